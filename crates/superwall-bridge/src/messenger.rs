// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Outbound channel from native code back to the host application layer.

use async_trait::async_trait;

use superwall_core::types::BridgeId;

use crate::method::{MethodCall, Response};

/// Delivers calls addressed to host-side objects (proxy bridges).
#[async_trait]
pub trait HostMessenger: Send + Sync {
    /// Fire-and-forget delivery; the host's answer, if any, is discarded.
    fn notify(&self, bridge_id: &BridgeId, call: MethodCall);

    /// Deliver a call and wait for the host's response.
    async fn invoke(&self, bridge_id: &BridgeId, call: MethodCall) -> Response;
}
