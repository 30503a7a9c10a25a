// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Subscription status exposed as a dispatchable bridge.
//
// One bridge class per variant, so the class tag and the status are the same
// thing. New instances are minted only by `BridgeRegistry::status_bridge_id`
// or when the host asks the creator channel for one by class.

use async_trait::async_trait;
use tracing::debug;

use superwall_core::types::{BridgeClass, SubscriptionStatus};

use crate::instance::{BridgeContext, BridgeInstance};
use crate::method::{MethodCall, Response};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionStatusBridge {
    status: SubscriptionStatus,
}

impl SubscriptionStatusBridge {
    pub fn new(status: SubscriptionStatus) -> Self {
        Self { status }
    }

    /// The bridge for a status class, or `None` for any other class.
    pub fn from_class(class: BridgeClass) -> Option<Self> {
        let status = match class {
            BridgeClass::SubscriptionStatusActiveBridge => SubscriptionStatus::Active,
            BridgeClass::SubscriptionStatusInactiveBridge => SubscriptionStatus::Inactive,
            BridgeClass::SubscriptionStatusUnknownBridge => SubscriptionStatus::Unknown,
            _ => return None,
        };
        Some(Self::new(status))
    }

    pub fn status(&self) -> SubscriptionStatus {
        self.status
    }

    pub fn class(&self) -> BridgeClass {
        match self.status {
            SubscriptionStatus::Active => BridgeClass::SubscriptionStatusActiveBridge,
            SubscriptionStatus::Inactive => BridgeClass::SubscriptionStatusInactiveBridge,
            SubscriptionStatus::Unknown => BridgeClass::SubscriptionStatusUnknownBridge,
        }
    }

    pub fn description(&self) -> &'static str {
        self.status.description()
    }
}

#[async_trait]
impl BridgeInstance for SubscriptionStatusBridge {
    fn bridge_class(&self) -> BridgeClass {
        self.class()
    }

    async fn handle(&self, _ctx: &BridgeContext, call: &MethodCall) -> Response {
        match call.method.as_str() {
            "getDescription" => Response::value(self.description()),
            other => {
                debug!(method = other, class = %self.class(), "method not implemented");
                Response::NotImplemented
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use superwall_core::config::BridgeConfig;

    use super::*;
    use crate::registry::BridgeRegistry;
    use crate::stub::RecordingMessenger;

    fn make_context() -> BridgeContext {
        let registry = BridgeRegistry::new(Arc::new(RecordingMessenger::new()), true);
        BridgeContext::new(registry, BridgeConfig::default())
    }

    #[test]
    fn class_and_status_are_one_to_one() {
        for status in SubscriptionStatus::ALL {
            let bridge = SubscriptionStatusBridge::new(status);
            assert_eq!(SubscriptionStatusBridge::from_class(bridge.class()), Some(bridge));
        }
        assert_eq!(
            SubscriptionStatusBridge::from_class(BridgeClass::CompletionBlockProxyBridge),
            None
        );
    }

    #[tokio::test]
    async fn get_description_returns_fixed_text() {
        let ctx = make_context();
        let bridge = SubscriptionStatusBridge::new(SubscriptionStatus::Inactive);
        let response = bridge.handle(&ctx, &MethodCall::bare("getDescription")).await;
        assert_eq!(response, Response::Value(json!("INACTIVE")));
    }

    #[tokio::test]
    async fn other_methods_are_not_implemented() {
        let ctx = make_context();
        let bridge = SubscriptionStatusBridge::new(SubscriptionStatus::Active);
        let response = bridge.handle(&ctx, &MethodCall::bare("setDescription")).await;
        assert_eq!(response, Response::NotImplemented);
    }
}
