// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Runtime settings for the bridge host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Upper bound on how long `dismiss` may stay outstanding, in
    /// milliseconds. `None` waits for as long as the SDK takes.
    pub dismiss_timeout_ms: Option<u64>,
    /// Hand out the same subscription-status bridge id for a variant while
    /// it is still registered, instead of minting a new one per request.
    pub reuse_status_bridges: bool,
    /// Log unrecognised method names at `warn` rather than `debug`.
    pub log_unhandled_methods: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            dismiss_timeout_ms: None,
            reuse_status_bridges: true,
            log_unhandled_methods: false,
        }
    }
}

impl BridgeConfig {
    /// Read a JSON config file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn dismiss_timeout(&self) -> Option<Duration> {
        self.dismiss_timeout_ms.map(Duration::from_millis)
    }
}
