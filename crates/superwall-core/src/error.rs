// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for the Superwall bridge.

use std::time::Duration;

use thiserror::Error;

use crate::types::BridgeId;

/// Wire code for a missing or mistyped required argument.
pub const CODE_BAD_ARGS: &str = "BAD_ARGS";
/// Wire code for a deep link that could not be parsed.
pub const CODE_INVALID_URL: &str = "INVALID_URL";
/// Wire code for a bridge id with no live registry entry.
pub const CODE_NOT_FOUND: &str = "NOT_FOUND";
/// Wire code for a bridge id that refers to the wrong kind of bridge.
pub const CODE_TYPE_MISMATCH: &str = "TYPE_MISMATCH";
/// Wire code for a suspended call that exceeded its bounded wait.
pub const CODE_TIMEOUT: &str = "TIMEOUT";
/// Wire code for a suspended call cancelled by host teardown.
pub const CODE_CANCELLED: &str = "CANCELLED";
/// Wire code for an invocation arriving after teardown.
pub const CODE_TORN_DOWN: &str = "TORN_DOWN";
/// Wire code for anything else.
pub const CODE_INTERNAL: &str = "INTERNAL";

/// Top-level error type for all bridge operations.
#[derive(Debug, Error)]
pub enum BridgeError {
    // -- Argument errors --
    #[error("missing or invalid arguments for '{method}': {detail}")]
    BadArgs { method: String, detail: String },

    #[error("Invalid URL provided")]
    InvalidUrl(String),

    // -- Resolution errors --
    #[error("no bridge instance registered for {0}")]
    NotFound(BridgeId),

    #[error("bridge {id} is a {found}, expected {expected}")]
    TypeMismatch {
        id: BridgeId,
        expected: &'static str,
        found: String,
    },

    #[error("unknown bridge class: {0}")]
    UnknownBridgeClass(String),

    #[error("{0} instances cannot be created on demand")]
    NotCreatable(String),

    // -- Suspension --
    #[error("operation did not complete within {0:?}")]
    Timeout(Duration),

    #[error("operation cancelled")]
    Cancelled,

    #[error("bridge host has been torn down")]
    TornDown,

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BridgeError {
    /// Shorthand for an argument error on `method`.
    pub fn bad_args(method: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::BadArgs {
            method: method.into(),
            detail: detail.into(),
        }
    }

    /// Stable error code sent across the boundary.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadArgs { .. } => CODE_BAD_ARGS,
            Self::InvalidUrl(_) => CODE_INVALID_URL,
            Self::NotFound(_) => CODE_NOT_FOUND,
            Self::TypeMismatch { .. } => CODE_TYPE_MISMATCH,
            Self::UnknownBridgeClass(_) | Self::NotCreatable(_) => CODE_BAD_ARGS,
            Self::Timeout(_) => CODE_TIMEOUT,
            Self::Cancelled => CODE_CANCELLED,
            Self::TornDown => CODE_TORN_DOWN,
            Self::Io(_) | Self::Serialization(_) => CODE_INTERNAL,
        }
    }

    /// Whether this is a registry resolution failure (missing or wrong kind).
    pub fn is_resolution(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::TypeMismatch { .. })
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BridgeError>;
