// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Method invocations crossing the bridge and the single response each one
// produces.
//
// Arguments arrive as a loosely-typed JSON object. Lookups never fail hard:
// an absent key, an explicit null, and a value of the wrong shape all read as
// "not supplied", and the calling bridge decides whether that is an error or
// a silent no-op.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use superwall_core::error::{BridgeError, CODE_INTERNAL, Result};
use superwall_core::types::BridgeId;

/// Argument bag of a single invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Arguments(Map<String, Value>);

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap whatever the host sent. Anything other than an object carries no
    /// usable keys and becomes an empty bag.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Raw value under `key`. Explicit nulls read as absent.
    pub fn raw(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|value| !value.is_null())
    }

    /// Typed value under `key`, or `None` if absent or of the wrong shape.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.raw(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Bridge id stored under `key`.
    pub fn bridge_id(&self, key: &str) -> Option<BridgeId> {
        self.get::<String>(key).map(BridgeId::from)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A named method invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub arguments: Arguments,
}

impl MethodCall {
    pub fn new(method: impl Into<String>, arguments: Arguments) -> Self {
        Self {
            method: method.into(),
            arguments,
        }
    }

    /// Invocation with an empty argument bag.
    pub fn bare(method: impl Into<String>) -> Self {
        Self::new(method, Arguments::new())
    }

    /// Argument error attributed to this call.
    pub fn bad_args(&self, detail: impl Into<String>) -> BridgeError {
        BridgeError::bad_args(&self.method, detail)
    }

    /// Required typed argument.
    pub fn require<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        self.arguments
            .get(key)
            .ok_or_else(|| self.bad_args(format!("missing or mistyped `{key}`")))
    }
}

/// Structured error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodError {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// The one answer an invocation produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Response {
    /// Success. `Value::Null` means "no value".
    Value(Value),
    Error(MethodError),
    /// The receiving bridge does not know the method.
    NotImplemented,
}

impl Response {
    pub fn null() -> Self {
        Self::Value(Value::Null)
    }

    /// Serialize `value` into a success response.
    pub fn value(value: impl Serialize) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => Self::Value(value),
            Err(err) => Self::Error(MethodError {
                code: CODE_INTERNAL.into(),
                message: err.to_string(),
                details: None,
            }),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn error_code(&self) -> Option<&str> {
        match self {
            Self::Error(err) => Some(err.code.as_str()),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }
}

impl From<BridgeError> for Response {
    fn from(err: BridgeError) -> Self {
        let details = match &err {
            BridgeError::InvalidUrl(raw) => Some(Value::String(raw.clone())),
            BridgeError::NotFound(id) | BridgeError::TypeMismatch { id, .. } => {
                Some(Value::String(id.to_string()))
            }
            _ => None,
        };
        Self::Error(MethodError {
            code: err.code().into(),
            message: err.to_string(),
            details,
        })
    }
}

impl From<Result<Value>> for Response {
    fn from(outcome: Result<Value>) -> Self {
        match outcome {
            Ok(value) => Self::Value(value),
            Err(err) => err.into(),
        }
    }
}
