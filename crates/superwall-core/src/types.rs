// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Superwall bridge.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::BridgeError;

/// Opaque identifier of a live bridge instance.
///
/// Natively minted ids have the shape `{BridgeClass}-bridgeId-{uuid}`. Ids
/// supplied by the host are accepted verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BridgeId(String);

impl BridgeId {
    /// Mint a fresh id for an instance of `class`.
    pub fn new(class: BridgeClass) -> Self {
        Self(format!("{}-bridgeId-{}", class.as_str(), Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BridgeId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for BridgeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for BridgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Every concrete bridge kind that can be registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BridgeClass {
    SuperwallBridge,
    SubscriptionStatusActiveBridge,
    SubscriptionStatusInactiveBridge,
    SubscriptionStatusUnknownBridge,
    SuperwallDelegateProxyBridge,
    PurchaseControllerProxyBridge,
    PaywallPresentationHandlerProxyBridge,
    CompletionBlockProxyBridge,
}

impl BridgeClass {
    pub const ALL: [BridgeClass; 8] = [
        Self::SuperwallBridge,
        Self::SubscriptionStatusActiveBridge,
        Self::SubscriptionStatusInactiveBridge,
        Self::SubscriptionStatusUnknownBridge,
        Self::SuperwallDelegateProxyBridge,
        Self::PurchaseControllerProxyBridge,
        Self::PaywallPresentationHandlerProxyBridge,
        Self::CompletionBlockProxyBridge,
    ];

    /// Class name as used on the wire and inside bridge ids.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuperwallBridge => "SuperwallBridge",
            Self::SubscriptionStatusActiveBridge => "SubscriptionStatusActiveBridge",
            Self::SubscriptionStatusInactiveBridge => "SubscriptionStatusInactiveBridge",
            Self::SubscriptionStatusUnknownBridge => "SubscriptionStatusUnknownBridge",
            Self::SuperwallDelegateProxyBridge => "SuperwallDelegateProxyBridge",
            Self::PurchaseControllerProxyBridge => "PurchaseControllerProxyBridge",
            Self::PaywallPresentationHandlerProxyBridge => "PaywallPresentationHandlerProxyBridge",
            Self::CompletionBlockProxyBridge => "CompletionBlockProxyBridge",
        }
    }
}

impl FromStr for BridgeClass {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|class| class.as_str() == s)
            .ok_or_else(|| BridgeError::UnknownBridgeClass(s.to_owned()))
    }
}

impl std::fmt::Display for BridgeClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the user has an active subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubscriptionStatus {
    Active,
    Inactive,
    /// Not yet determined (the SDK's initial state).
    Unknown,
}

impl SubscriptionStatus {
    pub const ALL: [SubscriptionStatus; 3] = [Self::Active, Self::Inactive, Self::Unknown];

    pub fn description(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

/// SDK log verbosity. Raw values match the native SDK's integer encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    None,
}

impl LogLevel {
    pub fn raw_value(&self) -> i64 {
        match self {
            Self::Debug => 10,
            Self::Info => 20,
            Self::Warn => 30,
            Self::Error => 40,
            Self::None => 99,
        }
    }

    /// Convert a raw integer, returning `None` for unrecognised values.
    pub fn from_raw(raw: i64) -> Option<Self> {
        match raw {
            10 => Some(Self::Debug),
            20 => Some(Self::Info),
            30 => Some(Self::Warn),
            40 => Some(Self::Error),
            99 => Some(Self::None),
            _ => None,
        }
    }
}

/// Options passed to `identify`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityOptions {
    /// Restore paywall assignments from the server for the identified user.
    pub restore_paywall_assignments: bool,
}

/// Which Superwall backend the SDK talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NetworkEnvironment {
    #[default]
    Release,
    ReleaseCandidate,
    Developer,
}

/// Paywall presentation options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaywallOptions {
    pub is_haptic_feedback_enabled: bool,
    pub should_show_purchase_failure_alert: bool,
    /// Preload paywalls in the background after configuration.
    pub should_preload: bool,
    /// Dismiss the paywall automatically after a purchase or restore.
    pub automatically_dismiss: bool,
}

impl Default for PaywallOptions {
    fn default() -> Self {
        Self {
            is_haptic_feedback_enabled: true,
            should_show_purchase_failure_alert: true,
            should_preload: true,
            automatically_dismiss: true,
        }
    }
}

/// SDK logging options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingOptions {
    pub level: LogLevel,
    /// Log scopes to emit; empty means all.
    pub scopes: Vec<String>,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            scopes: Vec::new(),
        }
    }
}

/// Options for `configure`. Every field has a default so partial objects from
/// the host deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SuperwallOptions {
    pub paywalls: PaywallOptions,
    pub network_environment: NetworkEnvironment,
    pub is_external_data_collection_enabled: bool,
    pub locale_identifier: Option<String>,
    pub is_game_controller_enabled: bool,
    pub logging: LoggingOptions,
}

impl Default for SuperwallOptions {
    fn default() -> Self {
        Self {
            paywalls: PaywallOptions::default(),
            network_environment: NetworkEnvironment::default(),
            is_external_data_collection_enabled: true,
            locale_identifier: None,
            is_game_controller_enabled: false,
            logging: LoggingOptions::default(),
        }
    }
}

/// Metadata describing a presented paywall.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaywallInfo {
    pub identifier: String,
    pub name: String,
    pub url: String,
    pub product_ids: Vec<String>,
}

/// Outcome of a purchase performed by a host-side purchase controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PurchaseResult {
    Purchased,
    Cancelled,
    Restored,
    Pending,
    Failed { error: String },
}

/// Outcome of a restore performed by a host-side purchase controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RestorationResult {
    Restored,
    Failed { error: Option<String> },
}

/// Why a registered event did not present a paywall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PaywallSkippedReason {
    Holdout,
    NoRuleMatch,
    EventNotFound,
    UserIsSubscribed,
}
