// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Seams to the native Superwall SDK.
//
// The SDK is an owned service handed to the bridge host at construction rather
// than a process global, so desktop builds and tests can substitute
// `stub::InMemorySdk`. The SDK owns its own state and locking; the bridge only
// forwards calls.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use url::Url;

use superwall_core::types::{
    IdentityOptions, LogLevel, PaywallInfo, PaywallSkippedReason, PurchaseResult,
    RestorationResult, SubscriptionStatus, SuperwallOptions,
};

/// Runs once when a registered event's feature is unlocked.
pub type FeatureBlock = Box<dyn FnOnce() + Send + 'static>;

/// The SDK's top-level facade.
#[async_trait]
pub trait SuperwallSdk: Send + Sync {
    fn set_delegate(&self, delegate: Option<Arc<dyn SuperwallDelegate>>);

    fn log_level(&self) -> LogLevel;
    fn set_log_level(&self, level: LogLevel);

    fn user_attributes(&self) -> Map<String, Value>;
    /// Merge `attributes` into the stored set. Null values remove a key.
    fn set_user_attributes(&self, attributes: Map<String, Value>);

    /// Identified user id, or the anonymous alias when not logged in.
    fn user_id(&self) -> String;
    fn is_logged_in(&self) -> bool;

    /// Description of the view controller currently showing a paywall.
    fn presented_view_controller(&self) -> Option<String>;
    fn latest_paywall_info(&self) -> Option<PaywallInfo>;

    fn subscription_status(&self) -> SubscriptionStatus;
    fn set_subscription_status(&self, status: SubscriptionStatus);

    fn is_configured(&self) -> bool;
    fn set_is_configured(&self, configured: bool);

    fn is_paywall_presented(&self) -> bool;

    fn preload_all_paywalls(&self);
    fn preload_paywalls(&self, event_names: HashSet<String>);

    /// Returns whether the SDK recognised and handled the link.
    fn handle_deep_link(&self, url: &Url) -> bool;

    fn toggle_paywall_spinner(&self, is_hidden: bool);

    /// Clear the user id, on-device paywall assignments, and stored data.
    fn reset(&self);

    fn configure(
        &self,
        api_key: &str,
        purchase_controller: Option<Arc<dyn PurchaseController>>,
        options: Option<SuperwallOptions>,
    );

    /// Dismiss the presented paywall. Resolves once the dismissal finishes.
    async fn dismiss(&self);

    fn register(
        &self,
        event: &str,
        params: Option<Map<String, Value>>,
        handler: Option<Arc<dyn PaywallPresentationHandler>>,
        feature: Option<FeatureBlock>,
    );

    fn identify(&self, user_id: &str, options: Option<IdentityOptions>);
}

/// SDK lifecycle callbacks. Every method defaults to a no-op.
pub trait SuperwallDelegate: Send + Sync {
    fn subscription_status_did_change(&self, _new_value: SubscriptionStatus) {}

    fn handle_custom_paywall_action(&self, _name: &str) {}

    fn paywall_will_open_url(&self, _url: &Url) {}

    fn paywall_will_open_deep_link(&self, _url: &Url) {}

    fn handle_log(&self, _level: LogLevel, _scope: &str, _message: Option<&str>) {}
}

/// Pluggable purchase handling.
#[async_trait]
pub trait PurchaseController: Send + Sync {
    async fn purchase(&self, product_id: &str) -> PurchaseResult;

    async fn restore_purchases(&self) -> RestorationResult;
}

/// Callbacks for one `register` presentation.
pub trait PaywallPresentationHandler: Send + Sync {
    fn on_present(&self, info: Option<&PaywallInfo>);

    fn on_dismiss(&self, info: Option<&PaywallInfo>);

    fn on_error(&self, error: &str);

    fn on_skip(&self, reason: PaywallSkippedReason);
}
