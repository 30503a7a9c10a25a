// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory SDK and messenger for desktop/CI builds where the native Superwall
// SDK is unavailable.
//
// `InMemorySdk` keeps the SDK's observable state in a mutex-guarded record and
// plays out a simplified presentation flow: events with a paywall attached
// present it, everything else is skipped and unlocks the feature at once.
// Callbacks into delegates and handlers always run with the state lock
// released.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Semaphore;
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

use superwall_core::types::{
    BridgeId, IdentityOptions, LogLevel, PaywallInfo, PaywallSkippedReason, SubscriptionStatus,
    SuperwallOptions,
};

use crate::messenger::HostMessenger;
use crate::method::{MethodCall, Response};
use crate::sdk::{
    FeatureBlock, PaywallPresentationHandler, PurchaseController, SuperwallDelegate, SuperwallSdk,
};

/// Query parameter that marks a link as a paywall preview.
const PREVIEW_QUERY_KEY: &str = "superwall_debug";

/// A paywall currently on screen.
struct Presentation {
    info: PaywallInfo,
    handler: Option<Arc<dyn PaywallPresentationHandler>>,
    /// Runs on dismissal if the user is subscribed by then.
    feature: Option<FeatureBlock>,
}

struct SdkState {
    delegate: Option<Arc<dyn SuperwallDelegate>>,
    log_level: LogLevel,
    user_attributes: Map<String, Value>,
    user_id: Option<String>,
    alias_id: String,
    subscription_status: SubscriptionStatus,
    is_configured: bool,
    api_key: Option<String>,
    options: Option<SuperwallOptions>,
    purchase_controller: Option<Arc<dyn PurchaseController>>,
    identify_options: Option<IdentityOptions>,
    spinner_hidden: Option<bool>,
    preloaded_all: bool,
    preloaded_events: HashSet<String>,
    paywall_events: HashSet<String>,
    registered_events: Vec<String>,
    /// Paywall assigned to each event on this device.
    assignments: HashMap<String, String>,
    presented: Option<Presentation>,
    latest_paywall_info: Option<PaywallInfo>,
    dismiss_count: usize,
}

fn new_alias() -> String {
    format!("$SuperwallAlias:{}", Uuid::new_v4())
}

impl Default for SdkState {
    fn default() -> Self {
        Self {
            delegate: None,
            log_level: LogLevel::default(),
            user_attributes: Map::new(),
            user_id: None,
            alias_id: new_alias(),
            subscription_status: SubscriptionStatus::Unknown,
            is_configured: false,
            api_key: None,
            options: None,
            purchase_controller: None,
            identify_options: None,
            spinner_hidden: None,
            preloaded_all: false,
            preloaded_events: HashSet::new(),
            paywall_events: HashSet::new(),
            registered_events: Vec::new(),
            assignments: HashMap::new(),
            presented: None,
            latest_paywall_info: None,
            dismiss_count: 0,
        }
    }
}

/// Holds `dismiss` calls open until released.
#[derive(Clone)]
pub struct DismissGate {
    permits: Arc<Semaphore>,
}

impl DismissGate {
    /// Let one held (or the next) dismissal complete.
    pub fn release(&self) {
        self.permits.add_permits(1);
    }
}

/// Working SDK with no native dependencies.
#[derive(Default)]
pub struct InMemorySdk {
    state: Mutex<SdkState>,
    dismiss_gate: Mutex<Option<DismissGate>>,
}

impl InMemorySdk {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, SdkState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// From now on `dismiss` waits for [`DismissGate::release`].
    pub fn hold_dismissals(&self) -> DismissGate {
        let gate = DismissGate {
            permits: Arc::new(Semaphore::new(0)),
        };
        *self.dismiss_gate.lock().unwrap_or_else(PoisonError::into_inner) = Some(gate.clone());
        gate
    }

    /// Attach a paywall to `event`, so registering it presents.
    pub fn add_paywall_for_event(&self, event: &str) {
        self.state().paywall_events.insert(event.to_owned());
    }

    pub fn api_key(&self) -> Option<String> {
        self.state().api_key.clone()
    }

    pub fn options(&self) -> Option<SuperwallOptions> {
        self.state().options.clone()
    }

    pub fn has_delegate(&self) -> bool {
        self.state().delegate.is_some()
    }

    pub fn has_purchase_controller(&self) -> bool {
        self.state().purchase_controller.is_some()
    }

    pub fn identify_options(&self) -> Option<IdentityOptions> {
        self.state().identify_options
    }

    /// Last spinner visibility requested, if any.
    pub fn spinner_hidden(&self) -> Option<bool> {
        self.state().spinner_hidden
    }

    pub fn preloaded_all(&self) -> bool {
        self.state().preloaded_all
    }

    pub fn preloaded_events(&self) -> HashSet<String> {
        self.state().preloaded_events.clone()
    }

    pub fn registered_events(&self) -> Vec<String> {
        self.state().registered_events.clone()
    }

    /// Event name to assigned paywall identifier.
    pub fn paywall_assignments(&self) -> HashMap<String, String> {
        self.state().assignments.clone()
    }

    pub fn dismiss_count(&self) -> usize {
        self.state().dismiss_count
    }
}

#[async_trait]
impl SuperwallSdk for InMemorySdk {
    fn set_delegate(&self, delegate: Option<Arc<dyn SuperwallDelegate>>) {
        self.state().delegate = delegate;
    }

    fn log_level(&self) -> LogLevel {
        self.state().log_level
    }

    fn set_log_level(&self, level: LogLevel) {
        self.state().log_level = level;
    }

    fn user_attributes(&self) -> Map<String, Value> {
        self.state().user_attributes.clone()
    }

    fn set_user_attributes(&self, attributes: Map<String, Value>) {
        let mut state = self.state();
        for (key, value) in attributes {
            if value.is_null() {
                state.user_attributes.remove(&key);
            } else {
                state.user_attributes.insert(key, value);
            }
        }
    }

    fn user_id(&self) -> String {
        let state = self.state();
        state.user_id.clone().unwrap_or_else(|| state.alias_id.clone())
    }

    fn is_logged_in(&self) -> bool {
        self.state().user_id.is_some()
    }

    fn presented_view_controller(&self) -> Option<String> {
        self.state()
            .presented
            .as_ref()
            .map(|p| format!("<PaywallViewController: {}>", p.info.identifier))
    }

    fn latest_paywall_info(&self) -> Option<PaywallInfo> {
        self.state().latest_paywall_info.clone()
    }

    fn subscription_status(&self) -> SubscriptionStatus {
        self.state().subscription_status
    }

    fn set_subscription_status(&self, status: SubscriptionStatus) {
        let delegate = {
            let mut state = self.state();
            if state.subscription_status == status {
                return;
            }
            state.subscription_status = status;
            state.delegate.clone()
        };
        info!(%status, "subscription status changed");
        if let Some(delegate) = delegate {
            delegate.subscription_status_did_change(status);
        }
    }

    fn is_configured(&self) -> bool {
        self.state().is_configured
    }

    fn set_is_configured(&self, configured: bool) {
        self.state().is_configured = configured;
    }

    fn is_paywall_presented(&self) -> bool {
        self.state().presented.is_some()
    }

    fn preload_all_paywalls(&self) {
        self.state().preloaded_all = true;
    }

    fn preload_paywalls(&self, event_names: HashSet<String>) {
        self.state().preloaded_events.extend(event_names);
    }

    fn handle_deep_link(&self, url: &Url) -> bool {
        let handled = url.query_pairs().any(|(key, _)| key == PREVIEW_QUERY_KEY);
        let delegate = self.state().delegate.clone();
        if handled {
            if let Some(delegate) = delegate {
                delegate.paywall_will_open_deep_link(url);
            }
        }
        handled
    }

    fn toggle_paywall_spinner(&self, is_hidden: bool) {
        self.state().spinner_hidden = Some(is_hidden);
    }

    fn reset(&self) {
        let mut state = self.state();
        state.user_id = None;
        state.alias_id = new_alias();
        state.user_attributes.clear();
        state.identify_options = None;
        state.preloaded_all = false;
        state.preloaded_events.clear();
        state.assignments.clear();
        debug!("sdk state reset");
    }

    fn configure(
        &self,
        api_key: &str,
        purchase_controller: Option<Arc<dyn PurchaseController>>,
        options: Option<SuperwallOptions>,
    ) {
        let mut state = self.state();
        state.api_key = Some(api_key.to_owned());
        state.purchase_controller = purchase_controller;
        if let Some(options) = &options {
            state.log_level = options.logging.level;
            state.preloaded_all = options.paywalls.should_preload;
        }
        state.options = options;
        state.is_configured = true;
        info!("sdk configured");
    }

    async fn dismiss(&self) {
        let gate = self
            .dismiss_gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.permits.acquire().await {
                permit.forget();
            }
        }

        let (presentation, subscribed) = {
            let mut state = self.state();
            state.dismiss_count += 1;
            (
                state.presented.take(),
                state.subscription_status == SubscriptionStatus::Active,
            )
        };
        if let Some(presentation) = presentation {
            if let Some(handler) = &presentation.handler {
                handler.on_dismiss(Some(&presentation.info));
            }
            if subscribed {
                if let Some(feature) = presentation.feature {
                    feature();
                }
            }
        }
    }

    fn register(
        &self,
        event: &str,
        _params: Option<Map<String, Value>>,
        handler: Option<Arc<dyn PaywallPresentationHandler>>,
        feature: Option<FeatureBlock>,
    ) {
        let skipped = {
            let mut state = self.state();
            state.registered_events.push(event.to_owned());

            if state.subscription_status == SubscriptionStatus::Active {
                Some(PaywallSkippedReason::UserIsSubscribed)
            } else if !state.paywall_events.contains(event) {
                Some(PaywallSkippedReason::EventNotFound)
            } else {
                None
            }
        };

        if let Some(reason) = skipped {
            debug!(event, ?reason, "paywall skipped");
            if let Some(handler) = &handler {
                handler.on_skip(reason);
            }
            if let Some(feature) = feature {
                feature();
            }
            return;
        }

        let info = PaywallInfo {
            identifier: format!("{event}-paywall"),
            name: event.to_owned(),
            url: format!("https://paywalls.superwall.invalid/{event}"),
            product_ids: Vec::new(),
        };
        {
            let mut state = self.state();
            state
                .assignments
                .insert(event.to_owned(), info.identifier.clone());
            state.latest_paywall_info = Some(info.clone());
            state.presented = Some(Presentation {
                info: info.clone(),
                handler: handler.clone(),
                feature,
            });
        }
        debug!(event, "paywall presented");
        if let Some(handler) = handler {
            handler.on_present(Some(&info));
        }
    }

    fn identify(&self, user_id: &str, options: Option<IdentityOptions>) {
        let mut state = self.state();
        state.user_id = Some(user_id.to_owned());
        state.identify_options = options;
    }
}

/// Messenger that records everything sent to the host and answers
/// invocations from a reply table.
#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<(BridgeId, MethodCall)>>,
    replies: Mutex<HashMap<String, Value>>,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer future invocations of `method` with `value`.
    pub fn reply_with(&self, method: &str, value: Value) {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(method.to_owned(), value);
    }

    /// Everything delivered so far, notifications and invocations alike.
    pub fn notifications(&self) -> Vec<(BridgeId, MethodCall)> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn notified_methods(&self) -> Vec<String> {
        self.notifications()
            .into_iter()
            .map(|(_, call)| call.method)
            .collect()
    }

    fn record(&self, bridge_id: &BridgeId, call: MethodCall) {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((bridge_id.clone(), call));
    }
}

#[async_trait]
impl HostMessenger for RecordingMessenger {
    fn notify(&self, bridge_id: &BridgeId, call: MethodCall) {
        self.record(bridge_id, call);
    }

    async fn invoke(&self, bridge_id: &BridgeId, call: MethodCall) -> Response {
        let reply = self
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&call.method)
            .cloned();
        self.record(bridge_id, call);
        reply.map_or(Response::NotImplemented, Response::Value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingDelegate(Mutex<Vec<SubscriptionStatus>>);

    impl SuperwallDelegate for CountingDelegate {
        fn subscription_status_did_change(&self, new_value: SubscriptionStatus) {
            self.0.lock().unwrap().push(new_value);
        }
    }

    #[test]
    fn status_changes_reach_delegate_once() {
        let sdk = InMemorySdk::new();
        let delegate = Arc::new(CountingDelegate(Mutex::new(Vec::new())));
        sdk.set_delegate(Some(delegate.clone()));

        sdk.set_subscription_status(SubscriptionStatus::Inactive);
        sdk.set_subscription_status(SubscriptionStatus::Inactive);
        sdk.set_subscription_status(SubscriptionStatus::Active);

        assert_eq!(
            *delegate.0.lock().unwrap(),
            vec![SubscriptionStatus::Inactive, SubscriptionStatus::Active]
        );
    }

    #[test]
    fn reset_forgets_identity() {
        let sdk = InMemorySdk::new();
        let alias = sdk.user_id();
        sdk.identify("u1", None);
        assert!(sdk.is_logged_in());

        sdk.reset();
        assert!(!sdk.is_logged_in());
        assert_ne!(sdk.user_id(), alias);
        assert!(sdk.user_id().starts_with("$SuperwallAlias:"));
    }

    #[test]
    fn configure_applies_options() {
        let sdk = InMemorySdk::new();
        let mut options = SuperwallOptions::default();
        options.logging.level = LogLevel::Debug;
        sdk.configure("pk", None, Some(options));
        assert!(sdk.is_configured());
        assert!(sdk.preloaded_all());
        assert_eq!(sdk.log_level(), LogLevel::Debug);
    }

    #[test]
    fn preview_links_are_handled() {
        let sdk = InMemorySdk::new();
        let preview = Url::parse("myapp://paywall?superwall_debug=true&paywall_id=7").unwrap();
        let other = Url::parse("https://example.com").unwrap();
        assert!(sdk.handle_deep_link(&preview));
        assert!(!sdk.handle_deep_link(&other));
    }

    #[tokio::test]
    async fn dismiss_unlocks_feature_for_subscribers() {
        let sdk = InMemorySdk::new();
        sdk.add_paywall_for_event("gated");
        let fired = Arc::new(Mutex::new(false));
        let flag = fired.clone();
        sdk.register(
            "gated",
            None,
            None,
            Some(Box::new(move || *flag.lock().unwrap() = true)),
        );
        assert!(sdk.is_paywall_presented());

        sdk.set_subscription_status(SubscriptionStatus::Active);
        sdk.dismiss().await;
        assert!(!sdk.is_paywall_presented());
        assert!(*fired.lock().unwrap());
    }
}
