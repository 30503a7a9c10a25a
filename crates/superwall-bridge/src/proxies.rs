// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Proxy bridges: native stand-ins for callback objects that live on the host
// side. The SDK calls them like any delegate; each call is forwarded over the
// host messenger addressed to the proxy's own bridge id.
//
// Proxies accept no inbound methods.

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use superwall_core::types::{
    BridgeClass, BridgeId, LogLevel, PaywallInfo, PaywallSkippedReason, PurchaseResult,
    RestorationResult, SubscriptionStatus,
};

use crate::instance::{BridgeContext, BridgeInstance};
use crate::messenger::HostMessenger;
use crate::method::{Arguments, MethodCall, Response};
use crate::registry::BridgeRegistry;
use crate::sdk::{PaywallPresentationHandler, PurchaseController, SuperwallDelegate};

/// Outbound half of a proxy: its id plus the messenger that reaches the host.
#[derive(Clone)]
pub struct ProxyChannel {
    bridge_id: BridgeId,
    messenger: Arc<dyn HostMessenger>,
}

impl ProxyChannel {
    pub fn new(bridge_id: BridgeId, messenger: Arc<dyn HostMessenger>) -> Self {
        Self {
            bridge_id,
            messenger,
        }
    }

    pub fn bridge_id(&self) -> &BridgeId {
        &self.bridge_id
    }

    fn notify(&self, method: &str, arguments: Arguments) {
        debug!(bridge_id = %self.bridge_id, method, "notifying host");
        self.messenger
            .notify(&self.bridge_id, MethodCall::new(method, arguments));
    }

    async fn invoke(&self, method: &str, arguments: Arguments) -> Response {
        debug!(bridge_id = %self.bridge_id, method, "invoking host");
        self.messenger
            .invoke(&self.bridge_id, MethodCall::new(method, arguments))
            .await
    }
}

fn reject_inbound(class: BridgeClass, call: &MethodCall) -> Response {
    debug!(method = %call.method, %class, "proxy bridges accept no inbound methods");
    Response::NotImplemented
}

// ---------------------------------------------------------------------------
// Delegate
// ---------------------------------------------------------------------------

pub struct SuperwallDelegateProxyBridge {
    channel: ProxyChannel,
    /// Used to mint status ids; weak because the registry owns this proxy.
    registry: Weak<BridgeRegistry>,
}

impl SuperwallDelegateProxyBridge {
    pub fn new(channel: ProxyChannel, registry: Weak<BridgeRegistry>) -> Self {
        Self { channel, registry }
    }
}

impl SuperwallDelegate for SuperwallDelegateProxyBridge {
    fn subscription_status_did_change(&self, new_value: SubscriptionStatus) {
        let Some(registry) = self.registry.upgrade() else {
            warn!("registry dropped; subscription status change not forwarded");
            return;
        };
        let status_id = registry.status_bridge_id(new_value);
        self.channel.notify(
            "subscriptionStatusDidChange",
            Arguments::new().with("subscriptionStatusBridgeId", status_id.as_str()),
        );
    }

    fn handle_custom_paywall_action(&self, name: &str) {
        self.channel
            .notify("handleCustomPaywallAction", Arguments::new().with("name", name));
    }

    fn paywall_will_open_url(&self, url: &Url) {
        self.channel
            .notify("paywallWillOpenURL", Arguments::new().with("url", url.as_str()));
    }

    fn paywall_will_open_deep_link(&self, url: &Url) {
        self.channel
            .notify("paywallWillOpenDeepLink", Arguments::new().with("url", url.as_str()));
    }

    fn handle_log(&self, level: LogLevel, scope: &str, message: Option<&str>) {
        self.channel.notify(
            "handleLog",
            Arguments::new()
                .with("level", level.raw_value())
                .with("scope", scope)
                .with("message", message),
        );
    }
}

#[async_trait]
impl BridgeInstance for SuperwallDelegateProxyBridge {
    fn bridge_class(&self) -> BridgeClass {
        BridgeClass::SuperwallDelegateProxyBridge
    }

    async fn handle(&self, _ctx: &BridgeContext, call: &MethodCall) -> Response {
        reject_inbound(self.bridge_class(), call)
    }
}

// ---------------------------------------------------------------------------
// Purchase controller
// ---------------------------------------------------------------------------

pub struct PurchaseControllerProxyBridge {
    channel: ProxyChannel,
}

impl PurchaseControllerProxyBridge {
    pub fn new(channel: ProxyChannel) -> Self {
        Self { channel }
    }
}

/// Decode a host reply into `T`, or describe why it could not be decoded.
fn decode_reply<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, String> {
    match response {
        Response::Value(value) => serde_json::from_value(value).map_err(|e| e.to_string()),
        Response::Error(err) => Err(err.message),
        Response::NotImplemented => Err("host purchase controller did not answer".into()),
    }
}

#[async_trait]
impl PurchaseController for PurchaseControllerProxyBridge {
    async fn purchase(&self, product_id: &str) -> PurchaseResult {
        let reply = self
            .channel
            .invoke(
                "purchaseFromAppStore",
                Arguments::new().with("productId", product_id),
            )
            .await;
        decode_reply(reply).unwrap_or_else(|error| {
            warn!(product_id, %error, "purchase reply unusable");
            PurchaseResult::Failed { error }
        })
    }

    async fn restore_purchases(&self) -> RestorationResult {
        let reply = self.channel.invoke("restorePurchases", Arguments::new()).await;
        decode_reply(reply).unwrap_or_else(|error| {
            warn!(%error, "restore reply unusable");
            RestorationResult::Failed { error: Some(error) }
        })
    }
}

#[async_trait]
impl BridgeInstance for PurchaseControllerProxyBridge {
    fn bridge_class(&self) -> BridgeClass {
        BridgeClass::PurchaseControllerProxyBridge
    }

    async fn handle(&self, _ctx: &BridgeContext, call: &MethodCall) -> Response {
        reject_inbound(self.bridge_class(), call)
    }
}

// ---------------------------------------------------------------------------
// Presentation handler
// ---------------------------------------------------------------------------

/// Paywall info is not converted for the host, so present/dismiss carry no
/// payload.
pub struct PaywallPresentationHandlerProxyBridge {
    channel: ProxyChannel,
}

impl PaywallPresentationHandlerProxyBridge {
    pub fn new(channel: ProxyChannel) -> Self {
        Self { channel }
    }
}

impl PaywallPresentationHandler for PaywallPresentationHandlerProxyBridge {
    fn on_present(&self, _info: Option<&PaywallInfo>) {
        self.channel.notify("onPresent", Arguments::new());
    }

    fn on_dismiss(&self, _info: Option<&PaywallInfo>) {
        self.channel.notify("onDismiss", Arguments::new());
    }

    fn on_error(&self, error: &str) {
        self.channel
            .notify("onError", Arguments::new().with("errorString", error));
    }

    fn on_skip(&self, reason: PaywallSkippedReason) {
        let reason = serde_json::to_value(reason).unwrap_or(Value::Null);
        self.channel
            .notify("onSkip", Arguments::new().with("reason", reason));
    }
}

#[async_trait]
impl BridgeInstance for PaywallPresentationHandlerProxyBridge {
    fn bridge_class(&self) -> BridgeClass {
        BridgeClass::PaywallPresentationHandlerProxyBridge
    }

    async fn handle(&self, _ctx: &BridgeContext, call: &MethodCall) -> Response {
        reject_inbound(self.bridge_class(), call)
    }
}

// ---------------------------------------------------------------------------
// Completion block
// ---------------------------------------------------------------------------

pub struct CompletionBlockProxyBridge {
    channel: ProxyChannel,
}

impl CompletionBlockProxyBridge {
    pub fn new(channel: ProxyChannel) -> Self {
        Self { channel }
    }

    pub fn call_completion_block(&self) {
        self.channel.notify("callCompletionBlock", Arguments::new());
    }
}

#[async_trait]
impl BridgeInstance for CompletionBlockProxyBridge {
    fn bridge_class(&self) -> BridgeClass {
        BridgeClass::CompletionBlockProxyBridge
    }

    async fn handle(&self, _ctx: &BridgeContext, call: &MethodCall) -> Response {
        reject_inbound(self.bridge_class(), call)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::stub::RecordingMessenger;

    fn make() -> (Arc<RecordingMessenger>, Arc<BridgeRegistry>) {
        let messenger = Arc::new(RecordingMessenger::new());
        let registry = BridgeRegistry::new(messenger.clone(), true);
        (messenger, registry)
    }

    #[test]
    fn delegate_forwards_status_as_bridge_id() {
        let (messenger, registry) = make();
        let id = registry
            .create_instance(BridgeClass::SuperwallDelegateProxyBridge)
            .unwrap();
        let delegate: Arc<SuperwallDelegateProxyBridge> = registry.resolve(&id).unwrap();

        delegate.subscription_status_did_change(SubscriptionStatus::Active);

        let sent = messenger.notifications();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, id);
        assert_eq!(sent[0].1.method, "subscriptionStatusDidChange");
        let status_id = sent[0]
            .1
            .arguments
            .bridge_id("subscriptionStatusBridgeId")
            .unwrap();
        let status: crate::subscription_status::SubscriptionStatusBridge =
            registry.resolve(&status_id).unwrap();
        assert_eq!(status.status(), SubscriptionStatus::Active);
    }

    #[test]
    fn delegate_forwards_paywall_callbacks() {
        let (messenger, registry) = make();
        let id = registry
            .create_instance(BridgeClass::SuperwallDelegateProxyBridge)
            .unwrap();
        let delegate: Arc<SuperwallDelegateProxyBridge> = registry.resolve(&id).unwrap();
        let link = Url::parse("myapp://offer/42").unwrap();
        let page = Url::parse("https://example.com/terms").unwrap();

        delegate.handle_custom_paywall_action("contact_support");
        delegate.paywall_will_open_url(&page);
        delegate.paywall_will_open_deep_link(&link);
        delegate.handle_log(LogLevel::Warn, "paywallPresentation", Some("slow load"));
        delegate.handle_log(LogLevel::Error, "network", None);

        let sent = messenger.notifications();
        let methods: Vec<&str> = sent.iter().map(|(_, call)| call.method.as_str()).collect();
        assert_eq!(
            methods,
            [
                "handleCustomPaywallAction",
                "paywallWillOpenURL",
                "paywallWillOpenDeepLink",
                "handleLog",
                "handleLog",
            ]
        );
        assert!(sent.iter().all(|(target, _)| *target == id));

        assert_eq!(
            sent[0].1.arguments.get::<String>("name").as_deref(),
            Some("contact_support")
        );
        assert_eq!(
            sent[1].1.arguments.get::<String>("url").as_deref(),
            Some("https://example.com/terms")
        );
        assert_eq!(
            sent[2].1.arguments.get::<String>("url").as_deref(),
            Some("myapp://offer/42")
        );

        let log = &sent[3].1.arguments;
        assert_eq!(log.get::<i64>("level"), Some(30));
        assert_eq!(log.get::<String>("scope").as_deref(), Some("paywallPresentation"));
        assert_eq!(log.get::<String>("message").as_deref(), Some("slow load"));
        assert_eq!(sent[4].1.arguments.get::<i64>("level"), Some(40));
        assert_eq!(sent[4].1.arguments.raw("message"), None);
    }

    #[test]
    fn handler_forwards_presentation_lifecycle() {
        let (messenger, registry) = make();
        let id = registry
            .create_instance(BridgeClass::PaywallPresentationHandlerProxyBridge)
            .unwrap();
        let handler: Arc<PaywallPresentationHandlerProxyBridge> = registry.resolve(&id).unwrap();

        handler.on_present(None);
        handler.on_dismiss(None);
        handler.on_error("no products");

        assert_eq!(messenger.notified_methods(), ["onPresent", "onDismiss", "onError"]);
        let sent = messenger.notifications();
        assert!(sent[0].1.arguments.is_empty());
        assert!(sent[1].1.arguments.is_empty());
        assert_eq!(
            sent[2].1.arguments.get::<String>("errorString").as_deref(),
            Some("no products")
        );
    }

    #[test]
    fn handler_reports_skip_reason() {
        let (messenger, registry) = make();
        let id = registry
            .create_instance(BridgeClass::PaywallPresentationHandlerProxyBridge)
            .unwrap();
        let handler: Arc<PaywallPresentationHandlerProxyBridge> = registry.resolve(&id).unwrap();

        handler.on_skip(PaywallSkippedReason::NoRuleMatch);

        let sent = messenger.notifications();
        assert_eq!(sent[0].1.method, "onSkip");
        assert_eq!(sent[0].1.arguments.get::<String>("reason").as_deref(), Some("noRuleMatch"));
    }

    #[test]
    fn completion_block_notifies_host() {
        let (messenger, registry) = make();
        let id = registry
            .create_instance(BridgeClass::CompletionBlockProxyBridge)
            .unwrap();
        let block: Arc<CompletionBlockProxyBridge> = registry.resolve(&id).unwrap();
        block.call_completion_block();
        assert_eq!(messenger.notified_methods(), vec!["callCompletionBlock".to_owned()]);
    }

    #[tokio::test]
    async fn purchase_decodes_host_reply() {
        let (messenger, registry) = make();
        messenger.reply_with("purchaseFromAppStore", json!({"type": "purchased"}));
        let id = registry
            .create_instance(BridgeClass::PurchaseControllerProxyBridge)
            .unwrap();
        let controller: Arc<PurchaseControllerProxyBridge> = registry.resolve(&id).unwrap();

        assert_eq!(controller.purchase("pro_monthly").await, PurchaseResult::Purchased);
    }

    #[tokio::test]
    async fn unanswered_restore_is_a_failure() {
        let (_messenger, registry) = make();
        let id = registry
            .create_instance(BridgeClass::PurchaseControllerProxyBridge)
            .unwrap();
        let controller: Arc<PurchaseControllerProxyBridge> = registry.resolve(&id).unwrap();

        assert!(matches!(
            controller.restore_purchases().await,
            RestorationResult::Failed { error: Some(_) }
        ));
    }

    #[tokio::test]
    async fn proxies_reject_inbound_calls() {
        let (_messenger, registry) = make();
        let ctx = BridgeContext::new(registry.clone(), Default::default());
        let id = registry
            .create_instance(BridgeClass::CompletionBlockProxyBridge)
            .unwrap();
        let object = registry.get(&id).unwrap();
        assert_eq!(
            object.handle(&ctx, &MethodCall::bare("callCompletionBlock")).await,
            Response::NotImplemented
        );
    }
}
