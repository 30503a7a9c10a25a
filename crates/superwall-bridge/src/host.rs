// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge host: owns the SDK service, the registry, and the two inbound
// channels (per-instance method calls and the bridge creator).

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use superwall_core::config::BridgeConfig;
use superwall_core::error::{BridgeError, Result};
use superwall_core::types::{BridgeClass, BridgeId};

use crate::instance::{BridgeContext, BridgeObject, Lifecycle};
use crate::messenger::HostMessenger;
use crate::method::{MethodCall, Response};
use crate::registry::BridgeRegistry;
use crate::sdk::SuperwallSdk;
use crate::superwall::SuperwallBridge;

/// Entry point for the host application layer.
pub struct BridgeHost {
    context: BridgeContext,
    sdk: Arc<dyn SuperwallSdk>,
    superwall_id: BridgeId,
}

impl BridgeHost {
    /// Build a host around `sdk` and register its facade bridge.
    pub fn new(
        sdk: Arc<dyn SuperwallSdk>,
        messenger: Arc<dyn HostMessenger>,
        config: BridgeConfig,
    ) -> Self {
        let registry = BridgeRegistry::new(messenger, config.reuse_status_bridges);
        let context = BridgeContext::new(registry, config);
        let superwall_id = BridgeId::new(BridgeClass::SuperwallBridge);
        let host = Self {
            context,
            sdk,
            superwall_id,
        };
        host.register_facade(host.superwall_id.clone());
        info!(superwall_bridge_id = %host.superwall_id, "bridge host initialised");
        host
    }

    fn register_facade(&self, id: BridgeId) {
        let facade = SuperwallBridge::new(Arc::clone(&self.sdk));
        self.context
            .registry
            .insert(id, BridgeObject::Superwall(Arc::new(facade)));
    }

    pub fn registry(&self) -> &Arc<BridgeRegistry> {
        &self.context.registry
    }

    pub fn context(&self) -> &BridgeContext {
        &self.context
    }

    /// Id of the facade registered at construction.
    pub fn superwall_bridge_id(&self) -> &BridgeId {
        &self.superwall_id
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.context.lifecycle()
    }

    /// Dispatch `call` to the bridge registered under `bridge_id`.
    #[instrument(
        skip(self, bridge_id, call),
        fields(bridge_id = %bridge_id, method = %call.method)
    )]
    pub async fn invoke(&self, bridge_id: &BridgeId, call: MethodCall) -> Response {
        if self.lifecycle() == Lifecycle::TornDown {
            return BridgeError::TornDown.into();
        }
        let Some(object) = self.context.registry.get(bridge_id) else {
            debug!("no bridge registered under id");
            return BridgeError::NotFound(bridge_id.clone()).into();
        };
        object.handle(&self.context, &call).await
    }

    /// Handle a call on the bridge creator channel.
    #[instrument(skip(self, call), fields(method = %call.method))]
    pub fn invoke_creator(&self, call: &MethodCall) -> Response {
        if self.lifecycle() == Lifecycle::TornDown {
            return BridgeError::TornDown.into();
        }
        match call.method.as_str() {
            "createBridgeInstance" => self.create_bridge_instance(call).into(),
            "invalidateBridgeInstance" => self.invalidate_bridge_instance(call).into(),
            other => {
                debug!(method = other, "creator method not implemented");
                Response::NotImplemented
            }
        }
    }

    fn create_bridge_instance(&self, call: &MethodCall) -> Result<serde_json::Value> {
        let id: BridgeId = call.require("bridgeId")?;
        let class_name: String = call.require("bridgeClass")?;
        let class: BridgeClass = class_name.parse()?;

        if class == BridgeClass::SuperwallBridge {
            self.register_facade(id);
        } else {
            self.context.registry.create_instance_with_id(id, class)?;
        }
        Ok(serde_json::Value::Null)
    }

    fn invalidate_bridge_instance(&self, call: &MethodCall) -> Result<serde_json::Value> {
        let id: BridgeId = call.require("bridgeId")?;
        if id == self.superwall_id {
            warn!("host released the facade bridge");
        }
        Ok(serde_json::Value::Bool(self.context.registry.invalidate(&id)))
    }

    /// Release every bridge and cancel suspended calls. Idempotent.
    pub fn teardown(&self) {
        if self.lifecycle() == Lifecycle::TornDown {
            return;
        }
        self.context.tear_down();
        let released = self.context.registry.len();
        self.context.registry.clear();
        info!(released, "bridge host torn down");
    }
}

impl Drop for BridgeHost {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};
    use superwall_core::types::SubscriptionStatus;

    use super::*;
    use crate::method::Arguments;
    use crate::stub::{InMemorySdk, RecordingMessenger};

    fn make_host() -> (BridgeHost, Arc<InMemorySdk>, Arc<RecordingMessenger>) {
        let sdk = Arc::new(InMemorySdk::new());
        let messenger = Arc::new(RecordingMessenger::new());
        let host = BridgeHost::new(sdk.clone(), messenger.clone(), BridgeConfig::default());
        (host, sdk, messenger)
    }

    fn call(method: &str, args: Value) -> MethodCall {
        MethodCall::new(method, Arguments::from_value(args))
    }

    fn create(host: &BridgeHost, id: &str, class: &str) -> Response {
        host.invoke_creator(&call(
            "createBridgeInstance",
            json!({"bridgeId": id, "bridgeClass": class}),
        ))
    }

    fn release(host: &BridgeHost, id: &str) -> Response {
        host.invoke_creator(&call("invalidateBridgeInstance", json!({ "bridgeId": id })))
    }

    async fn read_status(host: &BridgeHost) -> (BridgeId, Response) {
        let id = host
            .invoke(
                host.superwall_bridge_id(),
                MethodCall::bare("getSubscriptionStatusBridgeId"),
            )
            .await;
        let id = BridgeId::from(id.as_value().unwrap().as_str().unwrap());
        let description = host.invoke(&id, MethodCall::bare("getDescription")).await;
        (id, description)
    }

    #[tokio::test]
    async fn status_id_describes_current_status() {
        let (host, sdk, _) = make_host();
        for status in SubscriptionStatus::ALL {
            sdk.set_subscription_status(status);
            let (_, description) = read_status(&host).await;
            assert_eq!(description, Response::Value(json!(status.description())));
        }
    }

    #[tokio::test]
    async fn set_then_read_subscription_status() {
        let (host, _, _) = make_host();
        let active = host.registry().status_bridge_id(SubscriptionStatus::Active);
        let response = host
            .invoke(
                host.superwall_bridge_id(),
                call(
                    "setSubscriptionStatus",
                    json!({ "subscriptionStatusBridgeId": active.as_str() }),
                ),
            )
            .await;
        assert_eq!(response, Response::null());
        let (_, description) = read_status(&host).await;
        assert_eq!(description, Response::Value(json!("ACTIVE")));
    }

    #[tokio::test]
    async fn shared_status_id_survives_one_release() {
        let (host, _, _) = make_host();
        let (a, _) = read_status(&host).await;
        let (b, _) = read_status(&host).await;
        assert_eq!(a, b);

        assert_eq!(release(&host, a.as_str()), Response::Value(json!(true)));
        let still_held = host.invoke(&b, MethodCall::bare("getDescription")).await;
        assert_eq!(still_held, Response::Value(json!("UNKNOWN")));

        assert_eq!(release(&host, b.as_str()), Response::Value(json!(true)));
        let gone = host.invoke(&b, MethodCall::bare("getDescription")).await;
        assert_eq!(gone.error_code(), Some("NOT_FOUND"));
    }

    #[tokio::test]
    async fn unknown_bridge_id_is_not_found() {
        let (host, _, _) = make_host();
        let response = host
            .invoke(&BridgeId::from("missing"), MethodCall::bare("getDescription"))
            .await;
        assert_eq!(response.error_code(), Some("NOT_FOUND"));
    }

    #[tokio::test]
    async fn creator_builds_and_releases_proxies() {
        let (host, _, messenger) = make_host();
        assert_eq!(create(&host, "block-1", "CompletionBlockProxyBridge"), Response::null());
        assert!(host.registry().contains(&BridgeId::from("block-1")));

        let response = host
            .invoke(
                host.superwall_bridge_id(),
                call(
                    "registerEvent",
                    json!({"event": "open_settings", "featureBlockProxyBridgeId": "block-1"}),
                ),
            )
            .await;
        assert_eq!(response, Response::null());
        assert_eq!(messenger.notified_methods(), vec!["callCompletionBlock".to_owned()]);

        assert_eq!(release(&host, "block-1"), Response::Value(json!(true)));
        assert_eq!(release(&host, "block-1"), Response::Value(json!(false)));
    }

    #[tokio::test]
    async fn creator_rejects_bad_requests() {
        let (host, _, _) = make_host();
        assert_eq!(create(&host, "x", "NoSuchBridge").error_code(), Some("BAD_ARGS"));
        assert_eq!(
            host.invoke_creator(&call(
                "createBridgeInstance",
                json!({ "bridgeClass": "CompletionBlockProxyBridge" }),
            ))
            .error_code(),
            Some("BAD_ARGS")
        );
        assert_eq!(
            host.invoke_creator(&MethodCall::bare("listBridges")),
            Response::NotImplemented
        );
    }

    #[tokio::test]
    async fn creator_can_alias_the_facade() {
        let (host, sdk, _) = make_host();
        assert_eq!(create(&host, "superwall-host", "SuperwallBridge"), Response::null());
        host.invoke(
            &BridgeId::from("superwall-host"),
            call("identify", json!({"userId": "from-alias"})),
        )
        .await;
        assert_eq!(sdk.user_id(), "from-alias");
    }

    #[tokio::test]
    async fn teardown_rejects_further_calls() {
        let (host, _, _) = make_host();
        assert_eq!(host.lifecycle(), Lifecycle::Initialized);
        host.invoke(host.superwall_bridge_id(), call("configure", json!({"apiKey": "k"})))
            .await;
        assert_eq!(host.lifecycle(), Lifecycle::Ready);

        host.teardown();
        assert_eq!(host.lifecycle(), Lifecycle::TornDown);
        assert!(host.registry().is_empty());
        assert!(host.context().shutdown_token().is_cancelled());

        let response = host
            .invoke(host.superwall_bridge_id(), MethodCall::bare("getUserId"))
            .await;
        assert_eq!(response.error_code(), Some("TORN_DOWN"));
        assert_eq!(
            create(&host, "late", "CompletionBlockProxyBridge").error_code(),
            Some("TORN_DOWN")
        );
    }

    #[tokio::test]
    async fn concurrent_dispatch_shares_the_registry() {
        let (host, _, _) = make_host();
        let host = Arc::new(host);
        let mut tasks = tokio::task::JoinSet::new();
        for n in 0..16 {
            let host = Arc::clone(&host);
            tasks.spawn(async move {
                let id = format!("handler-{n}");
                create(&host, &id, "PaywallPresentationHandlerProxyBridge");
                host.invoke(
                    host.superwall_bridge_id(),
                    MethodCall::bare("getSubscriptionStatusBridgeId"),
                )
                .await
            });
        }
        while let Some(joined) = tasks.join_next().await {
            assert!(!joined.unwrap().is_error());
        }
        // 16 handlers, one reused status bridge, the facade.
        assert_eq!(host.registry().len(), 18);
    }
}
