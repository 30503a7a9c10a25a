// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Superwall facade bridge: the dispatch surface for the SDK's top-level
// service.
//
// Each method name maps to one SDK call. Required arguments that are missing
// or mistyped answer BAD_ARGS. The lenient setters (`setLogLevel`,
// `setIsConfigured`, `togglePaywallSpinner`, `preloadPaywallsForEvents`)
// instead answer null on malformed input and log it at debug.

use std::collections::HashSet;
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, warn};
use url::Url;

use superwall_core::error::{BridgeError, Result};
use superwall_core::types::{BridgeClass, BridgeId, IdentityOptions, LogLevel, SuperwallOptions};

use crate::instance::{BridgeContext, BridgeInstance, FromBridgeObject};
use crate::method::{MethodCall, Response};
use crate::proxies::{
    CompletionBlockProxyBridge, PaywallPresentationHandlerProxyBridge,
    PurchaseControllerProxyBridge, SuperwallDelegateProxyBridge,
};
use crate::registry::BridgeRegistry;
use crate::sdk::{
    FeatureBlock, PaywallPresentationHandler, PurchaseController, SuperwallDelegate, SuperwallSdk,
};
use crate::subscription_status::SubscriptionStatusBridge;

pub struct SuperwallBridge {
    sdk: Arc<dyn SuperwallSdk>,
}

impl SuperwallBridge {
    pub fn new(sdk: Arc<dyn SuperwallSdk>) -> Self {
        Self { sdk }
    }

    pub fn sdk(&self) -> &Arc<dyn SuperwallSdk> {
        &self.sdk
    }

    fn set_delegate(&self, ctx: &BridgeContext, call: &MethodCall) -> Result<Value> {
        let delegate: Arc<SuperwallDelegateProxyBridge> =
            required_bridge(ctx, call, "delegateProxyBridgeId")?;
        self.sdk
            .set_delegate(Some(delegate as Arc<dyn SuperwallDelegate>));
        Ok(Value::Null)
    }

    fn set_log_level(&self, call: &MethodCall) -> Result<Value> {
        match call.arguments.get::<i64>("logLevel").and_then(LogLevel::from_raw) {
            Some(level) => self.sdk.set_log_level(level),
            None => debug!(
                raw = ?call.arguments.raw("logLevel"),
                "ignoring unrecognised log level"
            ),
        }
        Ok(Value::Null)
    }

    fn set_user_attributes(&self, call: &MethodCall) -> Result<Value> {
        let attributes: Map<String, Value> = call.require("userAttributes")?;
        self.sdk.set_user_attributes(attributes);
        Ok(Value::Null)
    }

    fn set_subscription_status(&self, ctx: &BridgeContext, call: &MethodCall) -> Result<Value> {
        let bridge: SubscriptionStatusBridge =
            required_bridge(ctx, call, "subscriptionStatusBridgeId")?;
        self.sdk.set_subscription_status(bridge.status());
        Ok(Value::Null)
    }

    fn set_is_configured(&self, call: &MethodCall) -> Result<Value> {
        match call.arguments.get::<bool>("configured") {
            Some(configured) => self.sdk.set_is_configured(configured),
            None => debug!("ignoring setIsConfigured without a boolean `configured`"),
        }
        Ok(Value::Null)
    }

    fn preload_paywalls_for_events(&self, call: &MethodCall) -> Result<Value> {
        match call.arguments.get::<Vec<String>>("eventNames") {
            Some(names) => self.sdk.preload_paywalls(names.into_iter().collect::<HashSet<_>>()),
            None => debug!("ignoring preloadPaywallsForEvents without a string list `eventNames`"),
        }
        Ok(Value::Null)
    }

    fn handle_deep_link(&self, call: &MethodCall) -> Result<Value> {
        let raw = call.arguments.get::<String>("url");
        let url = raw
            .as_deref()
            .and_then(|s| Url::parse(s).ok())
            .ok_or_else(|| BridgeError::InvalidUrl(raw.clone().unwrap_or_default()))?;
        Ok(Value::Bool(self.sdk.handle_deep_link(&url)))
    }

    fn toggle_paywall_spinner(&self, call: &MethodCall) -> Result<Value> {
        match call.arguments.get::<bool>("isHidden") {
            Some(is_hidden) => self.sdk.toggle_paywall_spinner(is_hidden),
            None => debug!("ignoring togglePaywallSpinner without a boolean `isHidden`"),
        }
        Ok(Value::Null)
    }

    /// Always answers null: the host keeps using its own facade object rather
    /// than anything returned by the native configure.
    fn configure(&self, ctx: &BridgeContext, call: &MethodCall) -> Result<Value> {
        let api_key: String = call.require("apiKey")?;

        let purchase_controller = optional_bridge::<Arc<PurchaseControllerProxyBridge>>(
            ctx,
            call,
            "purchaseControllerProxyBridgeId",
        )
        .map(|controller| controller as Arc<dyn PurchaseController>);

        let options = call.arguments.raw("options").and_then(|raw| {
            serde_json::from_value::<SuperwallOptions>(raw.clone())
                .map_err(|err| warn!(%err, "ignoring malformed configure options"))
                .ok()
        });

        self.sdk.configure(&api_key, purchase_controller, options);
        ctx.mark_ready();
        Ok(Value::Null)
    }

    /// Outstanding until the SDK finishes dismissing. Bounded by the
    /// configured timeout (if any) and by host teardown.
    async fn dismiss(&self, ctx: &BridgeContext) -> Result<Value> {
        let dismissal = self.sdk.dismiss();
        let bounded = async {
            match ctx.config.dismiss_timeout() {
                Some(limit) => tokio::time::timeout(limit, dismissal)
                    .await
                    .map_err(|_| BridgeError::Timeout(limit)),
                None => {
                    dismissal.await;
                    Ok(())
                }
            }
        };

        tokio::select! {
            outcome = bounded => outcome.map(|()| Value::Null),
            _ = ctx.shutdown_token().cancelled() => Err(BridgeError::Cancelled),
        }
    }

    fn register_event(&self, ctx: &BridgeContext, call: &MethodCall) -> Result<Value> {
        let event: String = call.require("event")?;
        let params: Option<Map<String, Value>> = call.arguments.get("params");

        let handler = optional_bridge::<Arc<PaywallPresentationHandlerProxyBridge>>(
            ctx,
            call,
            "handlerProxyBridgeId",
        )
        .map(|handler| handler as Arc<dyn PaywallPresentationHandler>);

        // Resolved when the feature fires, not now: the host may swap the
        // block's registration in between.
        let feature = call
            .arguments
            .bridge_id("featureBlockProxyBridgeId")
            .map(|id| feature_block(Arc::downgrade(&ctx.registry), id));

        self.sdk.register(&event, params, handler, feature);
        Ok(Value::Null)
    }

    fn identify(&self, call: &MethodCall) -> Result<Value> {
        let user_id: String = call.require("userId")?;
        let options = call
            .arguments
            .get::<bool>("restorePaywallAssignments")
            .map(|restore_paywall_assignments| IdentityOptions {
                restore_paywall_assignments,
            });
        self.sdk.identify(&user_id, options);
        Ok(Value::Null)
    }
}

fn feature_block(registry: Weak<BridgeRegistry>, id: BridgeId) -> FeatureBlock {
    Box::new(move || {
        let Some(registry) = registry.upgrade() else {
            return;
        };
        match registry.resolve::<Arc<CompletionBlockProxyBridge>>(&id) {
            Ok(block) => block.call_completion_block(),
            Err(err) => warn!(%err, "feature unlocked but its completion block is gone"),
        }
    })
}

/// Resolve a bridge id argument the call cannot proceed without.
fn required_bridge<T: FromBridgeObject>(
    ctx: &BridgeContext,
    call: &MethodCall,
    key: &str,
) -> Result<T> {
    let id = call
        .arguments
        .bridge_id(key)
        .ok_or_else(|| call.bad_args(format!("missing `{key}`")))?;
    ctx.registry
        .resolve(&id)
        .map_err(|err| {
            if err.is_resolution() {
                call.bad_args(format!("`{key}`: {err}"))
            } else {
                err
            }
        })
}

/// Resolve an optional bridge id argument; unresolvable ids count as absent.
fn optional_bridge<T: FromBridgeObject>(
    ctx: &BridgeContext,
    call: &MethodCall,
    key: &str,
) -> Option<T> {
    let id = call.arguments.bridge_id(key)?;
    ctx.registry
        .resolve(&id)
        .map_err(|err| warn!(method = %call.method, key, %err, "ignoring unresolvable bridge id"))
        .ok()
}

#[async_trait]
impl BridgeInstance for SuperwallBridge {
    fn bridge_class(&self) -> BridgeClass {
        BridgeClass::SuperwallBridge
    }

    async fn handle(&self, ctx: &BridgeContext, call: &MethodCall) -> Response {
        debug!(method = %call.method, "superwall bridge call");

        let outcome = match call.method.as_str() {
            "setDelegate" => self.set_delegate(ctx, call),
            "getLogLevel" => Ok(Value::from(self.sdk.log_level().raw_value())),
            "setLogLevel" => self.set_log_level(call),
            "getUserAttributes" => Ok(Value::Object(self.sdk.user_attributes())),
            "setUserAttributes" => self.set_user_attributes(call),
            "getUserId" => Ok(Value::String(self.sdk.user_id())),
            "getIsLoggedIn" => Ok(Value::Bool(self.sdk.is_logged_in())),
            "getPresentedViewController" => Ok(self
                .sdk
                .presented_view_controller()
                .map_or(Value::Null, Value::String)),
            // PaywallInfo has no host representation yet.
            "getLatestPaywallInfo" => {
                let _ = self.sdk.latest_paywall_info();
                Ok(Value::Null)
            }
            "getSubscriptionStatusBridgeId" => {
                let id = ctx.registry.status_bridge_id(self.sdk.subscription_status());
                Ok(Value::String(id.to_string()))
            }
            "setSubscriptionStatus" => self.set_subscription_status(ctx, call),
            "getIsConfigured" => Ok(Value::Bool(self.sdk.is_configured())),
            "setIsConfigured" => self.set_is_configured(call),
            "getIsPaywallPresented" => Ok(Value::Bool(self.sdk.is_paywall_presented())),
            "preloadAllPaywalls" => {
                self.sdk.preload_all_paywalls();
                Ok(Value::Null)
            }
            "preloadPaywallsForEvents" => self.preload_paywalls_for_events(call),
            "handleDeepLink" => self.handle_deep_link(call),
            "togglePaywallSpinner" => self.toggle_paywall_spinner(call),
            "reset" => {
                self.sdk.reset();
                Ok(Value::Null)
            }
            "configure" => self.configure(ctx, call),
            "dismiss" => self.dismiss(ctx).await,
            "registerEvent" => self.register_event(ctx, call),
            "identify" => self.identify(call),
            other => {
                if ctx.config.log_unhandled_methods {
                    warn!(method = other, "method not implemented");
                } else {
                    debug!(method = other, "method not implemented");
                }
                return Response::NotImplemented;
            }
        };

        if let Err(err) = &outcome {
            debug!(method = %call.method, code = err.code(), %err, "superwall bridge call failed");
        }
        outcome.into()
    }
}
