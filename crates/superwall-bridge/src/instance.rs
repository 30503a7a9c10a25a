// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge objects, the dispatch trait they share, and the context every
// dispatch runs in.

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::info;

use superwall_core::config::BridgeConfig;
use superwall_core::types::BridgeClass;

use crate::method::{MethodCall, Response};
use crate::proxies::{
    CompletionBlockProxyBridge, PaywallPresentationHandlerProxyBridge,
    PurchaseControllerProxyBridge, SuperwallDelegateProxyBridge,
};
use crate::registry::BridgeRegistry;
use crate::subscription_status::SubscriptionStatusBridge;
use crate::superwall::SuperwallBridge;

/// An object reachable across the boundary through a name-keyed entry point.
#[async_trait]
pub trait BridgeInstance: Send + Sync {
    fn bridge_class(&self) -> BridgeClass;

    /// Produce exactly one response for `call`.
    async fn handle(&self, ctx: &BridgeContext, call: &MethodCall) -> Response;
}

/// Closed set of everything the registry can hold.
#[derive(Clone)]
pub enum BridgeObject {
    Superwall(Arc<SuperwallBridge>),
    SubscriptionStatus(SubscriptionStatusBridge),
    SuperwallDelegateProxy(Arc<SuperwallDelegateProxyBridge>),
    PurchaseControllerProxy(Arc<PurchaseControllerProxyBridge>),
    PaywallPresentationHandlerProxy(Arc<PaywallPresentationHandlerProxyBridge>),
    CompletionBlockProxy(Arc<CompletionBlockProxyBridge>),
}

impl BridgeObject {
    fn instance(&self) -> &dyn BridgeInstance {
        match self {
            Self::Superwall(bridge) => &**bridge,
            Self::SubscriptionStatus(bridge) => bridge,
            Self::SuperwallDelegateProxy(bridge) => &**bridge,
            Self::PurchaseControllerProxy(bridge) => &**bridge,
            Self::PaywallPresentationHandlerProxy(bridge) => &**bridge,
            Self::CompletionBlockProxy(bridge) => &**bridge,
        }
    }

    pub fn bridge_class(&self) -> BridgeClass {
        self.instance().bridge_class()
    }

    pub async fn handle(&self, ctx: &BridgeContext, call: &MethodCall) -> Response {
        self.instance().handle(ctx, call).await
    }
}

impl std::fmt::Debug for BridgeObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("BridgeObject").field(&self.bridge_class()).finish()
    }
}

/// A capability the registry can hand back from a stored object.
pub trait FromBridgeObject: Sized {
    /// Name used in type-mismatch errors.
    const CAPABILITY: &'static str;

    fn from_object(object: &BridgeObject) -> Option<Self>;
}

impl FromBridgeObject for BridgeObject {
    const CAPABILITY: &'static str = "BridgeInstance";

    fn from_object(object: &BridgeObject) -> Option<Self> {
        Some(object.clone())
    }
}

macro_rules! capability {
    ($ty:ty, $variant:ident, $name:literal) => {
        impl FromBridgeObject for $ty {
            const CAPABILITY: &'static str = $name;

            fn from_object(object: &BridgeObject) -> Option<Self> {
                match object {
                    BridgeObject::$variant(inner) => Some(inner.clone()),
                    _ => None,
                }
            }
        }
    };
}

capability!(Arc<SuperwallBridge>, Superwall, "SuperwallBridge");
capability!(SubscriptionStatusBridge, SubscriptionStatus, "SubscriptionStatusBridge");
capability!(Arc<SuperwallDelegateProxyBridge>, SuperwallDelegateProxy, "SuperwallDelegate");
capability!(Arc<PurchaseControllerProxyBridge>, PurchaseControllerProxy, "PurchaseController");
capability!(
    Arc<PaywallPresentationHandlerProxyBridge>,
    PaywallPresentationHandlerProxy,
    "PaywallPresentationHandler"
);
capability!(Arc<CompletionBlockProxyBridge>, CompletionBlockProxy, "CompletionBlock");

/// Host lifecycle: `Initialized -> Ready -> TornDown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Bridges are live, the SDK has not been configured yet.
    Initialized,
    /// `configure` has been dispatched.
    Ready,
    /// The host released every bridge; nothing further is dispatched.
    TornDown,
}

/// Shared state handed to every dispatch. Cheap to clone.
#[derive(Clone)]
pub struct BridgeContext {
    pub registry: Arc<BridgeRegistry>,
    pub config: Arc<BridgeConfig>,
    shutdown: CancellationToken,
    lifecycle: Arc<RwLock<Lifecycle>>,
}

impl BridgeContext {
    pub fn new(registry: Arc<BridgeRegistry>, config: BridgeConfig) -> Self {
        Self {
            registry,
            config: Arc::new(config),
            shutdown: CancellationToken::new(),
            lifecycle: Arc::new(RwLock::new(Lifecycle::Initialized)),
        }
    }

    /// Cancelled when the host tears down; suspended calls watch it.
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    pub fn lifecycle(&self) -> Lifecycle {
        *self.lifecycle.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn mark_ready(&self) {
        let mut state = self.lifecycle.write().unwrap_or_else(PoisonError::into_inner);
        if *state == Lifecycle::Initialized {
            *state = Lifecycle::Ready;
            info!("bridge host ready");
        }
    }

    pub(crate) fn tear_down(&self) {
        *self.lifecycle.write().unwrap_or_else(PoisonError::into_inner) = Lifecycle::TornDown;
        self.shutdown.cancel();
    }
}
