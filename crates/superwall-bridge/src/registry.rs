// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge instance registry: maps opaque ids to live bridge objects.
//
// Entries live until the host invalidates them or the registry is cleared on
// teardown. Natively minted ids embed a fresh UUID, so an id that has been
// released never resolves to a later instance.

use std::collections::HashMap;
use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak,
};

use tracing::{debug, instrument};

use superwall_core::error::{BridgeError, Result};
use superwall_core::types::{BridgeClass, BridgeId, SubscriptionStatus};

use crate::instance::{BridgeObject, FromBridgeObject};
use crate::messenger::HostMessenger;
use crate::proxies::{
    CompletionBlockProxyBridge, PaywallPresentationHandlerProxyBridge,
    PurchaseControllerProxyBridge, ProxyChannel, SuperwallDelegateProxyBridge,
};
use crate::subscription_status::SubscriptionStatusBridge;

/// Status ids handed out by [`BridgeRegistry::status_bridge_id`].
///
/// A reused id is shared by every caller it was handed to, so it stays
/// registered until each of them has released it.
#[derive(Default)]
struct StatusCache {
    /// Last id handed out per status variant.
    ids: HashMap<SubscriptionStatus, BridgeId>,
    /// Outstanding handouts per id.
    handouts: HashMap<BridgeId, usize>,
}

impl StatusCache {
    fn forget(&mut self, id: &BridgeId) {
        self.handouts.remove(id);
        self.ids.retain(|_, cached| cached != id);
    }
}

/// Store of every bridge instance reachable across the boundary.
///
/// Safe to share between concurrent dispatches; all access goes through
/// internal locks that are never held across an `.await`. When both are
/// needed the status cache is locked before the instance map.
pub struct BridgeRegistry {
    instances: RwLock<HashMap<BridgeId, BridgeObject>>,
    status_cache: Mutex<StatusCache>,
    reuse_status_bridges: bool,
    messenger: Arc<dyn HostMessenger>,
    this: Weak<BridgeRegistry>,
}

impl BridgeRegistry {
    /// Create an empty registry. Proxy bridges it creates deliver their
    /// callbacks through `messenger`.
    pub fn new(messenger: Arc<dyn HostMessenger>, reuse_status_bridges: bool) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            instances: RwLock::new(HashMap::new()),
            status_cache: Mutex::new(StatusCache::default()),
            reuse_status_bridges,
            messenger,
            this: this.clone(),
        })
    }

    /// Instantiate a bridge of `class` under a freshly minted id.
    pub fn create_instance(&self, class: BridgeClass) -> Result<BridgeId> {
        let id = BridgeId::new(class);
        self.create_instance_with_id(id.clone(), class)?;
        Ok(id)
    }

    /// Instantiate a bridge of `class` under a caller-chosen id, replacing any
    /// previous entry with that id.
    #[instrument(skip(self, id), fields(bridge_id = %id))]
    pub fn create_instance_with_id(&self, id: BridgeId, class: BridgeClass) -> Result<()> {
        let object = self.build(&id, class)?;
        self.insert(id, object);
        Ok(())
    }

    /// Register an already constructed object, replacing any previous entry
    /// (and its status handouts) under `id`.
    pub fn insert(&self, id: BridgeId, object: BridgeObject) {
        debug!(bridge_id = %id, class = %object.bridge_class(), "registering bridge instance");
        let mut cache = self.cache();
        cache.forget(&id);
        self.write().insert(id, object);
    }

    fn build(&self, id: &BridgeId, class: BridgeClass) -> Result<BridgeObject> {
        if let Some(status) = SubscriptionStatusBridge::from_class(class) {
            return Ok(BridgeObject::SubscriptionStatus(status));
        }

        let channel = ProxyChannel::new(id.clone(), Arc::clone(&self.messenger));
        let object = match class {
            BridgeClass::SuperwallDelegateProxyBridge => BridgeObject::SuperwallDelegateProxy(
                Arc::new(SuperwallDelegateProxyBridge::new(channel, self.this.clone())),
            ),
            BridgeClass::PurchaseControllerProxyBridge => BridgeObject::PurchaseControllerProxy(
                Arc::new(PurchaseControllerProxyBridge::new(channel)),
            ),
            BridgeClass::PaywallPresentationHandlerProxyBridge => {
                BridgeObject::PaywallPresentationHandlerProxy(Arc::new(
                    PaywallPresentationHandlerProxyBridge::new(channel),
                ))
            }
            BridgeClass::CompletionBlockProxyBridge => BridgeObject::CompletionBlockProxy(
                Arc::new(CompletionBlockProxyBridge::new(channel)),
            ),
            // The facade wraps the SDK service, which only the host owns.
            other => return Err(BridgeError::NotCreatable(other.to_string())),
        };
        Ok(object)
    }

    /// Look up `id` and extract the capability `T`.
    pub fn resolve<T: FromBridgeObject>(&self, id: &BridgeId) -> Result<T> {
        let instances = self.read();
        let object = instances
            .get(id)
            .ok_or_else(|| BridgeError::NotFound(id.clone()))?;
        T::from_object(object).ok_or_else(|| BridgeError::TypeMismatch {
            id: id.clone(),
            expected: T::CAPABILITY,
            found: object.bridge_class().to_string(),
        })
    }

    pub fn get(&self, id: &BridgeId) -> Option<BridgeObject> {
        self.read().get(id).cloned()
    }

    pub fn contains(&self, id: &BridgeId) -> bool {
        self.read().contains_key(id)
    }

    /// Id resolving to the bridge for `status`. Reuses the previously handed
    /// out id while it is still registered (when enabled), otherwise mints one.
    ///
    /// Every call counts as one handout; the id stays registered until it has
    /// been invalidated once per handout.
    pub fn status_bridge_id(&self, status: SubscriptionStatus) -> BridgeId {
        let mut cache = self.cache();
        let mut instances = self.write();

        if self.reuse_status_bridges {
            if let Some(id) = cache.ids.get(&status).cloned() {
                if instances.contains_key(&id) {
                    *cache.handouts.entry(id.clone()).or_insert(0) += 1;
                    return id;
                }
                cache.forget(&id);
            }
        }

        let bridge = SubscriptionStatusBridge::new(status);
        let id = BridgeId::new(bridge.class());
        debug!(bridge_id = %id, %status, "minting status bridge");
        instances.insert(id.clone(), BridgeObject::SubscriptionStatus(bridge));
        cache.ids.insert(status, id.clone());
        cache.handouts.insert(id.clone(), 1);
        id
    }

    /// Release `id`. Returns whether the caller held it.
    ///
    /// A status id with other outstanding handouts stays registered.
    pub fn invalidate(&self, id: &BridgeId) -> bool {
        let mut cache = self.cache();
        let mut instances = self.write();
        if !instances.contains_key(id) {
            debug!(bridge_id = %id, "invalidating unknown bridge instance");
            return false;
        }

        if let Some(count) = cache.handouts.get_mut(id) {
            if *count > 1 {
                *count -= 1;
                debug!(bridge_id = %id, remaining = *count, "releasing shared status bridge");
                return true;
            }
        }
        cache.forget(id);
        instances.remove(id);
        debug!(bridge_id = %id, "invalidated bridge instance");
        true
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let mut cache = self.cache();
        *cache = StatusCache::default();
        self.write().clear();
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn cache(&self) -> MutexGuard<'_, StatusCache> {
        self.status_cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<BridgeId, BridgeObject>> {
        self.instances.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<BridgeId, BridgeObject>> {
        self.instances.write().unwrap_or_else(PoisonError::into_inner)
    }
}
