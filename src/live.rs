//! In-process live-update registry. Records watches and subscriptions; useful for
//! tests and for single-node deployments that fan out through their own transport.

use crate::config::ResolvedModel;
use crate::error::AppError;
use crate::request::RequestContext;
use crate::subscribe::{LiveModel, ModelRegistry};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

pub struct MemoryLiveModel {
    identity: String,
    primary_key: String,
    watchers: RwLock<u64>,
    subscriptions: RwLock<Vec<Value>>,
}

impl MemoryLiveModel {
    pub fn new(identity: &str, primary_key: &str) -> Self {
        MemoryLiveModel {
            identity: identity.to_string(),
            primary_key: primary_key.to_string(),
            watchers: RwLock::new(0),
            subscriptions: RwLock::new(Vec::new()),
        }
    }

    pub fn watch_count(&self) -> u64 {
        self.watchers.read().map(|n| *n).unwrap_or(0)
    }

    /// Keys subscribed so far, in registration order.
    pub fn subscribed_keys(&self) -> Vec<Value> {
        self.subscriptions.read().map(|s| s.clone()).unwrap_or_default()
    }
}

impl LiveModel for MemoryLiveModel {
    fn identity(&self) -> &str {
        &self.identity
    }

    fn primary_key(&self) -> &str {
        &self.primary_key
    }

    fn watch(&self, _req: &dyn RequestContext) -> Result<(), AppError> {
        let mut n = self
            .watchers
            .write()
            .map_err(|_| AppError::Internal("watch lock poisoned".into()))?;
        *n += 1;
        Ok(())
    }

    fn subscribe(&self, _req: &dyn RequestContext, keys: &[Value]) -> Result<(), AppError> {
        let mut subs = self
            .subscriptions
            .write()
            .map_err(|_| AppError::Internal("subscription lock poisoned".into()))?;
        subs.extend(keys.iter().cloned());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryRegistry {
    models: HashMap<String, Arc<MemoryLiveModel>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// One live model per configured route, keyed by its model identity.
    pub fn from_model(model: &ResolvedModel) -> Self {
        let mut registry = Self::new();
        for route in model.routes() {
            registry.register(MemoryLiveModel::new(&route.model, &route.primary_key));
        }
        registry
    }

    pub fn register(&mut self, model: MemoryLiveModel) {
        self.models.insert(model.identity.clone(), Arc::new(model));
    }

    pub fn get(&self, identity: &str) -> Option<Arc<MemoryLiveModel>> {
        self.models.get(identity).cloned()
    }
}

impl ModelRegistry for MemoryRegistry {
    fn model(&self, identity: &str) -> Option<Arc<dyn LiveModel>> {
        self.models.get(identity).map(|m| m.clone() as Arc<dyn LiveModel>)
    }
}
