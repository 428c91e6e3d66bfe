//! Shared application state for blueprint routes.

use crate::config::ResolvedModel;
use crate::live::MemoryRegistry;
use crate::subscribe::ModelRegistry;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub model: Arc<ResolvedModel>,
    /// Live-update service used for subscriptions.
    pub registry: Arc<dyn ModelRegistry + Send + Sync>,
}

impl AppState {
    pub fn new(model: ResolvedModel, registry: Arc<dyn ModelRegistry + Send + Sync>) -> Self {
        AppState {
            model: Arc::new(model),
            registry,
        }
    }

    /// State backed by an in-process registry with one live model per route.
    pub fn in_memory(model: ResolvedModel) -> Self {
        let registry = Arc::new(MemoryRegistry::from_model(&model));
        Self::new(model, registry)
    }
}
