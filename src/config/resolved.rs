//! Resolved blueprint model: config validated and indexed for runtime use.

use crate::config::{BlueprintConfig, RouteOptions};
use crate::criteria::Blacklist;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct ResolvedRoute {
    pub model: String,
    pub primary_key: String,
    /// Shared by every request on this route; resolvers never mutate it.
    pub options: Arc<RouteOptions>,
    /// Blacklist with relation override names, precomputed at load time.
    pub blacklist: Blacklist,
}

#[derive(Clone, Debug)]
pub struct ResolvedModel {
    pub blueprints: Arc<BlueprintConfig>,
    pub routes: Vec<ResolvedRoute>,
    pub route_by_model: HashMap<String, ResolvedRoute>,
}

impl ResolvedModel {
    pub fn route(&self, model: &str) -> Option<&ResolvedRoute> {
        self.route_by_model.get(model)
    }

    pub fn routes(&self) -> &[ResolvedRoute] {
        &self.routes
    }
}
