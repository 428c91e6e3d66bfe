//! Live-update subscriptions for the related records of a fetched record.

use crate::config::{BlueprintConfig, RelationConfig, RelationKind};
use crate::error::AppError;
use crate::request::{effective_auto_watch, RequestContext};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// A model handle of the live-update service.
pub trait LiveModel: Send + Sync {
    fn identity(&self) -> &str;

    /// Field holding the primary-key value of an instance.
    fn primary_key(&self) -> &str;

    /// Collection-level subscription: be told about any created instance.
    fn watch(&self, req: &dyn RequestContext) -> Result<(), AppError>;

    fn subscribe(&self, req: &dyn RequestContext, keys: &[Value]) -> Result<(), AppError>;
}

/// Maps model identities to live-update handles.
pub trait ModelRegistry {
    fn model(&self, identity: &str) -> Option<Arc<dyn LiveModel>>;
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SubscriptionTarget {
    pub model: String,
    pub key: Value,
}

/// What [`SubscriptionResolver::subscribe`] would register for a record.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SubscriptionPlan {
    /// Identities watched at collection level, one per relation, in declaration order.
    pub watch: Vec<String>,
    pub targets: Vec<SubscriptionTarget>,
}

struct RelationSubscription {
    model: Arc<dyn LiveModel>,
    keys: Vec<Value>,
}

pub struct SubscriptionResolver<'a> {
    config: &'a BlueprintConfig,
}

impl<'a> SubscriptionResolver<'a> {
    pub fn new(config: &'a BlueprintConfig) -> Self {
        SubscriptionResolver { config }
    }

    /// Resolve targets without registering anything.
    pub fn plan(
        &self,
        req: &dyn RequestContext,
        record: &Value,
        registry: &dyn ModelRegistry,
    ) -> Result<SubscriptionPlan, AppError> {
        self.run(req, record, registry, false)
    }

    /// Watch related models (when auto-watch is on) and subscribe to every related instance present in `record`.
    /// Returns what was registered.
    pub fn subscribe(
        &self,
        req: &dyn RequestContext,
        record: &Value,
        registry: &dyn ModelRegistry,
    ) -> Result<SubscriptionPlan, AppError> {
        self.run(req, record, registry, true)
    }

    fn run(
        &self,
        req: &dyn RequestContext,
        record: &Value,
        registry: &dyn ModelRegistry,
        register: bool,
    ) -> Result<SubscriptionPlan, AppError> {
        let auto_watch = effective_auto_watch(req.options(), self.config);
        let mut plan = SubscriptionPlan::default();
        for sub in collect(&req.options().relations, record, registry)? {
            let identity = sub.model.identity().to_string();
            if auto_watch {
                if register {
                    sub.model.watch(req)?;
                }
                plan.watch.push(identity.clone());
            }
            if register {
                for key in &sub.keys {
                    sub.model.subscribe(req, std::slice::from_ref(key))?;
                }
                tracing::debug!(model = %identity, count = sub.keys.len(), "subscribed to related records");
            }
            plan.targets.extend(sub.keys.into_iter().map(|key| SubscriptionTarget {
                model: identity.clone(),
                key,
            }));
        }
        Ok(plan)
    }
}

fn collect(
    relations: &[RelationConfig],
    record: &Value,
    registry: &dyn ModelRegistry,
) -> Result<Vec<RelationSubscription>, AppError> {
    let mut out = Vec::with_capacity(relations.len());
    for relation in relations {
        let identity = relation.kind.identity();
        let model = registry
            .model(identity)
            .ok_or_else(|| AppError::MissingEntityType(identity.to_string(), relation.alias.clone()))?;
        let pk = model.primary_key().to_string();
        let keys = match (&relation.kind, record.get(&relation.alias)) {
            (RelationKind::Collection { .. }, Some(Value::Array(items))) => {
                items.iter().filter_map(|item| instance_key(item, &pk)).collect()
            }
            (RelationKind::Collection { .. }, _) => Vec::new(),
            (RelationKind::Model { .. }, Some(item)) => instance_key(item, &pk).into_iter().collect(),
            (RelationKind::Model { .. }, None) => Vec::new(),
        };
        out.push(RelationSubscription { model, keys });
    }
    Ok(out)
}

/// Primary-key value of a populated instance. Bare foreign keys and nulls yield nothing.
fn instance_key(item: &Value, pk: &str) -> Option<Value> {
    match item.get(pk) {
        Some(Value::Null) | None => None,
        Some(key) => Some(key.clone()),
    }
}
