//! Raw config types matching the blueprint JSON files (blueprints.json + routes.json).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fallback population limit when nothing else supplies one.
pub const DEFAULT_POPULATE_LIMIT: u32 = 30;

/// How a requested `populate` name is matched against a relation alias.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AliasMatch {
    /// Requested name contains the alias as a literal substring.
    #[default]
    Literal,
    /// Alias is compiled as a regular expression and searched for in the requested name.
    Regex,
}

/// Global blueprint defaults shared by every route.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlueprintConfig {
    #[serde(default = "default_limit")]
    pub default_limit: u32,
    #[serde(default = "default_true")]
    pub populate: bool,
    #[serde(default)]
    pub auto_watch: bool,
    #[serde(default)]
    pub jsonp: JsonpSetting,
    #[serde(default)]
    pub alias_match: AliasMatch,
    /// Reject a `where` parameter that is not valid JSON instead of ignoring it.
    #[serde(default)]
    pub strict_where: bool,
}

impl Default for BlueprintConfig {
    fn default() -> Self {
        BlueprintConfig {
            default_limit: DEFAULT_POPULATE_LIMIT,
            populate: true,
            auto_watch: false,
            jsonp: JsonpSetting::default(),
            alias_match: AliasMatch::default(),
            strict_where: false,
        }
    }
}

fn default_limit() -> u32 {
    DEFAULT_POPULATE_LIMIT
}

fn default_true() -> bool {
    true
}

/// JSONP may be switched on with `true` or with a custom callback parameter name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonpSetting {
    Enabled(bool),
    Custom { callback: String },
}

impl Default for JsonpSetting {
    fn default() -> Self {
        JsonpSetting::Enabled(false)
    }
}

impl JsonpSetting {
    pub const DEFAULT_CALLBACK: &'static str = "callback";

    /// Name of the callback parameter when JSONP is on.
    pub fn callback_param(&self) -> Option<&str> {
        match self {
            JsonpSetting::Enabled(true) => Some(Self::DEFAULT_CALLBACK),
            JsonpSetting::Enabled(false) => None,
            JsonpSetting::Custom { callback } => Some(callback.as_str()),
        }
    }
}

/// Relation kind, tagged by `type`; the sibling key of the same name holds the target model identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RelationKind {
    /// To-one.
    Model { model: String },
    /// To-many.
    Collection { collection: String },
}

impl RelationKind {
    /// Identity of the related model, used for registry lookup.
    pub fn identity(&self) -> &str {
        match self {
            RelationKind::Model { model } => model,
            RelationKind::Collection { collection } => collection,
        }
    }
}

/// A declared association, e.g. `{ "alias": "owner", "type": "model", "model": "user" }`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationConfig {
    pub alias: String,
    #[serde(flatten)]
    pub kind: RelationKind,
    #[serde(default)]
    pub limit: Option<u32>,
}

impl RelationConfig {
    pub fn model(alias: &str, model: &str) -> Self {
        RelationConfig {
            alias: alias.to_string(),
            kind: RelationKind::Model { model: model.to_string() },
            limit: None,
        }
    }

    pub fn collection(alias: &str, collection: &str) -> Self {
        RelationConfig {
            alias: alias.to_string(),
            kind: RelationKind::Collection { collection: collection.to_string() },
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// First dot-segment of the alias; parameter names are derived from it.
    pub fn real_alias(&self) -> &str {
        real_alias(&self.alias)
    }
}

pub(crate) fn real_alias(alias: &str) -> &str {
    alias.split('.').next().unwrap_or(alias)
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CriteriaOptions {
    /// Kept as raw JSON so a malformed override surfaces as a config error rather than a parse failure.
    #[serde(default)]
    pub blacklist: Option<Value>,
}

/// Per-route options. Unset values fall back to [`BlueprintConfig`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RouteOptions {
    #[serde(default)]
    pub relations: Vec<RelationConfig>,
    #[serde(default)]
    pub criteria: CriteriaOptions,
    #[serde(default)]
    pub populate: Option<bool>,
    #[serde(default)]
    pub auto_watch: Option<bool>,
    #[serde(default)]
    pub jsonp: Option<JsonpSetting>,
    /// Preset filter; request-derived values win on conflict.
    #[serde(default, rename = "where")]
    pub where_: Option<Map<String, Value>>,
}

impl RouteOptions {
    pub fn with_relations(relations: Vec<RelationConfig>) -> Self {
        RouteOptions {
            relations,
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Model identity served by this route (also its path segment).
    pub model: String,
    #[serde(default = "default_primary_key")]
    pub primary_key: String,
    #[serde(flatten)]
    pub options: RouteOptions,
}

fn default_primary_key() -> String {
    "id".into()
}

/// All config in one struct for in-memory loading.
#[derive(Clone, Debug, Default)]
pub struct FullConfig {
    pub blueprints: BlueprintConfig,
    pub routes: Vec<RouteConfig>,
}
