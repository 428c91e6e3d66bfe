//! Criteria (WHERE clause) derivation from request parameters.

use crate::config::{BlueprintConfig, RelationConfig};
use crate::error::{AppError, ConfigError};
use crate::json::JsonParam;
use crate::request::RequestContext;
use serde_json::{Map, Value};

/// Filter predicate handed to the query layer.
pub type WhereClause = Map<String, Value>;

/// Parameters never used as criteria unless a route overrides the list.
pub const DEFAULT_BLACKLIST: [&str; 4] = ["limit", "skip", "sort", "populate"];

/// Name of the per-relation population options parameter.
pub fn populate_param(real_alias: &str) -> String {
    format!("populate_{}", real_alias)
}

/// Ordered set of parameter names excluded from criteria. Built once per request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blacklist {
    names: Vec<String>,
}

impl Default for Blacklist {
    fn default() -> Self {
        Blacklist {
            names: DEFAULT_BLACKLIST.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Blacklist {
    /// Route override if set (must be an array of strings), else the default list.
    pub fn from_override(raw: Option<&Value>) -> Result<Self, ConfigError> {
        let items = match raw {
            None | Some(Value::Null) => return Ok(Self::default()),
            Some(Value::Array(items)) => items,
            Some(other) => return Err(ConfigError::InvalidBlacklist(json_kind(other))),
        };
        let mut list = Blacklist { names: Vec::with_capacity(items.len()) };
        for item in items {
            match item {
                Value::String(s) => list.insert(s),
                other => return Err(ConfigError::InvalidBlacklist(json_kind(other))),
            }
        }
        Ok(list)
    }

    /// Route blacklist extended with `populate_<realAlias>` for every declared relation.
    pub fn for_route(raw: Option<&Value>, relations: &[RelationConfig]) -> Result<Self, ConfigError> {
        Ok(Self::from_override(raw)?.with_relations(relations))
    }

    pub fn with_relations(mut self, relations: &[RelationConfig]) -> Self {
        for r in relations {
            self.insert(&populate_param(r.real_alias()));
        }
        self
    }

    fn insert(&mut self, name: &str) {
        if !self.contains(name) {
            self.names.push(name.to_string());
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Control parameter carrying an explicit filter. Never itself a criterion.
pub const WHERE_PARAM: &str = "where";

enum ExplicitWhere {
    /// No `where`, or one that failed to parse: derive criteria from the other parameters.
    Absent,
    Filter(WhereClause),
    /// Parsed, but not an object: only the route preset applies.
    Ignored,
}

pub struct CriteriaResolver<'a> {
    config: &'a BlueprintConfig,
}

impl<'a> CriteriaResolver<'a> {
    pub fn new(config: &'a BlueprintConfig) -> Self {
        CriteriaResolver { config }
    }

    /// Blacklist for this request's route.
    pub fn blacklist<R: RequestContext + ?Sized>(&self, req: &R) -> Result<Blacklist, ConfigError> {
        let options = req.options();
        Blacklist::for_route(options.criteria.blacklist.as_ref(), &options.relations)
    }

    /// Normalized WHERE clause, or `None` when no predicate remains.
    pub fn resolve<R: RequestContext + ?Sized>(&self, req: &R) -> Result<Option<WhereClause>, AppError> {
        let blacklist = self.blacklist(req)?;
        self.resolve_with(req, &blacklist)
    }

    /// Same as [`resolve`](Self::resolve) with a blacklist the caller already built.
    pub fn resolve_with<R: RequestContext + ?Sized>(
        &self,
        req: &R,
        blacklist: &Blacklist,
    ) -> Result<Option<WhereClause>, AppError> {
        let derived = match self.explicit_where(req)? {
            ExplicitWhere::Filter(w) => w,
            ExplicitWhere::Ignored => WhereClause::new(),
            ExplicitWhere::Absent => self.params_as_criteria(req, blacklist),
        };
        let mut merged = req.options().where_.clone().unwrap_or_default();
        deep_merge(&mut merged, derived);
        tracing::debug!(keys = ?merged.keys().collect::<Vec<_>>(), "resolved criteria");
        Ok(if merged.is_empty() { None } else { Some(merged) })
    }

    fn explicit_where<R: RequestContext + ?Sized>(&self, req: &R) -> Result<ExplicitWhere, AppError> {
        let raw = req.param(WHERE_PARAM);
        let value = match raw {
            Some(Value::String(_)) => match JsonParam::decode(raw) {
                JsonParam::Malformed(e) if self.config.strict_where => {
                    return Err(AppError::WhereClauseUnparseable(e.to_string()));
                }
                parsed => parsed.or_absent(WHERE_PARAM),
            },
            Some(other) => Some(other.clone()),
            None => None,
        };
        Ok(match value {
            Some(Value::Object(map)) => ExplicitWhere::Filter(map),
            Some(other) => {
                tracing::debug!(value = %other, "ignoring non-object `where` parameter");
                ExplicitWhere::Ignored
            }
            None => ExplicitWhere::Absent,
        })
    }

    fn params_as_criteria<R: RequestContext + ?Sized>(&self, req: &R, blacklist: &Blacklist) -> WhereClause {
        let jsonp = req.options().jsonp.as_ref().unwrap_or(&self.config.jsonp);
        let callback = if req.is_socket() { None } else { jsonp.callback_param() };
        req.params()
            .entries()
            .filter(|(name, _)| *name != WHERE_PARAM && !blacklist.contains(name) && Some(*name) != callback)
            .filter_map(|(name, value)| value.map(|v| (name.to_string(), v.clone())))
            .collect()
    }
}

/// Merge `src` over `dst`: nested objects merge key by key, anything else replaces.
pub fn deep_merge(dst: &mut Map<String, Value>, src: Map<String, Value>) {
    for (key, value) in src {
        match (dst.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => deep_merge(existing, incoming),
            (_, value) => {
                dst.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{JsonpSetting, RouteOptions};
    use crate::request::{BlueprintRequest, RequestParams};
    use serde_json::json;
    use std::sync::Arc;

    fn request(params: Value, options: RouteOptions) -> BlueprintRequest {
        let Value::Object(map) = params else { panic!("params must be an object") };
        BlueprintRequest::new(RequestParams::from(map), Arc::new(options))
    }

    fn resolve(req: &BlueprintRequest) -> Option<WhereClause> {
        CriteriaResolver::new(&BlueprintConfig::default()).resolve(req).unwrap()
    }

    #[test]
    fn paging_params_are_not_criteria() {
        let req = request(json!({"name": "x", "limit": 10, "skip": 0, "sort": "id"}), RouteOptions::default());
        assert_eq!(resolve(&req), Some(json!({"name": "x"}).as_object().unwrap().clone()));
    }

    #[test]
    fn relation_override_params_are_blacklisted() {
        let options = RouteOptions::with_relations(vec![RelationConfig::model("owner.profile", "user")]);
        let req = request(json!({"populate_owner": "{\"limit\":2}", "age": 3}), options);
        assert_eq!(resolve(&req).unwrap(), *json!({"age": 3}).as_object().unwrap());
    }

    #[test]
    fn blacklist_is_a_set() {
        let relations = vec![RelationConfig::model("owner", "user"), RelationConfig::model("owner.pets", "pet")];
        let list = Blacklist::for_route(None, &relations).unwrap();
        assert_eq!(list.iter().filter(|n| *n == "populate_owner").count(), 1);
        assert_eq!(list.len(), 5);
    }

    #[test]
    fn blacklist_override_must_be_strings() {
        assert!(matches!(
            Blacklist::from_override(Some(&json!("limit"))),
            Err(ConfigError::InvalidBlacklist("string"))
        ));
        assert!(matches!(
            Blacklist::from_override(Some(&json!(["limit", 3]))),
            Err(ConfigError::InvalidBlacklist("number"))
        ));
        let custom = Blacklist::from_override(Some(&json!(["page"]))).unwrap();
        assert!(custom.contains("page"));
        assert!(!custom.contains("limit"));
    }

    #[test]
    fn malformed_blacklist_fails_resolution() {
        let mut options = RouteOptions::default();
        options.criteria.blacklist = Some(json!({"limit": true}));
        let req = request(json!({"a": 1}), options);
        let err = CriteriaResolver::new(&BlueprintConfig::default()).resolve(&req).unwrap_err();
        assert_eq!(err.code(), crate::error::E_WHERE_CLAUSE_UNPARSEABLE);
    }

    #[test]
    fn explicit_where_wins_over_params() {
        let filter = json!({"age": {">": 21}, "name": "x"});
        let req = request(json!({"where": filter.to_string(), "color": "red"}), RouteOptions::default());
        assert_eq!(Value::Object(resolve(&req).unwrap()), filter);
    }

    #[test]
    fn structured_where_is_used_as_is() {
        let req = request(json!({"where": {"id": 4}, "color": "red"}), RouteOptions::default());
        assert_eq!(resolve(&req).unwrap(), *json!({"id": 4}).as_object().unwrap());
    }

    #[test]
    fn malformed_where_falls_back_to_params() {
        let req = request(json!({"where": "{not json", "color": "red"}), RouteOptions::default());
        let w = resolve(&req).unwrap();
        assert_eq!(w.get("color"), Some(&json!("red")));
        assert!(!w.contains_key("where"));
    }

    #[test]
    fn non_object_where_leaves_only_the_preset() {
        let options = RouteOptions {
            where_: Some(json!({"archived": false}).as_object().unwrap().clone()),
            ..Default::default()
        };
        for raw in ["5", "[1]", "null", "\"x\""] {
            let req = request(json!({"where": raw, "name": "x"}), options.clone());
            assert_eq!(resolve(&req).unwrap(), *json!({"archived": false}).as_object().unwrap(), "where={}", raw);
        }
        let req = request(json!({"where": "[1]", "name": "x"}), RouteOptions::default());
        assert_eq!(resolve(&req), None);
    }

    #[test]
    fn where_is_never_a_criterion_even_with_a_custom_blacklist() {
        let options = RouteOptions {
            criteria: crate::config::CriteriaOptions { blacklist: Some(json!(["page"])) },
            ..Default::default()
        };
        let req = request(json!({"where": "{oops", "name": "x", "limit": "5"}), options);
        assert_eq!(resolve(&req).unwrap(), *json!({"name": "x", "limit": "5"}).as_object().unwrap());
    }

    #[test]
    fn strict_mode_rejects_malformed_where() {
        let config = BlueprintConfig { strict_where: true, ..Default::default() };
        let req = request(json!({"where": "{not json"}), RouteOptions::default());
        let err = CriteriaResolver::new(&config).resolve(&req).unwrap_err();
        assert!(matches!(err, AppError::WhereClauseUnparseable(_)));
    }

    #[test]
    fn undefined_params_are_dropped() {
        let mut params = RequestParams::from_strings([("name", "x")]);
        params.insert_undefined("id");
        let req = BlueprintRequest::new(params, Arc::new(RouteOptions::default()));
        assert_eq!(resolve(&req).unwrap().len(), 1);
    }

    #[test]
    fn jsonp_callback_dropped_only_for_plain_http() {
        let options = RouteOptions { jsonp: Some(JsonpSetting::Enabled(true)), ..Default::default() };
        let req = request(json!({"callback": "fn", "a": 1}), options.clone());
        assert!(!resolve(&req).unwrap().contains_key("callback"));

        let socket = request(json!({"callback": "fn", "a": 1}), options).over_socket();
        assert!(resolve(&socket).unwrap().contains_key("callback"));

        let off = request(json!({"callback": "fn"}), RouteOptions::default());
        assert!(resolve(&off).unwrap().contains_key("callback"));
    }

    #[test]
    fn custom_jsonp_callback_name() {
        let options = RouteOptions {
            jsonp: Some(JsonpSetting::Custom { callback: "cb".into() }),
            ..Default::default()
        };
        let req = request(json!({"cb": "fn", "callback": "kept"}), options);
        let w = resolve(&req).unwrap();
        assert!(!w.contains_key("cb"));
        assert!(w.contains_key("callback"));
    }

    #[test]
    fn preset_where_is_a_default() {
        let options = RouteOptions {
            where_: Some(json!({"archived": false, "owner": {"active": true, "role": "admin"}}).as_object().unwrap().clone()),
            ..Default::default()
        };
        let req = request(json!({"archived": true, "owner": {"role": "user"}}), options);
        assert_eq!(
            Value::Object(resolve(&req).unwrap()),
            json!({"archived": true, "owner": {"active": true, "role": "user"}})
        );
    }

    #[test]
    fn empty_criteria_is_none() {
        let req = request(json!({"limit": 5}), RouteOptions::default());
        assert_eq!(resolve(&req), None);
    }

    #[test]
    fn value_types_are_preserved() {
        let req = request(json!({"age": "21", "rank": 21}), RouteOptions::default());
        let w = resolve(&req).unwrap();
        assert_eq!(w["age"], json!("21"));
        assert_eq!(w["rank"], json!(21));
    }
}
