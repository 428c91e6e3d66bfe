//! Relation population: which associations to eager-load, under which alias and limit.

use crate::config::{real_alias, AliasMatch, BlueprintConfig, RelationConfig};
use crate::criteria::populate_param;
use crate::json::{positive_limit, JsonParam};
use crate::query::{PopulateOptions, QueryBuilder};
use crate::request::{effective_populate, RequestContext};
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

/// One eager-load step. `limit` is always resolved to a positive integer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PopulationDirective {
    pub alias: String,
    pub limit: u32,
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

impl PopulationDirective {
    /// Split into the alias and the options the population primitive takes separately.
    pub fn into_parts(self) -> (String, PopulateOptions) {
        (
            self.alias,
            PopulateOptions {
                limit: self.limit,
                extra: self.options,
            },
        )
    }
}

/// Names from the `populate` parameter: `a,b`, `[a,b]` or a JSON array of strings.
/// `None` when the parameter is missing or of any other type.
pub fn requested_aliases(value: Option<&Value>) -> Option<Vec<String>> {
    match value? {
        Value::String(s) => {
            if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(s) {
                return Some(string_items(&items));
            }
            let s: String = s.chars().filter(|c| *c != '[' && *c != ']').collect();
            if s.is_empty() {
                return Some(Vec::new());
            }
            Some(s.split(',').map(|n| n.trim().trim_matches('"').to_string()).collect())
        }
        Value::Array(items) => Some(string_items(items)),
        _ => None,
    }
}

fn string_items(items: &[Value]) -> Vec<String> {
    items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect()
}

enum AliasMatcher {
    Literal(String),
    Regex(Option<Regex>),
}

impl AliasMatcher {
    fn new(alias: &str, mode: AliasMatch) -> Self {
        match mode {
            AliasMatch::Literal => AliasMatcher::Literal(alias.to_string()),
            AliasMatch::Regex => {
                let re = Regex::new(alias)
                    .map_err(|e| tracing::warn!(alias, error = %e, "relation alias is not a valid pattern"))
                    .ok();
                AliasMatcher::Regex(re)
            }
        }
    }

    fn is_match(&self, requested: &str) -> bool {
        match self {
            AliasMatcher::Literal(alias) => requested.contains(alias.as_str()),
            AliasMatcher::Regex(re) => re.as_ref().is_some_and(|re| re.is_match(requested)),
        }
    }
}

pub struct PopulationResolver<'a> {
    config: &'a BlueprintConfig,
}

impl<'a> PopulationResolver<'a> {
    pub fn new(config: &'a BlueprintConfig) -> Self {
        PopulationResolver { config }
    }

    /// Directives for every relation that should be populated, in declaration order.
    pub fn directives<R: RequestContext + ?Sized>(&self, req: &R) -> Vec<PopulationDirective> {
        let options = req.options();
        let requested = requested_aliases(req.param("populate"));
        let default = effective_populate(options, self.config);

        let mut out: Vec<PopulationDirective> = Vec::new();
        for relation in &options.relations {
            let working_alias = match &requested {
                None if default => relation.alias.clone(),
                None => continue,
                Some(names) => {
                    let matcher = AliasMatcher::new(&relation.alias, self.config.alias_match);
                    match names.iter().find(|n| matcher.is_match(n)) {
                        Some(name) => name.clone(),
                        None => continue,
                    }
                }
            };
            let directive = self.directive(req, relation, working_alias);
            if out.iter().any(|d| d.alias == directive.alias) {
                tracing::debug!(alias = %directive.alias, "relation already populated");
                continue;
            }
            out.push(directive);
        }
        tracing::debug!(
            directives = ?out.iter().map(|d| (d.alias.as_str(), d.limit)).collect::<Vec<_>>(),
            "resolved population"
        );
        out
    }

    /// Apply one population step per qualifying relation and hand the query back for chaining.
    pub fn resolve<Q: QueryBuilder, R: RequestContext + ?Sized>(&self, query: Q, req: &R) -> Q {
        self.directives(req).into_iter().fold(query, |query, directive| {
            let (alias, options) = directive.into_parts();
            query.populate(&alias, options)
        })
    }

    fn directive<R: RequestContext + ?Sized>(
        &self,
        req: &R,
        relation: &RelationConfig,
        working_alias: String,
    ) -> PopulationDirective {
        let real = real_alias(&working_alias).to_string();
        let param = populate_param(&real);
        let mut advanced = match JsonParam::decode(req.param(&param)).or_absent(&param) {
            Some(Value::Object(map)) => map,
            Some(other) => {
                tracing::debug!(param = %param, value = %other, "ignoring non-object population options");
                Map::new()
            }
            None => Map::new(),
        };

        let alias = match advanced.remove("alias") {
            Some(Value::String(a)) if !a.is_empty() => a,
            _ => working_alias,
        };
        let limit = advanced
            .remove("limit")
            .as_ref()
            .and_then(positive_limit)
            .or_else(|| req.param(&format!("{}_limit", param)).and_then(positive_limit))
            .or_else(|| req.param("populate_limit").and_then(positive_limit))
            .or_else(|| req.param("limit").and_then(positive_limit))
            .or(relation.limit.filter(|n| *n > 0))
            .unwrap_or(self.config.default_limit);

        PopulationDirective {
            alias,
            limit,
            options: advanced,
        }
    }
}
