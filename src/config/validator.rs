//! Config validation: limits, relation aliases and blacklist shape.

use crate::config::{FullConfig, RouteConfig};
use crate::criteria::Blacklist;
use crate::error::ConfigError;
use std::collections::HashSet;

pub fn validate(config: &FullConfig) -> Result<(), ConfigError> {
    if config.blueprints.default_limit == 0 {
        return Err(ConfigError::InvalidLimit("blueprints.default_limit".into()));
    }

    let mut models = HashSet::new();
    for route in &config.routes {
        if route.model.is_empty() {
            return Err(ConfigError::Validation("route model must not be empty".into()));
        }
        if !models.insert(route.model.as_str()) {
            return Err(ConfigError::Duplicate {
                kind: "route",
                id: route.model.clone(),
            });
        }
        validate_route(route)?;
    }
    Ok(())
}

fn validate_route(route: &RouteConfig) -> Result<(), ConfigError> {
    let mut aliases = HashSet::new();
    for relation in &route.options.relations {
        if relation.alias.is_empty() {
            return Err(ConfigError::Validation(format!("{}: relation alias must not be empty", route.model)));
        }
        if relation.kind.identity().is_empty() {
            return Err(ConfigError::MissingReference {
                kind: "model",
                id: format!("{}.{}", route.model, relation.alias),
            });
        }
        if !aliases.insert(relation.alias.as_str()) {
            return Err(ConfigError::Duplicate {
                kind: "relation",
                id: format!("{}.{}", route.model, relation.alias),
            });
        }
        if relation.limit == Some(0) {
            return Err(ConfigError::InvalidLimit(format!("{}.{}", route.model, relation.alias)));
        }
    }
    Blacklist::from_override(route.options.criteria.blacklist.as_ref())?;
    Ok(())
}
