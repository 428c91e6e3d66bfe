//! Load config from JSON files or text, apply environment overrides, and resolve it.

use crate::config::resolved::{ResolvedModel, ResolvedRoute};
use crate::config::types::*;
use crate::config::validate;
use crate::criteria::Blacklist;
use crate::error::ConfigError;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

pub const BLUEPRINTS_FILE: &str = "blueprints.json";
pub const ROUTES_FILE: &str = "routes.json";

/// Build resolved model from full config (validates first).
pub fn resolve(config: &FullConfig) -> Result<ResolvedModel, ConfigError> {
    validate(config)?;

    let mut routes = Vec::with_capacity(config.routes.len());
    let mut route_by_model = HashMap::new();
    for route in &config.routes {
        let blacklist = Blacklist::for_route(route.options.criteria.blacklist.as_ref(), &route.options.relations)?;
        let resolved = ResolvedRoute {
            model: route.model.clone(),
            primary_key: route.primary_key.clone(),
            options: Arc::new(route.options.clone()),
            blacklist,
        };
        route_by_model.insert(route.model.clone(), resolved.clone());
        routes.push(resolved);
    }
    tracing::info!(routes = routes.len(), "blueprint config resolved");

    Ok(ResolvedModel {
        blueprints: Arc::new(config.blueprints.clone()),
        routes,
        route_by_model,
    })
}

/// Parse `blueprints.json` and `routes.json` contents. Empty blueprint text means defaults.
pub fn from_json_str(blueprints: &str, routes: &str) -> Result<FullConfig, ConfigError> {
    let blueprints = if blueprints.trim().is_empty() {
        BlueprintConfig::default()
    } else {
        serde_json::from_str(blueprints).map_err(|e| ConfigError::Load(format!("{}: {}", BLUEPRINTS_FILE, e)))?
    };
    let routes = serde_json::from_str(routes).map_err(|e| ConfigError::Load(format!("{}: {}", ROUTES_FILE, e)))?;
    Ok(FullConfig { blueprints, routes })
}

/// Load from a directory holding `routes.json` and, optionally, `blueprints.json`.
pub fn load_from_dir(dir: impl AsRef<Path>) -> Result<FullConfig, ConfigError> {
    let dir = dir.as_ref();
    let read = |name: &str| {
        std::fs::read_to_string(dir.join(name)).map_err(|e| ConfigError::Load(format!("{}: {}", dir.join(name).display(), e)))
    };
    let blueprints = if dir.join(BLUEPRINTS_FILE).exists() {
        read(BLUEPRINTS_FILE)?
    } else {
        String::new()
    };
    let routes = read(ROUTES_FILE)?;
    from_json_str(&blueprints, &routes)
}

/// Apply `BLUEPRINTS_DEFAULT_LIMIT`, `BLUEPRINTS_POPULATE` and `BLUEPRINTS_AUTO_WATCH` from the process environment.
pub fn apply_env_overrides(config: &mut BlueprintConfig) -> Result<(), ConfigError> {
    apply_overrides(config, |key| std::env::var(key).ok())
}

pub(crate) fn apply_overrides<F>(config: &mut BlueprintConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("BLUEPRINTS_DEFAULT_LIMIT") {
        config.default_limit = v
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| ConfigError::InvalidLimit("BLUEPRINTS_DEFAULT_LIMIT".into()))?;
    }
    if let Some(v) = lookup("BLUEPRINTS_POPULATE") {
        config.populate = parse_flag("BLUEPRINTS_POPULATE", &v)?;
    }
    if let Some(v) = lookup("BLUEPRINTS_AUTO_WATCH") {
        config.auto_watch = parse_flag("BLUEPRINTS_AUTO_WATCH", &v)?;
    }
    Ok(())
}

fn parse_flag(key: &str, v: &str) -> Result<bool, ConfigError> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Validation(format!("{} must be a boolean, got '{}'", key, v))),
    }
}
