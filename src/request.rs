//! Request accessor: merged parameters, transport flag and per-route options.

use crate::config::{BlueprintConfig, RouteOptions};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// All named parameters of a request, merged from path, query string and body.
///
/// A parameter may be declared but undefined (e.g. an optional path segment that
/// did not match); such entries are kept so they can be told apart from absent ones,
/// but never surface through [`RequestParams::get`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RequestParams {
    values: BTreeMap<String, Option<Value>>,
}

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later sources overwrite earlier ones.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), Some(value));
    }

    pub fn insert_undefined(&mut self, name: impl Into<String>) {
        self.values.insert(name.into(), None);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name).and_then(Option::as_ref)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Every parameter, including undefined ones.
    pub fn entries(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    /// Merge top-level keys of a JSON object body; non-object bodies are ignored.
    pub fn merge_body(&mut self, body: Value) {
        if let Value::Object(map) = body {
            for (k, v) in map {
                self.insert(k, v);
            }
        }
    }

    /// String-valued parameters, as they arrive from a path or query string.
    pub fn from_strings<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        pairs
            .into_iter()
            .map(|(k, v)| (k.into(), Value::String(v.into())))
            .collect()
    }
}

impl FromIterator<(String, Value)> for RequestParams {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        let mut params = RequestParams::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

impl From<Map<String, Value>> for RequestParams {
    fn from(map: Map<String, Value>) -> Self {
        map.into_iter().collect()
    }
}

/// What the resolvers need from an incoming request.
pub trait RequestContext {
    fn params(&self) -> &RequestParams;

    /// True for persistent/streaming transports (e.g. websockets).
    fn is_socket(&self) -> bool;

    fn options(&self) -> &RouteOptions;

    fn param(&self, name: &str) -> Option<&Value> {
        self.params().get(name)
    }
}

/// Plain request context assembled by the HTTP layer or by tests.
#[derive(Clone, Debug)]
pub struct BlueprintRequest {
    pub params: RequestParams,
    pub socket: bool,
    pub options: Arc<RouteOptions>,
}

impl BlueprintRequest {
    pub fn new(params: RequestParams, options: Arc<RouteOptions>) -> Self {
        BlueprintRequest {
            params,
            socket: false,
            options,
        }
    }

    pub fn over_socket(mut self) -> Self {
        self.socket = true;
        self
    }
}

impl RequestContext for BlueprintRequest {
    fn params(&self) -> &RequestParams {
        &self.params
    }

    fn is_socket(&self) -> bool {
        self.socket
    }

    fn options(&self) -> &RouteOptions {
        &self.options
    }
}

/// Route option with the global default applied.
pub(crate) fn effective_populate(options: &RouteOptions, config: &BlueprintConfig) -> bool {
    options.populate.unwrap_or(config.populate)
}

pub(crate) fn effective_auto_watch(options: &RouteOptions, config: &BlueprintConfig) -> bool {
    options.auto_watch.unwrap_or(config.auto_watch)
}
