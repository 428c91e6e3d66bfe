//! Query-builder seam and the serializable find descriptor handed to an ORM.

use crate::criteria::WhereClause;
use crate::json::positive_limit;
use crate::request::RequestContext;
use serde::Serialize;
use serde_json::{Map, Value};

/// Options passed alongside an alias to the population primitive.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PopulateOptions {
    pub limit: u32,
    /// Advanced per-relation options (e.g. `where`, `sort`) forwarded untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Chainable query builder exposed by the ORM.
pub trait QueryBuilder: Sized {
    fn populate(self, alias: &str, options: PopulateOptions) -> Self;
}

/// Sort direction for one field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Paging modifiers read from the blacklisted `limit`, `skip` and `sort` parameters.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Paging {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<(String, SortOrder)>,
}

impl Paging {
    /// `sort` accepts `"name desc, id"` style strings. Unusable values are ignored.
    pub fn from_request<R: RequestContext + ?Sized>(req: &R) -> Self {
        let skip = req.param("skip").and_then(|v| match v {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        });
        let sort = match req.param("sort") {
            Some(Value::String(s)) => parse_sort(s),
            _ => Vec::new(),
        };
        Paging {
            limit: req.param("limit").and_then(positive_limit),
            skip: skip.and_then(|n| u32::try_from(n).ok()),
            sort,
        }
    }
}

fn parse_sort(s: &str) -> Vec<(String, SortOrder)> {
    s.split(',')
        .filter_map(|part| {
            let mut words = part.split_whitespace();
            let field = words.next()?;
            let order = match words.next().map(str::to_ascii_lowercase).as_deref() {
                Some("desc") => SortOrder::Desc,
                _ => SortOrder::Asc,
            };
            Some((field.to_string(), order))
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PopulateStep {
    pub alias: String,
    #[serde(flatten)]
    pub options: PopulateOptions,
}

/// Find query descriptor: model, criteria, paging and population steps.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FindQuery {
    pub model: String,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub criteria: Option<WhereClause>,
    #[serde(flatten)]
    pub paging: Paging,
    pub populate: Vec<PopulateStep>,
}

impl FindQuery {
    pub fn new(model: impl Into<String>) -> Self {
        FindQuery {
            model: model.into(),
            criteria: None,
            paging: Paging::default(),
            populate: Vec::new(),
        }
    }

    pub fn with_criteria(mut self, criteria: Option<WhereClause>) -> Self {
        self.criteria = criteria;
        self
    }

    pub fn with_paging(mut self, paging: Paging) -> Self {
        self.paging = paging;
        self
    }
}

impl QueryBuilder for FindQuery {
    fn populate(mut self, alias: &str, options: PopulateOptions) -> Self {
        self.populate.push(PopulateStep {
            alias: alias.to_string(),
            options,
        });
        self
    }
}
