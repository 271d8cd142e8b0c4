use std::collections::HashMap;

use bson::Document as BsonDocument;
use serde::{Deserialize, Serialize};

// Safety limits for untrusted query strings
pub(crate) const MAX_CRITERIA_DEPTH: usize = 32;
pub(crate) const MAX_POPULATE_PATHS: usize = 16;
pub(crate) const MAX_SELECT_FIELDS: usize = 64;

/// A decoded query string as delivered by the HTTP layer. Repeated
/// parameters arrive as `Many`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    One(String),
    Many(Vec<String>),
}

impl RawValue {
    pub(crate) fn first(&self) -> Option<&str> {
        match self {
            Self::One(s) => Some(s),
            Self::Many(v) => v.first().map(String::as_str),
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        Self::One(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        Self::One(s)
    }
}

impl From<Vec<String>> for RawValue {
    fn from(v: Vec<String>) -> Self {
        Self::Many(v)
    }
}

pub type RawQuery = HashMap<String, RawValue>;

/// Sort specification. A JSON object form is passed as fields; anything
/// else is an opaque field-list string the driver's sort primitive accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum Sort {
    Fields(BsonDocument),
    Raw(String),
}

/// Instruction to join a referenced document into the result at `path`,
/// optionally with its own projection and filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PopulateDirective {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<String>,
    #[serde(default, rename = "match", skip_serializing_if = "Option::is_none")]
    pub criteria: Option<BsonDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<BsonDocument>,
}

impl PopulateDirective {
    #[must_use]
    pub fn path(path: impl Into<String>) -> Self {
        Self { path: path.into(), ..Self::default() }
    }
}

/// The compiled, validated representation of a request's query intent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySpec {
    pub filter: Option<BsonDocument>,
    pub select: Option<BsonDocument>,
    pub sort: Option<Sort>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub distinct: Option<String>,
    pub populate: Vec<PopulateDirective>,
}

/// Which operation a query builder executes. Count and distinct queries are
/// exempt from limit application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QueryOp {
    #[default]
    Find,
    FindOne,
    Count,
    Distinct,
}
