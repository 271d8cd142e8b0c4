use bson::{Bson, Document as BsonDocument};
use serde_json::Value;

use super::criteria::parse_criteria;
use super::types::{
    MAX_POPULATE_PATHS, MAX_SELECT_FIELDS, PopulateDirective, QuerySpec, RawQuery, RawValue, Sort,
};
use crate::errors::RestError;

/// Compiles raw query-string parameters into a [`QuerySpec`].
///
/// Only the recognized keys (`query`/`filter`, `populate`, `select`, `sort`,
/// `limit`, `skip`, `distinct`) are read; everything else is silently
/// ignored.
#[derive(Debug, Clone, Copy)]
pub struct QueryCompiler {
    allow_regex: bool,
}

impl QueryCompiler {
    #[must_use]
    pub fn new(allow_regex: bool) -> Self {
        Self { allow_regex }
    }

    /// # Errors
    /// `InvalidQuerySyntax` when a structured value fails to parse,
    /// `RegexNotAllowed` when a regex is attempted without permission.
    /// Compilation is atomic: a failure yields no partial spec.
    pub fn compile(&self, raw: &RawQuery) -> Result<QuerySpec, RestError> {
        let mut spec = QuerySpec::default();

        if let Some(value) = raw.get("query").or_else(|| raw.get("filter"))
            && let Some(s) = value.first()
        {
            spec.filter = Some(parse_criteria(s, self.allow_regex)?);
        }

        let mut select = match raw.get("select") {
            Some(value) => parse_select(value)?,
            None => BsonDocument::new(),
        };

        if let Some(value) = raw.get("sort")
            && let Some(s) = value.first()
        {
            spec.sort = Some(parse_sort(s));
        }

        spec.limit = parse_int(raw.get("limit"), "limit");
        spec.skip = parse_int(raw.get("skip"), "skip");

        if let Some(value) = raw.get("distinct")
            && let Some(s) = value.first()
        {
            spec.distinct = Some(s.to_string());
        }

        let mut populate = match raw.get("populate") {
            Some(value) => parse_populate(value)?,
            None => Vec::new(),
        };
        reconcile_populate_select(&mut populate, &mut select);

        if !select.is_empty() {
            spec.select = Some(select);
        }
        spec.populate = populate;
        Ok(spec)
    }
}

/// The curried form of compilation: fix the regex permission once, compile
/// many raw queries.
pub fn compile_query(allow_regex: bool) -> impl Fn(&RawQuery) -> Result<QuerySpec, RestError> {
    let compiler = QueryCompiler::new(allow_regex);
    move |raw| compiler.compile(raw)
}

fn parse_select(value: &RawValue) -> Result<BsonDocument, RestError> {
    let mut out = BsonDocument::new();
    match value {
        RawValue::One(s) if s.trim_start().starts_with('{') => {
            let parsed: Value =
                serde_json::from_str(s).map_err(|e| RestError::bad_syntax("select", e))?;
            let Value::Object(map) = parsed else {
                return Err(RestError::bad_syntax("select", "expected a JSON object"));
            };
            for (field, v) in &map {
                let included = match v {
                    Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
                    Value::Bool(b) => *b,
                    _ => true,
                };
                insert_select(&mut out, field, included);
            }
        }
        RawValue::One(s) => {
            for token in s.split(',') {
                select_token(&mut out, token);
            }
        }
        RawValue::Many(items) => {
            for item in items {
                for token in item.split(',') {
                    select_token(&mut out, token);
                }
            }
        }
    }
    if out.len() > MAX_SELECT_FIELDS {
        log::warn!("select spec too long: {} fields", out.len());
    }
    Ok(out)
}

fn select_token(out: &mut BsonDocument, token: &str) {
    let token = token.trim();
    if token.is_empty() {
        return;
    }
    match token.strip_prefix('-') {
        Some(field) => insert_select(out, field, false),
        None => insert_select(out, token, true),
    }
}

fn insert_select(out: &mut BsonDocument, field: &str, included: bool) {
    out.insert(field, Bson::Int32(i32::from(included)));
}

fn parse_sort(s: &str) -> Sort {
    if s.trim_start().starts_with('{')
        && let Ok(Value::Object(map)) = serde_json::from_str::<Value>(s)
        && let Ok(doc) = BsonDocument::try_from(map)
    {
        return Sort::Fields(doc);
    }
    Sort::Raw(s.to_string())
}

fn parse_int(value: Option<&RawValue>, key: &str) -> Option<i64> {
    let s = value?.first()?;
    match s.trim().parse::<i64>() {
        Ok(n) => Some(n),
        Err(_) => {
            log::warn!("ignoring non-numeric `{key}` parameter: {s:?}");
            None
        }
    }
}

// Explicit shape dispatch for populate values instead of prefix sniffing
// scattered through the parse.
enum RawPopulateValue<'a> {
    Paths(&'a str),
    Single(&'a str),
    Array(&'a str),
}

fn classify_populate(s: &str) -> RawPopulateValue<'_> {
    let trimmed = s.trim_start();
    if trimmed.starts_with('{') {
        RawPopulateValue::Single(s)
    } else if trimmed.starts_with('[') {
        RawPopulateValue::Array(s)
    } else {
        RawPopulateValue::Paths(s)
    }
}

fn parse_populate(value: &RawValue) -> Result<Vec<PopulateDirective>, RestError> {
    let items: Vec<&str> = match value {
        RawValue::One(s) => vec![s.as_str()],
        RawValue::Many(v) => v.iter().map(String::as_str).collect(),
    };
    let mut out = Vec::new();
    for item in items {
        match classify_populate(item) {
            RawPopulateValue::Paths(s) => {
                for path in s.split(',') {
                    let path = path.trim();
                    if !path.is_empty() {
                        out.push(PopulateDirective::path(path));
                    }
                }
            }
            RawPopulateValue::Single(s) => {
                out.push(serde_json::from_str(s).map_err(|e| RestError::bad_syntax("populate", e))?);
            }
            RawPopulateValue::Array(s) => {
                let directives: Vec<PopulateDirective> =
                    serde_json::from_str(s).map_err(|e| RestError::bad_syntax("populate", e))?;
                out.extend(directives);
            }
        }
    }
    if out.len() > MAX_POPULATE_PATHS {
        log::warn!("populate spec too long: {} directives", out.len());
        out.truncate(MAX_POPULATE_PATHS);
    }
    Ok(out)
}

// Sub-field selections of a populated path live in the directive, not the
// top-level projection: `select=foo.bar` with `populate=foo` migrates into
// the directive as `select: "bar"`, and a surviving top-level select keeps
// `foo: 1` so the relation is not projected away.
fn reconcile_populate_select(populate: &mut [PopulateDirective], select: &mut BsonDocument) {
    for directive in populate.iter_mut() {
        if directive.path.is_empty() {
            continue;
        }
        let prefix = format!("{}.", directive.path);
        let migrated: Vec<(String, String, bool)> = select
            .iter()
            .filter_map(|(key, v)| {
                key.strip_prefix(prefix.as_str())
                    .map(|sub| (key.clone(), sub.to_string(), select_included(v)))
            })
            .collect();
        for (key, _, _) in &migrated {
            select.remove(key);
        }
        if !migrated.is_empty() {
            let tokens: Vec<String> = migrated
                .iter()
                .map(|(_, sub, included)| {
                    if *included { sub.clone() } else { format!("-{sub}") }
                })
                .collect();
            let joined = tokens.join(" ");
            directive.select = Some(match directive.select.take() {
                Some(existing) => format!("{existing} {joined}"),
                None => joined,
            });
        }
        if !select.is_empty() && !select.contains_key(&directive.path) {
            select.insert(directive.path.clone(), Bson::Int32(1));
        }
    }
}

fn select_included(v: &Bson) -> bool {
    !matches!(v, Bson::Int32(0) | Bson::Int64(0))
}
