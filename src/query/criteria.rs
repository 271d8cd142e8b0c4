use bson::{Bson, Document as BsonDocument};
use serde_json::{Map as JsonMap, Value};

use super::types::MAX_CRITERIA_DEPTH;
use crate::errors::RestError;

/// Parse the `query` parameter into database criteria.
///
/// Two-phase: `serde_json` parses the text into a generic tree, then a pure
/// recursive rewrite applies the operator micro-syntax per scalar string
/// (`~rest` becomes a case-insensitive regular expression, `>=`/`>`/`<=`/
/// `<`/`!=` prefixes become range operators on the remainder) and turns
/// plain arrays under non-operator keys into `$in` sets. A `$regex` key
/// anywhere, or the `~` shorthand, fails the whole parse unless regex is
/// permitted.
///
/// # Errors
/// `InvalidQuerySyntax` on malformed JSON, a non-object top level or
/// excessive nesting; `RegexNotAllowed` when regex is attempted without
/// permission.
pub(crate) fn parse_criteria(raw: &str, allow_regex: bool) -> Result<BsonDocument, RestError> {
    let value: Value = serde_json::from_str(raw).map_err(|e| RestError::bad_syntax("query", e))?;
    let Value::Object(map) = value else {
        return Err(RestError::bad_syntax("query", "expected a JSON object"));
    };
    transform_object(&map, allow_regex, 0)
}

fn transform_object(
    map: &JsonMap<String, Value>,
    allow_regex: bool,
    depth: usize,
) -> Result<BsonDocument, RestError> {
    if depth >= MAX_CRITERIA_DEPTH {
        return Err(RestError::bad_syntax("query", "criteria nested too deeply"));
    }
    let mut out = BsonDocument::new();
    for (key, value) in map {
        if key == "$regex" && !allow_regex {
            return Err(RestError::RegexNotAllowed);
        }
        let transformed = match value {
            Value::Array(items) if in_operator_applies(key, items) => {
                let mut list = Vec::with_capacity(items.len());
                for item in items {
                    list.push(transform_value(item, allow_regex, depth + 1)?);
                }
                let mut membership = BsonDocument::new();
                membership.insert("$in", Bson::Array(list));
                Bson::Document(membership)
            }
            other => transform_value(other, allow_regex, depth + 1)?,
        };
        out.insert(key.clone(), transformed);
    }
    Ok(out)
}

fn transform_value(value: &Value, allow_regex: bool, depth: usize) -> Result<Bson, RestError> {
    if depth >= MAX_CRITERIA_DEPTH {
        return Err(RestError::bad_syntax("query", "criteria nested too deeply"));
    }
    match value {
        Value::String(s) => rewrite_scalar(s, allow_regex),
        Value::Array(items) => {
            let mut list = Vec::with_capacity(items.len());
            for item in items {
                list.push(transform_value(item, allow_regex, depth + 1)?);
            }
            Ok(Bson::Array(list))
        }
        Value::Object(map) => Ok(Bson::Document(transform_object(map, allow_regex, depth)?)),
        other => Bson::try_from(other.clone()).map_err(|e| RestError::bad_syntax("query", e)),
    }
}

// Plain arrays become membership tests, except under operator keys and for
// GeoJSON-style coordinate pairs, which must reach the driver untouched.
fn in_operator_applies(key: &str, items: &[Value]) -> bool {
    if key.starts_with('$') {
        return false;
    }
    !(key == "coordinates" && items.len() == 2 && items.iter().all(Value::is_number))
}

fn rewrite_scalar(s: &str, allow_regex: bool) -> Result<Bson, RestError> {
    if let Some(rest) = s.strip_prefix('~') {
        if !allow_regex {
            return Err(RestError::RegexNotAllowed);
        }
        return Ok(Bson::RegularExpression(bson::Regex {
            pattern: rest.to_string().try_into().map_err(|e| RestError::bad_syntax("query", e))?,
            options: "i".to_string().try_into().map_err(|e| RestError::bad_syntax("query", e))?,
        }));
    }
    let ranges: [(&str, &str); 5] =
        [(">=", "$gte"), ("<=", "$lte"), ("!=", "$ne"), (">", "$gt"), ("<", "$lt")];
    for (prefix, operator) in ranges {
        if let Some(rest) = s.strip_prefix(prefix) {
            let mut doc = BsonDocument::new();
            doc.insert(operator, Bson::String(rest.to_string()));
            return Ok(Bson::Document(doc));
        }
    }
    Ok(Bson::String(s.to_string()))
}
