use std::future::Future;

use bson::Document as BsonDocument;

use super::types::{PopulateDirective, QueryOp, QuerySpec, Sort};
use crate::errors::RestError;

/// Chainable single-query builder, implemented by the database adapter.
/// Every method applies one clause and returns the builder; `exec` is the
/// terminal call producing the result.
pub trait QueryBuilder: Sized {
    type Output;

    #[must_use]
    fn criteria(self, filter: BsonDocument) -> Self;
    #[must_use]
    fn skip(self, n: i64) -> Self;
    #[must_use]
    fn limit(self, n: i64) -> Self;
    #[must_use]
    fn sort(self, sort: Sort) -> Self;
    #[must_use]
    fn populate(self, directive: PopulateDirective) -> Self;
    #[must_use]
    fn select(self, projection: BsonDocument) -> Self;
    #[must_use]
    fn distinct(self, field: &str) -> Self;
    #[must_use]
    fn read_preference(self, preference: &str) -> Self;
    #[must_use]
    fn lean(self, enabled: bool) -> Self;

    /// Which operation this builder executes.
    fn op(&self) -> QueryOp {
        QueryOp::Find
    }

    fn exec(self) -> impl Future<Output = Result<Self::Output, RestError>> + Send;
}

/// Instance-wide execution options, configured once per served model.
#[derive(Debug, Clone, Default)]
pub struct ExecOptions {
    pub max_limit: Option<i64>,
    pub read_preference: Option<String>,
    pub lean: Option<bool>,
}

/// Apply a compiled spec to a query builder and execute it.
///
/// Pure composition: each clause is applied only when specified. The
/// requested limit is clamped to `max_limit` when one is configured (absent,
/// zero and over-max requests all substitute the maximum), and skipped
/// entirely for count and distinct operations. Failures surface through the
/// returned future, never as a panic.
///
/// # Errors
/// Whatever the builder's terminal execution reports.
pub async fn apply<B: QueryBuilder>(
    mut builder: B,
    spec: &QuerySpec,
    opts: &ExecOptions,
) -> Result<B::Output, RestError> {
    if let Some(filter) = &spec.filter {
        builder = builder.criteria(filter.clone());
    }
    if let Some(skip) = spec.skip {
        builder = builder.skip(skip);
    }
    let unlimited =
        matches!(builder.op(), QueryOp::Count | QueryOp::Distinct) || spec.distinct.is_some();
    if !unlimited && let Some(limit) = effective_limit(spec.limit, opts.max_limit) {
        builder = builder.limit(limit);
    }
    if let Some(sort) = &spec.sort {
        builder = builder.sort(sort.clone());
    }
    for directive in &spec.populate {
        builder = builder.populate(directive.clone());
    }
    if let Some(select) = &spec.select {
        builder = builder.select(select.clone());
    }
    if let Some(field) = &spec.distinct {
        builder = builder.distinct(field);
    }
    if let Some(preference) = &opts.read_preference {
        builder = builder.read_preference(preference);
    }
    if let Some(lean) = opts.lean {
        builder = builder.lean(lean);
    }
    builder.exec().await
}

fn effective_limit(requested: Option<i64>, max: Option<i64>) -> Option<i64> {
    let Some(max) = max else {
        // no instance maximum; zero still means "unspecified"
        return requested.filter(|n| *n > 0);
    };
    match requested {
        Some(n) if n > 0 && n <= max => Some(n),
        Some(n) => {
            log::debug!("clamping requested limit {n} to instance maximum {max}");
            Some(max)
        }
        None => Some(max),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_clamping() {
        assert_eq!(effective_limit(Some(100), Some(50)), Some(50));
        assert_eq!(effective_limit(Some(0), Some(50)), Some(50));
        assert_eq!(effective_limit(None, Some(50)), Some(50));
        assert_eq!(effective_limit(Some(10), Some(50)), Some(10));
        assert_eq!(effective_limit(Some(10), None), Some(10));
        assert_eq!(effective_limit(Some(0), None), None);
        assert_eq!(effective_limit(None, None), None);
    }
}
