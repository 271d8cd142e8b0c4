// Test doubles for the query-builder interface, shared by unit and
// integration tests.

use bson::{Bson, Document as BsonDocument};

use crate::errors::RestError;
use crate::query::{PopulateDirective, QueryBuilder, QueryOp, Sort};

/// Everything `apply` pushed into a builder, in call order where it matters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppliedQuery {
    pub criteria: Option<BsonDocument>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub sort: Option<Sort>,
    pub populate: Vec<PopulateDirective>,
    pub select: Option<BsonDocument>,
    pub distinct: Option<String>,
    pub read_preference: Option<String>,
    pub lean: Option<bool>,
}

/// Records every builder call; `exec` returns the record.
#[derive(Debug, Clone, Default)]
pub struct RecordingBuilder {
    op: QueryOp,
    applied: AppliedQuery,
}

impl RecordingBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_op(op: QueryOp) -> Self {
        Self { op, applied: AppliedQuery::default() }
    }
}

impl QueryBuilder for RecordingBuilder {
    type Output = AppliedQuery;

    fn criteria(mut self, filter: BsonDocument) -> Self {
        self.applied.criteria = Some(filter);
        self
    }

    fn skip(mut self, n: i64) -> Self {
        self.applied.skip = Some(n);
        self
    }

    fn limit(mut self, n: i64) -> Self {
        self.applied.limit = Some(n);
        self
    }

    fn sort(mut self, sort: Sort) -> Self {
        self.applied.sort = Some(sort);
        self
    }

    fn populate(mut self, directive: PopulateDirective) -> Self {
        self.applied.populate.push(directive);
        self
    }

    fn select(mut self, projection: BsonDocument) -> Self {
        self.applied.select = Some(projection);
        self
    }

    fn distinct(mut self, field: &str) -> Self {
        self.applied.distinct = Some(field.to_string());
        self
    }

    fn read_preference(mut self, preference: &str) -> Self {
        self.applied.read_preference = Some(preference.to_string());
        self
    }

    fn lean(mut self, enabled: bool) -> Self {
        self.applied.lean = Some(enabled);
        self
    }

    fn op(&self) -> QueryOp {
        self.op
    }

    async fn exec(self) -> Result<AppliedQuery, RestError> {
        Ok(self.applied)
    }
}

/// Returns a canned result from `exec`; ignores every clause.
#[derive(Debug, Clone)]
pub struct StaticBuilder {
    result: Bson,
}

impl StaticBuilder {
    #[must_use]
    pub fn new(result: Bson) -> Self {
        Self { result }
    }
}

impl QueryBuilder for StaticBuilder {
    type Output = Bson;

    fn criteria(self, _filter: BsonDocument) -> Self {
        self
    }

    fn skip(self, _n: i64) -> Self {
        self
    }

    fn limit(self, _n: i64) -> Self {
        self
    }

    fn sort(self, _sort: Sort) -> Self {
        self
    }

    fn populate(self, _directive: PopulateDirective) -> Self {
        self
    }

    fn select(self, _projection: BsonDocument) -> Self {
        self
    }

    fn distinct(self, _field: &str) -> Self {
        self
    }

    fn read_preference(self, _preference: &str) -> Self {
        self
    }

    fn lean(self, _enabled: bool) -> Self {
        self
    }

    async fn exec(self) -> Result<Bson, RestError> {
        Ok(self.result)
    }
}
