pub mod errors;
pub mod logger;
pub mod paths;
pub mod query;
pub mod registry;
pub mod schema;
pub mod test_support;
pub mod types;
pub mod visibility;

use std::sync::Arc;

use bson::Bson;

use crate::errors::RestError;
use crate::query::{
    ExecOptions, PopulateDirective, QueryBuilder, QueryCompiler, QuerySpec, RawQuery,
};
use crate::registry::ModelRegistry;
use crate::types::AccessLevel;
use crate::visibility::{FilterOptions, VisibilityFilter};

/// Per-model instance options.
#[derive(Debug, Clone, Default)]
pub struct ResourceOptions {
    pub allow_regex: bool,
    pub max_limit: Option<i64>,
    pub read_preference: Option<String>,
    pub lean: Option<bool>,
}

/// One served model: compiles its query strings, applies them to a database
/// query builder and filters results for the caller's access level. The
/// model registry is built once at setup and shared between resources.
pub struct Resource {
    model: String,
    compiler: QueryCompiler,
    visibility: VisibilityFilter,
    exec_options: ExecOptions,
}

impl Resource {
    pub fn new(
        model: impl Into<String>,
        registry: Arc<ModelRegistry>,
        options: ResourceOptions,
    ) -> Self {
        Self {
            model: model.into(),
            compiler: QueryCompiler::new(options.allow_regex),
            visibility: VisibilityFilter::new(registry),
            exec_options: ExecOptions {
                max_limit: options.max_limit,
                read_preference: options.read_preference,
                lean: options.lean,
            },
        }
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Compile raw query-string parameters into a query specification.
    ///
    /// # Errors
    /// `InvalidQuerySyntax` or `RegexNotAllowed`, reporting the offending
    /// parameter; no partial spec is produced.
    pub fn compile(&self, raw: &RawQuery) -> Result<QuerySpec, RestError> {
        self.compiler.compile(raw)
    }

    /// Apply a compiled spec to a query builder and execute it under this
    /// resource's instance options.
    ///
    /// # Errors
    /// Whatever the builder's terminal execution reports.
    pub async fn execute<B: QueryBuilder>(
        &self,
        builder: B,
        spec: &QuerySpec,
    ) -> Result<B::Output, RestError> {
        query::apply(builder, spec, &self.exec_options).await
    }

    /// Strip fields hidden from `access` out of a result document (or array
    /// of documents), following populate directives into joined documents.
    pub fn filter_output(
        &self,
        doc: &mut Bson,
        access: AccessLevel,
        populate: &[PopulateDirective],
    ) {
        let opts =
            FilterOptions::new(self.model.as_str(), access).with_populate(populate.to_vec());
        self.visibility.filter_document(doc, &opts);
    }

    /// Full request pipeline: compile the query string, run it, filter the
    /// result for the caller's access level.
    ///
    /// # Errors
    /// Compilation errors, or whatever the builder's execution reports.
    pub async fn handle<B>(
        &self,
        builder: B,
        raw: &RawQuery,
        access: AccessLevel,
    ) -> Result<Bson, RestError>
    where
        B: QueryBuilder<Output = Bson>,
    {
        let spec = self.compile(raw)?;
        let mut result = self.execute(builder, &spec).await?;
        self.filter_output(&mut result, access, &spec.populate);
        Ok(result)
    }
}
