use std::sync::Arc;

use bson::{Bson, Document as BsonDocument};

use crate::paths;
use crate::query::PopulateDirective;
use crate::registry::ModelRegistry;
use crate::types::{AccessLevel, FieldPath, ModelName};

/// What to filter a document as: the model whose rules apply, the caller's
/// access level, and the populate directives the query carried (so joined
/// documents are filtered under the referenced model's rules).
#[derive(Debug, Clone, Default)]
pub struct FilterOptions {
    pub access: AccessLevel,
    pub model: ModelName,
    pub populate: Vec<PopulateDirective>,
}

impl FilterOptions {
    #[must_use]
    pub fn new(model: impl Into<String>, access: AccessLevel) -> Self {
        Self { access, model: model.into(), populate: Vec::new() }
    }

    #[must_use]
    pub fn with_populate(mut self, populate: Vec<PopulateDirective>) -> Self {
        self.populate = populate;
        self
    }
}

/// Strips private/protected fields from documents according to the rules
/// registered per model. Missing models and paths are left alone; explicit
/// exclusion markers are always honored.
#[derive(Debug, Clone)]
pub struct VisibilityFilter {
    registry: Arc<ModelRegistry>,
}

impl VisibilityFilter {
    #[must_use]
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self { registry }
    }

    #[must_use]
    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// The field paths hidden from `access` on `model`.
    #[must_use]
    pub fn excluded_fields(&self, model: &str, access: AccessLevel) -> Vec<FieldPath> {
        self.registry.excluded_fields(model, access)
    }

    /// Remove every hidden field in place, recursively. Arrays of documents
    /// filter element-wise; dotted exclusion paths delete through arrays of
    /// sub-documents; populated relations filter under the referenced
    /// model's rules at the same access level. Idempotent.
    pub fn filter_document(&self, doc: &mut Bson, opts: &FilterOptions) {
        match doc {
            Bson::Array(items) => {
                for item in items {
                    self.filter_document(item, opts);
                }
            }
            Bson::Document(d) => self.filter_one(d, opts),
            _ => {}
        }
    }

    fn filter_one(&self, doc: &mut BsonDocument, opts: &FilterOptions) {
        for path in self.excluded_fields(&opts.model, opts.access) {
            if path.contains('.') {
                paths::delete_path(doc, &path);
            } else {
                doc.remove(&path);
            }
        }
        for directive in &opts.populate {
            if directive.path.is_empty() {
                continue;
            }
            // which model's rules govern the joined documents at this path
            let Some(referenced) = self.registry.resolve_reference(&opts.model, &directive.path)
            else {
                continue;
            };
            let sub_opts = FilterOptions::new(referenced, opts.access);
            if let Some(value) = paths::get_path_mut(doc, &directive.path) {
                self.filter_document(value, &sub_opts);
            } else if let Some((parent, leaf)) = directive.path.rsplit_once('.')
                && let Some(Bson::Array(items)) = paths::get_path_mut(doc, parent)
            {
                // the path names a field inside an array of sub-documents
                for item in items {
                    if let Bson::Document(d) = item
                        && let Some(value) = d.get_mut(leaf)
                    {
                        self.filter_document(value, &sub_opts);
                    }
                }
            }
        }
    }
}
