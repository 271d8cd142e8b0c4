use std::collections::HashMap;

use crate::schema::ModelSchema;
use crate::types::{AccessLevel, FieldPath, ModelName};

// Hierarchy walks are bounded; deeper chains stop contributing.
const MAX_HIERARCHY_DEPTH: usize = 32;

/// Field paths hidden per access level for one model. `private` paths are
/// hidden from protected and public access; `protected` paths from public
/// access only. Ordered and duplicate-free.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilteredKeys {
    pub private: Vec<FieldPath>,
    pub protected: Vec<FieldPath>,
}

impl FilteredKeys {
    #[must_use]
    pub fn new(private: &[&str], protected: &[&str]) -> Self {
        let mut out = Self::default();
        for key in private {
            push_unique(&mut out.private, key);
        }
        for key in protected {
            push_unique(&mut out.protected, key);
        }
        out
    }

    fn union(&mut self, other: &FilteredKeys) {
        for key in &other.private {
            push_unique(&mut self.private, key);
        }
        for key in &other.protected {
            push_unique(&mut self.protected, key);
        }
    }
}

fn push_unique(list: &mut Vec<FieldPath>, key: &str) {
    if !list.iter().any(|k| k == key) {
        list.push(key.to_string());
    }
}

#[derive(Debug, Clone)]
pub struct ModelEntry {
    pub filtered: FilteredKeys,
    pub model: ModelSchema,
}

/// Name-keyed model registry, populated once at service setup and read-only
/// afterwards. Lookups never mutate; share it behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: HashMap<ModelName, ModelEntry>,
}

impl ModelRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model. Filtered keys of every already-registered ancestor
    /// and descendant are unioned into the new entry before it is stored,
    /// so registration order matters: registering a base model after its
    /// specializations pulls their exclusions upward.
    pub fn register(&mut self, model: ModelSchema, filtered: FilteredKeys) {
        let mut merged = filtered;
        let mut base = model.base.clone();
        let mut hops = 0;
        while let Some(name) = base {
            if hops >= MAX_HIERARCHY_DEPTH {
                break;
            }
            hops += 1;
            match self.models.get(&name) {
                Some(entry) => {
                    merged.union(&entry.filtered);
                    base = entry.model.base.clone();
                }
                None => break,
            }
        }
        for entry in self.models.values() {
            if self.inherits_from(&entry.model, &model.name) {
                merged.union(&entry.filtered);
            }
        }
        self.models.insert(model.name.clone(), ModelEntry { filtered: merged, model });
    }

    fn inherits_from(&self, model: &ModelSchema, ancestor: &str) -> bool {
        let mut base = model.base.as_deref();
        let mut hops = 0;
        while let Some(name) = base {
            if name == ancestor {
                return true;
            }
            hops += 1;
            if hops >= MAX_HIERARCHY_DEPTH {
                return false;
            }
            base = self.models.get(name).and_then(|e| e.model.base.as_deref());
        }
        false
    }

    #[must_use]
    pub fn contains(&self, model: &str) -> bool {
        self.models.contains_key(model)
    }

    #[must_use]
    pub fn get(&self, model: &str) -> Option<&ModelEntry> {
        self.models.get(model)
    }

    #[must_use]
    pub fn filtered_keys(&self, model: &str) -> Option<&FilteredKeys> {
        self.models.get(model).map(|e| &e.filtered)
    }

    /// The field paths to strip for `model` at `access`. Unknown models have
    /// nothing registered to strip.
    #[must_use]
    pub fn excluded_fields(&self, model: &str, access: AccessLevel) -> Vec<FieldPath> {
        let Some(entry) = self.models.get(model) else {
            return Vec::new();
        };
        match access {
            AccessLevel::Private => Vec::new(),
            AccessLevel::Protected => entry.filtered.private.clone(),
            AccessLevel::Public => {
                let mut out = entry.filtered.private.clone();
                for key in &entry.filtered.protected {
                    push_unique(&mut out, key);
                }
                out
            }
        }
    }

    /// Which model the dotted `path` on `model` references, if any.
    #[must_use]
    pub fn resolve_reference(&self, model: &str, path: &str) -> Option<&str> {
        self.models.get(model)?.model.schema.reference_at(path)
    }
}
