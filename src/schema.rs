use std::collections::HashMap;

use crate::types::ModelName;

/// Shape of a single schema field.
#[derive(Debug, Clone)]
pub enum SchemaNode {
    Scalar,
    Reference(ModelName),
    List(Box<SchemaNode>),
    Embedded(Schema),
}

impl SchemaNode {
    #[must_use]
    pub fn reference(model: impl Into<String>) -> Self {
        Self::Reference(model.into())
    }

    #[must_use]
    pub fn list(element: SchemaNode) -> Self {
        Self::List(Box::new(element))
    }

    #[must_use]
    pub fn embedded(schema: Schema) -> Self {
        Self::Embedded(schema)
    }
}

/// What a dotted path resolves to in a schema.
#[derive(Debug, Clone, Copy)]
pub struct PathInfo<'a> {
    pub is_reference: bool,
    pub referenced_model: Option<&'a str>,
    pub is_list: bool,
    pub sub_schema: Option<&'a Schema>,
}

#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: HashMap<String, SchemaNode>,
}

impl Schema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn field(mut self, name: impl Into<String>, node: SchemaNode) -> Self {
        self.fields.insert(name.into(), node);
        self
    }

    /// Resolve a dotted path segment by segment, descending into embedded
    /// sub-schemas and transparently through list wrappers. Missing paths
    /// resolve to `None`, never an error.
    #[must_use]
    pub fn path_at(&self, path: &str) -> Option<PathInfo<'_>> {
        if path.is_empty() {
            return None;
        }
        let mut cur = self;
        let mut iter = path.split('.').peekable();
        while let Some(seg) = iter.next() {
            let (node, is_list) = unwrap_list(cur.fields.get(seg)?);
            if iter.peek().is_none() {
                return Some(match node {
                    SchemaNode::Reference(model) => PathInfo {
                        is_reference: true,
                        referenced_model: Some(model.as_str()),
                        is_list,
                        sub_schema: None,
                    },
                    SchemaNode::Embedded(schema) => PathInfo {
                        is_reference: false,
                        referenced_model: None,
                        is_list,
                        sub_schema: Some(schema),
                    },
                    _ => PathInfo {
                        is_reference: false,
                        referenced_model: None,
                        is_list,
                        sub_schema: None,
                    },
                });
            }
            match node {
                SchemaNode::Embedded(schema) => cur = schema,
                _ => return None,
            }
        }
        None
    }

    /// The model referenced at `path`, if that field (or its list element
    /// type) declares one.
    #[must_use]
    pub fn reference_at(&self, path: &str) -> Option<&str> {
        self.path_at(path).and_then(|info| info.referenced_model)
    }
}

// List wrappers are transparent for path resolution; an array of references
// resolves to the referenced model, not an array type.
fn unwrap_list(node: &SchemaNode) -> (&SchemaNode, bool) {
    let mut is_list = false;
    let mut cur = node;
    while let SchemaNode::List(inner) = cur {
        is_list = true;
        cur = inner;
    }
    (cur, is_list)
}

/// A named model: its schema plus the base model it specializes, if any.
#[derive(Debug, Clone)]
pub struct ModelSchema {
    pub name: ModelName,
    pub base: Option<ModelName>,
    pub schema: Schema,
}

impl ModelSchema {
    #[must_use]
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self { name: name.into(), base: None, schema }
    }

    #[must_use]
    pub fn specializes(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }
}
