use serde::{Deserialize, Serialize};

pub type ModelName = String;
pub type FieldPath = String;

/// Caller trust tier controlling which fields of a document are returned.
///
/// `Private` access sees everything; `Protected` sees everything except
/// private-flagged fields; `Public` additionally loses protected-flagged
/// fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    #[default]
    Public,
    Protected,
    Private,
}
