use thiserror::Error;

#[derive(Debug, Error)]
pub enum RestError {
    #[error("invalid JSON in `{key}` parameter: {reason}")]
    InvalidQuerySyntax { key: &'static str, reason: String },

    #[error("regex filters are not allowed")]
    RegexNotAllowed,

    #[error("query execution error: {0}")]
    Exec(String),
}

impl RestError {
    pub(crate) fn bad_syntax(key: &'static str, err: impl std::fmt::Display) -> Self {
        Self::InvalidQuerySyntax { key, reason: err.to_string() }
    }
}
