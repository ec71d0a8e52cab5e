//! Model document read errors.

/// Errors raised while parsing and validating a model document.
///
/// All of these reject the model at load time; none are recoverable.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    /// A required constructor parameter is absent.
    #[error("missing required field [{0}]")]
    MissingField(&'static str),

    /// The document is structurally present but inconsistent.
    #[error("invalid model document: {0}")]
    Validation(String),

    /// The document is not valid JSON for the schema.
    #[error("malformed model document")]
    Json(#[from] serde_json::Error),
}
