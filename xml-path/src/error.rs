//! Error types for XML path evaluation.

use thiserror::Error;

/// Errors returned while parsing a document or evaluating a path against it.
#[derive(Debug, Error)]
pub enum XmlPathError {
    /// The input is not well-formed XML.
    #[error("failed to parse XML: {0}")]
    Parse(#[from] roxmltree::Error),

    /// The path expression could not be parsed or cannot be applied.
    #[error("invalid XML path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },
}

impl XmlPathError {
    pub(crate) fn invalid_path(path: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}
