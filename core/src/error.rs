//! Error types for request construction, filter dispatch and validation.
//!
//! # Design
//! Path parameter problems get dedicated variants because their messages are
//! part of the contract: callers see exactly which values were redundant or
//! which placeholders stayed undefined. Transport failures carry the
//! underlying message only, so any `Transport` implementation can produce
//! them. Filter errors are never wrapped; whatever a filter returns reaches
//! the caller unchanged.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// More path parameter values were supplied than the template can use.
    #[error(
        "Path parameters were not correctly defined. Redundant path parameters are: {}.",
        .0.join(", ")
    )]
    RedundantPathParams(Vec<String>),

    /// Placeholders remained without a value at dispatch.
    #[error(
        "Invalid number of path parameters. Expected {expected}, was {actual}. Undefined path parameters are: {}.",
        .undefined.join(", ")
    )]
    UndefinedPathParams {
        expected: usize,
        actual: usize,
        undefined: Vec<String>,
    },

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("invalid URL '{0}'")]
    InvalidUrl(String),

    /// The transport could not complete the round-trip.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML path error: {0}")]
    XmlPath(#[from] xml_path::XmlPathError),

    #[error("authentication failed: {0}")]
    Authentication(String),

    /// A response expectation did not hold.
    #[error("{0}")]
    Assertion(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
