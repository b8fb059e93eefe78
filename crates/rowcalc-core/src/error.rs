//! Error types for rowcalc-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in rowcalc-core
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Output kind name not recognised
    #[error("Unknown output kind: {0}")]
    UnknownOutputKind(String),

    /// Date grouping name not recognised
    #[error("Unknown date grouping: {0}")]
    UnknownGrouping(String),
}
