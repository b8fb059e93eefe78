//! Formula error types

use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur while compiling a formula
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FormulaError {
    /// Tokenization error
    #[error("Lex error at {position}: {message}")]
    Lex { position: usize, message: String },

    /// Formula parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Unknown function (strict mode only)
    #[error("Unknown function: {0}")]
    UnknownFunction(String),
}
