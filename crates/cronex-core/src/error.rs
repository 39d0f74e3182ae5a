//! Error types for cron expression compilation.

use thiserror::Error;

/// Errors that can occur while compiling a cron expression.
///
/// Only construction can fail. Date queries are total: the absence of a
/// matching instant is reported as `None`, never as an error.
#[derive(Error, Debug)]
pub enum CronexError {
    /// The expression as a whole is malformed (empty input, wrong field count).
    #[error("invalid cron expression: {0}")]
    InvalidExpression(String),

    /// A single field failed to parse or holds an out-of-range value.
    #[error("invalid {field} field: {message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },

    /// The timezone name is not a known IANA identifier.
    #[error("invalid timezone: {0}")]
    InvalidTimezone(String),

    /// The fixed UTC offset cannot be represented.
    #[error("invalid UTC offset: {0} minutes")]
    InvalidOffset(i32),

    /// Strict mode rejected the expression because of parser warnings.
    #[error("strict mode: parsing failed with {count} warning(s)")]
    StrictWarnings { count: usize },
}

/// Convenience alias used throughout cronex-core.
pub type Result<T> = std::result::Result<T, CronexError>;
