use thiserror::Error;

/// Errors that can occur while loading, storing or exchanging rules.
///
/// Parsing, filtering and validation never produce these; they report
/// problems through their return values instead.
#[derive(Error, Debug)]
pub enum ScrubError {
    /// IO error (file not found, permission denied, etc.).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error from an invalid export file or stored value.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// SQLite database error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Invalid command-line arguments or configuration.
    #[error("{0}")]
    InvalidArgs(String),

    /// A rule set failed validation and was not saved.
    #[error("Invalid rule set: {0}")]
    InvalidRules(String),

    /// No rule with the given id exists.
    #[error("Rule not found: {0}")]
    RuleNotFound(String),
}

/// Convenience result type for curlscrub operations.
pub type Result<T> = std::result::Result<T, ScrubError>;
