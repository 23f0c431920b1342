//! Error taxonomy for warehouse operations

use serde::{Deserialize, Serialize};

/// Errors produced while resolving a table name or talking to a warehouse.
///
/// These never abort an audit. Every check folds them into its own
/// result so that one failing side leaves the other checks running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum FetchError {
    /// A session could not be opened (bad credentials, unreachable host,
    /// missing connection parameter)
    #[error("Connection failed: {0}")]
    ConnectionFailure(String),

    /// The SQL statement failed (malformed identifier, permissions, types)
    #[error("Query failed: {0}")]
    QueryFailure(String),

    /// Table identifier with zero or more than three segments
    #[error("Invalid table name format: {0}")]
    InvalidFormat(String),

    /// Adapter or resolver is missing a setting it needs
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The warehouse answered with something we could not decode
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl FetchError {
    /// Short, stable name of the error category
    pub fn category(&self) -> &'static str {
        match self {
            Self::ConnectionFailure(_) => "connection_failure",
            Self::QueryFailure(_) => "query_failure",
            Self::InvalidFormat(_) => "invalid_format",
            Self::Configuration(_) => "configuration",
            Self::InvalidResponse(_) => "invalid_response",
        }
    }
}
