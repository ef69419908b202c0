//! Contrail client errors

use thiserror::Error;

/// Errors that can occur when interacting with the Contrail configuration API
#[derive(Debug, Error)]
pub enum ContrailError {
    /// HTTP request/response error (includes transport timeouts)
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    /// Contrail API returned an unexpected status
    #[error("Contrail API error: {0}")]
    Api(String),

    /// JSON serialization/deserialization error
    #[error("Serialization failed")]
    Serialization(#[from] serde_json::Error),

    /// Authentication failed (missing or rejected token)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Resource already exists or is still referenced
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Invalid request (e.g., malformed subnet, unresolvable reference)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ContrailError {
    /// Whether this error means the requested object does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, ContrailError::NotFound(_))
    }

    /// Whether this error is a create/delete conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, ContrailError::Conflict(_))
    }
}
