//! Error types for fleet backend operations.

use thiserror::Error;

/// Result type alias for fleet operations.
pub type FleetResult<T> = Result<T, FleetError>;

/// Errors returned by a [`FleetClient`](crate::FleetClient).
#[derive(Debug, Error)]
pub enum FleetError {
    /// The load balancer or instance does not exist (HTTP 404).
    #[error("resource not found")]
    NotFound,

    /// The configured credentials were rejected (HTTP 403).
    #[error("forbidden: the backend rejected the configured credentials")]
    Forbidden,

    /// Any other non-success status code.
    #[error("unexpected backend response, http status code: '{0}'")]
    Unknown(u16),

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body could not be decoded.
    #[error("could not decode backend response: {0}")]
    Decode(String),

    /// The run context was already done when the call was issued.
    #[error("run cancelled or deadline exceeded")]
    Cancelled,
}

impl FleetError {
    /// Whether this error means the resource is already gone.
    pub fn is_not_found(&self) -> bool {
        matches!(self, FleetError::NotFound)
    }
}

impl From<reqwest::Error> for FleetError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            FleetError::Decode(e.to_string())
        } else {
            FleetError::Transport(e.to_string())
        }
    }
}
