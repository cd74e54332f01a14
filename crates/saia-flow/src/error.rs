//! Flow error types.

use thiserror::Error;

use saia_client::{ApiError, ErrorKind};
use saia_models::PersonId;

/// Result type for flow operations.
pub type FlowResult<T> = Result<T, FlowError>;

/// Errors raised by a measurement flow.
#[derive(Debug, Error)]
pub enum FlowError {
    /// Input rejected before any request was made.
    #[error("{0}")]
    Invalid(String),

    /// A request failed after the flow started.
    ///
    /// `fallback` is the person the service pointed at in the error
    /// response's `Location` header, if any. See
    /// [`MeasurementFlow::recover`](crate::MeasurementFlow::recover).
    #[error("{error}")]
    Interrupted {
        #[source]
        error: ApiError,
        fallback: Option<PersonId>,
    },

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Unexpected response: {0}")]
    Unexpected(String),

    #[error("Failed to decode person: {0}")]
    Decode(#[from] serde_json::Error),
}

impl FlowError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }

    /// Wrap an API error raised mid-flow, keeping any person it points at.
    pub fn interrupted(error: ApiError) -> Self {
        let fallback = error
            .location()
            .and_then(|location| PersonId::from_location(location).ok());
        Self::Interrupted { error, fallback }
    }

    /// Person to fall back to, when the failure named one.
    pub fn fallback(&self) -> Option<PersonId> {
        match self {
            FlowError::Interrupted { fallback, .. } => *fallback,
            _ => None,
        }
    }

    /// Underlying API error, if this came from the client.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            FlowError::Interrupted { error, .. } | FlowError::Api(error) => Some(error),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.api_error()
            .is_some_and(|e| e.kind() == ErrorKind::Cancelled)
    }
}
