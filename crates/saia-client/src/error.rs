//! SAIA client error types.

use thiserror::Error;

/// Result type for SAIA client operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Coarse classification of [`ApiError`] for callers that only branch on kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing or malformed input, detected before any I/O.
    InvalidArgument,
    /// The service reported a failed task set.
    TaskFailed,
    /// Network or HTTP-level failure.
    Transport,
    /// Polling exceeded its configured ceiling.
    Timeout,
    /// The caller aborted polling.
    Cancelled,
    /// The service answered with something we could not interpret.
    Protocol,
    /// Client misconfiguration.
    Config,
}

/// Errors that can occur while talking to the SAIA API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("{}", describe_failed_sub_tasks(.failed_sub_tasks))]
    TaskFailed { failed_sub_tasks: Vec<String> },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Request failed with status {status}: {body}")]
    Http {
        status: u16,
        body: String,
        /// `Location` header of the error response, if any.
        location: Option<String>,
    },

    #[error("Polling timed out after {attempts} attempts ({elapsed_ms}ms)")]
    Timeout { attempts: u32, elapsed_ms: u64 },

    #[error("Polling cancelled")]
    Cancelled,

    #[error("Response has no task set location: {0}")]
    MissingLocation(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// One `Subtask failed: {id}` line per failed sub-task.
fn describe_failed_sub_tasks(ids: &[String]) -> String {
    ids.iter()
        .map(|id| format!("Subtask failed: {}\n", id))
        .collect()
}

impl ApiError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn task_failed(failed_sub_tasks: Vec<String>) -> Self {
        Self::TaskFailed { failed_sub_tasks }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build an error from a non-success HTTP response.
    pub fn from_http_status(status: u16, body: impl Into<String>, location: Option<String>) -> Self {
        Self::Http {
            status,
            body: body.into(),
            location,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            ApiError::TaskFailed { .. } => ErrorKind::TaskFailed,
            ApiError::Network(_) | ApiError::Http { .. } => ErrorKind::Transport,
            ApiError::Timeout { .. } => ErrorKind::Timeout,
            ApiError::Cancelled => ErrorKind::Cancelled,
            ApiError::MissingLocation(_) | ApiError::InvalidResponse(_) | ApiError::Json(_) => {
                ErrorKind::Protocol
            }
            ApiError::Config(_) => ErrorKind::Config,
        }
    }

    pub fn is_transport(&self) -> bool {
        self.kind() == ErrorKind::Transport
    }

    /// HTTP status code, when the error carries one.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            ApiError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.http_status() == Some(404)
    }

    /// `Location` header attached to an HTTP error response.
    pub fn location(&self) -> Option<&str> {
        match self {
            ApiError::Http { location, .. } => location.as_deref(),
            _ => None,
        }
    }

    /// Ids of failed sub-tasks for [`ApiError::TaskFailed`].
    pub fn failed_sub_tasks(&self) -> &[String] {
        match self {
            ApiError::TaskFailed { failed_sub_tasks } => failed_sub_tasks,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_failed_message_lists_each_sub_task() {
        let err = ApiError::task_failed(vec!["a".to_string(), "c".to_string()]);
        assert_eq!(err.to_string(), "Subtask failed: a\nSubtask failed: c\n");
        assert_eq!(err.kind(), ErrorKind::TaskFailed);
        assert_eq!(err.failed_sub_tasks().to_vec(), vec!["a", "c"]);
    }

    #[test]
    fn test_task_failed_without_sub_tasks_is_empty_message() {
        let err = ApiError::task_failed(Vec::new());
        assert_eq!(err.to_string(), "");
    }

    #[test]
    fn test_http_error_is_transport() {
        let err = ApiError::from_http_status(502, "bad gateway", None);
        assert!(err.is_transport());
        assert_eq!(err.http_status(), Some(502));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_http_error_keeps_location() {
        let err = ApiError::from_http_status(
            401,
            "unauthorized",
            Some("https://host/api/v2/persons/5/".to_string()),
        );
        assert_eq!(err.location(), Some("https://host/api/v2/persons/5/"));
    }

    #[test]
    fn test_kinds() {
        assert_eq!(ApiError::invalid_argument("id is not specified").kind(), ErrorKind::InvalidArgument);
        assert_eq!(ApiError::Cancelled.kind(), ErrorKind::Cancelled);
        assert_eq!(
            ApiError::Timeout { attempts: 3, elapsed_ms: 300 }.kind(),
            ErrorKind::Timeout
        );
        assert_eq!(ApiError::MissingLocation("x".into()).kind(), ErrorKind::Protocol);
        assert_eq!(ApiError::config("no key").kind(), ErrorKind::Config);
        assert_eq!(ApiError::Cancelled.http_status(), None);
    }
}
