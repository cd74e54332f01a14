//! Helpers for pulling identifiers out of `Location` headers.
//!
//! The API announces asynchronous work by pointing the `Location` header at
//! `.../queue/{taskset_id}/`, and announces a freshly available person at
//! `.../persons/{id}/`.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static TASK_SET_LOCATION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/queue/(.*)/").unwrap());

static PERSON_LOCATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/persons/(\d+)/").unwrap());

/// Errors raised while parsing a `Location` header.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("location does not point to a task set: {0}")]
    NotTaskSet(String),

    #[error("location does not point to a person: {0}")]
    NotPerson(String),
}

/// Extract the task-set id from a `.../queue/{id}/` location.
///
/// The capture is greedy up to the last slash, so nested paths such as
/// `/queue/a/b/` yield `a/b`.
pub fn extract_task_set_id(location: &str) -> Result<String, LocationError> {
    TASK_SET_LOCATION
        .captures(location)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| LocationError::NotTaskSet(location.to_string()))
}

/// Extract a numeric person id from a `.../persons/{id}/` location.
pub fn extract_person_id(location: &str) -> Result<u64, LocationError> {
    PERSON_LOCATION
        .captures(location)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .ok_or_else(|| LocationError::NotPerson(location.to_string()))
}

/// Minimal `{ "id": ... }` body returned by create endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdResponse {
    pub id: u64,
}
