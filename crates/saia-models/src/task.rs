//! Task-set identifiers and queue status payloads.
//!
//! The queue endpoint answers with one of two shapes: an in-progress
//! task-set status, or the final resource once processing has finished.
//! [`QueuePayload`] decides which one it is at decode time.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::utils::{extract_task_set_id, LocationError};

/// Key whose presence marks a task-set status payload.
const STATUS_MARKER: &str = "is_successful";

/// Identifier of a group of asynchronous sub-tasks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskSetId(String);

impl TaskSetId {
    /// Create from an existing string.
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Parse from a `.../queue/{id}/` location header.
    pub fn from_location(location: &str) -> Result<Self, LocationError> {
        extract_task_set_id(location).map(Self)
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for TaskSetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TaskSetId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TaskSetId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Treat an explicit `null` like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Status of one unit of work inside a task set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubTaskStatus {
    pub task_id: String,
    /// Missing or null flags count as failures.
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_successful: bool,
    /// Anything else the service reports (name, status, message).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SubTaskStatus {
    pub fn new(task_id: impl Into<String>, is_successful: bool) -> Self {
        Self {
            task_id: task_id.into(),
            is_successful,
            extra: Map::new(),
        }
    }
}

/// Snapshot of a task set that is still tracked by the queue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskSetStatus {
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_ready: bool,
    #[serde(default)]
    pub is_successful: Option<bool>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sub_tasks: Vec<SubTaskStatus>,
}

impl TaskSetStatus {
    /// Ready and explicitly unsuccessful.
    pub fn is_failed(&self) -> bool {
        self.is_ready && self.is_successful == Some(false)
    }

    /// Sub-tasks flagged as failed, in the order the service listed them.
    pub fn failed_sub_tasks(&self) -> impl Iterator<Item = &SubTaskStatus> {
        self.sub_tasks.iter().filter(|task| !task.is_successful)
    }

    /// Ids of the failed sub-tasks.
    pub fn failed_task_ids(&self) -> Vec<String> {
        self.failed_sub_tasks()
            .map(|task| task.task_id.clone())
            .collect()
    }
}

/// Body of a queue status response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueuePayload {
    /// Task set is still tracked; carries its status.
    Pending(TaskSetStatus),
    /// Processing finished and the endpoint returned the resulting resource.
    Resource(Value),
}

impl QueuePayload {
    /// Classify a decoded JSON body.
    ///
    /// Any object that carries `is_successful` (even as `null`) is a task-set
    /// status; everything else is the final resource.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        let is_status = value
            .as_object()
            .is_some_and(|obj| obj.contains_key(STATUS_MARKER));

        if is_status {
            Ok(Self::Pending(serde_json::from_value(value)?))
        } else {
            Ok(Self::Resource(value))
        }
    }

    pub fn as_status(&self) -> Option<&TaskSetStatus> {
        match self {
            Self::Pending(status) => Some(status),
            Self::Resource(_) => None,
        }
    }

    pub fn is_resource(&self) -> bool {
        matches!(self, Self::Resource(_))
    }
}

impl<'de> Deserialize<'de> for QueuePayload {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(serde::de::Error::custom)
    }
}
