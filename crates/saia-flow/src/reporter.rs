//! User-facing progress reporting.

use std::fmt;

use async_trait::async_trait;
use tracing::{info, warn};

use saia_models::{PersonId, TaskSetId};

/// Stage a flow has reached.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowStatus {
    Starting,
    GettingResults { task_set_id: TaskSetId },
    Completed { person_id: PersonId },
    Failed { message: String },
}

impl FlowStatus {
    /// Short human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            FlowStatus::Starting => "Starting",
            FlowStatus::GettingResults { .. } => "Getting results",
            FlowStatus::Completed { .. } => "Completed",
            FlowStatus::Failed { .. } => "Failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, FlowStatus::Completed { .. } | FlowStatus::Failed { .. })
    }
}

impl fmt::Display for FlowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Receives status updates as a flow progresses.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatusReporter: Send + Sync {
    async fn report(&self, status: FlowStatus);
}

/// Discards all updates.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentReporter;

#[async_trait]
impl StatusReporter for SilentReporter {
    async fn report(&self, _status: FlowStatus) {}
}

/// Emits updates as tracing events.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

#[async_trait]
impl StatusReporter for LogReporter {
    async fn report(&self, status: FlowStatus) {
        match &status {
            FlowStatus::Starting => info!(status = %status, "Measurement flow status"),
            FlowStatus::GettingResults { task_set_id } => {
                info!(status = %status, task_set_id = %task_set_id, "Measurement flow status")
            }
            FlowStatus::Completed { person_id } => {
                info!(status = %status, person_id = %person_id, "Measurement flow status")
            }
            FlowStatus::Failed { message } => {
                warn!(status = %status, error = %message, "Measurement flow status")
            }
        }
    }
}
