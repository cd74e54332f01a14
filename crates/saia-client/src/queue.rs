//! Task-set status queries.

use async_trait::async_trait;
use reqwest::Method;
use tracing::debug;

use saia_models::{QueuePayload, TaskSetId};

use crate::error::{ApiError, ApiResult};
use crate::poller::StatusSource;
use crate::transport::HttpTransport;

/// Client for `queue/{id}/`.
#[derive(Clone)]
pub struct Queue {
    transport: HttpTransport,
}

impl Queue {
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    /// Fetch the current status of a task set, or the resulting resource
    /// once processing has finished.
    pub async fn get(&self, task_set_id: &TaskSetId) -> ApiResult<QueuePayload> {
        if task_set_id.is_empty() {
            return Err(ApiError::invalid_argument("id is not specified"));
        }

        let path = format!("queue/{}/", task_set_id);
        let request = self.transport.request(Method::GET, &path)?;
        let response = self.transport.execute("queue_get", request).await?;
        if response.is_empty() {
            return Err(ApiError::InvalidResponse(format!(
                "empty status body for task set {}",
                task_set_id
            )));
        }

        let payload: QueuePayload = response.json()?;
        debug!(
            task_set_id = %task_set_id,
            is_resource = payload.is_resource(),
            "Queue status fetched"
        );
        Ok(payload)
    }
}

#[async_trait]
impl StatusSource for Queue {
    async fn fetch_status(&self, task_set_id: &TaskSetId) -> ApiResult<QueuePayload> {
        self.get(task_set_id).await
    }
}
