//! Composition root for the SAIA API.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use saia_models::TaskSetId;

use crate::config::ClientConfig;
use crate::error::ApiResult;
use crate::mtm_client::MtmClients;
use crate::person::Persons;
use crate::poller::TaskPoller;
use crate::product::Products;
use crate::queue::Queue;
use crate::sizechart::Sizecharts;
use crate::transport::HttpTransport;

/// SAIA API client.
///
/// Cheap to clone; all resource clients share one connection pool.
#[derive(Clone)]
pub struct SaiaClient {
    config: ClientConfig,
    persons: Persons,
    products: Products,
    sizecharts: Sizecharts,
    mtm_clients: MtmClients,
    queue: Arc<Queue>,
    poller: TaskPoller<Queue>,
}

impl SaiaClient {
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        let transport = HttpTransport::new(&config)?;
        let queue = Arc::new(Queue::new(transport.clone()));
        let poller = TaskPoller::new(Arc::clone(&queue), config.poll.clone());

        Ok(Self {
            persons: Persons::new(transport.clone()),
            products: Products::new(transport.clone()),
            sizecharts: Sizecharts::new(transport.clone()),
            mtm_clients: MtmClients::new(transport),
            queue,
            poller,
            config,
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> ApiResult<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn persons(&self) -> &Persons {
        &self.persons
    }

    pub fn products(&self) -> &Products {
        &self.products
    }

    pub fn sizecharts(&self) -> &Sizecharts {
        &self.sizecharts
    }

    pub fn mtm_clients(&self) -> &MtmClients {
        &self.mtm_clients
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn poller(&self) -> &TaskPoller<Queue> {
        &self.poller
    }

    /// Poll a task set with the configured interval and ceiling.
    pub async fn get_results(&self, task_set_id: &TaskSetId) -> ApiResult<Value> {
        self.poller.get_results(task_set_id, None).await
    }

    /// Poll a task set with an explicit interval.
    pub async fn get_results_every(
        &self,
        task_set_id: &TaskSetId,
        delay: Duration,
    ) -> ApiResult<Value> {
        self.poller.get_results(task_set_id, Some(delay)).await
    }

    /// Poll a task set until it settles or `cancel` fires.
    pub async fn get_results_with_cancel(
        &self,
        task_set_id: &TaskSetId,
        cancel: CancellationToken,
    ) -> ApiResult<Value> {
        self.poller
            .get_results_with_cancel(task_set_id, None, cancel)
            .await
    }
}
