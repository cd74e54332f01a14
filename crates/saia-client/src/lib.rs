//! Client for the SAIA body-measurement API.
//!
//! This crate provides:
//! - An authenticated HTTP transport with tracing spans and metrics
//! - Resource clients for persons, products, size charts and MTM clients
//! - A task-set poller that waits for asynchronous calculations
//! - Cancellation and optional timeout/attempt ceilings for polling

pub mod client;
pub mod config;
pub mod error;
pub mod metrics;
pub mod mtm_client;
pub mod person;
pub mod poller;
pub mod product;
pub mod queue;
pub mod sizechart;
pub mod transport;

pub use client::SaiaClient;
pub use config::{ClientConfig, PollConfig, DEFAULT_POLL_INTERVAL};
pub use error::{ApiError, ApiResult, ErrorKind};
pub use mtm_client::MtmClients;
pub use person::Persons;
pub use poller::{PollHandle, StatusSource, TaskPoller};
pub use product::Products;
pub use queue::Queue;
pub use sizechart::Sizecharts;
pub use transport::{ApiResponse, HttpTransport};

pub use tokio_util::sync::CancellationToken;
