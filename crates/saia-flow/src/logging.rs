//! Tracing bootstrap and structured flow logging.

use tracing::{error, info, warn, Span};
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_FILTER: &str = "saia_client=info,saia_flow=info";

/// Install a global subscriber.
///
/// `LOG_FORMAT=json` selects JSON output, anything else colored text.
/// `RUST_LOG` overrides the default filter.
pub fn init_tracing() -> Result<(), TryInitError> {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .try_init()
    }
}

/// Lifecycle logger for one flow run.
#[derive(Debug, Clone)]
pub struct FlowLogger {
    operation: String,
    subject: String,
}

impl FlowLogger {
    /// `subject` identifies what the flow works on, e.g. a task set id.
    pub fn new(operation: &str, subject: &str) -> Self {
        Self {
            operation: operation.to_string(),
            subject: subject.to_string(),
        }
    }

    /// Same operation, new subject.
    pub fn with_subject(&self, subject: &str) -> Self {
        Self::new(&self.operation, subject)
    }

    pub fn log_start(&self, message: &str) {
        info!(
            operation = %self.operation,
            subject = %self.subject,
            "Flow started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            operation = %self.operation,
            subject = %self.subject,
            "Flow progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            operation = %self.operation,
            subject = %self.subject,
            "Flow warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            operation = %self.operation,
            subject = %self.subject,
            "Flow error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            operation = %self.operation,
            subject = %self.subject,
            "Flow completed: {}", message
        );
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "saia_flow",
            operation = %self.operation,
            subject = %self.subject
        )
    }
}
