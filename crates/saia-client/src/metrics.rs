//! SAIA client metrics.
//!
//! Provides standardized metrics for monitoring API usage:
//! - Request counters by operation and status
//! - Latency histograms
//! - Poll tick and outcome counters

use metrics::{counter, histogram};

// =============================================================================
// Metric Names
// =============================================================================

/// Metric name constants for consistency.
pub mod names {
    /// Total API requests by operation and status.
    pub const REQUESTS_TOTAL: &str = "saia_requests_total";

    /// Request latency in seconds by operation.
    pub const LATENCY_SECONDS: &str = "saia_request_latency_seconds";

    /// Status queries issued by the poller.
    pub const POLL_TICKS_TOTAL: &str = "saia_poll_ticks_total";

    /// Settled polling sessions by outcome.
    pub const POLL_OUTCOMES_TOTAL: &str = "saia_poll_outcomes_total";
}

// =============================================================================
// Recording Functions
// =============================================================================

/// Record metrics for a completed API request.
pub fn record_request(operation: &str, status: u16, latency_ms: f64) {
    counter!(
        names::REQUESTS_TOTAL,
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        names::LATENCY_SECONDS,
        "operation" => operation.to_string()
    )
    .record(latency_ms / 1000.0);
}

/// Record one status query issued by the poller.
pub fn record_poll_tick() {
    counter!(names::POLL_TICKS_TOTAL).increment(1);
}

/// Record how a polling session settled.
pub fn record_poll_outcome(outcome: &'static str) {
    counter!(names::POLL_OUTCOMES_TOTAL, "outcome" => outcome).increment(1);
}

// =============================================================================
// Tests
// =============================================================================
