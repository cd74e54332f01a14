//! Measurement flow for the SAIA SDK.
//!
//! Ties the client together into one call: validate the input, create the
//! person with photos, wait for the calculation and decode the record.
//! Progress goes to a [`StatusReporter`].

pub mod error;
pub mod flow;
pub mod logging;
pub mod reporter;

pub use error::{FlowError, FlowResult};
pub use flow::{FlowInput, Girths, MeasurementFlow, MeasurementSummary, Measurements};
pub use logging::{init_tracing, FlowLogger};
pub use reporter::{FlowStatus, LogReporter, SilentReporter, StatusReporter};
