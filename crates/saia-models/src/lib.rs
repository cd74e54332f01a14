//! Shared data models for the SAIA SDK.
//!
//! This crate provides Serde-serializable types for:
//! - Task-set identifiers and queue status payloads
//! - Person creation, update and measurement records
//! - Product and size chart recommendation queries
//! - Made-to-measure (MTM) client records
//! - Image payload encoding

pub mod image;
pub mod mtm_client;
pub mod person;
pub mod product;
pub mod sizechart;
pub mod task;
pub mod utils;

// Re-export common types
pub use image::ImageData;
pub use mtm_client::{MtmClientId, MtmClientUpdate, MtmUnit, NewMtmClient, NewMtmPerson};
pub use person::{
    BodyParams, CalculationOptions, CreatedPerson, DeviceCoordinates, DevicePosition, Gender,
    MeasurementsType, NewPerson, Person, PersonDetails, PersonId, PersonUpdate, PhotoFlow,
    VirtualTryOn,
};
pub use product::{RecommendationQuery, SizeQuery};
pub use sizechart::SizechartQuery;
pub use task::{QueuePayload, SubTaskStatus, TaskSetId, TaskSetStatus};
pub use utils::{IdResponse, LocationError};
