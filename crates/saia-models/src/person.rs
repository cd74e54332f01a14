//! Person models: creation payloads, update patches and measurement records.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::image::ImageData;
use crate::task::TaskSetId;
use crate::utils::extract_person_id;
use crate::LocationError;

/// Numeric person identifier assigned by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(pub u64);

impl PersonId {
    /// Parse from a `.../persons/{id}/` location header.
    pub fn from_location(location: &str) -> Result<Self, LocationError> {
        extract_person_id(location).map(Self)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for PersonId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the photos were taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhotoFlow {
    /// Someone else held the phone.
    Friend,
    /// The person held the phone.
    Hand,
}

/// Kind of measurements to compute, e.g. `all`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeasurementsType(String);

impl MeasurementsType {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn all() -> Self {
        Self("all".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Device orientation in degrees while a photo was taken.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevicePosition {
    /// Front-to-back tilt, -180..180.
    pub beta_x: f64,
    /// Left-to-right tilt, -90..90.
    pub gamma_y: f64,
    /// Rotation around z, 0..360.
    pub alpha_z: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceCoordinates {
    pub front_photo: DevicePosition,
    pub side_photo: DevicePosition,
}

/// Optional fields shared by create and update payloads.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PersonDetails {
    /// Base64 data URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub front_image: Option<String>,
    /// Base64 data URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side_image: Option<String>,
    /// Weight in kg.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_top_border: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_bottom_border: Option<f64>,
    #[serde(rename = "phone_position", skip_serializing_if = "Option::is_none")]
    pub device_coordinates: Option<DeviceCoordinates>,
    #[serde(rename = "photo_flow", skip_serializing_if = "Option::is_none")]
    pub photo_flow: Option<PhotoFlow>,
}

impl PersonDetails {
    /// Attach both photos, encoded as data URLs.
    pub fn with_images(mut self, front: &ImageData, side: &ImageData) -> Self {
        self.front_image = Some(front.to_data_url());
        self.side_image = Some(side.to_data_url());
        self
    }

    pub fn has_images(&self) -> bool {
        self.front_image.is_some() || self.side_image.is_some()
    }
}

/// Query parameters controlling what gets calculated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalculationOptions {
    pub measurements_type: Option<MeasurementsType>,
    pub virtual_try_on: bool,
    /// Product sku used for virtual try-on.
    pub product_sku: Option<String>,
}

impl CalculationOptions {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(kind) = &self.measurements_type {
            pairs.push(("measurements_type", kind.as_str().to_string()));
        }
        if self.virtual_try_on {
            pairs.push(("virtual_tryon", "true".to_string()));
        }
        if let Some(sku) = &self.product_sku {
            pairs.push(("product_sku", sku.clone()));
        }
        pairs
    }
}

/// Payload for creating a person.
///
/// Without photos the service answers with the new person's id; with
/// photos it enqueues a calculation and answers with a task set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewPerson {
    pub gender: Gender,
    /// Height in cm.
    pub height: u32,
    #[serde(flatten)]
    pub details: PersonDetails,
    #[serde(skip)]
    pub options: CalculationOptions,
}

impl NewPerson {
    pub fn new(gender: Gender, height: u32) -> Self {
        Self {
            gender,
            height,
            details: PersonDetails::default(),
            options: CalculationOptions::default(),
        }
    }

    pub fn with_images(mut self, front: &ImageData, side: &ImageData) -> Self {
        self.details = self.details.with_images(front, side);
        self
    }

    pub fn with_options(mut self, options: CalculationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn has_images(&self) -> bool {
        self.details.has_images()
    }

    /// Validate the payload.
    pub fn validate(&self) -> Result<(), String> {
        if self.height == 0 {
            return Err("height is not specified".to_string());
        }
        Ok(())
    }
}

/// Partial update of a person.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PersonUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(flatten)]
    pub details: PersonDetails,
}

impl PersonUpdate {
    /// Validate the patch. At least one of gender, height or a photo is required.
    pub fn validate(&self) -> Result<(), String> {
        if self.gender.is_none()
            && self.height.is_none()
            && self.details.front_image.is_none()
            && self.details.side_image.is_none()
        {
            return Err("params is empty".to_string());
        }
        Ok(())
    }
}

/// Outcome of creating a person.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreatedPerson {
    /// Metadata only; the person exists right away.
    Created(PersonId),
    /// Photos were submitted and a calculation was enqueued.
    Queued(TaskSetId),
}

impl CreatedPerson {
    pub fn task_set_id(&self) -> Option<&TaskSetId> {
        match self {
            CreatedPerson::Queued(id) => Some(id),
            CreatedPerson::Created(_) => None,
        }
    }
}

/// Girths for one projection, in cm.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BodyParams {
    #[serde(default)]
    pub chest: Option<f64>,
    #[serde(default)]
    pub waist: Option<f64>,
    #[serde(default)]
    pub hips: Option<f64>,
    /// Every other measurement the service computed.
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualTryOn {
    pub id: u64,
    pub product_sku: String,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub image: Option<String>,
}

/// Person record as returned by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub front_params: Option<BodyParams>,
    #[serde(default)]
    pub side_params: Option<BodyParams>,
    #[serde(default)]
    pub volume_params: Option<BodyParams>,
    #[serde(default)]
    pub virtual_tryons: Option<Vec<VirtualTryOn>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Person {
    /// True once front, side and volume measurements are all present.
    pub fn has_measurements(&self) -> bool {
        self.front_params.is_some() && self.side_params.is_some() && self.volume_params.is_some()
    }
}
