//! Made-to-measure (MTM) client records.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::person::{Gender, MeasurementsType, PersonDetails};

/// Identifier of an MTM client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MtmClientId(pub u64);

impl fmt::Display for MtmClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for MtmClientId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Measurement unit preferred by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MtmUnit {
    Cm,
    In,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewMtmClient {
    pub unit: MtmUnit,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub widget_id: Option<u64>,
}

impl NewMtmClient {
    pub fn new(unit: MtmUnit) -> Self {
        Self {
            unit,
            first_name: None,
            last_name: None,
            phone: None,
            email: None,
            source: None,
            notes: None,
            widget_id: None,
        }
    }
}

/// Partial update of an MTM client.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MtmClientUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<MtmUnit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl MtmClientUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Person created under an MTM client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewMtmPerson {
    pub gender: Gender,
    pub height: u32,
    #[serde(flatten)]
    pub details: PersonDetails,
    #[serde(skip)]
    pub measurements_type: Option<MeasurementsType>,
}

impl NewMtmPerson {
    pub fn new(gender: Gender, height: u32) -> Self {
        Self {
            gender,
            height,
            details: PersonDetails::default(),
            measurements_type: None,
        }
    }

    /// Validate the payload.
    pub fn validate(&self) -> Result<(), String> {
        if self.height == 0 {
            return Err("height is not specified".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_client_body() {
        let mut client = NewMtmClient::new(MtmUnit::In);
        client.first_name = Some("Ada".to_string());
        client.widget_id = Some(3);

        assert_eq!(
            serde_json::to_value(&client).unwrap(),
            json!({"unit": "in", "first_name": "Ada", "widget_id": 3})
        );
    }

    #[test]
    fn test_update_is_empty() {
        assert!(MtmClientUpdate::default().is_empty());
        let update = MtmClientUpdate {
            notes: Some("VIP".to_string()),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}
