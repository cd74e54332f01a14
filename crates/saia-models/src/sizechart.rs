//! Brand size chart lookups.

use serde::{Deserialize, Serialize};

use crate::person::Gender;
use crate::product::validate_girths;

/// Query for a brand's size chart, sent as URL parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizechartQuery {
    pub gender: Gender,
    pub hips: f64,
    pub chest: f64,
    pub waist: f64,
    /// e.g. `top` or `bottom`.
    pub body_part: String,
    pub brand: String,
}

impl SizechartQuery {
    /// Validate the query.
    pub fn validate(&self) -> Result<(), String> {
        validate_girths(self.hips, self.chest, self.waist)?;

        if self.body_part.trim().is_empty() {
            return Err("body_part is not specified".to_string());
        }

        if self.brand.trim().is_empty() {
            return Err("brand is not specified".to_string());
        }

        Ok(())
    }
}
