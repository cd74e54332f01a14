//! Product size recommendation queries.

use serde::{Deserialize, Serialize};

use crate::person::Gender;

/// Query for the legacy `product/get-size` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeQuery {
    pub height: u32,
    pub gender: Gender,
    /// Volume girths in cm.
    pub hips: f64,
    pub chest: f64,
    pub waist: f64,
    /// Product page url.
    pub url: String,
}

impl SizeQuery {
    /// Validate the query.
    pub fn validate(&self) -> Result<(), String> {
        if self.height == 0 {
            return Err("height is not specified".to_string());
        }
        validate_girths(self.hips, self.chest, self.waist)?;
        validate_url(&self.url)
    }
}

/// Query for the `size/recommendation` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationQuery {
    pub gender: Gender,
    pub hips: f64,
    pub chest: f64,
    pub waist: f64,
    pub url: String,
}

impl RecommendationQuery {
    /// Validate the query.
    pub fn validate(&self) -> Result<(), String> {
        validate_girths(self.hips, self.chest, self.waist)?;
        validate_url(&self.url)
    }
}

pub(crate) fn validate_girths(hips: f64, chest: f64, waist: f64) -> Result<(), String> {
    for (name, value) in [("hips", hips), ("chest", chest), ("waist", waist)] {
        if value.is_nan() || value <= 0.0 {
            return Err(format!("{} is not specified", name));
        }
    }
    Ok(())
}

fn validate_url(url: &str) -> Result<(), String> {
    if url.trim().is_empty() {
        return Err("url is not specified".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query() -> SizeQuery {
        SizeQuery {
            height: 173,
            gender: Gender::Female,
            hips: 89.0,
            chest: 87.0,
            waist: 73.0,
            url: "https://saia.3dlook.me/test-product".to_string(),
        }
    }

    #[test]
    fn test_valid_size_query() {
        assert!(query().validate().is_ok());
    }

    #[test]
    fn test_size_query_reports_first_missing_field() {
        let mut q = query();
        q.chest = 0.0;
        assert_eq!(q.validate(), Err("chest is not specified".to_string()));

        let mut q = query();
        q.height = 0;
        assert_eq!(q.validate(), Err("height is not specified".to_string()));

        let mut q = query();
        q.url = String::new();
        assert_eq!(q.validate(), Err("url is not specified".to_string()));
    }

    #[test]
    fn test_recommendation_rejects_nan() {
        let q = RecommendationQuery {
            gender: Gender::Male,
            hips: f64::NAN,
            chest: 100.0,
            waist: 90.0,
            url: "https://shop/item".to_string(),
        };
        assert_eq!(q.validate(), Err("hips is not specified".to_string()));
    }
}
