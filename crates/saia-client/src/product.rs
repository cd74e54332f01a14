//! Product size recommendations.

use reqwest::Method;
use serde_json::Value;

use saia_models::{RecommendationQuery, SizeQuery};

use crate::error::{ApiError, ApiResult};
use crate::transport::HttpTransport;

/// Client for `products/`.
#[derive(Clone)]
pub struct Products {
    transport: HttpTransport,
}

impl Products {
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    /// Size for a product page, using the legacy recommendation method.
    pub async fn get_size(&self, query: &SizeQuery) -> ApiResult<Value> {
        query.validate().map_err(ApiError::InvalidArgument)?;

        let request = self
            .transport
            .request(Method::POST, "products/product/get-size/")?
            .json(query);
        self.transport.execute("product_get_size", request).await?.json()
    }

    /// Size recommendations for a product from body measurements.
    pub async fn get_recommendations(&self, query: &RecommendationQuery) -> ApiResult<Value> {
        query.validate().map_err(ApiError::InvalidArgument)?;

        let request = self
            .transport
            .request(Method::POST, "products/size/recommendation/")?
            .json(query);
        self.transport
            .execute("product_recommendations", request)
            .await?
            .json()
    }
}
