//! Brand size charts.

use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use saia_models::SizechartQuery;

use crate::error::{ApiError, ApiResult};
use crate::transport::HttpTransport;

/// Client for `sizecharts/`.
#[derive(Clone)]
pub struct Sizecharts {
    transport: HttpTransport,
}

impl Sizecharts {
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    /// Recommended size for a brand and body part.
    ///
    /// Returns `Ok(None)` when the brand has no matching size chart.
    pub async fn get_size(&self, query: &SizechartQuery) -> ApiResult<Option<Value>> {
        query.validate().map_err(ApiError::InvalidArgument)?;

        let request = self
            .transport
            .request(Method::GET, "sizecharts/size/recommendation/")?
            .query(query);

        match self.transport.execute("sizechart_get_size", request).await {
            Ok(response) => response.json().map(Some),
            Err(e) if e.is_not_found() => {
                debug!(brand = %query.brand, body_part = %query.body_part, "No size chart found");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
