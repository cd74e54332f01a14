//! Authenticated HTTP transport shared by all resource clients.
//!
//! Every request carries `Authorization: APIKey {key}`, runs inside a
//! `saia_request` tracing span and is counted in the request metrics.
//! Non-success responses become [`ApiError::Http`] without retries.

use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, LOCATION};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info_span, Instrument};
use url::Url;

use saia_models::{CreatedPerson, IdResponse, PersonId, TaskSetId};

use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use crate::metrics::record_request;

/// Buffered response of a successful request.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    location: Option<String>,
    body: Vec<u8>,
}

impl ApiResponse {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Raw `Location` header.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> ApiResult<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Task set announced by the `Location` header.
    pub fn task_set_id(&self) -> ApiResult<TaskSetId> {
        let location = self
            .location
            .as_deref()
            .ok_or_else(|| ApiError::MissingLocation(format!("status {}", self.status)))?;

        TaskSetId::from_location(location).map_err(|e| ApiError::MissingLocation(e.to_string()))
    }

    /// Interpret a create response: an id when no photos were sent, a
    /// task set otherwise.
    pub fn created_person(&self, has_images: bool) -> ApiResult<CreatedPerson> {
        if has_images {
            self.task_set_id().map(CreatedPerson::Queued)
        } else {
            let created: IdResponse = self.json()?;
            Ok(CreatedPerson::Created(PersonId(created.id)))
        }
    }
}

/// HTTP transport bound to one API host and key.
#[derive(Clone)]
pub struct HttpTransport {
    http: Client,
    base_url: Url,
}

impl HttpTransport {
    /// Build the underlying `reqwest` client.
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        let mut auth = HeaderValue::from_str(&format!("APIKey {}", config.api_key))
            .map_err(|_| ApiError::config("API key contains invalid header characters"))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let http = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(concat!("saia-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ApiError::Network)?;

        Ok(Self {
            http,
            base_url: config.base_url()?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a path such as `persons/12/` against the base url.
    pub fn endpoint(&self, path: &str) -> ApiResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::invalid_argument(format!("Invalid endpoint {}: {}", path, e)))
    }

    /// Start a request for `path`.
    pub fn request(&self, method: Method, path: &str) -> ApiResult<RequestBuilder> {
        Ok(self.http.request(method, self.endpoint(path)?))
    }

    /// Send a request and buffer its response.
    pub async fn execute(&self, operation: &str, request: RequestBuilder) -> ApiResult<ApiResponse> {
        let span = info_span!("saia_request", operation = %operation);

        let start = Instant::now();
        let result = Self::send(request).instrument(span).await;
        let latency_ms = start.elapsed().as_millis() as f64;

        let status = match &result {
            Ok(response) => response.status.as_u16(),
            Err(e) => e.http_status().unwrap_or(0),
        };
        record_request(operation, status, latency_ms);

        result
    }

    async fn send(request: RequestBuilder) -> ApiResult<ApiResponse> {
        let response = request.send().await?;
        let status = response.status();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        debug!(status = status.as_u16(), location = ?location, "SAIA response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_http_status(status.as_u16(), body, location));
        }

        let body = response.bytes().await?.to_vec();
        Ok(ApiResponse {
            status,
            location,
            body,
        })
    }
}
