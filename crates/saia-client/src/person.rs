//! Person endpoints.

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use saia_models::{
    CalculationOptions, CreatedPerson, NewPerson, Person, PersonId, PersonUpdate, TaskSetId,
};

use crate::error::{ApiError, ApiResult};
use crate::transport::HttpTransport;

/// Client for `persons/`.
#[derive(Clone)]
pub struct Persons {
    transport: HttpTransport,
}

impl Persons {
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    /// Create a person.
    ///
    /// Metadata alone yields [`CreatedPerson::Created`]; with photos the
    /// service starts a calculation and this yields [`CreatedPerson::Queued`].
    pub async fn create(&self, person: &NewPerson) -> ApiResult<CreatedPerson> {
        person.validate().map_err(ApiError::InvalidArgument)?;

        let request = self
            .transport
            .request(Method::POST, "persons/")?
            .query(&person.options.query_pairs())
            .json(person);
        let response = self.transport.execute("person_create", request).await?;

        let created = response.created_person(person.has_images())?;
        info!(gender = %person.gender, height = person.height, created = ?created, "Person created");
        Ok(created)
    }

    /// Get a person by id.
    pub async fn get(&self, id: PersonId) -> ApiResult<Person> {
        let path = person_path(id, "")?;
        let request = self.transport.request(Method::GET, &path)?;
        self.transport.execute("person_get", request).await?.json()
    }

    /// Partially update a person. Returns the updated fields.
    pub async fn update(&self, id: PersonId, update: &PersonUpdate) -> ApiResult<Value> {
        let path = person_path(id, "")?;
        update.validate().map_err(ApiError::InvalidArgument)?;

        let request = self.transport.request(Method::PATCH, &path)?.json(update);
        self.transport.execute("person_update", request).await?.json()
    }

    /// Replace a person's data and start a new calculation.
    pub async fn update_and_calculate(
        &self,
        id: PersonId,
        update: &PersonUpdate,
        options: &CalculationOptions,
    ) -> ApiResult<TaskSetId> {
        let path = person_path(id, "")?;
        update.validate().map_err(ApiError::InvalidArgument)?;

        let request = self
            .transport
            .request(Method::PUT, &path)?
            .query(&options.query_pairs())
            .json(update);
        self.transport
            .execute("person_update_and_calculate", request)
            .await?
            .task_set_id()
    }

    /// Manually restart the calculation for a person.
    pub async fn calculate(&self, id: PersonId) -> ApiResult<TaskSetId> {
        let path = person_path(id, "calculate/")?;
        let request = self.transport.request(Method::GET, &path)?;
        self.transport
            .execute("person_calculate", request)
            .await?
            .task_set_id()
    }

    /// Start a virtual try-on of `product_sku` for a person.
    ///
    /// The result also appears later in [`Person::virtual_tryons`].
    pub async fn virtual_try_on(&self, id: PersonId, product_sku: &str) -> ApiResult<Value> {
        let path = person_path(id, "virtual_tryon/")?;
        if product_sku.trim().is_empty() {
            return Err(ApiError::invalid_argument("product is not specified"));
        }

        let request = self
            .transport
            .request(Method::POST, &path)?
            .json(&VirtualTryOnRequest { product_sku });
        let response = self.transport.execute("person_virtual_tryon", request).await?;

        if response.is_empty() {
            return Ok(Value::Null);
        }
        response.json()
    }
}

#[derive(Serialize)]
struct VirtualTryOnRequest<'a> {
    product_sku: &'a str,
}

fn person_path(id: PersonId, suffix: &str) -> ApiResult<String> {
    if id.get() == 0 {
        return Err(ApiError::invalid_argument("id is not specified"));
    }
    Ok(format!("persons/{}/{}", id, suffix))
}
