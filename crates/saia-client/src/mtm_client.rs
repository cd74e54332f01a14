//! Made-to-measure client endpoints.

use reqwest::Method;
use tracing::info;

use saia_models::{
    CalculationOptions, CreatedPerson, IdResponse, MtmClientId, MtmClientUpdate, NewMtmClient,
    NewMtmPerson,
};

use crate::error::{ApiError, ApiResult};
use crate::transport::HttpTransport;

/// Client for `measurements/mtm-clients/`.
#[derive(Clone)]
pub struct MtmClients {
    transport: HttpTransport,
}

impl MtmClients {
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    /// Create an MTM client and return its id.
    pub async fn create(&self, client: &NewMtmClient) -> ApiResult<MtmClientId> {
        let request = self
            .transport
            .request(Method::POST, "measurements/mtm-clients/")?
            .json(client);
        let created: IdResponse = self.transport.execute("mtm_client_create", request).await?.json()?;

        info!(mtm_client_id = created.id, "MTM client created");
        Ok(MtmClientId(created.id))
    }

    /// Partially update an MTM client.
    pub async fn update(&self, id: MtmClientId, update: &MtmClientUpdate) -> ApiResult<MtmClientId> {
        let path = client_path(id, "")?;
        if update.is_empty() {
            return Err(ApiError::invalid_argument("No mtm client's parameters passed"));
        }

        let request = self.transport.request(Method::PATCH, &path)?.json(update);
        let updated: IdResponse = self.transport.execute("mtm_client_update", request).await?.json()?;
        Ok(MtmClientId(updated.id))
    }

    /// Create a person owned by an MTM client.
    pub async fn create_person(
        &self,
        id: MtmClientId,
        person: &NewMtmPerson,
    ) -> ApiResult<CreatedPerson> {
        let path = client_path(id, "persons/")?;
        person.validate().map_err(ApiError::InvalidArgument)?;

        let options = CalculationOptions {
            measurements_type: person.measurements_type.clone(),
            ..Default::default()
        };
        let request = self
            .transport
            .request(Method::POST, &path)?
            .query(&options.query_pairs())
            .json(person);
        let response = self.transport.execute("mtm_client_create_person", request).await?;

        response.created_person(person.details.has_images())
    }
}

fn client_path(id: MtmClientId, suffix: &str) -> ApiResult<String> {
    if id.0 == 0 {
        return Err(ApiError::invalid_argument("No mtm client id passed"));
    }
    Ok(format!("measurements/mtm-clients/{}/{}", id, suffix))
}
