//! Create a person from photos, wait for the calculation and collect
//! the measurements.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use saia_client::{ApiError, ApiResult, SaiaClient};
use saia_models::{
    BodyParams, CreatedPerson, Gender, ImageData, NewPerson, Person, PersonId, TaskSetId,
};

use crate::error::{FlowError, FlowResult};
use crate::logging::FlowLogger;
use crate::reporter::{FlowStatus, LogReporter, StatusReporter};

/// Everything needed to measure a person.
#[derive(Debug, Clone, Default)]
pub struct FlowInput {
    pub gender: Option<Gender>,
    /// Height in cm.
    pub height: Option<u32>,
    pub front_image: Option<ImageData>,
    pub side_image: Option<ImageData>,
    /// Weight in kg.
    pub weight: Option<f64>,
}

impl FlowInput {
    pub fn new(gender: Gender, height: u32, front_image: ImageData, side_image: ImageData) -> Self {
        Self {
            gender: Some(gender),
            height: Some(height),
            front_image: Some(front_image),
            side_image: Some(side_image),
            weight: None,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    /// Check the input and build the create request.
    pub fn to_new_person(&self) -> FlowResult<NewPerson> {
        let (front, side) = match (&self.front_image, &self.side_image) {
            (Some(front), Some(side)) if !front.is_empty() && !side.is_empty() => (front, side),
            _ => return Err(FlowError::invalid("No images found")),
        };

        let gender = self
            .gender
            .ok_or_else(|| FlowError::invalid("No gender is specified"))?;

        let height = match self.height {
            Some(height) if height > 0 => height,
            _ => return Err(FlowError::invalid("No height is specified")),
        };

        let mut person = NewPerson::new(gender, height).with_images(front, side);
        person.details.weight = self.weight;
        Ok(person)
    }
}

/// Chest, waist and hips, rounded to whole cm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Girths {
    pub chest: Option<i64>,
    pub waist: Option<i64>,
    pub hips: Option<i64>,
}

impl Girths {
    fn from_params(params: Option<&BodyParams>) -> Self {
        let round = |value: Option<f64>| value.map(|v| v.round() as i64);
        match params {
            Some(params) => Self {
                chest: round(params.chest),
                waist: round(params.waist),
                hips: round(params.hips),
            },
            None => Self::default(),
        }
    }
}

/// Rounded girths per projection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeasurementSummary {
    pub front: Girths,
    pub side: Girths,
    pub volume: Girths,
}

impl MeasurementSummary {
    pub fn from_person(person: &Person) -> Self {
        Self {
            front: Girths::from_params(person.front_params.as_ref()),
            side: Girths::from_params(person.side_params.as_ref()),
            volume: Girths::from_params(person.volume_params.as_ref()),
        }
    }
}

impl fmt::Display for MeasurementSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (title, girths) in [
            ("Front", &self.front),
            ("Side", &self.side),
            ("Volume", &self.volume),
        ] {
            writeln!(f, "{}:", title)?;
            for (name, value) in [
                ("Chest", girths.chest),
                ("Waist", girths.waist),
                ("Hips", girths.hips),
            ] {
                match value {
                    Some(value) => writeln!(f, "{}: {} cm", name, value)?,
                    None => writeln!(f, "{}: -", name)?,
                }
            }
        }
        Ok(())
    }
}

/// Final record of a completed flow.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurements {
    pub person: Person,
    pub summary: MeasurementSummary,
}

impl Measurements {
    pub fn new(person: Person) -> Self {
        let summary = MeasurementSummary::from_person(&person);
        Self { person, summary }
    }

    pub fn person_id(&self) -> PersonId {
        self.person.id
    }
}

/// Create → poll → record, with status updates along the way.
#[derive(Clone)]
pub struct MeasurementFlow {
    client: SaiaClient,
    reporter: Arc<dyn StatusReporter>,
}

impl MeasurementFlow {
    pub fn new(client: SaiaClient, reporter: Arc<dyn StatusReporter>) -> Self {
        Self { client, reporter }
    }

    /// Flow that reports through tracing.
    pub fn with_logging(client: SaiaClient) -> Self {
        Self::new(client, Arc::new(LogReporter))
    }

    pub fn client(&self) -> &SaiaClient {
        &self.client
    }

    /// Measure a person from two photos.
    pub async fn run(&self, input: FlowInput) -> FlowResult<Measurements> {
        self.run_cancellable(input, CancellationToken::new()).await
    }

    /// Like [`run`](Self::run), stopping early once `cancel` fires.
    pub async fn run_cancellable(
        &self,
        input: FlowInput,
        cancel: CancellationToken,
    ) -> FlowResult<Measurements> {
        let person = input.to_new_person()?;
        let logger = FlowLogger::new("measure", "new_person");

        let span = logger.create_span();
        let result = self.measure(&person, &cancel, &logger).instrument(span).await;
        self.finish(result, &logger).await
    }

    /// Restart the calculation for an existing person and wait for it.
    pub async fn recalculate(&self, person_id: PersonId) -> FlowResult<Measurements> {
        let logger = FlowLogger::new("recalculate", &person_id.to_string());
        let cancel = CancellationToken::new();

        let result = async {
            logger.log_start("restarting calculation");
            let task_set_id = self.client.persons().calculate(person_id).await?;
            self.await_person(&task_set_id, &cancel, &logger).await
        }
        .instrument(logger.create_span())
        .await;

        self.finish(result, &logger).await
    }

    /// Fetch the person an interrupted flow pointed at.
    ///
    /// Returns `Ok(None)` when `error` carries no fallback.
    pub async fn recover(&self, error: &FlowError) -> FlowResult<Option<Measurements>> {
        let Some(person_id) = error.fallback() else {
            return Ok(None);
        };

        let logger = FlowLogger::new("recover", &person_id.to_string());
        logger.log_warning(&format!("falling back after: {}", error));

        let person = self.client.persons().get(person_id).await?;
        Ok(Some(Measurements::new(person)))
    }

    async fn measure(
        &self,
        person: &NewPerson,
        cancel: &CancellationToken,
        logger: &FlowLogger,
    ) -> FlowResult<Measurements> {
        self.reporter.report(FlowStatus::Starting).await;
        logger.log_start(&format!("gender={} height={}", person.gender, person.height));

        let created = until_cancelled(cancel, self.client.persons().create(person))
            .await
            .map_err(FlowError::interrupted)?;

        let task_set_id = match created {
            CreatedPerson::Queued(task_set_id) => task_set_id,
            CreatedPerson::Created(id) => {
                return Err(FlowError::Unexpected(format!(
                    "person {} was created without a calculation",
                    id
                )))
            }
        };

        let logger = logger.with_subject(task_set_id.as_str());
        self.await_person(&task_set_id, cancel, &logger).await
    }

    async fn await_person(
        &self,
        task_set_id: &TaskSetId,
        cancel: &CancellationToken,
        logger: &FlowLogger,
    ) -> FlowResult<Measurements> {
        self.reporter
            .report(FlowStatus::GettingResults {
                task_set_id: task_set_id.clone(),
            })
            .await;
        logger.log_progress("waiting for task set");

        let value = self
            .client
            .poller()
            .get_results_with_cancel(task_set_id, None, cancel.clone())
            .await
            .map_err(FlowError::interrupted)?;

        decode_person(value).map(Measurements::new)
    }

    async fn finish(
        &self,
        result: FlowResult<Measurements>,
        logger: &FlowLogger,
    ) -> FlowResult<Measurements> {
        match &result {
            Ok(measurements) => {
                self.reporter
                    .report(FlowStatus::Completed {
                        person_id: measurements.person_id(),
                    })
                    .await;
                logger.log_completion(&format!("person {}", measurements.person_id()));
            }
            Err(e) => {
                self.reporter
                    .report(FlowStatus::Failed {
                        message: e.to_string(),
                    })
                    .await;
                logger.log_error(&e.to_string());
            }
        }
        result
    }
}

fn decode_person(value: Value) -> FlowResult<Person> {
    if !value.is_object() {
        return Err(FlowError::Unexpected(format!(
            "task set resolved to a non-object: {}",
            value
        )));
    }
    Ok(serde_json::from_value(value)?)
}

async fn until_cancelled<T>(
    cancel: &CancellationToken,
    request: impl Future<Output = ApiResult<T>>,
) -> ApiResult<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ApiError::Cancelled),
        result = request => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input() -> FlowInput {
        FlowInput::new(
            Gender::Female,
            168,
            ImageData::jpeg(vec![1]),
            ImageData::jpeg(vec![2]),
        )
    }

    #[test]
    fn test_missing_images() {
        let mut input = input();
        input.side_image = None;

        let err = input.to_new_person().unwrap_err();
        assert_eq!(err.to_string(), "No images found");
    }

    #[test]
    fn test_empty_image_counts_as_missing() {
        let mut input = input();
        input.front_image = Some(ImageData::jpeg(Vec::new()));

        assert_eq!(input.to_new_person().unwrap_err().to_string(), "No images found");
    }

    #[test]
    fn test_images_checked_before_gender_and_height() {
        let input = FlowInput::default();
        assert_eq!(input.to_new_person().unwrap_err().to_string(), "No images found");
    }

    #[test]
    fn test_missing_gender_and_height() {
        let mut no_gender = input();
        no_gender.gender = None;
        assert_eq!(
            no_gender.to_new_person().unwrap_err().to_string(),
            "No gender is specified"
        );

        let mut no_height = input();
        no_height.height = Some(0);
        assert_eq!(
            no_height.to_new_person().unwrap_err().to_string(),
            "No height is specified"
        );
    }

    #[test]
    fn test_new_person_carries_images_and_weight() {
        let person = input().with_weight(61.5).to_new_person().unwrap();

        assert!(person.has_images());
        assert_eq!(person.details.weight, Some(61.5));
        assert_eq!(person.height, 168);
    }

    #[test]
    fn test_summary_rounds_girths() {
        let person: Person = serde_json::from_value(json!({
            "id": 3,
            "front_params": {"chest": 90.4, "waist": 70.5, "hips": 95.6},
            "volume_params": {"chest": 91.0}
        }))
        .unwrap();
        let summary = MeasurementSummary::from_person(&person);

        assert_eq!(summary.front.chest, Some(90));
        assert_eq!(summary.front.waist, Some(71));
        assert_eq!(summary.front.hips, Some(96));
        assert_eq!(summary.side, Girths::default());
        assert_eq!(summary.volume.chest, Some(91));
        assert_eq!(summary.volume.hips, None);
    }

    #[test]
    fn test_summary_display() {
        let summary = MeasurementSummary {
            front: Girths {
                chest: Some(90),
                waist: Some(70),
                hips: Some(95),
            },
            ..Default::default()
        };
        let text = summary.to_string();

        assert!(text.starts_with("Front:\nChest: 90 cm\nWaist: 70 cm\nHips: 95 cm\n"));
        assert!(text.contains("Side:\nChest: -\n"));
    }

    #[test]
    fn test_decode_person_rejects_non_object() {
        assert!(matches!(
            decode_person(json!([1, 2])),
            Err(FlowError::Unexpected(_))
        ));
    }
}
