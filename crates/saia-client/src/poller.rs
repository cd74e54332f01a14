//! Task-set polling.
//!
//! The service has no push channel, so completion of a task set is observed
//! by querying its status at a fixed interval. A session sleeps, issues one
//! query, waits for the answer and classifies it; queries never overlap.
//!
//! A session settles exactly once:
//! - a final resource resolves it,
//! - a ready-and-unsuccessful status fails it with [`ApiError::TaskFailed`],
//! - a transport error fails it with that error unchanged,
//! - the optional deadline or attempt ceiling fails it with [`ApiError::Timeout`],
//! - the cancellation token fails it with [`ApiError::Cancelled`].
//!
//! Cancellation and the deadline race both the sleep and the in-flight query,
//! so a response arriving after either is dropped unseen.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, info_span, warn, Instrument};

use saia_models::{QueuePayload, TaskSetId};

use crate::config::PollConfig;
use crate::error::{ApiError, ApiResult};
use crate::metrics::{record_poll_outcome, record_poll_tick};

/// Anything that can report the status of a task set.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_status(&self, task_set_id: &TaskSetId) -> ApiResult<QueuePayload>;
}

// =============================================================================
// Session
// =============================================================================

/// What a single status observation means for the session.
#[derive(Debug)]
enum PollStep {
    Continue,
    Resolved(Value),
    Failed(ApiError),
}

/// State of one in-flight `get_results` call.
struct PollSession {
    task_set_id: TaskSetId,
    interval: Duration,
    max_attempts: Option<u32>,
    deadline: Option<Instant>,
    started: Instant,
    attempts: u32,
}

impl PollSession {
    fn new(task_set_id: TaskSetId, config: &PollConfig) -> Self {
        let started = Instant::now();
        Self {
            task_set_id,
            interval: config.interval,
            max_attempts: config.max_attempts,
            deadline: config.timeout.map(|timeout| started + timeout),
            started,
            attempts: 0,
        }
    }

    fn observe(&self, payload: QueuePayload) -> PollStep {
        match payload {
            QueuePayload::Resource(value) => PollStep::Resolved(value),
            QueuePayload::Pending(status) if status.is_failed() => {
                PollStep::Failed(ApiError::task_failed(status.failed_task_ids()))
            }
            QueuePayload::Pending(_) => PollStep::Continue,
        }
    }

    fn timeout(&self) -> ApiError {
        ApiError::Timeout {
            attempts: self.attempts,
            elapsed_ms: self.started.elapsed().as_millis() as u64,
        }
    }

    fn attempts_exhausted(&self) -> bool {
        self.max_attempts.is_some_and(|max| self.attempts >= max)
    }

    async fn run<S>(mut self, source: &S, cancel: &CancellationToken) -> ApiResult<Value>
    where
        S: StatusSource + ?Sized,
    {
        let deadline = self.deadline;
        let expired = async move {
            match deadline {
                Some(at) => sleep_until(at).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(expired);

        loop {
            if self.attempts_exhausted() {
                return self.settle(Err(self.timeout()));
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return self.settle(Err(ApiError::Cancelled)),
                _ = &mut expired => return self.settle(Err(self.timeout())),
                _ = sleep(self.interval) => {}
            }

            self.attempts += 1;
            record_poll_tick();

            let response = tokio::select! {
                biased;
                _ = cancel.cancelled() => return self.settle(Err(ApiError::Cancelled)),
                _ = &mut expired => return self.settle(Err(self.timeout())),
                response = source.fetch_status(&self.task_set_id) => response,
            };

            let payload = match response {
                Ok(payload) => payload,
                Err(e) => return self.settle(Err(e)),
            };

            match self.observe(payload) {
                PollStep::Continue => {
                    debug!(attempt = self.attempts, "Task set still processing");
                }
                PollStep::Resolved(value) => return self.settle(Ok(value)),
                PollStep::Failed(e) => return self.settle(Err(e)),
            }
        }
    }

    fn settle(&self, result: ApiResult<Value>) -> ApiResult<Value> {
        let elapsed_ms = self.started.elapsed().as_millis() as u64;
        let outcome = match &result {
            Ok(_) => {
                info!(attempts = self.attempts, elapsed_ms, "Task set completed");
                "resolved"
            }
            Err(ApiError::TaskFailed { failed_sub_tasks }) => {
                warn!(attempts = self.attempts, failed = ?failed_sub_tasks, "Task set failed");
                "failed"
            }
            Err(ApiError::Timeout { .. }) => {
                warn!(attempts = self.attempts, elapsed_ms, "Task set polling timed out");
                "timeout"
            }
            Err(ApiError::Cancelled) => {
                info!(attempts = self.attempts, "Task set polling cancelled");
                "cancelled"
            }
            Err(e) => {
                warn!(attempts = self.attempts, "Task set status query failed: {}", e);
                "error"
            }
        };
        record_poll_outcome(outcome);
        result
    }
}

// =============================================================================
// Poller
// =============================================================================

/// Turns a task-set id into the final resource by polling its status.
pub struct TaskPoller<S: ?Sized> {
    source: Arc<S>,
    config: PollConfig,
}

impl<S: ?Sized> Clone for TaskPoller<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            config: self.config.clone(),
        }
    }
}

impl<S> TaskPoller<S>
where
    S: StatusSource + ?Sized + 'static,
{
    pub fn new(source: Arc<S>, config: PollConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// Poll until the task set reaches a terminal state.
    ///
    /// `delay` overrides the configured interval; zero falls back to the
    /// 2000 ms default.
    pub async fn get_results(
        &self,
        task_set_id: &TaskSetId,
        delay: Option<Duration>,
    ) -> ApiResult<Value> {
        self.get_results_with_cancel(task_set_id, delay, CancellationToken::new())
            .await
    }

    /// Like [`get_results`](Self::get_results), aborting with
    /// [`ApiError::Cancelled`] once `cancel` fires.
    pub async fn get_results_with_cancel(
        &self,
        task_set_id: &TaskSetId,
        delay: Option<Duration>,
        cancel: CancellationToken,
    ) -> ApiResult<Value> {
        let session = self.session(task_set_id, delay)?;
        let span = info_span!("saia_poll", task_set_id = %task_set_id);
        session.run(&*self.source, &cancel).instrument(span).await
    }

    /// Start polling in the background.
    ///
    /// Validation happens before anything is spawned. Dropping the returned
    /// handle cancels the session.
    pub fn spawn_results(
        &self,
        task_set_id: TaskSetId,
        delay: Option<Duration>,
    ) -> ApiResult<PollHandle> {
        let session = self.session(&task_set_id, delay)?;
        let source = Arc::clone(&self.source);
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let span = info_span!("saia_poll", task_set_id = %task_set_id);

        let join = tokio::spawn(
            async move { session.run(&*source, &token).await }.instrument(span),
        );

        Ok(PollHandle {
            task_set_id,
            _guard: cancel.clone().drop_guard(),
            cancel,
            join,
        })
    }

    fn session(&self, task_set_id: &TaskSetId, delay: Option<Duration>) -> ApiResult<PollSession> {
        if task_set_id.is_empty() {
            return Err(ApiError::invalid_argument("id is not specified"));
        }

        let config = match delay {
            Some(delay) => self.config.clone().with_interval(delay),
            None => self.config.clone(),
        };
        Ok(PollSession::new(task_set_id.clone(), &config))
    }
}

/// Handle to a polling session running in the background.
///
/// The session is cancelled when the handle, or the future returned by
/// [`result`](Self::result), is dropped.
pub struct PollHandle {
    task_set_id: TaskSetId,
    cancel: CancellationToken,
    _guard: DropGuard,
    join: JoinHandle<ApiResult<Value>>,
}

impl PollHandle {
    pub fn task_set_id(&self) -> &TaskSetId {
        &self.task_set_id
    }

    /// Stop polling; the session settles with [`ApiError::Cancelled`].
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the session to settle.
    pub async fn result(self) -> ApiResult<Value> {
        match self.join.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(_) => Err(ApiError::Cancelled),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use saia_models::{SubTaskStatus, TaskSetStatus};
    use serde_json::json;

    use crate::config::DEFAULT_POLL_INTERVAL;
    use crate::error::ErrorKind;

    /// Replays canned responses and records when each query happened.
    #[derive(Default)]
    struct ScriptedSource {
        responses: Mutex<VecDeque<ApiResult<QueuePayload>>>,
        calls: Mutex<Vec<Instant>>,
        latency: Duration,
    }

    impl ScriptedSource {
        fn new(responses: Vec<ApiResult<QueuePayload>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                ..Default::default()
            }
        }

        fn with_latency(mut self, latency: Duration) -> Self {
            self.latency = latency;
            self
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn call_times(&self) -> Vec<Instant> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl StatusSource for ScriptedSource {
        async fn fetch_status(&self, _task_set_id: &TaskSetId) -> ApiResult<QueuePayload> {
            self.calls.lock().unwrap().push(Instant::now());
            if !self.latency.is_zero() {
                sleep(self.latency).await;
            }
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(running()))
        }
    }

    fn running() -> QueuePayload {
        QueuePayload::Pending(TaskSetStatus {
            is_ready: false,
            is_successful: None,
            sub_tasks: Vec::new(),
        })
    }

    fn payload(value: Value) -> ApiResult<QueuePayload> {
        Ok(QueuePayload::from_value(value).unwrap())
    }

    fn poller(source: Arc<ScriptedSource>) -> TaskPoller<ScriptedSource> {
        TaskPoller::new(source, PollConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_id_fails_before_any_query() {
        let mut mock = MockStatusSource::new();
        mock.expect_fetch_status().times(0);
        let poller = TaskPoller::new(Arc::new(mock), PollConfig::default());

        let err = poller
            .get_results(&TaskSetId::new(""), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(err.to_string(), "id is not specified");
    }

    #[test]
    fn test_empty_id_fails_on_first_poll() {
        let mut mock = MockStatusSource::new();
        mock.expect_fetch_status().times(0);
        let poller = TaskPoller::new(Arc::new(mock), PollConfig::default());
        let id = TaskSetId::new("");

        let mut fut = tokio_test::task::spawn(poller.get_results(&id, None));
        let result = tokio_test::assert_ready!(fut.poll());
        assert!(matches!(result, Err(ApiError::InvalidArgument(_))));
    }

    #[test]
    fn test_spawn_with_empty_id_is_rejected_synchronously() {
        let mut mock = MockStatusSource::new();
        mock.expect_fetch_status().times(0);
        let poller = TaskPoller::new(Arc::new(mock), PollConfig::default());

        // No runtime needed: nothing is spawned for an invalid id.
        let result = poller.spawn_results(TaskSetId::new(""), None);
        assert!(matches!(result, Err(ApiError::InvalidArgument(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_task_set_lists_only_failed_sub_tasks() {
        let source = Arc::new(ScriptedSource::new(vec![
            Ok(running()),
            payload(json!({
                "is_ready": true,
                "is_successful": false,
                "sub_tasks": [
                    {"task_id": "a", "is_successful": false},
                    {"task_id": "b", "is_successful": true}
                ]
            })),
        ]));

        let err = poller(source.clone())
            .get_results(&TaskSetId::new("abc123"), Some(Duration::from_millis(100)))
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("Subtask failed: a"));
        assert!(!message.contains("Subtask failed: b"));
        assert_eq!(source.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejects_with_enumerated_message() {
        let source = Arc::new(ScriptedSource::new(vec![
            payload(json!({"is_ready": false, "is_successful": null, "sub_tasks": []})),
            payload(json!({
                "is_ready": true,
                "is_successful": false,
                "sub_tasks": [{"task_id": "x", "is_successful": false}]
            })),
        ]));

        let err = poller(source)
            .get_results(&TaskSetId::new("abc123"), Some(Duration::from_millis(50)))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::TaskFailed);
        assert_eq!(err.to_string(), "Subtask failed: x\n");
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolves_with_final_resource_on_first_tick() {
        let source = Arc::new(ScriptedSource::new(vec![payload(json!({"id": 7, "height": 170}))]));
        let start = Instant::now();

        let value = poller(source.clone())
            .get_results(&TaskSetId::new("abc123"), None)
            .await
            .unwrap();

        assert_eq!(value, json!({"id": 7, "height": 170}));
        assert_eq!(source.call_count(), 1);
        assert_eq!(source.call_times()[0] - start, DEFAULT_POLL_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_queries_after_resolution() {
        let source = Arc::new(ScriptedSource::new(vec![
            payload(json!({"is_ready": true, "is_successful": true, "sub_tasks": []})),
            payload(json!({"id": 1})),
        ]));
        let handle = poller(source.clone())
            .spawn_results(TaskSetId::new("abc123"), Some(Duration::from_millis(100)))
            .unwrap();

        let value = handle.result().await.unwrap();
        assert_eq!(value, json!({"id": 1}));
        assert_eq!(source.call_count(), 2);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(source.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_settles_once_after_many_running_ticks() {
        let mut responses: Vec<_> = (0..5).map(|_| Ok(running())).collect();
        responses.push(payload(json!({"id": 9})));
        let source = Arc::new(ScriptedSource::new(responses));

        let value = poller(source.clone())
            .get_results(&TaskSetId::new("abc123"), Some(Duration::from_millis(10)))
            .await
            .unwrap();

        assert_eq!(value["id"], 9);
        assert_eq!(source.call_count(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_queries_are_at_least_one_interval_apart() {
        let source = Arc::new(
            ScriptedSource::new(vec![Ok(running()), Ok(running()), payload(json!({"id": 2}))])
                .with_latency(Duration::from_millis(30)),
        );

        poller(source.clone())
            .get_results(&TaskSetId::new("abc123"), Some(Duration::from_millis(100)))
            .await
            .unwrap();

        let times = source.call_times();
        assert_eq!(times.len(), 3);
        for pair in times.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(100));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_error_is_returned_unchanged() {
        let source = Arc::new(ScriptedSource::new(vec![
            Ok(running()),
            Err(ApiError::from_http_status(503, "unavailable", None)),
            payload(json!({"id": 3})),
        ]));

        let err = poller(source.clone())
            .get_results(&TaskSetId::new("abc123"), Some(Duration::from_millis(10)))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Http { status: 503, .. }));
        assert_eq!(source.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_but_unknown_success_keeps_polling() {
        let source = Arc::new(ScriptedSource::new(vec![
            payload(json!({"is_ready": true, "is_successful": null})),
            payload(json!({"id": 4})),
        ]));

        let value = poller(source.clone())
            .get_results(&TaskSetId::new("abc123"), Some(Duration::from_millis(10)))
            .await
            .unwrap();
        assert_eq!(value["id"], 4);
        assert_eq!(source.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_max_attempts_ceiling() {
        let source = Arc::new(ScriptedSource::default());
        let poller = TaskPoller::new(
            source.clone(),
            PollConfig::default()
                .with_interval(Duration::from_millis(10))
                .with_max_attempts(3),
        );

        let err = poller
            .get_results(&TaskSetId::new("abc123"), None)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Timeout { attempts: 3, .. }));
        assert_eq!(source.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_max_attempts_polls_without_ceiling() {
        let source = Arc::new(ScriptedSource::new(vec![
            Ok(running()),
            payload(json!({"id": 5})),
        ]));
        let poller = TaskPoller::new(
            source.clone(),
            PollConfig::default()
                .with_interval(Duration::from_millis(10))
                .with_max_attempts(0),
        );

        let value = poller
            .get_results(&TaskSetId::new("abc123"), None)
            .await
            .unwrap();

        assert_eq!(value, json!({"id": 5}));
        assert_eq!(source.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_interrupts_slow_query() {
        let source = Arc::new(ScriptedSource::default().with_latency(Duration::from_secs(60)));
        let poller = TaskPoller::new(
            source.clone(),
            PollConfig::default()
                .with_interval(Duration::from_millis(100))
                .with_timeout(Duration::from_secs(1)),
        );

        let start = Instant::now();
        let err = poller
            .get_results(&TaskSetId::new("abc123"), None)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert_eq!(Instant::now() - start, Duration::from_secs(1));
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_between_ticks() {
        let source = Arc::new(ScriptedSource::default());
        let handle = poller(source.clone())
            .spawn_results(TaskSetId::new("abc123"), Some(Duration::from_millis(100)))
            .unwrap();

        tokio::time::sleep(Duration::from_millis(250)).await;
        handle.cancel();
        let err = handle.result().await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert_eq!(source.call_count(), 2);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(source.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_handle_stops_polling() {
        let source = Arc::new(ScriptedSource::default());
        let handle = poller(source.clone())
            .spawn_results(TaskSetId::new("abc123"), Some(Duration::from_millis(100)))
            .unwrap();
        let token = handle.cancellation_token();

        tokio::time::sleep(Duration::from_millis(250)).await;
        drop(handle);
        assert!(token.is_cancelled());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(source.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_response_after_cancel_is_discarded() {
        // The only response would resolve, but it arrives after cancellation.
        let source = Arc::new(
            ScriptedSource::new(vec![payload(json!({"id": 5}))])
                .with_latency(Duration::from_millis(500)),
        );
        let poller = poller(source.clone());
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(300)).await;
            trigger.cancel();
        });

        let err = poller
            .get_results_with_cancel(&TaskSetId::new("abc123"), Some(Duration::from_millis(100)), cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Cancelled));
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pre_cancelled_token_never_queries() {
        let mut mock = MockStatusSource::new();
        mock.expect_fetch_status().times(0);
        let poller = TaskPoller::new(Arc::new(mock), PollConfig::default());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = poller
            .get_results_with_cancel(&TaskSetId::new("abc123"), None, cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_source_receives_task_set_id() {
        let mut mock = MockStatusSource::new();
        mock.expect_fetch_status()
            .withf(|id| id.as_str() == "abc123")
            .times(1)
            .returning(|_| Ok(QueuePayload::Resource(json!({"id": 11}))));
        let poller = TaskPoller::new(Arc::new(mock), PollConfig::default());

        let value = poller
            .get_results(&TaskSetId::new("abc123"), Some(Duration::from_millis(5)))
            .await
            .unwrap();
        assert_eq!(value["id"], 11);
    }

    #[test]
    fn test_observe_classification() {
        let session = PollSession {
            task_set_id: TaskSetId::new("t"),
            interval: Duration::from_millis(1),
            max_attempts: None,
            deadline: None,
            started: Instant::now(),
            attempts: 0,
        };

        let failed = QueuePayload::Pending(TaskSetStatus {
            is_ready: true,
            is_successful: Some(false),
            sub_tasks: vec![SubTaskStatus::new("front", false)],
        });
        assert!(matches!(session.observe(failed), PollStep::Failed(_)));

        let not_ready = QueuePayload::Pending(TaskSetStatus {
            is_ready: false,
            is_successful: Some(false),
            sub_tasks: Vec::new(),
        });
        assert!(matches!(session.observe(not_ready), PollStep::Continue));

        let done = QueuePayload::Resource(json!({"id": 1}));
        assert!(matches!(session.observe(done), PollStep::Resolved(_)));
    }
}
