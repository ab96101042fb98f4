//! Background status polling for a single job
//!
//! The loop queries immediately, then once per interval, until the
//! observer says stop (terminal or superseded job), the handle is stopped,
//! or the observer is dropped. Transient failures back off exponentially up
//! to the configured cap; after too many in a row the loop gives up. Any
//! other failure ends the loop at once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use tokio::task::JoinHandle;

use crate::api::JobStatusResponse;
use crate::client::GenerationService;
use crate::config::GenerationConfig;
use crate::events::PollStopReason;
use crate::job::JobId;

/// What the loop should do after a status response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStep {
    Continue,
    Stop(PollStopReason),
}

/// Receives status responses from the poll loop
pub trait StatusObserver: Send + Sync {
    /// Handle a successful status response
    fn observe(&self, job_id: &str, response: JobStatusResponse) -> PollStep;

    /// Called once when the loop ends on its own
    fn polling_stopped(&self, job_id: &str, reason: PollStopReason);
}

/// Handle to a running poll loop
#[derive(Debug)]
pub struct PollHandle {
    job_id: JobId,
    running: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Check if the loop is still running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst) && !self.task.is_finished()
    }

    /// Stop the loop, cancelling any in-flight query
    pub fn stop(self) {
        if self.running.swap(false, Ordering::SeqCst) {
            log::debug!("Stopping status polling for job {}", self.job_id);
        }
        self.task.abort();
    }
}

/// Start polling a job in the background
///
/// The observer is held weakly; once it is dropped the loop ends at the
/// next tick.
pub fn spawn_poller<O>(
    job_id: JobId,
    service: Arc<dyn GenerationService>,
    config: GenerationConfig,
    observer: Weak<O>,
) -> PollHandle
where
    O: StatusObserver + 'static,
{
    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    let id = job_id.clone();

    log::info!(
        "Polling job {} every {}s",
        job_id,
        config.poll_interval().as_secs()
    );

    let task = tokio::spawn(async move {
        let mut failures: u32 = 0;

        while flag.load(Ordering::SeqCst) {
            let result = service.status(&id).await;

            let Some(target) = observer.upgrade() else {
                log::debug!("Observer for job {} dropped, polling ends", id);
                break;
            };

            match result {
                Ok(response) => {
                    failures = 0;
                    if let PollStep::Stop(reason) = target.observe(&id, response) {
                        log::info!("Polling for job {} stopped: {:?}", id, reason);
                        target.polling_stopped(&id, reason);
                        break;
                    }
                }
                Err(e) if !e.is_transient() => {
                    log::error!("Status query for job {} refused: {}", id, e);
                    target.polling_stopped(&id, PollStopReason::Refused);
                    break;
                }
                Err(e) => {
                    failures = failures.saturating_add(1);
                    log::warn!(
                        "Status query for job {} failed ({} in a row): {}",
                        id,
                        failures,
                        e
                    );
                    if let Some(max) = config.max_consecutive_poll_failures {
                        if failures >= max {
                            target.polling_stopped(&id, PollStopReason::Unreachable);
                            break;
                        }
                    }
                }
            }
            drop(target);

            tokio::time::sleep(config.backoff_delay(failures)).await;
        }

        flag.store(false, Ordering::SeqCst);
    });

    PollHandle {
        job_id,
        running,
        task,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{SubmitRequest, SubmitResponse};
    use crate::error::{GenerationError, Result};
    use crate::job::JobStatus;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::time::Duration;

    /// Service answering status queries from a script
    struct ScriptedService {
        script: Mutex<VecDeque<Result<JobStatusResponse>>>,
        calls: Mutex<Vec<tokio::time::Instant>>,
    }

    impl ScriptedService {
        fn new(script: Vec<Result<JobStatusResponse>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.lock().len()
        }
    }

    #[async_trait]
    impl GenerationService for ScriptedService {
        async fn submit(&self, _request: &SubmitRequest) -> Result<SubmitResponse> {
            Err(GenerationError::api(500, "not scripted"))
        }

        async fn status(&self, _job_id: &str) -> Result<JobStatusResponse> {
            self.calls.lock().push(tokio::time::Instant::now());
            self.script
                .lock()
                .pop_front()
                .unwrap_or_else(|| Ok(JobStatusResponse::with_status(JobStatus::Running)))
        }

        async fn approve(&self, _job_id: &str) -> Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        seen: Mutex<Vec<JobStatus>>,
        stopped: Mutex<Option<PollStopReason>>,
    }

    impl StatusObserver for RecordingObserver {
        fn observe(&self, _job_id: &str, response: JobStatusResponse) -> PollStep {
            self.seen.lock().push(response.status);
            if response.status.is_terminal() {
                PollStep::Stop(PollStopReason::Terminal)
            } else {
                PollStep::Continue
            }
        }

        fn polling_stopped(&self, _job_id: &str, reason: PollStopReason) {
            *self.stopped.lock() = Some(reason);
        }
    }

    fn status(s: JobStatus) -> Result<JobStatusResponse> {
        Ok(JobStatusResponse::with_status(s))
    }

    fn unreachable() -> Result<JobStatusResponse> {
        Err(GenerationError::api(503, "unavailable"))
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_immediately_then_on_interval_until_terminal() {
        let service = ScriptedService::new(vec![
            status(JobStatus::Pending),
            status(JobStatus::Running),
            status(JobStatus::Done),
        ]);
        let observer = Arc::new(RecordingObserver::default());
        let start = tokio::time::Instant::now();

        let handle = spawn_poller(
            "job".into(),
            service.clone(),
            GenerationConfig::default(),
            Arc::downgrade(&observer),
        );

        tokio::time::sleep(Duration::from_secs(30)).await;

        assert_eq!(
            *observer.seen.lock(),
            vec![JobStatus::Pending, JobStatus::Running, JobStatus::Done]
        );
        assert_eq!(*observer.stopped.lock(), Some(PollStopReason::Terminal));
        assert_eq!(service.call_count(), 3);
        assert!(!handle.is_running());

        let offsets: Vec<u64> = service
            .calls
            .lock()
            .iter()
            .map(|t| t.duration_since(start).as_secs())
            .collect();
        assert_eq!(offsets, vec![0, 3, 6]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_back_off_and_recover() {
        let service = ScriptedService::new(vec![
            unreachable(),
            unreachable(),
            unreachable(),
            status(JobStatus::Running),
            status(JobStatus::Failed),
        ]);
        let observer = Arc::new(RecordingObserver::default());
        let start = tokio::time::Instant::now();

        let _handle = spawn_poller(
            "job".into(),
            service.clone(),
            GenerationConfig::default(),
            Arc::downgrade(&observer),
        );
        tokio::time::sleep(Duration::from_secs(120)).await;

        let offsets: Vec<u64> = service
            .calls
            .lock()
            .iter()
            .map(|t| t.duration_since(start).as_secs())
            .collect();
        // 0, +6, +12, +24, then back to the 3s interval
        assert_eq!(offsets, vec![0, 6, 18, 42, 45]);
        assert_eq!(*observer.stopped.lock(), Some(PollStopReason::Terminal));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_failure_ceiling() {
        let service = ScriptedService::new((0..10).map(|_| unreachable()).collect());
        let observer = Arc::new(RecordingObserver::default());
        let config = GenerationConfig {
            max_consecutive_poll_failures: Some(3),
            ..GenerationConfig::default()
        };

        let handle = spawn_poller("job".into(), service.clone(), config, Arc::downgrade(&observer));
        tokio::time::sleep(Duration::from_secs(600)).await;

        assert_eq!(service.call_count(), 3);
        assert_eq!(*observer.stopped.lock(), Some(PollStopReason::Unreachable));
        assert!(!handle.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_transient_error_stops_at_once() {
        let service = ScriptedService::new(vec![
            status(JobStatus::Running),
            Err(GenerationError::api(404, "no such job")),
        ]);
        let observer = Arc::new(RecordingObserver::default());

        let handle = spawn_poller(
            "job".into(),
            service.clone(),
            GenerationConfig::default(),
            Arc::downgrade(&observer),
        );
        tokio::time::sleep(Duration::from_secs(600)).await;

        assert_eq!(service.call_count(), 2);
        assert_eq!(*observer.stopped.lock(), Some(PollStopReason::Refused));
        assert!(!handle.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_still_waits_between_queries() {
        let service = ScriptedService::new(Vec::new());
        let observer = Arc::new(RecordingObserver::default());
        let config = GenerationConfig {
            poll_interval_secs: 0,
            ..GenerationConfig::default()
        };

        let handle = spawn_poller("job".into(), service.clone(), config, Arc::downgrade(&observer));
        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(service.call_count(), 3);
        handle.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_loop() {
        let service = ScriptedService::new(Vec::new());
        let observer = Arc::new(RecordingObserver::default());

        let handle = spawn_poller(
            "job".into(),
            service.clone(),
            GenerationConfig::default(),
            Arc::downgrade(&observer),
        );
        tokio::time::sleep(Duration::from_secs(7)).await;
        let calls = service.call_count();
        assert_eq!(calls, 3);

        handle.stop();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(service.call_count(), calls);
        assert!(observer.stopped.lock().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_observer_ends_loop() {
        let service = ScriptedService::new(Vec::new());
        let observer = Arc::new(RecordingObserver::default());

        let handle = spawn_poller(
            "job".into(),
            service.clone(),
            GenerationConfig::default(),
            Arc::downgrade(&observer),
        );
        tokio::time::sleep(Duration::from_secs(1)).await;
        drop(observer);
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert!(!handle.is_running());
        assert_eq!(service.call_count(), 2);
    }
}
