//! Job lifecycle orchestration
//!
//! The orchestrator submits a job, then follows it through two independent
//! status channels: a poll loop ([`crate::poller`]) and the push
//! subscription. Both funnel into [`Job::merge`], so duplicated or
//! reordered deliveries never move the job backwards.
//!
//! A push `REVIEW_REQUIRED` signal fetches the proposed files and opens a
//! [`ReviewGate`]. The job stays in `review_required` until the user
//! approves (the service resumes the job) or rejects (the interaction is
//! cancelled locally).
//!
//! State lives behind a mutex that is never held across an await. Every
//! continuation re-checks that its job is still the current one before
//! touching state.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::api::{JobStatusResponse, SubmitRequest};
use crate::architecture::ArchitectureSpec;
use crate::client::GenerationService;
use crate::config::GenerationConfig;
use crate::error::{GenerationError, Result};
use crate::events::{
    EventSink, GenerationEvent, NotificationLevel, PollStopReason, ReviewDecision,
};
use crate::job::{Job, JobId, JobState, JobStatus, MergeOutcome, StatusSource};
use crate::poller::{spawn_poller, PollHandle, PollStep, StatusObserver};
use crate::push::{PushEvent, PushMessage, PushSubscription};
use crate::review::{ReviewGate, ReviewOutcome};

/// Mutable orchestrator state
#[derive(Default)]
struct OrchestratorState {
    job: Option<Job>,
    review: Option<ReviewGate>,
    /// True from submission until terminal status, rejection or failure
    generating: bool,
    /// The user rejected the current job's review
    cancelled: bool,
    last_outcome: Option<ReviewOutcome>,
    poller: Option<PollHandle>,
    listener: Option<JoinHandle<()>>,
}

impl OrchestratorState {
    /// The current job, if it has the given ID
    fn job_mut(&mut self, job_id: &str) -> Option<&mut Job> {
        self.job.as_mut().filter(|j| j.id == job_id)
    }

    /// Whether continuations for this job may still mutate state
    fn is_live(&self, job_id: &str) -> bool {
        !self.cancelled
            && self
                .job
                .as_ref()
                .is_some_and(|j| j.id == job_id && !j.status().is_terminal())
    }

    fn stop_polling(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.stop();
        }
    }
}

struct Shared {
    /// Handle to this value, held weakly by the poll loops it spawns
    this: Weak<Shared>,
    config: GenerationConfig,
    service: Arc<dyn GenerationService>,
    events: Arc<dyn EventSink>,
    state: Mutex<OrchestratorState>,
}

impl Shared {
    /// Start a poll loop for the job, replacing any running one
    fn start_polling(&self, state: &mut OrchestratorState, job_id: &str) {
        state.stop_polling();
        state.poller = Some(spawn_poller(
            job_id.to_string(),
            self.service.clone(),
            self.config.clone(),
            self.this.clone(),
        ));
    }

    fn emit(&self, events: Vec<GenerationEvent>) {
        for event in events {
            if let Err(e) = self.events.send(event) {
                log::warn!("Failed to emit generation event: {}", e);
            }
        }
    }

    /// Merge an observation into the current job, collecting events
    ///
    /// Returns None when the observation is for a job that is no longer
    /// current.
    fn merge(
        state: &mut OrchestratorState,
        job_id: &str,
        observed: JobState,
        source: StatusSource,
        out: &mut Vec<GenerationEvent>,
    ) -> Option<MergeOutcome> {
        let job = state.job_mut(job_id)?;
        let outcome = job.merge(observed);
        let MergeOutcome::Advanced { from, to } = outcome else {
            log::debug!(
                "Job {} ignored {:?} observation: {:?}",
                job_id,
                source,
                outcome
            );
            return Some(outcome);
        };

        log::info!("Job {} status {} -> {} ({:?})", job_id, from, to, source);
        out.push(GenerationEvent::StatusChanged {
            job_id: job_id.to_string(),
            from,
            to,
            source,
        });

        match &job.state {
            JobState::Done { files } => {
                out.push(GenerationEvent::JobCompleted {
                    job_id: job_id.to_string(),
                    file_count: files.len(),
                });
            }
            JobState::Failed { reason } => {
                out.push(GenerationEvent::notify(
                    NotificationLevel::Error,
                    format!("Generation failed: {}", reason),
                ));
            }
            _ => {}
        }

        if to.is_terminal() {
            state.generating = false;
            if state.review.take().is_some() {
                log::warn!("Job {} ended while its review was still open", job_id);
            }
        }
        Some(outcome)
    }

    fn apply_response(
        &self,
        job_id: &str,
        response: JobStatusResponse,
        source: StatusSource,
    ) -> Option<MergeOutcome> {
        let mut out = Vec::new();
        let outcome = {
            let mut state = self.state.lock();
            if state.cancelled {
                None
            } else {
                if let Some(job) = state.job_mut(job_id) {
                    let fresh = job.absorb_polled_logs(&response.logs);
                    if !fresh.is_empty() {
                        out.push(GenerationEvent::LogAppended {
                            job_id: job_id.to_string(),
                            lines: fresh,
                        });
                    }
                }
                Self::merge(&mut state, job_id, response.to_state(), source, &mut out)
            }
        };
        self.emit(out);
        outcome
    }

    async fn handle_push(&self, event: PushEvent) {
        match event.classify() {
            PushMessage::ReviewRequired { job_id } => self.open_review(&job_id).await,
            PushMessage::Log { job_id, message } => {
                let mut out = Vec::new();
                {
                    let mut state = self.state.lock();
                    let target = match job_id {
                        Some(id) => state.job_mut(&id),
                        None => state.job.as_mut(),
                    };
                    if let Some(job) = target {
                        job.push_log(message.clone());
                        out.push(GenerationEvent::LogAppended {
                            job_id: job.id.clone(),
                            lines: vec![message],
                        });
                    }
                }
                self.emit(out);
            }
            PushMessage::Unknown { event_type } => {
                log::debug!("Ignoring push event of type '{}'", event_type);
            }
        }
    }

    async fn open_review(&self, job_id: &str) {
        {
            let state = self.state.lock();
            if !state.is_live(job_id) {
                log::debug!("Review signal for stale job {} ignored", job_id);
                return;
            }
            if state.review.as_ref().is_some_and(|r| r.job_id() == job_id) {
                log::debug!("Review for job {} already open", job_id);
                return;
            }
        }

        let mut out = Vec::new();
        let files = match self.service.status(job_id).await {
            Ok(response) => response.files(),
            Err(e) => {
                log::warn!("Failed to fetch generated files for job {}: {}", job_id, e);
                out.push(GenerationEvent::notify(
                    NotificationLevel::Warning,
                    format!("Could not load generated files for review: {}", e),
                ));
                Default::default()
            }
        };

        {
            let mut state = self.state.lock();
            // The job may have moved on while the files were in flight
            if !state.is_live(job_id) || state.review.is_some() {
                log::debug!("Review for job {} superseded during fetch", job_id);
                return;
            }
            let gate = ReviewGate::open(job_id, files.clone());
            out.push(GenerationEvent::ReviewOpened {
                job_id: job_id.to_string(),
                file_count: gate.file_count(),
                tree: gate.tree().clone(),
            });
            Self::merge(
                &mut state,
                job_id,
                JobState::ReviewRequired { files },
                StatusSource::Push,
                &mut out,
            );
            log::info!("Review opened for job {} ({} files)", job_id, gate.file_count());
            state.review = Some(gate);
            // Polling may have given up before the signal arrived
            if state.poller.is_none() && state.is_live(job_id) {
                log::info!("Resuming status polling for job {}", job_id);
                self.start_polling(&mut state, job_id);
            }
        }
        self.emit(out);
    }
}

impl StatusObserver for Shared {
    fn observe(&self, job_id: &str, response: JobStatusResponse) -> PollStep {
        match self.apply_response(job_id, response, StatusSource::Poll) {
            None => PollStep::Stop(PollStopReason::Cancelled),
            Some(MergeOutcome::Terminal) => PollStep::Stop(PollStopReason::Terminal),
            Some(_) => {
                let state = self.state.lock();
                match state.job.as_ref() {
                    Some(job) if job.id == job_id && job.status().is_terminal() => {
                        PollStep::Stop(PollStopReason::Terminal)
                    }
                    _ => PollStep::Continue,
                }
            }
        }
    }

    fn polling_stopped(&self, job_id: &str, reason: PollStopReason) {
        let mut out = vec![GenerationEvent::PollingStopped {
            job_id: job_id.to_string(),
            reason,
        }];
        match reason {
            PollStopReason::Unreachable => out.push(GenerationEvent::notify(
                NotificationLevel::Warning,
                "Lost contact with the generation service; status updates paused",
            )),
            PollStopReason::Refused => out.push(GenerationEvent::notify(
                NotificationLevel::Error,
                format!("The generation service no longer reports on job {}", job_id),
            )),
            PollStopReason::Terminal | PollStopReason::Cancelled => {}
        }
        {
            let mut state = self.state.lock();
            // Detach without aborting: this runs on the poll task itself
            if state.poller.as_ref().is_some_and(|p| p.job_id() == job_id) {
                state.poller = None;
            }
            if reason == PollStopReason::Refused && state.is_live(job_id) {
                state.generating = false;
            }
        }
        self.emit(out);
    }
}

/// Submits generation jobs and tracks them to completion
///
/// Cheap to clone; clones share the same job.
#[derive(Clone)]
pub struct JobOrchestrator {
    shared: Arc<Shared>,
}

impl JobOrchestrator {
    /// Create an orchestrator with no job
    ///
    /// Fails if the configuration does not validate.
    pub fn new(
        config: GenerationConfig,
        service: Arc<dyn GenerationService>,
        events: Arc<dyn EventSink>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            shared: Arc::new_cyclic(|this| Shared {
                this: this.clone(),
                config,
                service,
                events,
                state: Mutex::new(OrchestratorState::default()),
            }),
        })
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.shared.config
    }

    /// Submit a job and start polling it
    ///
    /// Fails if another job is still generating. On a failed submission
    /// the user is notified and the orchestrator returns to idle.
    pub async fn submit(
        &self,
        architecture_spec: ArchitectureSpec,
        project_id: Option<String>,
    ) -> Result<JobId> {
        {
            let mut state = self.shared.state.lock();
            if state.generating {
                let id = state.job.as_ref().map(|j| j.id.clone()).unwrap_or_default();
                return Err(GenerationError::AlreadyGenerating(id));
            }
            state.generating = true;
        }

        let request = SubmitRequest {
            architecture_spec,
            project_id,
        };
        let response = match self.shared.service.submit(&request).await {
            Ok(response) => response,
            Err(e) => {
                log::error!("Job submission failed: {}", e);
                self.shared.state.lock().generating = false;
                self.shared.emit(vec![GenerationEvent::notify(
                    NotificationLevel::Error,
                    format!("Failed to start generation: {}", e),
                )]);
                return Err(e);
            }
        };

        let job_id = response.job_id;
        log::info!("Submitted generation job {}", job_id);
        {
            let mut state = self.shared.state.lock();
            state.job = Some(Job::new(job_id.clone()));
            state.review = None;
            state.cancelled = false;
            self.shared.start_polling(&mut state, &job_id);
        }
        self.shared.emit(vec![GenerationEvent::JobSubmitted {
            job_id: job_id.clone(),
        }]);
        Ok(job_id)
    }

    /// Start consuming push events for the lifetime of this orchestrator
    ///
    /// Replaces any previous subscription.
    pub fn listen(&self, mut subscription: PushSubscription) {
        let shared: Weak<Shared> = Arc::downgrade(&self.shared);
        let task = tokio::spawn(async move {
            while let Some(event) = subscription.next().await {
                let Some(shared) = shared.upgrade() else {
                    break;
                };
                shared.handle_push(event).await;
            }
            log::debug!("Push subscription ended");
        });
        if let Some(previous) = self.shared.state.lock().listener.replace(task) {
            previous.abort();
        }
    }

    /// Handle one push event directly
    pub async fn handle_push(&self, event: PushEvent) {
        self.shared.handle_push(event).await;
    }

    /// Apply a status response as if it came from the given channel
    pub fn apply_status(
        &self,
        job_id: &str,
        response: JobStatusResponse,
        source: StatusSource,
    ) -> Option<MergeOutcome> {
        self.shared.apply_response(job_id, response, source)
    }

    /// Approve the open review
    ///
    /// On success the gate closes and the service resumes the job, which
    /// the poll loop follows to completion. On failure the user is
    /// notified and the orchestrator returns to idle.
    pub async fn approve(&self) -> Result<()> {
        let job_id = self.pending_review_job()?;

        if let Err(e) = self.shared.service.approve(&job_id).await {
            log::error!("Approval of job {} failed: {}", job_id, e);
            {
                let mut state = self.shared.state.lock();
                if state.job.as_ref().is_some_and(|j| j.id == job_id) {
                    state.stop_polling();
                    state.review = None;
                    state.job = None;
                    state.generating = false;
                }
            }
            self.shared.emit(vec![GenerationEvent::notify(
                NotificationLevel::Error,
                format!("Failed to approve generated files: {}", e),
            )]);
            return Err(e);
        }

        let mut out = Vec::new();
        {
            let mut state = self.shared.state.lock();
            let Some(gate) = state.review.take_if(|r| r.job_id() == job_id) else {
                return Ok(());
            };
            log::info!("Approved job {}", job_id);
            state.last_outcome = Some(gate.close(ReviewDecision::Approved));
            out.push(GenerationEvent::ReviewClosed {
                job_id: job_id.clone(),
                decision: ReviewDecision::Approved,
            });
            // Polling may have given up while the gate was open
            if state.poller.is_none() && state.is_live(&job_id) {
                self.shared.start_polling(&mut state, &job_id);
            }
        }
        self.shared.emit(out);
        Ok(())
    }

    /// Reject the open review
    ///
    /// Closes the gate and cancels the interaction locally. The remote job
    /// is only cancelled when `cancel_remote_on_reject` is configured.
    pub async fn reject(&self) -> Result<()> {
        let job_id = self.pending_review_job()?;
        {
            let mut state = self.shared.state.lock();
            if let Some(gate) = state.review.take() {
                state.last_outcome = Some(gate.close(ReviewDecision::Rejected));
            }
            state.stop_polling();
            state.cancelled = true;
            state.generating = false;
        }
        log::info!("Rejected job {}", job_id);
        self.shared.emit(vec![GenerationEvent::ReviewClosed {
            job_id: job_id.clone(),
            decision: ReviewDecision::Rejected,
        }]);

        if self.shared.config.cancel_remote_on_reject {
            if let Err(e) = self.cancel_remote(&job_id).await {
                self.shared.emit(vec![GenerationEvent::notify(
                    NotificationLevel::Warning,
                    format!("Could not cancel job on the server: {}", e),
                )]);
            }
        }
        Ok(())
    }

    /// Ask the service to cancel a job
    pub async fn cancel_remote(&self, job_id: &str) -> Result<()> {
        log::info!("Requesting remote cancellation of job {}", job_id);
        self.shared.service.cancel(job_id).await
    }

    /// Stop polling and push listening
    ///
    /// The remote job is left alone.
    pub fn shutdown(&self) {
        let mut state = self.shared.state.lock();
        state.stop_polling();
        if let Some(listener) = state.listener.take() {
            listener.abort();
        }
        state.generating = false;
    }

    /// Snapshot of the current job
    pub fn current_job(&self) -> Option<Job> {
        self.shared.state.lock().job.clone()
    }

    pub fn status(&self) -> Option<JobStatus> {
        self.shared.state.lock().job.as_ref().map(Job::status)
    }

    /// Snapshot of the open review gate
    pub fn review(&self) -> Option<ReviewGate> {
        self.shared.state.lock().review.clone()
    }

    pub fn last_review_outcome(&self) -> Option<ReviewOutcome> {
        self.shared.state.lock().last_outcome.clone()
    }

    pub fn is_generating(&self) -> bool {
        self.shared.state.lock().generating
    }

    /// Whether the current job's interaction was cancelled by rejection
    pub fn is_cancelled(&self) -> bool {
        self.shared.state.lock().cancelled
    }

    pub fn is_polling(&self) -> bool {
        self.shared
            .state
            .lock()
            .poller
            .as_ref()
            .is_some_and(PollHandle::is_running)
    }

    fn pending_review_job(&self) -> Result<JobId> {
        let state = self.shared.state.lock();
        match (&state.review, &state.job) {
            (Some(review), _) => Ok(review.job_id().to_string()),
            (None, Some(job)) => Err(GenerationError::NoPendingReview(job.id.clone())),
            (None, None) => Err(GenerationError::NoActiveJob),
        }
    }
}
