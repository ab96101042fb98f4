//! Event types for streaming generation progress
//!
//! Events are sent from the orchestrator to the UI (or any consumer) to
//! report status changes, log output, review gates and notifications.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::job::{JobStatus, StatusSource};
use crate::tree::TreeLevel;

/// Destination for generation events
///
/// Implemented by whatever bridges events to the UI; the orchestrator only
/// sees this trait.
pub trait EventSink: Send + Sync {
    fn send(&self, event: GenerationEvent) -> Result<(), EventError>;
}

/// An event could not be delivered
#[derive(Debug, Clone, Error)]
#[error("Event delivery failed: {reason}")]
pub struct EventError {
    pub reason: String,
}

impl EventError {
    /// The receiving side has gone away
    pub fn disconnected() -> Self {
        Self {
            reason: "receiver dropped".to_string(),
        }
    }
}

/// Severity of a user-facing notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

/// How a review gate was closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approved,
    Rejected,
}

/// Why a poll loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollStopReason {
    /// The job reached `done` or `failed`
    Terminal,
    /// Stopped by the session (teardown, rejection, new job)
    Cancelled,
    /// Too many consecutive failed queries
    Unreachable,
    /// The service answered with an error retrying cannot fix
    Refused,
}

/// Events emitted while a generation job is tracked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GenerationEvent {
    /// A job was accepted by the service
    #[serde(rename_all = "camelCase")]
    JobSubmitted { job_id: String },

    /// The observed status moved forward
    #[serde(rename_all = "camelCase")]
    StatusChanged {
        job_id: String,
        from: JobStatus,
        to: JobStatus,
        source: StatusSource,
    },

    /// New log output from the job
    #[serde(rename_all = "camelCase")]
    LogAppended { job_id: String, lines: Vec<String> },

    /// The job is waiting for a human decision
    #[serde(rename_all = "camelCase")]
    ReviewOpened {
        job_id: String,
        file_count: usize,
        tree: TreeLevel,
    },

    /// The review gate closed
    #[serde(rename_all = "camelCase")]
    ReviewClosed {
        job_id: String,
        decision: ReviewDecision,
    },

    /// The job finished successfully
    #[serde(rename_all = "camelCase")]
    JobCompleted { job_id: String, file_count: usize },

    /// The poll loop ended
    #[serde(rename_all = "camelCase")]
    PollingStopped {
        job_id: String,
        reason: PollStopReason,
    },

    /// Message that should be shown to the user
    #[serde(rename_all = "camelCase")]
    Notification {
        level: NotificationLevel,
        message: String,
    },
}

impl GenerationEvent {
    /// Create a notification event
    pub fn notify(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self::Notification {
            level,
            message: message.into(),
        }
    }
}

/// Sink that drops every event
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn send(&self, _event: GenerationEvent) -> Result<(), EventError> {
        Ok(())
    }
}

/// Sink that keeps events in memory, in emission order
#[derive(Default)]
pub struct VecEventSink {
    events: Mutex<Vec<GenerationEvent>>,
}

impl VecEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything received so far
    pub fn events(&self) -> Vec<GenerationEvent> {
        self.events.lock().clone()
    }

    /// Drain and return everything received so far
    pub fn take(&self) -> Vec<GenerationEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl EventSink for VecEventSink {
    fn send(&self, event: GenerationEvent) -> Result<(), EventError> {
        self.events.lock().push(event);
        Ok(())
    }
}

/// Event sink forwarding into a tokio channel
pub struct ChannelEventSink {
    tx: tokio::sync::mpsc::UnboundedSender<GenerationEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: tokio::sync::mpsc::UnboundedSender<GenerationEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn send(&self, event: GenerationEvent) -> Result<(), EventError> {
        self.tx.send(event).map_err(|_| EventError::disconnected())
    }
}
