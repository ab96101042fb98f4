//! Push notification channel
//!
//! The generation service streams log messages out of band. A transport
//! adapter (websocket, SSE, ...) parses raw frames with
//! [`PushEvent::parse`] and publishes them; the orchestrator consumes a
//! [`PushSubscription`]. The subscription ends when either side is
//! dropped or [`PushSubscription::unsubscribe`] is called.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::constants::push::{LOG_EVENT_TYPE, REVIEW_REQUIRED_MESSAGE};
use crate::error::Result;
use crate::job::JobId;

/// Raw push event as sent by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,
}

/// Meaning of a push event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushMessage {
    /// A job asks for human review
    ReviewRequired { job_id: JobId },
    /// A log line, optionally tied to a job
    Log {
        job_id: Option<JobId>,
        message: String,
    },
    /// Anything this client does not understand
    Unknown { event_type: String },
}

impl PushEvent {
    /// A log event
    pub fn log(message: impl Into<String>, job_id: Option<&str>) -> Self {
        Self {
            event_type: LOG_EVENT_TYPE.to_string(),
            message: message.into(),
            job_id: job_id.map(str::to_string),
        }
    }

    /// The review trigger for a job
    pub fn review_required(job_id: &str) -> Self {
        Self::log(REVIEW_REQUIRED_MESSAGE, Some(job_id))
    }

    /// Parse a raw JSON frame
    pub fn parse(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Classify the event
    ///
    /// `REVIEW_REQUIRED` without a job ID is an ordinary log line.
    pub fn classify(&self) -> PushMessage {
        if self.event_type != LOG_EVENT_TYPE {
            return PushMessage::Unknown {
                event_type: self.event_type.clone(),
            };
        }
        match &self.job_id {
            Some(job_id) if self.message == REVIEW_REQUIRED_MESSAGE => {
                PushMessage::ReviewRequired {
                    job_id: job_id.clone(),
                }
            }
            job_id => PushMessage::Log {
                job_id: job_id.clone(),
                message: self.message.clone(),
            },
        }
    }
}

/// Create a bounded push channel
pub fn push_channel(capacity: usize) -> (PushPublisher, PushSubscription) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (PushPublisher { tx }, PushSubscription { rx })
}

/// Sending half, held by the transport adapter
#[derive(Debug, Clone)]
pub struct PushPublisher {
    tx: mpsc::Sender<PushEvent>,
}

impl PushPublisher {
    /// Publish an event, waiting for queue space
    ///
    /// Returns false once the subscriber is gone.
    pub async fn publish(&self, event: PushEvent) -> bool {
        self.tx.send(event).await.is_ok()
    }

    /// Publish without waiting; drops the event when the queue is full
    pub fn try_publish(&self, event: PushEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(event)) => {
                log::warn!("Push queue full, dropping {:?} event", event.event_type);
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// Parse a raw frame and publish it
    pub async fn publish_raw(&self, raw: &str) -> Result<bool> {
        let event = PushEvent::parse(raw)?;
        Ok(self.publish(event).await)
    }

    pub fn is_subscribed(&self) -> bool {
        !self.tx.is_closed()
    }
}

/// Receiving half, owned by the session's listener
#[derive(Debug)]
pub struct PushSubscription {
    rx: mpsc::Receiver<PushEvent>,
}

impl PushSubscription {
    /// Wait for the next event, `None` when the publisher is gone
    pub async fn next(&mut self) -> Option<PushEvent> {
        self.rx.recv().await
    }

    /// Stop accepting events; anything already queued can still be drained
    pub fn unsubscribe(&mut self) {
        self.rx.close();
    }
}
