//! Blueprint Generation - turning a canvas into generated code
//!
//! This crate submits the canvas to a remote generation service and
//! follows the resulting job:
//!
//! - Status polling with backoff, and a push channel for logs and review
//!   signals, reconciled so a job's status only moves forward
//! - A review gate showing the proposed files as a tree, closed by an
//!   explicit approve or reject
//! - Events for the UI (status, logs, review, notifications)
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use blueprint_generation::{
//!     push_channel, EditorSession, GenerationConfig, HttpGenerationClient, VecEventSink,
//! };
//!
//! let config = GenerationConfig::load("generation.json").await?;
//! let client = Arc::new(HttpGenerationClient::new(&config));
//! let session = EditorSession::new(config, client, Arc::new(VecEventSink::new()))?;
//!
//! let (publisher, subscription) = push_channel(session.orchestrator().config().push_channel_capacity);
//! session.listen(subscription);
//! let job_id = session.generate().await?;
//! ```

pub mod api;
pub mod architecture;
pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod job;
pub mod orchestrator;
pub mod poller;
pub mod push;
pub mod review;
pub mod session;
pub mod tree;

// Re-export key types
pub use api::{GenerationResult, JobStatusResponse, SubmitRequest, SubmitResponse};
pub use architecture::{ArchitectureMetadata, ArchitectureSpec};
pub use client::{GenerationService, HttpGenerationClient};
pub use config::GenerationConfig;
pub use error::{GenerationError, Result};
pub use events::{
    ChannelEventSink, EventError, EventSink, GenerationEvent, NotificationLevel, NullEventSink,
    PollStopReason, ReviewDecision, VecEventSink,
};
pub use job::{FileMap, Job, JobId, JobState, JobStatus, MergeOutcome, StatusSource};
pub use orchestrator::JobOrchestrator;
pub use poller::{spawn_poller, PollHandle, PollStep, StatusObserver};
pub use push::{push_channel, PushEvent, PushMessage, PushPublisher, PushSubscription};
pub use review::{ReviewGate, ReviewOutcome};
pub use session::EditorSession;
pub use tree::{build_tree, FileTree, TreeLevel};
