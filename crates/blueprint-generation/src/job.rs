//! Generation job state and monotonic status merging
//!
//! Status reaches the client through two unsynchronized channels. Both feed
//! [`Job::merge`], which only ever moves a job forward in the lifecycle
//! `pending < running < review_required < done | failed`. Once a job is
//! terminal nothing else is accepted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Unique identifier for a remote job
pub type JobId = String;

/// Generated files keyed by `/`-delimited path
pub type FileMap = BTreeMap<String, String>;

/// Lifecycle status of a job, without payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    ReviewRequired,
    Done,
    Failed,
}

impl JobStatus {
    /// Position in the lifecycle; `Done` and `Failed` share the last rank
    pub fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Running => 1,
            Self::ReviewRequired => 2,
            Self::Done | Self::Failed => 3,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::ReviewRequired => "review_required",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Job status with the payload that status carries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Running,
    ReviewRequired { files: FileMap },
    Done { files: FileMap },
    Failed { reason: String },
}

impl JobState {
    pub fn status(&self) -> JobStatus {
        match self {
            Self::Pending => JobStatus::Pending,
            Self::Running => JobStatus::Running,
            Self::ReviewRequired { .. } => JobStatus::ReviewRequired,
            Self::Done { .. } => JobStatus::Done,
            Self::Failed { .. } => JobStatus::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }

    /// Files carried by this state, if any
    pub fn files(&self) -> Option<&FileMap> {
        match self {
            Self::ReviewRequired { files } | Self::Done { files } => Some(files),
            _ => None,
        }
    }
}

/// Which channel an observation arrived on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusSource {
    Poll,
    Push,
    /// Local actions such as submission
    Local,
}

/// Result of merging one observation into a job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Status moved forward
    Advanced { from: JobStatus, to: JobStatus },
    /// Same status seen again; payload refreshed if it had one
    Unchanged,
    /// Observation is earlier than what we hold
    Stale,
    /// Job is already terminal
    Terminal,
}

impl MergeOutcome {
    pub fn advanced(&self) -> bool {
        matches!(self, Self::Advanced { .. })
    }
}

/// Locally observed view of a remote job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub state: JobState,
    /// Log lines received on either channel, in arrival order
    #[serde(default)]
    pub logs: Vec<String>,
    /// Number of log lines taken from status responses so far
    #[serde(skip)]
    polled_log_count: usize,
}

impl Job {
    /// A freshly submitted job
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: JobState::Pending,
            logs: Vec::new(),
            polled_log_count: 0,
        }
    }

    pub fn status(&self) -> JobStatus {
        self.state.status()
    }

    /// Apply an observation if it is not earlier than the held status
    pub fn merge(&mut self, observed: JobState) -> MergeOutcome {
        let current = self.status();
        if current.is_terminal() {
            return MergeOutcome::Terminal;
        }

        let next = observed.status();
        if next.rank() < current.rank() {
            return MergeOutcome::Stale;
        }
        if next == current {
            // Keep richer payloads; an empty file map never replaces a full one
            if let (JobState::ReviewRequired { files: held }, JobState::ReviewRequired { files }) =
                (&mut self.state, observed)
            {
                if !files.is_empty() {
                    *held = files;
                }
            }
            return MergeOutcome::Unchanged;
        }

        self.state = observed;
        MergeOutcome::Advanced {
            from: current,
            to: next,
        }
    }

    /// Append log lines from a status response
    ///
    /// Status responses carry the full log so far; only lines beyond those
    /// already taken are appended. Returns the new lines.
    pub fn absorb_polled_logs(&mut self, logs: &[String]) -> Vec<String> {
        if logs.len() <= self.polled_log_count {
            return Vec::new();
        }
        let fresh: Vec<String> = logs[self.polled_log_count..].to_vec();
        self.polled_log_count = logs.len();
        self.logs.extend(fresh.iter().cloned());
        fresh
    }

    /// Append a single pushed log line
    pub fn push_log(&mut self, line: impl Into<String>) {
        self.logs.push(line.into());
    }
}
