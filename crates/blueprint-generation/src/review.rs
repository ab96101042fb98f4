//! Review gate for generated output
//!
//! A gate opens when the service signals that a job needs review. It holds
//! the proposed files as a display tree until a human approves or rejects
//! them, then it is discarded.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::events::ReviewDecision;
use crate::job::{FileMap, JobId};
use crate::tree::{build_tree, file_count, TreeLevel};

/// An open review of a job's proposed files
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewGate {
    job_id: JobId,
    files: FileMap,
    tree: TreeLevel,
    opened_at: DateTime<Utc>,
}

impl ReviewGate {
    /// Open a gate for the given files
    pub fn open(job_id: impl Into<String>, files: FileMap) -> Self {
        let tree = build_tree(&files);
        Self {
            job_id: job_id.into(),
            files,
            tree,
            opened_at: Utc::now(),
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Flat file map as received
    pub fn files(&self) -> &FileMap {
        &self.files
    }

    /// Nested display tree
    pub fn tree(&self) -> &TreeLevel {
        &self.tree
    }

    /// Number of files shown in the tree
    pub fn file_count(&self) -> usize {
        file_count(&self.tree)
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    /// Close the gate with a decision
    pub fn close(self, decision: ReviewDecision) -> ReviewOutcome {
        ReviewOutcome {
            job_id: self.job_id,
            decision,
            file_count: file_count(&self.tree),
            closed_at: Utc::now(),
        }
    }
}

/// Record of a closed review
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewOutcome {
    pub job_id: JobId,
    pub decision: ReviewDecision,
    pub file_count: usize,
    pub closed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_and_close() {
        let files: FileMap = [
            ("src/main.rs".to_string(), "fn main() {}".to_string()),
            ("src/lib.rs".to_string(), String::new()),
            ("Cargo.toml".to_string(), "[package]".to_string()),
        ]
        .into_iter()
        .collect();

        let gate = ReviewGate::open("job-1", files);
        assert_eq!(gate.job_id(), "job-1");
        assert_eq!(gate.file_count(), 3);
        assert!(gate.tree()["src"].as_directory().is_some());

        let outcome = gate.close(ReviewDecision::Approved);
        assert_eq!(outcome.job_id, "job-1");
        assert_eq!(outcome.decision, ReviewDecision::Approved);
        assert_eq!(outcome.file_count, 3);
    }

    #[test]
    fn test_empty_result_opens_empty_gate() {
        let gate = ReviewGate::open("job-1", FileMap::new());
        assert!(gate.tree().is_empty());
        assert_eq!(gate.close(ReviewDecision::Rejected).file_count, 0);
    }
}
