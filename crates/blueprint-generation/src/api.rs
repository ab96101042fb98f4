//! Wire types for the remote generation service

use serde::{Deserialize, Serialize};

use crate::architecture::ArchitectureSpec;
use crate::job::{FileMap, JobId, JobState, JobStatus};

/// Body of a job submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub architecture_spec: ArchitectureSpec,
    pub project_id: Option<String>,
}

/// Response to a job submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub job_id: JobId,
}

/// Generated output attached to a status response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    #[serde(default)]
    pub files: FileMap,
}

/// Response to a status query
///
/// Older service versions name the result `generation_result`; either
/// field is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub status: JobStatus,
    #[serde(default)]
    pub logs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<GenerationResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_result: Option<GenerationResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobStatusResponse {
    /// A response with the given status and nothing else
    pub fn with_status(status: JobStatus) -> Self {
        Self {
            status,
            logs: Vec::new(),
            result: None,
            generation_result: None,
            error: None,
        }
    }

    /// Attach generated files
    pub fn with_files(mut self, files: FileMap) -> Self {
        self.result = Some(GenerationResult { files });
        self
    }

    /// Generated files, empty when the payload has none
    pub fn files(&self) -> FileMap {
        self.result
            .as_ref()
            .or(self.generation_result.as_ref())
            .map(|r| r.files.clone())
            .unwrap_or_default()
    }

    /// Convert to the typed job state
    pub fn to_state(&self) -> JobState {
        match self.status {
            JobStatus::Pending => JobState::Pending,
            JobStatus::Running => JobState::Running,
            JobStatus::ReviewRequired => JobState::ReviewRequired {
                files: self.files(),
            },
            JobStatus::Done => JobState::Done {
                files: self.files(),
            },
            JobStatus::Failed => JobState::Failed {
                reason: self
                    .error
                    .clone()
                    .or_else(|| self.logs.last().cloned())
                    .unwrap_or_else(|| "Generation failed".to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_field_aliases() {
        let current: JobStatusResponse = serde_json::from_str(
            r#"{"status":"done","logs":[],"result":{"files":{"src/main.rs":"fn main() {}"}}}"#,
        )
        .unwrap();
        assert_eq!(current.files().len(), 1);

        let legacy: JobStatusResponse = serde_json::from_str(
            r#"{"status":"done","generation_result":{"files":{"a":"1","b":"2"}}}"#,
        )
        .unwrap();
        assert_eq!(legacy.files().len(), 2);
        assert!(matches!(legacy.to_state(), JobState::Done { files } if files.len() == 2));
    }

    #[test]
    fn test_missing_result_is_empty() {
        let response: JobStatusResponse =
            serde_json::from_str(r#"{"status":"running","logs":["building"]}"#).unwrap();
        assert!(response.files().is_empty());
        assert_eq!(response.to_state(), JobState::Running);

        let malformed: JobStatusResponse =
            serde_json::from_str(r#"{"status":"review_required","result":{}}"#).unwrap();
        assert!(malformed.files().is_empty());
    }

    #[test]
    fn test_failed_reason() {
        let response: JobStatusResponse =
            serde_json::from_str(r#"{"status":"failed","logs":["step 1","compiler crashed"]}"#)
                .unwrap();
        assert_eq!(
            response.to_state(),
            JobState::Failed {
                reason: "compiler crashed".into()
            }
        );
        assert_eq!(
            JobStatusResponse::with_status(JobStatus::Failed).to_state(),
            JobState::Failed {
                reason: "Generation failed".into()
            }
        );
    }
}
