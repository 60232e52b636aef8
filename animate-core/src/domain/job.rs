//! Job domain types
//!
//! A `Job` is an immutable snapshot. Every transition builds a new record
//! from the previous one, so the store can swap whole records and readers
//! never see a half-applied update.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub const MSG_STARTED: &str = "Starting animation generation...";
pub const MSG_INITIALIZING: &str = "Initializing AI models...";
pub const MSG_GENERATING: &str = "Generating video with AI...";
pub const MSG_COMPLETED: &str = "Animation generated successfully!";
pub const MSG_NO_OUTPUT: &str = "Failed to generate animation";
pub const ERR_NO_OUTPUT: &str = "Generation process failed";

pub const PROGRESS_INITIALIZING: u8 = 10;
pub const PROGRESS_GENERATING: u8 = 20;
pub const PROGRESS_DONE: u8 = 100;

/// Job lifecycle status
///
/// `Started -> Processing -> (Completed | Failed)`. A job may also fail
/// straight from `Started` (cancelled or abandoned before it got a slot).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Started,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Completed and failed jobs never change again
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Started => "started",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected state transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("job {id} is already {status}")]
    Terminal { id: Uuid, status: JobStatus },

    #[error("job {id} progress cannot go back from {current} to {requested}")]
    ProgressRegression { id: Uuid, current: u8, requested: u8 },
}

/// Generation job record
///
/// Fields are private: `artifact_path` is only ever set together with
/// `Completed` and `error` only together with `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    #[serde(rename = "job_id")]
    id: Uuid,
    status: JobStatus,
    progress: u8,
    message: String,
    artifact_path: Option<PathBuf>,
    error: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Job {
    /// Fresh job in the `started` state with progress 0
    pub fn new(id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id,
            status: JobStatus::Started,
            progress: 0,
            message: MSG_STARTED.to_string(),
            artifact_path: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn artifact_path(&self) -> Option<&Path> {
        self.artifact_path.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Move to `processing` at the given progress
    pub fn processing(
        &self,
        progress: u8,
        message: impl Into<String>,
    ) -> Result<Self, TransitionError> {
        self.ensure_open()?;
        if progress < self.progress {
            return Err(TransitionError::ProgressRegression {
                id: self.id,
                current: self.progress,
                requested: progress,
            });
        }

        Ok(Self {
            status: JobStatus::Processing,
            progress: progress.min(PROGRESS_DONE),
            message: message.into(),
            updated_at: Utc::now(),
            ..self.clone()
        })
    }

    /// Terminal success holding the stored artifact location
    pub fn completed(&self, artifact_path: PathBuf) -> Result<Self, TransitionError> {
        self.ensure_open()?;
        Ok(Self {
            status: JobStatus::Completed,
            progress: PROGRESS_DONE,
            message: MSG_COMPLETED.to_string(),
            artifact_path: Some(artifact_path),
            error: None,
            updated_at: Utc::now(),
            ..self.clone()
        })
    }

    /// Terminal failure; progress resets to 0
    pub fn failed(
        &self,
        message: impl Into<String>,
        error: impl Into<String>,
    ) -> Result<Self, TransitionError> {
        self.ensure_open()?;
        Ok(Self {
            status: JobStatus::Failed,
            progress: 0,
            message: message.into(),
            artifact_path: None,
            error: Some(error.into()),
            updated_at: Utc::now(),
            ..self.clone()
        })
    }

    fn ensure_open(&self) -> Result<(), TransitionError> {
        if self.is_terminal() {
            return Err(TransitionError::Terminal {
                id: self.id,
                status: self.status,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_consistent(job: &Job) {
        assert_eq!(
            job.artifact_path().is_some(),
            job.status() == JobStatus::Completed
        );
        assert_eq!(job.error().is_some(), job.status() == JobStatus::Failed);
    }

    #[test]
    fn test_new_job_is_started() {
        let job = Job::new(Uuid::new_v4());
        assert_eq!(job.status(), JobStatus::Started);
        assert_eq!(job.progress(), 0);
        assert_eq!(job.message(), MSG_STARTED);
        assert_consistent(&job);
    }

    #[test]
    fn test_happy_path_transitions() {
        let job = Job::new(Uuid::new_v4());
        let job = job.processing(PROGRESS_INITIALIZING, MSG_INITIALIZING).unwrap();
        assert_consistent(&job);
        let job = job.processing(PROGRESS_GENERATING, MSG_GENERATING).unwrap();
        assert_eq!(job.status(), JobStatus::Processing);
        assert_eq!(job.progress(), 20);
        assert_consistent(&job);

        let job = job.completed(PathBuf::from("static/generated/x.mp4")).unwrap();
        assert_eq!(job.status(), JobStatus::Completed);
        assert_eq!(job.progress(), 100);
        assert_eq!(job.message(), MSG_COMPLETED);
        assert_consistent(&job);
    }

    #[test]
    fn test_failure_resets_progress() {
        let job = Job::new(Uuid::new_v4())
            .processing(PROGRESS_GENERATING, MSG_GENERATING)
            .unwrap()
            .failed("Generation error: boom", "boom")
            .unwrap();

        assert_eq!(job.status(), JobStatus::Failed);
        assert_eq!(job.progress(), 0);
        assert_eq!(job.error(), Some("boom"));
        assert_consistent(&job);
    }

    #[test]
    fn test_terminal_jobs_reject_transitions() {
        let done = Job::new(Uuid::new_v4())
            .completed(PathBuf::from("a.mp4"))
            .unwrap();
        assert!(matches!(
            done.failed("x", "y"),
            Err(TransitionError::Terminal { .. })
        ));
        assert!(done.processing(50, "again").is_err());

        let failed = Job::new(Uuid::new_v4()).failed("x", "y").unwrap();
        assert!(failed.completed(PathBuf::from("a.mp4")).is_err());
    }

    #[test]
    fn test_progress_cannot_regress() {
        let job = Job::new(Uuid::new_v4())
            .processing(PROGRESS_GENERATING, MSG_GENERATING)
            .unwrap();
        assert!(matches!(
            job.processing(PROGRESS_INITIALIZING, MSG_INITIALIZING),
            Err(TransitionError::ProgressRegression { current: 20, requested: 10, .. })
        ));
    }

    #[test]
    fn test_serialized_shape() {
        let job = Job::new(Uuid::new_v4());
        let value = serde_json::to_value(&job).unwrap();

        assert_eq!(value["job_id"], job.id().to_string());
        assert_eq!(value["status"], "started");
        assert_eq!(value["progress"], 0);
        assert!(value["artifact_path"].is_null());
        assert!(value["error"].is_null());
        assert!(value["created_at"].is_string());
    }
}
