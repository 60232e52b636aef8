//! Job Service
//!
//! Submission, status lookup, artifact retrieval and cancellation.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use animate_core::domain::job::{Job, JobStatus};
use animate_core::dto::job::GenerateRequest;
use animate_core::params::{GenerationParams, ValidationError};
use animate_provider::VideoProvider;
use thiserror::Error;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::repository::{JobStore, StoreError};
use crate::storage::ArtifactStorage;
use crate::worker::{GenerationWorker, WorkerConfig, sweeper};

pub const VIDEO_CONTENT_TYPE: &str = "video/mp4";

/// Service error type
#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("job {0} not found")]
    NotFound(Uuid),

    /// Job exists but has no downloadable video (running, failed, or file gone)
    #[error("job {0} is not ready")]
    NotReady(Uuid),

    #[error("{0}")]
    InvalidState(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for JobError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => JobError::NotFound(id),
            StoreError::Transition(e) => JobError::InvalidState(e.to_string()),
            StoreError::Duplicate(id) => JobError::Internal(format!("duplicate job id {}", id)),
        }
    }
}

/// How a finished video is handed to the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactMode {
    /// Inline playback
    Stream,
    /// Save-as attachment
    Download,
}

/// An open, completed video ready to be sent
#[derive(Debug)]
pub struct Artifact {
    pub job_id: Uuid,
    pub file: tokio::fs::File,
    pub len: u64,
    pub mode: ArtifactMode,
}

impl Artifact {
    /// Suggested file name, `express_animate_<job_id>.mp4`
    pub fn filename(&self) -> String {
        format!("express_animate_{}.mp4", self.job_id)
    }

    pub fn content_disposition(&self) -> String {
        match self.mode {
            ArtifactMode::Stream => "inline".to_string(),
            ArtifactMode::Download => format!("attachment; filename=\"{}\"", self.filename()),
        }
    }
}

/// The job orchestrator
///
/// Owns the job store, the artifact directory and the background worker.
pub struct JobService {
    store: Arc<dyn JobStore>,
    storage: ArtifactStorage,
    worker: GenerationWorker,
}

impl JobService {
    pub fn new(
        store: Arc<dyn JobStore>,
        provider: Arc<dyn VideoProvider>,
        storage: ArtifactStorage,
        config: WorkerConfig,
    ) -> Self {
        let worker = GenerationWorker::new(Arc::clone(&store), provider, storage.clone(), config);
        Self {
            store,
            storage,
            worker,
        }
    }

    pub fn storage(&self) -> &ArtifactStorage {
        &self.storage
    }

    pub fn worker(&self) -> &GenerationWorker {
        &self.worker
    }

    /// Validate a request, record a new `started` job and hand it to the worker
    ///
    /// Returns as soon as the job is stored; generation happens in the
    /// background.
    pub fn submit(&self, req: GenerateRequest) -> Result<Job, JobError> {
        let params = GenerationParams::from_request(req)?;

        let job = Job::new(Uuid::new_v4());
        self.store.insert(job.clone())?;

        tracing::info!(
            "Job {} submitted: '{}' ({}s, {}, expand: {})",
            job.id(),
            params.prompt,
            params.duration_secs,
            params.resolution,
            params.expand_prompt
        );

        self.worker.spawn(job.id(), params);
        Ok(job)
    }

    /// Current snapshot of a job
    pub fn get_status(&self, id: Uuid) -> Result<Job, JobError> {
        self.store.get(id).ok_or(JobError::NotFound(id))
    }

    /// Open the video of a completed job
    pub async fn fetch_artifact(&self, id: Uuid, mode: ArtifactMode) -> Result<Artifact, JobError> {
        let job = self.get_status(id)?;
        if job.status() != JobStatus::Completed {
            return Err(JobError::NotReady(id));
        }
        let path = job.artifact_path().ok_or(JobError::NotReady(id))?;

        let file = match tokio::fs::File::open(path).await {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!("Artifact of job {} is missing: {}", id, path.display());
                return Err(JobError::NotReady(id));
            }
            Err(e) => return Err(JobError::Internal(e.to_string())),
        };
        let len = file
            .metadata()
            .await
            .map_err(|e| JobError::Internal(e.to_string()))?
            .len();

        Ok(Artifact {
            job_id: id,
            file,
            len,
            mode,
        })
    }

    /// Cancel a job that has not finished yet
    pub async fn cancel(&self, id: Uuid) -> Result<Job, JobError> {
        let job = self.get_status(id)?;
        if job.is_terminal() {
            return Err(JobError::InvalidState(format!(
                "Job {} is already {}",
                id,
                job.status()
            )));
        }

        if !self.worker.cancel(id).await {
            tracing::debug!("Job {} had no running task to cancel", id);
        }

        // The task may have finished on its own before the cancel landed
        let job = self.get_status(id)?;
        if job.status() != JobStatus::Failed {
            return Err(JobError::InvalidState(format!(
                "Job {} could not be cancelled: it is {}",
                id,
                job.status()
            )));
        }
        Ok(job)
    }

    /// Start evicting finished jobs older than `ttl`
    pub fn spawn_sweeper(&self, ttl: Duration, every: Duration) -> JoinHandle<()> {
        sweeper::spawn_sweeper(
            Arc::clone(&self.store),
            self.storage.clone(),
            ttl,
            every,
            self.worker.shutdown_token(),
        )
    }

    /// Stop the worker, recording in-flight jobs as abandoned
    pub async fn shutdown(&self, grace: Duration) {
        self.worker.shutdown(grace).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryJobStore;
    use animate_provider::MockProvider;

    fn service(dir: &std::path::Path) -> (Arc<InMemoryJobStore>, JobService) {
        let store = Arc::new(InMemoryJobStore::new());
        let provider = Arc::new(MockProvider::new(Duration::from_secs(60), dir.join("mock")));
        let service = JobService::new(
            store.clone(),
            provider,
            ArtifactStorage::new(dir.join("generated")),
            WorkerConfig::default(),
        );
        (store, service)
    }

    #[tokio::test]
    async fn test_invalid_request_creates_no_job() {
        let tmp = tempfile::tempdir().unwrap();
        let (store, service) = service(tmp.path());

        let err = service.submit(GenerateRequest::new("   ")).unwrap_err();
        assert!(matches!(err, JobError::Validation(ValidationError::EmptyPrompt)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_submit_returns_started_job() {
        let tmp = tempfile::tempdir().unwrap();
        let (_store, service) = service(tmp.path());

        let job = service.submit(GenerateRequest::new("A cat")).unwrap();
        assert_eq!(job.status(), JobStatus::Started);
        assert_eq!(job.progress(), 0);
        assert_eq!(service.get_status(job.id()).unwrap().id(), job.id());
    }

    #[tokio::test]
    async fn test_unknown_job_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let (_store, service) = service(tmp.path());
        let id = Uuid::new_v4();

        assert!(matches!(service.get_status(id), Err(JobError::NotFound(_))));
        assert!(matches!(
            service.fetch_artifact(id, ArtifactMode::Stream).await,
            Err(JobError::NotFound(_))
        ));
        assert!(matches!(service.cancel(id).await, Err(JobError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_artifact_requires_completion_and_file() {
        let tmp = tempfile::tempdir().unwrap();
        let (store, service) = service(tmp.path());

        let running = Job::new(Uuid::new_v4());
        store.insert(running.clone()).unwrap();
        assert!(matches!(
            service.fetch_artifact(running.id(), ArtifactMode::Download).await,
            Err(JobError::NotReady(_))
        ));

        // Completed, but the file was removed behind our back
        let gone = Job::new(Uuid::new_v4())
            .completed(tmp.path().join("gone.mp4"))
            .unwrap();
        store.insert(gone.clone()).unwrap();
        assert!(matches!(
            service.fetch_artifact(gone.id(), ArtifactMode::Stream).await,
            Err(JobError::NotReady(_))
        ));

        let path = tmp.path().join("ok.mp4");
        std::fs::write(&path, b"12345").unwrap();
        let ok = Job::new(Uuid::new_v4()).completed(path).unwrap();
        store.insert(ok.clone()).unwrap();

        let artifact = service
            .fetch_artifact(ok.id(), ArtifactMode::Download)
            .await
            .unwrap();
        assert_eq!(artifact.len, 5);
        assert_eq!(
            artifact.content_disposition(),
            format!("attachment; filename=\"express_animate_{}.mp4\"", ok.id())
        );
    }

    #[tokio::test]
    async fn test_cancel_terminal_job_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let (store, service) = service(tmp.path());

        let failed = Job::new(Uuid::new_v4()).failed("x", "y").unwrap();
        store.insert(failed.clone()).unwrap();
        assert!(matches!(
            service.cancel(failed.id()).await,
            Err(JobError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn test_cancel_without_effect_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let (store, service) = service(tmp.path());

        // No worker task owns this job, so cancelling cannot fail it
        let orphan = Job::new(Uuid::new_v4());
        store.insert(orphan.clone()).unwrap();

        let err = service.cancel(orphan.id()).await.unwrap_err();
        assert!(matches!(err, JobError::InvalidState(_)));
        assert_eq!(store.get(orphan.id()).unwrap().status(), JobStatus::Started);
    }

    #[tokio::test]
    async fn test_cancel_in_flight_job() {
        let tmp = tempfile::tempdir().unwrap();
        let (_store, service) = service(tmp.path());

        let job = service.submit(GenerateRequest::new("slow")).unwrap();
        let cancelled = service.cancel(job.id()).await.unwrap();
        assert_eq!(cancelled.status(), JobStatus::Failed);
        assert_eq!(cancelled.error(), Some(crate::worker::ERR_CANCELLED));
    }
}
