//! Generation worker
//!
//! Each submitted job runs in its own tokio task. A semaphore bounds how many
//! provider calls run at the same time; jobs waiting for a slot stay
//! `started`. Every job has a timeout and a cancellation token, and its task
//! always writes exactly one terminal update.

pub mod sweeper;

use std::any::Any;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use animate_core::domain::job::{
    ERR_NO_OUTPUT, MSG_GENERATING, MSG_INITIALIZING, MSG_NO_OUTPUT, PROGRESS_GENERATING,
    PROGRESS_INITIALIZING,
};
use animate_core::params::GenerationParams;
use animate_provider::VideoProvider;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tokio_util::task::{AbortOnDropHandle, TaskTracker};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::repository::JobStore;
use crate::storage::ArtifactStorage;

pub const ERR_CANCELLED: &str = "Generation cancelled";
pub const ERR_ABANDONED: &str = "Generation abandoned: server shutting down";

/// How long `cancel` waits for the job task to record its failure
const CANCEL_WAIT: Duration = Duration::from_secs(5);

/// Worker limits
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Max provider calls in flight
    pub max_concurrent_jobs: usize,
    /// Max time a single provider call may take
    pub job_timeout: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 4,
            job_timeout: Duration::from_secs(900),
        }
    }
}

#[derive(Clone)]
struct RunningJob {
    cancel: CancellationToken,
    finished: CancellationToken,
}

/// How a job's run ended
#[derive(Debug)]
enum Outcome {
    Stored(PathBuf),
    NoOutput,
    CopyFailed(String),
    ProviderFailed(String),
    TimedOut(Duration),
    Cancelled,
    Abandoned,
}

struct WorkerContext {
    store: Arc<dyn JobStore>,
    provider: Arc<dyn VideoProvider>,
    storage: ArtifactStorage,
    semaphore: Arc<Semaphore>,
    job_timeout: Duration,
    running: Mutex<HashMap<Uuid, RunningJob>>,
}

/// Spawns and tracks background generation tasks
pub struct GenerationWorker {
    ctx: Arc<WorkerContext>,
    shutdown: CancellationToken,
    tracker: TaskTracker,
}

impl GenerationWorker {
    pub fn new(
        store: Arc<dyn JobStore>,
        provider: Arc<dyn VideoProvider>,
        storage: ArtifactStorage,
        config: WorkerConfig,
    ) -> Self {
        let ctx = WorkerContext {
            store,
            provider,
            storage,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent_jobs.max(1))),
            job_timeout: config.job_timeout,
            running: Mutex::new(HashMap::new()),
        };

        Self {
            ctx: Arc::new(ctx),
            shutdown: CancellationToken::new(),
            tracker: TaskTracker::new(),
        }
    }

    /// Starts the background run of a job that is already in the store
    ///
    /// Returns immediately; the task owns every further update of the job.
    pub fn spawn(&self, job_id: Uuid, params: GenerationParams) {
        let running = RunningJob {
            cancel: self.shutdown.child_token(),
            finished: CancellationToken::new(),
        };
        self.ctx.lock_running().insert(job_id, running.clone());

        let ctx = Arc::clone(&self.ctx);
        let shutdown = self.shutdown.clone();

        self.tracker.spawn(async move {
            let outcome = tokio::select! {
                biased;
                _ = running.cancel.cancelled() => {
                    if shutdown.is_cancelled() {
                        Outcome::Abandoned
                    } else {
                        Outcome::Cancelled
                    }
                }
                outcome = ctx.execute(job_id, params) => outcome,
            };

            ctx.finish(job_id, outcome).await;
            ctx.lock_running().remove(&job_id);
            running.finished.cancel();
        });
    }

    /// Cancels an in-flight job and waits briefly for its failure to be recorded
    ///
    /// # Returns
    /// `false` if the job has no running task
    pub async fn cancel(&self, job_id: Uuid) -> bool {
        let Some(running) = self.ctx.lock_running().get(&job_id).cloned() else {
            return false;
        };

        info!("Cancelling job {}", job_id);
        running.cancel.cancel();

        if tokio::time::timeout(CANCEL_WAIT, running.finished.cancelled())
            .await
            .is_err()
        {
            warn!("Job {} did not stop within {:?}", job_id, CANCEL_WAIT);
        }
        true
    }

    /// Number of jobs whose task has not finished yet
    pub fn active_jobs(&self) -> usize {
        self.ctx.lock_running().len()
    }

    /// Token cancelled when the worker shuts down
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Abandons every in-flight job and waits up to `grace` for the tasks
    /// to record it
    pub async fn shutdown(&self, grace: Duration) {
        let active = self.active_jobs();
        if active > 0 {
            info!("Abandoning {} in-flight job(s)", active);
        }

        self.shutdown.cancel();
        self.tracker.close();

        if tokio::time::timeout(grace, self.tracker.wait()).await.is_err() {
            warn!("Worker tasks still running after {:?}", grace);
        }
    }
}

impl WorkerContext {
    fn lock_running(&self) -> MutexGuard<'_, HashMap<Uuid, RunningJob>> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn execute(&self, job_id: Uuid, params: GenerationParams) -> Outcome {
        let _permit = match Arc::clone(&self.semaphore).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => return Outcome::Abandoned,
        };

        self.advance(job_id, PROGRESS_INITIALIZING, MSG_INITIALIZING);
        self.advance(job_id, PROGRESS_GENERATING, MSG_GENERATING);

        info!(
            "Generating job {} with provider {}",
            job_id,
            self.provider.name()
        );

        // Own task so a provider panic surfaces as a JoinError
        let provider = Arc::clone(&self.provider);
        let call = AbortOnDropHandle::new(tokio::spawn(async move {
            provider.generate(&params).await
        }));

        let output = match tokio::time::timeout(self.job_timeout, call).await {
            Err(_) => return Outcome::TimedOut(self.job_timeout),
            Ok(Err(join_error)) => {
                return Outcome::ProviderFailed(describe_join_error(join_error));
            }
            Ok(Ok(Err(e))) => return Outcome::ProviderFailed(e.to_string()),
            Ok(Ok(Ok(output))) => output,
        };

        let Some(source) = output else {
            return Outcome::NoOutput;
        };
        if !tokio::fs::try_exists(&source).await.unwrap_or(false) {
            warn!(
                "Provider output {} for job {} does not exist",
                source.display(),
                job_id
            );
            return Outcome::NoOutput;
        }

        match self.storage.store(job_id, &source).await {
            Ok(path) => Outcome::Stored(path),
            Err(e) => Outcome::CopyFailed(e.to_string()),
        }
    }

    fn advance(&self, job_id: Uuid, progress: u8, message: &str) {
        match self
            .store
            .update(job_id, &|job| job.processing(progress, message))
        {
            Ok(_) => debug!("Job {} at {}%: {}", job_id, progress, message),
            Err(e) => warn!("Failed to advance job {}: {}", job_id, e),
        }
    }

    async fn finish(&self, job_id: Uuid, outcome: Outcome) {
        let (message, error) = match outcome {
            Outcome::Stored(path) => {
                match self.store.update(job_id, &|job| job.completed(path.clone())) {
                    Ok(_) => info!("Job {} completed: {}", job_id, path.display()),
                    Err(e) => {
                        warn!("Failed to complete job {}: {}", job_id, e);
                        self.discard_artifact(job_id).await;
                    }
                }
                return;
            }
            Outcome::NoOutput => (MSG_NO_OUTPUT.to_string(), ERR_NO_OUTPUT.to_string()),
            Outcome::CopyFailed(e) => (format!("Failed to save video: {}", e), e),
            Outcome::ProviderFailed(e) => (format!("Generation error: {}", e), e),
            Outcome::TimedOut(limit) => {
                let e = format!("Generation timed out after {:?}", limit);
                (format!("Generation error: {}", e), e)
            }
            Outcome::Cancelled => (ERR_CANCELLED.to_string(), ERR_CANCELLED.to_string()),
            Outcome::Abandoned => (ERR_ABANDONED.to_string(), ERR_ABANDONED.to_string()),
        };

        error!("Job {} failed: {}", job_id, error);
        self.discard_artifact(job_id).await;

        if let Err(e) = self
            .store
            .update(job_id, &|job| job.failed(message.as_str(), error.as_str()))
        {
            warn!("Failed to record failure of job {}: {}", job_id, e);
        }
    }

    /// Removes a partially written artifact, if any
    async fn discard_artifact(&self, job_id: Uuid) {
        let path = self.storage.path_for(job_id);
        if let Err(e) = self.storage.remove(&path).await {
            warn!("Failed to remove artifact {}: {}", path.display(), e);
        }
    }
}

fn describe_join_error(err: tokio::task::JoinError) -> String {
    if !err.is_panic() {
        return "provider task was cancelled".to_string();
    }
    let payload: Box<dyn Any + Send> = err.into_panic();
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    format!("provider panicked: {}", detail)
}
