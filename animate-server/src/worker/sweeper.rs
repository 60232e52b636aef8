//! Retention sweeper
//!
//! Periodically drops finished jobs older than the configured TTL together
//! with their artifacts. Running jobs are never touched.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::repository::JobStore;
use crate::storage::ArtifactStorage;

/// Removes terminal jobs whose last update is at least `ttl` old
///
/// # Returns
/// The number of jobs removed
pub async fn sweep_expired(
    store: &dyn JobStore,
    storage: &ArtifactStorage,
    ttl: Duration,
    now: DateTime<Utc>,
) -> usize {
    let ttl = TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX);
    let expired: Vec<_> = store
        .list()
        .into_iter()
        .filter(|job| job.is_terminal() && now - job.updated_at() >= ttl)
        .collect();

    let mut removed = 0;
    for job in expired {
        if store.remove(job.id()).is_none() {
            continue;
        }
        removed += 1;

        // A copy that outlived its cancelled job can still sit at the
        // job's storage path
        let mut paths = vec![storage.path_for(job.id())];
        if let Some(path) = job.artifact_path() {
            if !paths.iter().any(|p| p == path) {
                paths.push(path.to_path_buf());
            }
        }
        for path in paths {
            if let Err(e) = storage.remove(&path).await {
                warn!("Failed to delete artifact {}: {}", path.display(), e);
            }
        }
        debug!("Evicted job {} ({})", job.id(), job.status());
    }

    removed
}

/// Starts the sweep loop; it stops when `shutdown` is cancelled
pub fn spawn_sweeper(
    store: Arc<dyn JobStore>,
    storage: ArtifactStorage,
    ttl: Duration,
    every: Duration,
    shutdown: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting job sweeper (ttl: {:?}, interval: {:?})", ttl, every);
        let mut ticker = time::interval(every);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let removed = sweep_expired(store.as_ref(), &storage, ttl, Utc::now()).await;
            if removed > 0 {
                info!("Evicted {} expired job(s)", removed);
            }
        }

        debug!("Job sweeper stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryJobStore;
    use animate_core::domain::job::Job;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_sweep_removes_only_expired_terminal_jobs() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = ArtifactStorage::new(tmp.path());
        let store = InMemoryJobStore::new();

        let done = Job::new(Uuid::new_v4());
        let done_path = storage.path_for(done.id());
        std::fs::write(&done_path, b"video").unwrap();
        let done = done.completed(done_path.clone()).unwrap();

        let failed = Job::new(Uuid::new_v4()).failed("x", "boom").unwrap();
        let running = Job::new(Uuid::new_v4())
            .processing(20, "Generating video with AI...")
            .unwrap();

        for job in [&done, &failed, &running] {
            store.insert((*job).clone()).unwrap();
        }

        // Nothing is old enough yet
        let ttl = Duration::from_secs(60);
        assert_eq!(sweep_expired(&store, &storage, ttl, Utc::now()).await, 0);

        let later = Utc::now() + TimeDelta::seconds(120);
        assert_eq!(sweep_expired(&store, &storage, ttl, later).await, 2);

        assert!(store.get(done.id()).is_none());
        assert!(store.get(failed.id()).is_none());
        assert!(store.get(running.id()).is_some());
        assert!(!done_path.exists());
    }

    #[tokio::test]
    async fn test_sweep_removes_orphaned_copy_of_failed_job() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = ArtifactStorage::new(tmp.path());
        let store = InMemoryJobStore::new();

        let failed = Job::new(Uuid::new_v4())
            .failed("Generation cancelled", "Generation cancelled")
            .unwrap();
        let orphan = storage.path_for(failed.id());
        std::fs::write(&orphan, b"late copy").unwrap();
        store.insert(failed).unwrap();

        let later = Utc::now() + TimeDelta::seconds(120);
        assert_eq!(
            sweep_expired(&store, &storage, Duration::from_secs(60), later).await,
            1
        );
        assert!(!orphan.exists());
    }

    #[tokio::test]
    async fn test_sweeper_stops_on_shutdown() {
        let store: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());
        let shutdown = CancellationToken::new();
        let handle = spawn_sweeper(
            store,
            ArtifactStorage::new("unused"),
            Duration::from_secs(1),
            Duration::from_millis(10),
            shutdown.clone(),
        );

        shutdown.cancel();
        time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweeper should stop")
            .unwrap();
    }
}
