//! Artifact storage
//!
//! Generated videos live in one directory, one `<job_id>.mp4` file per job.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

pub const VIDEO_EXTENSION: &str = "mp4";

/// Directory of generated videos
#[derive(Debug, Clone)]
pub struct ArtifactStorage {
    dir: PathBuf,
}

impl ArtifactStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creates the directory if it does not exist yet
    pub async fn ensure_dir(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    /// Deterministic location of a job's video
    pub fn path_for(&self, job_id: Uuid) -> PathBuf {
        self.dir.join(format!("{}.{}", job_id, VIDEO_EXTENSION))
    }

    /// Copies a provider output into storage
    ///
    /// The source is removed afterwards unless it already is the target.
    /// Failing to remove it is only logged.
    pub async fn store(&self, job_id: Uuid, source: &Path) -> io::Result<PathBuf> {
        let target = self.path_for(job_id);
        if source == target {
            return Ok(target);
        }

        self.ensure_dir().await?;
        tokio::fs::copy(source, &target).await?;
        debug!("Stored artifact for job {} at {}", job_id, target.display());

        if let Err(e) = tokio::fs::remove_file(source).await {
            warn!(
                "Failed to remove provider output {}: {}",
                source.display(),
                e
            );
        }

        Ok(target)
    }

    /// Deletes an artifact; a missing file is not an error
    pub async fn remove(&self, path: &Path) -> io::Result<()> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}
