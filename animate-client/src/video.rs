//! Video endpoints

use std::path::Path;

use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::AnimateClient;
use crate::error::Result;

impl AnimateClient {
    /// URL for inline playback of a job's video
    pub fn stream_url(&self, job_id: Uuid) -> String {
        self.url(&format!("/api/video/{}", job_id))
    }

    /// Save a completed job's video to `dest`
    ///
    /// # Returns
    /// Number of bytes written
    pub async fn download(&self, job_id: Uuid, dest: impl AsRef<Path>) -> Result<u64> {
        let dest = dest.as_ref();
        let url = self.url(&format!("/api/download/{}", job_id));
        let response = self.client.get(&url).send().await?;
        let mut response = self.check_status(response).await?;

        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        tracing::debug!("Saved video of job {} to {}", job_id, dest.display());
        Ok(written)
    }
}
