//! Job-related API endpoints

use std::time::Duration;

use animate_core::domain::job::Job;
use animate_core::dto::job::{GenerateRequest, GenerateResponse, HelloResponse};
use tokio::time::Instant;
use uuid::Uuid;

use crate::AnimateClient;
use crate::error::{ClientError, Result};

/// Consecutive 5xx answers tolerated while waiting
const MAX_STATUS_RETRIES: u32 = 3;

impl AnimateClient {
    /// Check that the server is up
    pub async fn hello(&self) -> Result<HelloResponse> {
        let response = self.client.get(self.url("/api/hello")).send().await?;
        self.handle_response(response).await
    }

    /// Submit a generation request
    ///
    /// # Returns
    /// The new job id; the job itself runs in the background on the server
    pub async fn generate(&self, req: &GenerateRequest) -> Result<GenerateResponse> {
        let response = self
            .client
            .post(self.url("/api/generate"))
            .json(req)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Current snapshot of a job
    pub async fn status(&self, job_id: Uuid) -> Result<Job> {
        let url = self.url(&format!("/api/status/{}", job_id));
        let response = self.client.get(&url).send().await?;
        self.handle_response(response).await
    }

    /// Cancel a running job
    ///
    /// # Returns
    /// The job record after cancellation, normally `failed`
    pub async fn cancel(&self, job_id: Uuid) -> Result<Job> {
        let url = self.url(&format!("/api/cancel/{}", job_id));
        let response = self.client.post(&url).send().await?;
        self.handle_response(response).await
    }

    /// Poll a job until it is completed or failed
    ///
    /// # Arguments
    /// * `poll_interval` - Delay between status requests
    /// * `max_wait` - Give up with `ClientError::Timeout` after this long
    ///
    /// Short server outages (5xx) are retried.
    pub async fn wait_for_completion(
        &self,
        job_id: Uuid,
        poll_interval: Duration,
        max_wait: Duration,
    ) -> Result<Job> {
        let started = Instant::now();
        let mut failures = 0;
        loop {
            let job = match self.status(job_id).await {
                Ok(job) => {
                    failures = 0;
                    job
                }
                Err(e) if e.is_server_error() && failures < MAX_STATUS_RETRIES => {
                    failures += 1;
                    tracing::warn!("Status check of job {} failed: {}", job_id, e);
                    tokio::time::sleep(poll_interval).await;
                    continue;
                }
                Err(e) => return Err(e),
            };
            if job.is_terminal() {
                return Ok(job);
            }

            if started.elapsed() >= max_wait {
                return Err(ClientError::Timeout {
                    job_id,
                    status: job.status(),
                    waited_secs: started.elapsed().as_secs(),
                });
            }

            tracing::debug!("Job {} is {} ({}%)", job_id, job.status(), job.progress());
            tokio::time::sleep(poll_interval).await;
        }
    }
}
