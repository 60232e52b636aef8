//! Express Animate HTTP Client
//!
//! A typed client for the Express Animate server API, used by the CLI and
//! usable from any other Rust program that wants to drive generation jobs.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use animate_client::AnimateClient;
//! use animate_core::dto::job::GenerateRequest;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = AnimateClient::new("http://localhost:5000");
//!
//!     let started = client.generate(&GenerateRequest::new("A cat on a skateboard")).await?;
//!     let job = client
//!         .wait_for_completion(started.job_id, Duration::from_secs(2), Duration::from_secs(600))
//!         .await?;
//!     println!("Job {} is {}", job.id(), job.status());
//!
//!     client.download(job.id(), "cat.mp4").await?;
//!     Ok(())
//! }
//! ```

pub mod error;
mod jobs;
mod video;

// Re-export commonly used types
pub use error::{ClientError, Result};

use reqwest::Client;
use serde::de::DeserializeOwned;

/// HTTP client for the Express Animate API
#[derive(Debug, Clone)]
pub struct AnimateClient {
    /// Base URL of the server (e.g., "http://localhost:5000")
    base_url: String,
    client: Client,
}

impl AnimateClient {
    /// Create a new client
    ///
    /// # Example
    /// ```
    /// use animate_client::AnimateClient;
    ///
    /// let client = AnimateClient::new("http://localhost:5000/");
    /// assert_eq!(client.base_url(), "http://localhost:5000");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the server
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Fails with the server's error message, or returns the response untouched
    async fn check_status(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(ClientError::from_body(status.as_u16(), &body))
    }

    /// Handle an API response and deserialize JSON
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        self.check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = AnimateClient::new("http://localhost:5000");
        assert_eq!(client.base_url(), "http://localhost:5000");
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = AnimateClient::new("http://localhost:5000/");
        assert_eq!(client.base_url(), "http://localhost:5000");
        assert_eq!(client.url("/api/hello"), "http://localhost:5000/api/hello");
    }

    #[test]
    fn test_client_with_custom_client() {
        let client = AnimateClient::with_client("http://localhost:5000", Client::new());
        assert_eq!(client.base_url(), "http://localhost:5000");
    }
}
