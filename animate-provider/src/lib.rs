//! Animate Provider
//!
//! The boundary between Express Animate and the hosted video-generation model.
//!
//! A provider takes validated [`GenerationParams`], runs the (possibly
//! minutes-long) generation remotely and hands back the path of a local video
//! file. `Ok(None)` means the provider finished without producing a usable
//! file.
//!
//! # Example
//!
//! ```no_run
//! use animate_core::dto::job::GenerateRequest;
//! use animate_core::params::GenerationParams;
//! use animate_provider::{ReplicateConfig, ReplicateProvider, VideoProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = ReplicateProvider::new(ReplicateConfig::new("r8_token"))?;
//!     let params = GenerationParams::from_request(GenerateRequest::new("A cat on a skateboard"))?;
//!
//!     if let Some(path) = provider.generate(&params).await? {
//!         println!("Video written to {}", path.display());
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
mod mock;
mod replicate;

use std::path::PathBuf;

use animate_core::params::GenerationParams;
use async_trait::async_trait;

// Re-export commonly used types
pub use error::{ProviderError, Result};
pub use mock::MockProvider;
pub use replicate::{
    DEFAULT_BASE_URL, DEFAULT_MODEL, Prediction, PredictionStatus, ReplicateConfig,
    ReplicateProvider,
};

/// A remote video-generation capability
#[async_trait]
pub trait VideoProvider: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Generate a video for the given parameters
    ///
    /// # Returns
    /// The local path of the produced file, or `None` when the provider
    /// reported success without any usable output
    async fn generate(&self, params: &GenerationParams) -> Result<Option<PathBuf>>;
}
