//! Offline provider for local development

use std::path::PathBuf;
use std::time::Duration;

use animate_core::params::GenerationParams;
use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use crate::VideoProvider;
use crate::error::Result;

/// Provider that waits a fixed delay and writes a placeholder file
///
/// The file is not a playable video; it only lets the job pipeline run
/// end to end without provider credentials.
#[derive(Debug, Clone)]
pub struct MockProvider {
    delay: Duration,
    output_dir: PathBuf,
}

impl MockProvider {
    pub fn new(delay: Duration, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            delay,
            output_dir: output_dir.into(),
        }
    }
}

#[async_trait]
impl VideoProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, params: &GenerationParams) -> Result<Option<PathBuf>> {
        info!(
            "Mock generation for '{}' ({}s, {})",
            params.prompt, params.duration_secs, params.resolution
        );
        tokio::time::sleep(self.delay).await;

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let path = self.output_dir.join(format!("mock-{}.mp4", Uuid::new_v4()));
        let contents = format!(
            "mock video\nprompt: {}\nduration: {}\nsize: {}\n",
            params.prompt, params.duration_secs, params.resolution
        );
        tokio::fs::write(&path, contents).await?;

        Ok(Some(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use animate_core::dto::job::GenerateRequest;

    #[tokio::test]
    async fn test_mock_writes_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let provider = MockProvider::new(Duration::from_millis(1), dir.path());
        let params = GenerationParams::from_request(GenerateRequest::new("a dog")).unwrap();

        let path = provider.generate(&params).await.unwrap().unwrap();
        assert!(path.starts_with(dir.path()));
        let contents = std::fs::read_to_string(path).unwrap();
        assert!(contents.contains("prompt: a dog"));
    }
}
