//! Video command handlers

use std::path::PathBuf;

use animate_client::{AnimateClient, ClientError};
use anyhow::{Context, Result};
use colored::*;
use uuid::Uuid;

/// Default file name for a job's video
fn default_output(job_id: Uuid) -> PathBuf {
    PathBuf::from(format!("express_animate_{}.mp4", job_id))
}

pub async fn download(client: &AnimateClient, job_id: Uuid, output: Option<PathBuf>) -> Result<()> {
    let dest = output.unwrap_or_else(|| default_output(job_id));

    let bytes = match client.download(job_id, &dest).await {
        Ok(bytes) => bytes,
        Err(e) => {
            if let Some(hint) = download_hint(&e) {
                println!("{}", hint.yellow());
            }
            return Err(e).with_context(|| format!("Failed to download video of job {}", job_id));
        }
    };

    println!(
        "{} Saved {} ({} bytes)",
        "✓".green(),
        dest.display().to_string().cyan(),
        bytes
    );
    println!(
        "{}",
        format!("Stream: {}", client.stream_url(job_id)).dimmed()
    );
    Ok(())
}

/// Next step for the user after a rejected download
fn download_hint(err: &ClientError) -> Option<&'static str> {
    if err.is_not_found() {
        Some("The job does not exist or has expired.")
    } else if err.is_client_error() {
        Some("The video is not ready yet; check `animate status` or use `animate wait`.")
    } else if err.is_server_error() {
        Some("The server failed; try again later.")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_name() {
        let id = Uuid::new_v4();
        assert_eq!(
            default_output(id),
            PathBuf::from(format!("express_animate_{}.mp4", id))
        );
    }

    #[test]
    fn test_download_hints() {
        let hint = |status| download_hint(&ClientError::api_error(status, "x"));
        assert!(hint(404).unwrap().contains("expired"));
        assert!(hint(400).unwrap().contains("not ready"));
        assert!(hint(502).unwrap().contains("try again"));
        assert!(download_hint(&ClientError::ParseError("bad".to_string())).is_none());
    }
}
