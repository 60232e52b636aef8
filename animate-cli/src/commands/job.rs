//! Job command handlers
//!
//! Submission, status, waiting and cancellation.

use std::path::PathBuf;
use std::time::Duration;

use animate_client::AnimateClient;
use animate_core::domain::job::{Job, JobStatus};
use animate_core::dto::job::GenerateRequest;
use anyhow::{Result, bail};
use clap::Args;
use colored::*;
use uuid::Uuid;

use super::video;

const WAIT_INTERVAL: Duration = Duration::from_secs(2);
const WAIT_TIMEOUT: Duration = Duration::from_secs(900);

/// Arguments of `animate generate`
#[derive(Args)]
pub struct GenerateArgs {
    /// Text description of the video
    pub prompt: String,

    /// Length in seconds
    #[arg(short, long)]
    pub duration: Option<i64>,

    /// Resolution, e.g. 1280*720 or 720p
    #[arg(short, long)]
    pub quality: Option<String>,

    /// Things the video should avoid
    #[arg(long)]
    pub negative_prompt: Option<String>,

    /// Disable automatic prompt expansion
    #[arg(long)]
    pub no_expand: bool,

    /// Wait for the job to finish
    #[arg(short, long)]
    pub wait: bool,

    /// Download the video here once finished (implies --wait)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl GenerateArgs {
    fn to_request(&self) -> GenerateRequest {
        GenerateRequest {
            prompt: Some(self.prompt.clone()),
            duration: self.duration,
            quality: self.quality.clone(),
            negative_prompt: self.negative_prompt.clone(),
            enable_prompt_expansion: self.no_expand.then_some(false),
        }
    }
}

pub async fn hello(client: &AnimateClient) -> Result<()> {
    let hello = client.hello().await?;
    println!(
        "{} {} {}",
        "✓".green(),
        hello.message,
        format!("(v{})", hello.version).dimmed()
    );
    Ok(())
}

pub async fn generate(client: &AnimateClient, args: GenerateArgs) -> Result<()> {
    let started = client.generate(&args.to_request()).await?;

    println!("{}", "✓ Generation started".green().bold());
    println!("  Job ID: {}", started.job_id.to_string().cyan());
    println!("  Status: {}", colorize_status(started.status));

    if !args.wait && args.output.is_none() {
        println!();
        println!(
            "{}",
            format!("Track it with: animate status {}", started.job_id).dimmed()
        );
        return Ok(());
    }

    println!();
    let job = wait(client, started.job_id, WAIT_INTERVAL, WAIT_TIMEOUT).await?;

    if let Some(output) = args.output {
        if job.status() == JobStatus::Completed {
            video::download(client, job.id(), Some(output)).await?;
        }
    }

    Ok(())
}

pub async fn status(client: &AnimateClient, job_id: Uuid) -> Result<()> {
    let job = client.status(job_id).await?;
    print_job_details(&job);
    Ok(())
}

/// Waits for a job and prints its final state
///
/// A failed job is printed and reported as an error.
pub async fn wait(
    client: &AnimateClient,
    job_id: Uuid,
    interval: Duration,
    timeout: Duration,
) -> Result<Job> {
    println!(
        "{}",
        format!("Waiting for job {}...", job_id).dimmed()
    );

    let job = client.wait_for_completion(job_id, interval, timeout).await?;
    print_job_details(&job);

    if job.status() == JobStatus::Failed {
        bail!(
            "job {} failed: {}",
            job_id,
            job.error().unwrap_or("unknown error")
        );
    }
    Ok(job)
}

pub async fn cancel(client: &AnimateClient, job_id: Uuid) -> Result<()> {
    let job = client.cancel(job_id).await?;
    println!("{}", format!("✓ Job {} cancelled", job_id).yellow());
    print_job_details(&job);
    Ok(())
}

/// Print detailed job information
fn print_job_details(job: &Job) {
    println!("{}", "Job Details:".bold());
    println!("  ID:        {}", job.id().to_string().cyan());
    println!("  Status:    {}", colorize_status(job.status()));
    println!("  Progress:  {}%", job.progress());
    println!("  Message:   {}", job.message());
    println!(
        "  Created:   {}",
        job.created_at().format("%Y-%m-%d %H:%M:%S")
    );
    println!(
        "  Updated:   {}",
        job.updated_at().format("%Y-%m-%d %H:%M:%S")
    );

    if let Some(path) = job.artifact_path() {
        println!("  Video:     {}", path.display().to_string().green());
    }
    if let Some(error) = job.error() {
        println!("  Error:     {}", error.red());
    }
}

fn colorize_status(status: JobStatus) -> ColoredString {
    match status {
        JobStatus::Started => status.as_str().blue(),
        JobStatus::Processing => status.as_str().yellow(),
        JobStatus::Completed => status.as_str().green(),
        JobStatus::Failed => status.as_str().red(),
    }
}
