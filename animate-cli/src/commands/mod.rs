//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod job;
mod video;

pub use job::GenerateArgs;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Subcommand;
use uuid::Uuid;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Check that the server is running
    Hello,
    /// Submit a new generation job
    Generate(GenerateArgs),
    /// Show the current state of a job
    Status {
        job_id: Uuid,
    },
    /// Wait until a job is completed or failed
    Wait {
        job_id: Uuid,

        /// Seconds between status checks
        #[arg(long, default_value_t = 2)]
        interval: u64,

        /// Give up after this many seconds
        #[arg(long, default_value_t = 900)]
        timeout: u64,
    },
    /// Download the video of a completed job
    Download {
        job_id: Uuid,

        /// Destination file (defaults to express_animate_<job_id>.mp4)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Cancel a running job
    Cancel {
        job_id: Uuid,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    let client = animate_client::AnimateClient::new(&config.server_url);

    match command {
        Commands::Hello => job::hello(&client).await,
        Commands::Generate(args) => job::generate(&client, args).await,
        Commands::Status { job_id } => job::status(&client, job_id).await,
        Commands::Wait {
            job_id,
            interval,
            timeout,
        } => {
            job::wait(
                &client,
                job_id,
                Duration::from_secs(interval),
                Duration::from_secs(timeout),
            )
            .await
            .map(|_| ())
        }
        Commands::Download { job_id, output } => video::download(&client, job_id, output).await,
        Commands::Cancel { job_id } => job::cancel(&client, job_id).await,
    }
}
