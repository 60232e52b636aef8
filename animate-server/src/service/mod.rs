//! Service Module
//!
//! Business logic layer of the server.
//! Services sit between the HTTP handlers and the store/worker.

pub mod job;

// Re-export for convenience
pub use job as job_service;
pub use job::{Artifact, ArtifactMode, JobError, JobService};
