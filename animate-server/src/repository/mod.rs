//! Repository Module
//!
//! Storage for job records. The orchestrator only talks to the `JobStore`
//! trait, so the in-memory map can be swapped for an external store.

pub mod job;

// Re-export for convenience
pub use job::{InMemoryJobStore, JobStore, StoreError};
