//! Job Repository
//!
//! Holds the current snapshot of every job, keyed by id.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use animate_core::domain::job::{Job, TransitionError};
use thiserror::Error;
use uuid::Uuid;

/// Store error type
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("job {0} not found")]
    NotFound(Uuid),

    #[error("job {0} already exists")]
    Duplicate(Uuid),

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// Concurrent job storage
///
/// Updates replace the whole record under the store's own synchronization,
/// so readers observe either the previous snapshot or the next one.
pub trait JobStore: Send + Sync {
    /// Inserts a new job; fails if the id is already taken
    fn insert(&self, job: Job) -> Result<(), StoreError>;

    /// Returns a snapshot of the job
    fn get(&self, id: Uuid) -> Option<Job>;

    /// Applies a transition to the stored job and stores the result
    ///
    /// # Returns
    /// The new snapshot
    fn update(
        &self,
        id: Uuid,
        transition: &dyn Fn(&Job) -> Result<Job, TransitionError>,
    ) -> Result<Job, StoreError>;

    /// Removes a job, returning its last snapshot
    fn remove(&self, id: Uuid) -> Option<Job>;

    /// Snapshots of all stored jobs
    fn list(&self) -> Vec<Job>;
}

/// In-memory implementation of JobStore
///
/// A `HashMap` behind an `RwLock`. Poisoned locks are recovered: every
/// write is a single `insert` of a fully built record.
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<Uuid, Job>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<Uuid, Job>> {
        self.jobs.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Uuid, Job>> {
        self.jobs.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl JobStore for InMemoryJobStore {
    fn insert(&self, job: Job) -> Result<(), StoreError> {
        let mut jobs = self.write();
        if jobs.contains_key(&job.id()) {
            return Err(StoreError::Duplicate(job.id()));
        }
        jobs.insert(job.id(), job);
        Ok(())
    }

    fn get(&self, id: Uuid) -> Option<Job> {
        self.read().get(&id).cloned()
    }

    fn update(
        &self,
        id: Uuid,
        transition: &dyn Fn(&Job) -> Result<Job, TransitionError>,
    ) -> Result<Job, StoreError> {
        let mut jobs = self.write();
        let current = jobs.get(&id).ok_or(StoreError::NotFound(id))?;
        let next = transition(current)?;
        jobs.insert(id, next.clone());
        Ok(next)
    }

    fn remove(&self, id: Uuid) -> Option<Job> {
        self.write().remove(&id)
    }

    fn list(&self) -> Vec<Job> {
        self.read().values().cloned().collect()
    }
}
