//! In-memory storage implementation for testing and development.

use async_trait::async_trait;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{IngestError, Result};
use crate::traits::store::{InsertOutcome, JobStore};
use crate::types::job::JobPosting;

/// In-memory job posting store keyed by external key.
///
/// Useful for testing and development. Not suitable for production as
/// data is lost on restart. The whole batch in `insert_new_only` runs
/// under a single write lock, so the per-key check-and-insert is atomic
/// with respect to concurrent callers.
pub struct MemoryStore {
    jobs: RwLock<HashMap<String, JobPosting>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
        }
    }

    /// Clear all stored postings.
    pub fn clear(&self) {
        self.jobs.write().unwrap().clear();
    }

    /// Get the number of stored postings.
    pub fn job_count(&self) -> usize {
        self.jobs.read().unwrap().len()
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn find_by_key(&self, key: &str) -> Result<Option<JobPosting>> {
        Ok(self.jobs.read().unwrap().get(key).cloned())
    }

    async fn replace(&self, job: &JobPosting) -> Result<()> {
        match self.jobs.write().unwrap().entry(job.key.clone()) {
            Entry::Occupied(mut slot) => {
                slot.insert(job.clone());
                Ok(())
            }
            Entry::Vacant(_) => Err(IngestError::NotFound {
                key: job.key.clone(),
            }),
        }
    }

    async fn insert_new_only(&self, batch: &[JobPosting]) -> Result<InsertOutcome> {
        let mut jobs = self.jobs.write().unwrap();

        let mut inserted_keys = Vec::new();
        for job in batch {
            if let Entry::Vacant(slot) = jobs.entry(job.key.clone()) {
                slot.insert(job.clone());
                inserted_keys.push(job.key.clone());
            }
        }

        Ok(InsertOutcome::from_keys(inserted_keys))
    }
}
