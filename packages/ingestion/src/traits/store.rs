//! Storage trait for job postings.
//!
//! The store is a thin capability over a persistent key-indexed
//! collection: point lookup, single-document replace, and a batched
//! conditional insert. It owns no classification logic — that lives in
//! [`BatchIngestor`](crate::ingest::BatchIngestor).

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

use crate::error::Result;
use crate::types::job::JobPosting;

/// Per-key outcome of a batched conditional insert.
///
/// Carries both the aggregate count the store reported and the exact set
/// of keys it inserted, so the two can be reconciled downstream. A key
/// absent from the set either already existed before the call or was a
/// repeat within the batch.
#[derive(Debug, Clone, Default)]
pub struct InsertOutcome {
    inserted: u64,
    inserted_keys: HashSet<String>,
}

impl InsertOutcome {
    /// Build an outcome from the set of keys the store actually inserted.
    pub fn from_keys(keys: impl IntoIterator<Item = String>) -> Self {
        let inserted_keys: HashSet<String> = keys.into_iter().collect();
        Self {
            inserted: inserted_keys.len() as u64,
            inserted_keys,
        }
    }

    /// Build an outcome from a reported aggregate count and the inserted
    /// key set.
    ///
    /// The two are stored separately so a disagreement between them stays
    /// observable instead of being papered over.
    pub fn new(inserted: u64, keys: impl IntoIterator<Item = String>) -> Self {
        Self {
            inserted,
            inserted_keys: keys.into_iter().collect(),
        }
    }

    /// Number of documents the store reported as inserted by this call.
    pub fn inserted_count(&self) -> u64 {
        self.inserted
    }

    /// Whether this call inserted the given key.
    pub fn was_inserted(&self, key: &str) -> bool {
        self.inserted_keys.contains(key)
    }

    /// Keys inserted by this call.
    pub fn inserted_keys(&self) -> impl Iterator<Item = &str> {
        self.inserted_keys.iter().map(String::as_str)
    }
}

/// Storage adapter for job postings.
///
/// Implementations must make the insert-if-absent decision of
/// [`insert_new_only`](JobStore::insert_new_only) atomically per key at
/// the storage layer; a separate check-then-insert in application code
/// would leave a race window between the existence check and the insert.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Point lookup by external key. Absence is the expected case for a
    /// not-yet-seen posting and is not an error.
    async fn find_by_key(&self, key: &str) -> Result<Option<JobPosting>>;

    /// Bulk lookup by external keys. Missing keys are skipped.
    ///
    /// The default implementation loops [`find_by_key`](JobStore::find_by_key);
    /// backends with a native batch lookup should override it.
    async fn find_by_keys(&self, keys: &[&str]) -> Result<Vec<JobPosting>> {
        let mut found = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(job) = self.find_by_key(key).await? {
                found.push(job);
            }
        }
        Ok(found)
    }

    /// Replace the stored payload for `job.key` in full.
    ///
    /// Fails with `NotFound` when no posting with that key exists; this
    /// path never inserts.
    async fn replace(&self, job: &JobPosting) -> Result<()>;

    /// Insert every posting in `batch` whose key is not yet stored.
    ///
    /// Existing documents are left completely unmodified — no partial
    /// merge, no field overwrite. Repeated keys within `batch` persist at
    /// most one document. The returned outcome reports, per key, whether
    /// this call created it.
    async fn insert_new_only(&self, batch: &[JobPosting]) -> Result<InsertOutcome>;
}

// A store handle is a long-lived shared resource: workers clone one Arc
// instead of opening a connection per batch.
#[async_trait]
impl<S: JobStore + ?Sized> JobStore for Arc<S> {
    async fn find_by_key(&self, key: &str) -> Result<Option<JobPosting>> {
        (**self).find_by_key(key).await
    }

    async fn find_by_keys(&self, keys: &[&str]) -> Result<Vec<JobPosting>> {
        (**self).find_by_keys(keys).await
    }

    async fn replace(&self, job: &JobPosting) -> Result<()> {
        (**self).replace(job).await
    }

    async fn insert_new_only(&self, batch: &[JobPosting]) -> Result<InsertOutcome> {
        (**self).insert_new_only(batch).await
    }
}
