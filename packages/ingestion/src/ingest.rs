//! Batch deduplicating ingestor.
//!
//! Takes a batch of scraped postings, performs one conditional-insert
//! round trip, and splits the batch into postings that were newly
//! persisted versus postings whose key was already stored. Downstream
//! consumers (e.g. a notification pipeline) act on the `new` side only.

use std::collections::HashSet;

use tracing::info;

use crate::error::{IngestError, Result};
use crate::traits::store::JobStore;
use crate::types::job::JobPosting;

/// Partition of an input batch into newly persisted and already-known
/// postings.
///
/// Every input posting lands in exactly one of the two vecs, and both
/// vecs preserve the relative order of the input batch.
#[derive(Debug, Default)]
pub struct BatchPartition {
    /// Postings persisted by this call; safe to announce downstream
    pub new: Vec<JobPosting>,

    /// Postings whose key was already stored, or repeated earlier in the
    /// same batch
    pub existing: Vec<JobPosting>,
}

impl BatchPartition {
    /// Total number of postings classified.
    pub fn len(&self) -> usize {
        self.new.len() + self.existing.len()
    }

    /// True if the input batch was empty.
    pub fn is_empty(&self) -> bool {
        self.new.is_empty() && self.existing.is_empty()
    }
}

/// Batch deduplicating ingestor over a [`JobStore`].
///
/// Holds no locks and coordinates nothing itself: multiple ingestors may
/// run against the same store concurrently, and correctness rests on the
/// store's conditional insert being atomic per key.
///
/// # Example
///
/// ```rust,ignore
/// let ingestor = BatchIngestor::new(MemoryStore::new());
/// let partition = ingestor.ingest(scraped_batch).await?;
/// notifier.announce(&partition.new).await?;
/// ```
pub struct BatchIngestor<S: JobStore> {
    store: S,
}

impl<S: JobStore> BatchIngestor<S> {
    /// Create an ingestor over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Get a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Ingest a batch and classify every posting as new or existing.
    ///
    /// Makes exactly one store round trip (none for an empty batch). A
    /// posting is `new` only if this call created its key; repeated keys
    /// within the batch are `existing` from the second occurrence on.
    /// The classification is exhaustive: every input posting lands on
    /// exactly one side, or the whole call fails without a partial
    /// result.
    pub async fn ingest(&self, batch: Vec<JobPosting>) -> Result<BatchPartition> {
        if batch.is_empty() {
            return Ok(BatchPartition::default());
        }

        let outcome = self.store.insert_new_only(&batch).await?;

        // Classification works off per-key outcomes, never off input
        // position versus an aggregate count: the store performs inserts
        // as an unordered set operation, so the Nth inserted document
        // need not correspond to the Nth input posting.
        let batch_keys: HashSet<&str> = batch.iter().map(|job| job.key.as_str()).collect();
        if let Some(stray) = outcome.inserted_keys().find(|key| !batch_keys.contains(key)) {
            return Err(IngestError::ClassificationInconsistency {
                reason: format!("store reported inserted key {stray:?} that is not in the batch"),
            });
        }

        let reported_keys = outcome.inserted_keys().count() as u64;
        if outcome.inserted_count() != reported_keys {
            return Err(IngestError::ClassificationInconsistency {
                reason: format!(
                    "store reported {} inserts but {} per-key outcomes",
                    outcome.inserted_count(),
                    reported_keys
                ),
            });
        }

        let mut partition = BatchPartition::default();
        // First occurrence of an inserted key claims the `new` slot; the
        // store only ever persisted one document for it.
        let mut claimed: HashSet<String> = HashSet::with_capacity(reported_keys as usize);
        for job in batch {
            if outcome.was_inserted(&job.key) && claimed.insert(job.key.clone()) {
                partition.new.push(job);
            } else {
                partition.existing.push(job);
            }
        }

        info!(
            new = partition.new.len(),
            existing = partition.existing.len(),
            "batch classified"
        );

        Ok(partition)
    }
}
