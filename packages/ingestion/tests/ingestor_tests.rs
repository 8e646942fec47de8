//! End-to-end tests for the batch deduplicating ingestor.
//!
//! These run against `MemoryStore`; the same scenarios run against real
//! Postgres in `postgres_store_tests.rs` under the `postgres` feature.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use ingestion::{
    BatchIngestor, IngestError, InsertOutcome, JobPosting, JobStore, MemoryStore, Result,
};
use proptest::prelude::*;

/// Store wrapper that counts calls, for asserting round-trip behavior.
struct CountingStore<S> {
    inner: S,
    insert_calls: AtomicUsize,
}

impl<S> CountingStore<S> {
    fn new(inner: S) -> Self {
        Self {
            inner,
            insert_calls: AtomicUsize::new(0),
        }
    }

    fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<S: JobStore> JobStore for CountingStore<S> {
    async fn find_by_key(&self, key: &str) -> Result<Option<JobPosting>> {
        self.inner.find_by_key(key).await
    }

    async fn replace(&self, job: &JobPosting) -> Result<()> {
        self.inner.replace(job).await
    }

    async fn insert_new_only(&self, batch: &[JobPosting]) -> Result<InsertOutcome> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.insert_new_only(batch).await
    }
}

fn job(key: &str, title: &str) -> JobPosting {
    JobPosting::new(key, title, "Acme")
}

fn keys_of(jobs: &[JobPosting]) -> Vec<&str> {
    jobs.iter().map(|j| j.key.as_str()).collect()
}

#[tokio::test]
async fn empty_batch_returns_empty_partition_without_store_calls() {
    let ingestor = BatchIngestor::new(CountingStore::new(MemoryStore::new()));

    let partition = ingestor.ingest(Vec::new()).await.unwrap();

    assert!(partition.new.is_empty());
    assert!(partition.existing.is_empty());
    assert_eq!(ingestor.store().insert_calls(), 0);
}

#[tokio::test]
async fn batch_makes_exactly_one_store_round_trip() {
    let ingestor = BatchIngestor::new(CountingStore::new(MemoryStore::new()));

    let batch = vec![job("a", "A"), job("b", "B"), job("c", "C")];
    ingestor.ingest(batch).await.unwrap();

    assert_eq!(ingestor.store().insert_calls(), 1);
}

#[tokio::test]
async fn partition_is_complete_and_disjoint() {
    let store = MemoryStore::new();
    store
        .insert_new_only(&[job("known", "Known")])
        .await
        .unwrap();

    let ingestor = BatchIngestor::new(store);
    let batch = vec![job("x", "X"), job("known", "Known again"), job("y", "Y")];
    let input_keys: Vec<String> = batch.iter().map(|j| j.key.clone()).collect();

    let partition = ingestor.ingest(batch).await.unwrap();

    assert_eq!(partition.len(), input_keys.len());
    let mut output_keys: Vec<&str> = keys_of(&partition.new);
    output_keys.extend(keys_of(&partition.existing));
    output_keys.sort_unstable();
    let mut expected: Vec<&str> = input_keys.iter().map(String::as_str).collect();
    expected.sort_unstable();
    assert_eq!(output_keys, expected);
}

#[tokio::test]
async fn second_identical_batch_is_all_existing() {
    let ingestor = BatchIngestor::new(MemoryStore::new());
    let batch = vec![job("a", "A"), job("b", "B")];

    let first = ingestor.ingest(batch.clone()).await.unwrap();
    assert_eq!(keys_of(&first.new), vec!["a", "b"]);
    assert!(first.existing.is_empty());

    let second = ingestor.ingest(batch).await.unwrap();
    assert!(second.new.is_empty());
    assert_eq!(keys_of(&second.existing), vec!["a", "b"]);
}

#[tokio::test]
async fn first_writer_wins_and_payload_is_never_overwritten() {
    let ingestor = BatchIngestor::new(MemoryStore::new());

    ingestor
        .ingest(vec![job("a", "Original title")])
        .await
        .unwrap();
    let partition = ingestor
        .ingest(vec![job("a", "Reposted title")])
        .await
        .unwrap();

    assert!(partition.new.is_empty());
    assert_eq!(keys_of(&partition.existing), vec!["a"]);

    let stored = ingestor.store().find_by_key("a").await.unwrap().unwrap();
    assert_eq!(stored.title, "Original title");
}

#[tokio::test]
async fn intra_batch_duplicate_classifies_first_occurrence_as_new() {
    let ingestor = BatchIngestor::new(MemoryStore::new());

    let batch = vec![job("a", "first occurrence"), job("a", "second occurrence")];
    let partition = ingestor.ingest(batch).await.unwrap();

    assert_eq!(partition.new.len(), 1);
    assert_eq!(partition.new[0].title, "first occurrence");
    assert_eq!(partition.existing.len(), 1);
    assert_eq!(partition.existing[0].title, "second occurrence");
    assert_eq!(ingestor.store().job_count(), 1);
}

#[tokio::test]
async fn relative_input_order_is_preserved_in_both_partitions() {
    let store = MemoryStore::new();
    store.insert_new_only(&[job("a", "A")]).await.unwrap();

    let ingestor = BatchIngestor::new(store);
    let batch = vec![
        job("b", "b first"),
        job("a", "a repost"),
        job("b", "b repeat"),
        job("c", "c first"),
    ];

    let partition = ingestor.ingest(batch).await.unwrap();

    assert_eq!(keys_of(&partition.new), vec!["b", "c"]);
    assert_eq!(keys_of(&partition.existing), vec!["a", "b"]);
    assert_eq!(partition.existing[1].title, "b repeat");
}

#[tokio::test]
async fn mixed_batch_of_known_and_unknown_keys() {
    // Store starts with j1; the batch carries j1 (known) plus j2, j3.
    let store = MemoryStore::new();
    store
        .insert_new_only(&[job("j1", "Stored j1")])
        .await
        .unwrap();

    let ingestor = BatchIngestor::new(store);
    let batch = vec![job("j1", "Rescraped j1"), job("j2", "J2"), job("j3", "J3")];
    let partition = ingestor.ingest(batch).await.unwrap();

    assert_eq!(keys_of(&partition.existing), vec!["j1"]);
    assert_eq!(keys_of(&partition.new), vec!["j2", "j3"]);

    let store = ingestor.store();
    assert_eq!(store.job_count(), 3);
    let j1 = store.find_by_key("j1").await.unwrap().unwrap();
    assert_eq!(j1.title, "Stored j1");
    assert!(store.find_by_key("j2").await.unwrap().is_some());
    assert!(store.find_by_key("j3").await.unwrap().is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_batches_persist_each_key_at_most_once() {
    let store = Arc::new(MemoryStore::new());
    let keys = ["k1", "k2", "k3", "k4", "k5"];

    let worker = |tag: &'static str, store: Arc<MemoryStore>| {
        let batch: Vec<JobPosting> = keys.iter().map(|key| job(key, tag)).collect();
        tokio::spawn(async move { BatchIngestor::new(store).ingest(batch).await })
    };

    let (a, b) = tokio::join!(
        worker("worker-a", store.clone()),
        worker("worker-b", store.clone())
    );
    let a = a.unwrap().unwrap();
    let b = b.unwrap().unwrap();

    // Every key was created by exactly one of the two workers.
    let new_a: HashSet<&str> = keys_of(&a.new).into_iter().collect();
    let new_b: HashSet<&str> = keys_of(&b.new).into_iter().collect();
    assert!(new_a.is_disjoint(&new_b));
    let mut all_new: Vec<&str> = new_a.union(&new_b).copied().collect();
    all_new.sort_unstable();
    assert_eq!(all_new, keys);

    assert_eq!(a.len() + b.len(), keys.len() * 2);
    assert_eq!(store.job_count(), keys.len());
}

#[tokio::test]
async fn replace_updates_payload_through_the_update_path() {
    let store = MemoryStore::new();
    store
        .insert_new_only(&[job("a", "Before edit")])
        .await
        .unwrap();

    let edited = job("a", "After edit").with_location("Remote");
    store.replace(&edited).await.unwrap();

    let stored = store.find_by_key("a").await.unwrap().unwrap();
    assert_eq!(stored.title, "After edit");
    assert_eq!(stored.location.as_deref(), Some("Remote"));
}

#[tokio::test]
async fn replace_on_unknown_key_reports_not_found() {
    let store = MemoryStore::new();

    let err = store.replace(&job("ghost", "Ghost")).await.unwrap_err();
    assert!(matches!(err, IngestError::NotFound { key } if key == "ghost"));
}

#[tokio::test]
async fn find_by_keys_skips_missing_keys() {
    let store = MemoryStore::new();
    store
        .insert_new_only(&[job("a", "A"), job("b", "B")])
        .await
        .unwrap();

    let found = store.find_by_keys(&["a", "missing", "b"]).await.unwrap();

    let mut found_keys: Vec<&str> = keys_of(&found);
    found_keys.sort_unstable();
    assert_eq!(found_keys, vec!["a", "b"]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Partition completeness and at-most-once persistence hold for any
    /// batch, including intra-batch repeats and pre-seeded keys.
    #[test]
    fn partition_is_exhaustive_for_any_batch(
        batch_keys in prop::collection::vec("[a-e]", 0..12),
        seeded_keys in prop::collection::vec("[a-e]", 0..6),
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let store = MemoryStore::new();
            let seed: Vec<JobPosting> =
                seeded_keys.iter().map(|key| job(key, "seeded")).collect();
            store.insert_new_only(&seed).await.unwrap();

            let ingestor = BatchIngestor::new(store);
            let batch: Vec<JobPosting> =
                batch_keys.iter().map(|key| job(key, "scraped")).collect();
            let partition = ingestor.ingest(batch).await.unwrap();

            // Complete and disjoint partition of the input.
            prop_assert_eq!(partition.len(), batch_keys.len());
            let mut output: Vec<String> = partition
                .new
                .iter()
                .chain(partition.existing.iter())
                .map(|j| j.key.clone())
                .collect();
            output.sort_unstable();
            let mut expected = batch_keys.clone();
            expected.sort_unstable();
            prop_assert_eq!(output, expected);

            // At most one stored document per distinct key ever.
            let distinct: HashSet<&String> =
                seeded_keys.iter().chain(batch_keys.iter()).collect();
            prop_assert_eq!(ingestor.store().job_count(), distinct.len());

            // `new` is exactly the distinct unseeded keys, once each.
            let seeded: HashSet<&String> = seeded_keys.iter().collect();
            let mut new_keys: Vec<&str> = keys_of(&partition.new);
            new_keys.sort_unstable();
            let mut expected_new: Vec<&str> = batch_keys
                .iter()
                .filter(|key| !seeded.contains(key))
                .map(String::as_str)
                .collect::<HashSet<_>>()
                .into_iter()
                .collect();
            expected_new.sort_unstable();
            prop_assert_eq!(new_keys, expected_new);

            Ok(())
        })?;
    }
}
