//! Idempotent Job-Posting Ingestion Library
//!
//! Persists batches of externally discovered job postings at most once
//! per stable external key and reports back, per posting, whether it was
//! newly stored or already known — so a downstream notification pipeline
//! only ever announces genuinely new postings.
//!
//! # Design Philosophy
//!
//! - Batched: one store round trip per ingested batch
//! - Per-key outcomes, never positional inference against an aggregate
//!   count
//! - Dependency-injected storage, no process-global connection state
//! - Library handles classification mechanics, app handles delivery
//!
//! # Usage
//!
//! ```rust,ignore
//! use ingestion::{BatchIngestor, JobPosting, MemoryStore};
//!
//! let ingestor = BatchIngestor::new(MemoryStore::new());
//!
//! let batch = vec![JobPosting::new("j-1", "Backend Engineer", "Acme")];
//! let partition = ingestor.ingest(batch).await?;
//!
//! // Only postings persisted by this call reach the notifier.
//! notifier.announce(&partition.new).await?;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Store trait abstraction
//! - [`types`] - Job posting types
//! - [`ingest`] - Batch deduplicating ingestor (the core)
//! - [`stores`] - Storage implementations (MemoryStore, PostgresStore)
//! - [`config`] - Environment-based store configuration

pub mod config;
pub mod error;
pub mod ingest;
pub mod stores;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use config::StoreConfig;
pub use error::{IngestError, Result};
pub use ingest::{BatchIngestor, BatchPartition};
pub use stores::MemoryStore;
#[cfg(feature = "postgres")]
pub use stores::PostgresStore;
pub use traits::store::{InsertOutcome, JobStore};
pub use types::job::JobPosting;
