//! Core trait abstractions for the ingestion library.
//!
//! Applications implement (or pick) a [`store::JobStore`] backend and
//! inject it into the ingestor; nothing in this library reaches for
//! process-global state.

pub mod store;
