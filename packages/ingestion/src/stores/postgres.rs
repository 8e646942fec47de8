//! PostgreSQL storage implementation.
//!
//! A production-ready backend. The conditional batch insert relies on a
//! `UNIQUE` constraint on `external_key`: the insert-if-absent decision
//! is made inside Postgres per key, in the same statement that performs
//! the insert, so two concurrent batches carrying the same new key agree
//! on exactly one winner.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use tracing::debug;
use uuid::Uuid;

use crate::config::StoreConfig;
use crate::error::{IngestError, Result};
use crate::traits::store::{InsertOutcome, JobStore};
use crate::types::job::JobPosting;

/// Row type for the `job_postings` table.
///
/// Kept separate from [`JobPosting`] so the table can carry columns
/// (internal id, audit timestamps) that never leave the store.
#[derive(Debug, FromRow)]
struct JobRow {
    external_key: String,
    title: String,
    company: String,
    location: Option<String>,
    description: Option<String>,
    url: Option<String>,
    posted_at: Option<DateTime<Utc>>,
    discovered_at: DateTime<Utc>,
}

impl From<JobRow> for JobPosting {
    fn from(row: JobRow) -> Self {
        Self {
            key: row.external_key,
            title: row.title,
            company: row.company,
            location: row.location,
            description: row.description,
            url: row.url,
            posted_at: row.posted_at,
            discovered_at: row.discovered_at,
        }
    }
}

const JOB_COLUMNS: &str =
    "external_key, title, company, location, description, url, posted_at, discovered_at";

/// PostgreSQL-backed job posting store.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect with the given configuration and run migrations.
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await
            .map_err(store_unavailable)?;

        Self::from_pool(pool).await
    }

    /// Create a store from an existing connection pool.
    ///
    /// Use this when the application already has a `PgPool`. The pool is
    /// a long-lived shared resource reused across calls; nothing here
    /// opens or closes connections per batch.
    pub async fn from_pool(pool: PgPool) -> Result<Self> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Run database migrations (base schema).
    async fn run_migrations(&self) -> Result<()> {
        // The internal UUID id is never exposed through the adapter;
        // `external_key` is the only lookup handle.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS job_postings (
                id UUID PRIMARY KEY,
                external_key TEXT NOT NULL UNIQUE,
                title TEXT NOT NULL,
                company TEXT NOT NULL,
                location TEXT,
                description TEXT,
                url TEXT,
                posted_at TIMESTAMPTZ,
                discovered_at TIMESTAMPTZ NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(store_unavailable)?;

        Ok(())
    }
}

fn store_unavailable(e: sqlx::Error) -> IngestError {
    IngestError::StoreUnavailable(Box::new(e))
}

#[async_trait]
impl JobStore for PostgresStore {
    async fn find_by_key(&self, key: &str) -> Result<Option<JobPosting>> {
        let row = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {JOB_COLUMNS} FROM job_postings WHERE external_key = $1"
        ))
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_unavailable)?;

        Ok(row.map(JobPosting::from))
    }

    async fn find_by_keys(&self, keys: &[&str]) -> Result<Vec<JobPosting>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<String> = keys.iter().map(|key| key.to_string()).collect();

        let rows = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {JOB_COLUMNS} FROM job_postings WHERE external_key = ANY($1)"
        ))
        .bind(&keys)
        .fetch_all(&self.pool)
        .await
        .map_err(store_unavailable)?;

        Ok(rows.into_iter().map(JobPosting::from).collect())
    }

    async fn replace(&self, job: &JobPosting) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE job_postings
            SET title = $2,
                company = $3,
                location = $4,
                description = $5,
                url = $6,
                posted_at = $7,
                updated_at = NOW()
            WHERE external_key = $1
            "#,
        )
        .bind(&job.key)
        .bind(&job.title)
        .bind(&job.company)
        .bind(&job.location)
        .bind(&job.description)
        .bind(&job.url)
        .bind(job.posted_at)
        .execute(&self.pool)
        .await
        .map_err(store_unavailable)?;

        if result.rows_affected() == 0 {
            return Err(IngestError::NotFound {
                key: job.key.clone(),
            });
        }

        Ok(())
    }

    async fn insert_new_only(&self, batch: &[JobPosting]) -> Result<InsertOutcome> {
        if batch.is_empty() {
            return Ok(InsertOutcome::default());
        }

        // Column-major arrays for a single UNNEST insert: one round trip
        // regardless of batch size.
        let mut ids: Vec<Uuid> = Vec::with_capacity(batch.len());
        let mut keys: Vec<String> = Vec::with_capacity(batch.len());
        let mut titles: Vec<String> = Vec::with_capacity(batch.len());
        let mut companies: Vec<String> = Vec::with_capacity(batch.len());
        let mut locations: Vec<Option<String>> = Vec::with_capacity(batch.len());
        let mut descriptions: Vec<Option<String>> = Vec::with_capacity(batch.len());
        let mut urls: Vec<Option<String>> = Vec::with_capacity(batch.len());
        let mut posted_ats: Vec<Option<DateTime<Utc>>> = Vec::with_capacity(batch.len());
        let mut discovered_ats: Vec<DateTime<Utc>> = Vec::with_capacity(batch.len());

        for job in batch {
            ids.push(Uuid::now_v7());
            keys.push(job.key.clone());
            titles.push(job.title.clone());
            companies.push(job.company.clone());
            locations.push(job.location.clone());
            descriptions.push(job.description.clone());
            urls.push(job.url.clone());
            posted_ats.push(job.posted_at);
            discovered_ats.push(job.discovered_at);
        }

        // ON CONFLICT DO NOTHING makes the per-key existence check and
        // the insert one atomic operation, and also swallows repeated
        // keys within the batch itself. RETURNING reports exactly which
        // keys this statement created.
        let inserted: Vec<(String,)> = sqlx::query_as(
            r#"
            INSERT INTO job_postings
                (id, external_key, title, company, location, description, url, posted_at, discovered_at)
            SELECT * FROM UNNEST(
                $1::UUID[], $2::TEXT[], $3::TEXT[], $4::TEXT[], $5::TEXT[],
                $6::TEXT[], $7::TEXT[], $8::TIMESTAMPTZ[], $9::TIMESTAMPTZ[]
            )
            ON CONFLICT (external_key) DO NOTHING
            RETURNING external_key
            "#,
        )
        .bind(&ids)
        .bind(&keys)
        .bind(&titles)
        .bind(&companies)
        .bind(&locations)
        .bind(&descriptions)
        .bind(&urls)
        .bind(&posted_ats)
        .bind(&discovered_ats)
        .fetch_all(&self.pool)
        .await
        .map_err(store_unavailable)?;

        debug!(
            batch_size = batch.len(),
            inserted = inserted.len(),
            "conditional insert completed"
        );

        Ok(InsertOutcome::from_keys(
            inserted.into_iter().map(|(key,)| key),
        ))
    }
}
