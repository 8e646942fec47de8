//! Job posting types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One externally discovered job posting.
///
/// The `key` is the stable identifier assigned by the upstream source and
/// is the sole deduplication key; the store's internal row id never leaks
/// out of the storage layer. Payload fields change only through an
/// explicit [`replace`](crate::traits::store::JobStore::replace) — the
/// ingest path never overwrites a stored posting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPosting {
    /// Stable unique external identifier, immutable once assigned
    pub key: String,

    /// Posting title
    pub title: String,

    /// Hiring company or organization
    pub company: String,

    /// Free-form location if the source provides one
    pub location: Option<String>,

    /// Full description text
    pub description: Option<String>,

    /// Canonical URL of the posting
    pub url: Option<String>,

    /// When the source says the position was posted
    pub posted_at: Option<DateTime<Utc>>,

    /// When the scraper first observed the posting
    pub discovered_at: DateTime<Utc>,
}

impl JobPosting {
    /// Create a new posting with the required fields.
    pub fn new(
        key: impl Into<String>,
        title: impl Into<String>,
        company: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            company: company.into(),
            location: None,
            description: None,
            url: None,
            posted_at: None,
            discovered_at: Utc::now(),
        }
    }

    /// Set the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the canonical URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the source's posted-at timestamp.
    pub fn with_posted_at(mut self, posted_at: DateTime<Utc>) -> Self {
        self.posted_at = Some(posted_at);
        self
    }

    /// Set the discovery timestamp.
    pub fn with_discovered_at(mut self, discovered_at: DateTime<Utc>) -> Self {
        self.discovered_at = discovered_at;
        self
    }
}
