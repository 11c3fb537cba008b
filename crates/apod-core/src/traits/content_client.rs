// # Content Client Trait
//
// Defines the interface for looking up one record from the remote publisher.
//
// ## Implementations
//
// - NASA APOD API: `apod-client-nasa` crate
//
// ## Usage
//
// ```rust,ignore
// use apod_core::{ContentClient, FetchOutcome};
// use chrono::NaiveDate;
//
// let outcome = client.fetch(NaiveDate::from_ymd_opt(2024, 1, 1)).await;
// if let FetchOutcome::Success(record) = outcome {
//     println!("{}", record.title());
// }
// ```

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::record::ContentRecord;

/// Result of one remote lookup
///
/// Every expected condition is a variant; the client never returns `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The record for the requested date
    Success(ContentRecord),

    /// The date is valid but the publisher has nothing for it
    ///
    /// Recoverable by picking an earlier date. Never cached.
    NotYetPublished,

    /// Transport failure: timeout, refused connection, or an unexpected status
    ///
    /// Transient. Safe to retry later.
    RemoteUnavailable(String),

    /// The provider answered with something that is not a record
    InvalidResponse(String),
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Borrow the record when this is a success
    pub fn record(&self) -> Option<&ContentRecord> {
        match self {
            Self::Success(record) => Some(record),
            _ => None,
        }
    }

    /// Take the record when this is a success
    pub fn into_record(self) -> Option<ContentRecord> {
        match self {
            Self::Success(record) => Some(record),
            _ => None,
        }
    }

    /// Short label for logs and events
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::NotYetPublished => "not_yet_published",
            Self::RemoteUnavailable(_) => "remote_unavailable",
            Self::InvalidResponse(_) => "invalid_response",
        }
    }
}

/// Trait for remote content lookups
///
/// # Contract
///
/// - One remote request per call
/// - No retries: a retry is a new call decided by the caller of the engine
/// - No caching: the engine owns the cache
/// - Bounded by a finite timeout
/// - The credential never appears in outcomes or logs
#[async_trait]
pub trait ContentClient: Send + Sync {
    /// Look up the record for `date`, or the latest one when `None`
    async fn fetch(&self, date: Option<NaiveDate>) -> FetchOutcome;

    /// Client name (for logging/debugging)
    fn client_name(&self) -> &'static str;
}

/// Helper trait for constructing content clients from configuration
pub trait ContentClientFactory: Send + Sync {
    /// Create a ContentClient instance from configuration
    fn create(
        &self,
        config: &crate::config::ClientConfig,
    ) -> Result<Box<dyn ContentClient>, crate::Error>;
}
