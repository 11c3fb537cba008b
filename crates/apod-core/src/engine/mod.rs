//! Date resolution engine
//!
//! The DateResolutionEngine is responsible for:
//! - Turning a requested date into the effective date (clamping to the publisher clock)
//! - Serving cached records without a network call
//! - Fetching missing records via ContentClient
//! - Writing confirmed successes back to the cache
//!
//! ## Architecture
//!
//! ```text
//!   DateRequest ───┐
//!                  ▼
//!        ┌──────────────────────┐      ┌───────────────┐
//!        │ DateResolutionEngine │─────▶│ ClockResolver │ (clamp)
//!        └──────────────────────┘      └───────────────┘
//!                  │
//!        ┌─────────┴──────────┐
//!        ▼                    ▼
//! ┌──────────────┐    ┌───────────────┐
//! │ ContentCache │    │ ContentClient │
//! │ (get / put)  │    │ (fetch)       │
//! └──────────────┘    └───────────────┘
//! ```
//!
//! ## Resolution Flow
//!
//! 1. `Today` becomes the publisher's current valid date
//! 2. A later date is clamped to the current valid date (silently)
//! 3. Cache hit → return it, no network call
//! 4. Miss → fetch; only a success is cached
//!
//! The engine never retries. A retry is another `resolve` call.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::NaiveDate;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, info, warn};

use crate::cache::ContentCache;
use crate::clock::{ClockResolver, PublisherClock};
use crate::config::ApodConfig;
use crate::error::{Error, Result};
use crate::record::ContentRecord;
use crate::registry::ProviderRegistry;
use crate::traits::{ContentClient, FetchOutcome};

/// The date a caller asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateRequest {
    /// Whatever the publisher's current valid date is
    Today,
    /// A specific calendar date
    On(NaiveDate),
}

impl From<NaiveDate> for DateRequest {
    fn from(date: NaiveDate) -> Self {
        DateRequest::On(date)
    }
}

impl FromStr for DateRequest {
    type Err = Error;

    /// Parse `"today"` or an ISO 8601 date (`YYYY-MM-DD`)
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("today") {
            return Ok(DateRequest::Today);
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(DateRequest::On)
            .map_err(|_| Error::invalid_input(format!("Not a date or \"today\": {}", s)))
    }
}

impl std::fmt::Display for DateRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateRequest::Today => f.write_str("today"),
            DateRequest::On(date) => write!(f, "{}", date.format("%Y-%m-%d")),
        }
    }
}

/// Where a resolved outcome came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Served from the cache, no remote call made
    Cache,
    /// The cache missed and the remote client was asked
    Remote,
}

/// Detailed result of a resolve call
///
/// `origin` tells a cache hit apart from a failure after a cache miss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// What the caller asked for
    pub requested: DateRequest,
    /// The date actually looked up
    pub effective_date: NaiveDate,
    /// Whether a future date was replaced by the current valid date
    pub clamped: bool,
    /// Cache hit or remote lookup
    pub origin: Origin,
    /// The outcome for `effective_date`
    pub outcome: FetchOutcome,
}

impl Resolution {
    pub fn is_cache_hit(&self) -> bool {
        self.origin == Origin::Cache
    }
}

/// Events emitted by the DateResolutionEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// A future date was replaced by the current valid date
    Clamped {
        requested: NaiveDate,
        effective: NaiveDate,
    },

    /// Served from the cache
    CacheHit { date: NaiveDate },

    /// Nothing cached; a remote lookup follows
    CacheMiss { date: NaiveDate },

    /// Remote lookup succeeded and was cached
    Fetched { date: NaiveDate },

    /// Remote lookup returned a non-success outcome
    FetchFailed {
        date: NaiveDate,
        kind: &'static str,
        reason: String,
    },
}

/// Per-date lookup gates, used when coalescing is enabled
type Gates = Mutex<HashMap<NaiveDate, Arc<tokio::sync::Mutex<()>>>>;

/// Core date resolution engine
///
/// ## Threading
///
/// `resolve` takes `&self`; share the engine behind an `Arc` to serve
/// concurrent callers. The engine spawns no tasks.
///
/// ## Coalescing
///
/// With coalescing on (the default), overlapping misses for the same date
/// queue on a per-date gate: the first caller fetches, the rest re-check the
/// cache when it finishes. Off, overlapping calls each fetch and the cache
/// keeps the last successful write.
///
/// ## Cancellation
///
/// Dropping a `resolve` future drops the in-flight remote request with it.
/// An abandoned lookup caches nothing, even if the remote would have
/// answered; the next `resolve` for that date fetches again.
pub struct DateResolutionEngine {
    clock: Box<dyn ClockResolver>,
    client: Box<dyn ContentClient>,
    cache: ContentCache,
    coalesce: bool,
    gates: Gates,
    event_tx: Option<mpsc::Sender<EngineEvent>>,
}

impl DateResolutionEngine {
    /// Create an engine with coalescing on and no event channel
    pub fn new(
        clock: Box<dyn ClockResolver>,
        client: Box<dyn ContentClient>,
        cache: ContentCache,
    ) -> Self {
        Self {
            clock,
            client,
            cache,
            coalesce: true,
            gates: Mutex::new(HashMap::new()),
            event_tx: None,
        }
    }

    /// Turn per-date coalescing on or off
    pub fn with_coalescing(mut self, coalesce: bool) -> Self {
        self.coalesce = coalesce;
        self
    }

    /// Attach a bounded event channel
    ///
    /// Events that do not fit are dropped with a warning; `resolve` never waits on it.
    pub fn with_events(mut self, capacity: usize) -> (Self, mpsc::Receiver<EngineEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        self.event_tx = Some(tx);
        (self, rx)
    }

    /// Build an engine from configuration
    ///
    /// The client and store types named in `config` must be registered in `registry`.
    pub async fn from_config(
        config: ApodConfig,
        registry: &ProviderRegistry,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let clock = PublisherClock::new(config.clock.utc_offset_secs)?;
        let client = registry.create_client(&config.client)?;
        let store = registry.create_store(&config.cache).await?;
        let cache = ContentCache::new(store, config.engine.key_prefix.clone());

        info!(
            "Engine configured: client={}, cache={}, prefix={}",
            client.client_name(),
            config.cache.type_name(),
            config.engine.key_prefix
        );

        Ok(Self::new(Box::new(clock), client, cache)
            .with_coalescing(config.engine.coalesce_requests)
            .with_events(config.engine.event_channel_capacity))
    }

    /// The publisher's current valid date
    pub fn current_valid_date(&self) -> NaiveDate {
        self.clock.current_valid_date()
    }

    /// The underlying cache
    pub fn cache(&self) -> &ContentCache {
        &self.cache
    }

    /// Resolve a requested date to an outcome
    pub async fn resolve(&self, request: impl Into<DateRequest>) -> FetchOutcome {
        self.resolve_detailed(request.into()).await.outcome
    }

    /// Resolve a requested date, reporting the effective date and origin
    pub async fn resolve_detailed(&self, request: DateRequest) -> Resolution {
        let current = self.clock.current_valid_date();
        let (effective_date, clamped) = match request {
            DateRequest::Today => (current, false),
            DateRequest::On(date) if date > current => (current, true),
            DateRequest::On(date) => (date, false),
        };

        if clamped {
            debug!("Requested {} is after the current valid date, clamping to {}", request, current);
            if let DateRequest::On(requested) = request {
                self.emit_event(EngineEvent::Clamped {
                    requested,
                    effective: effective_date,
                });
            }
        }

        if let Some(record) = self.cached(effective_date).await {
            debug!("Cache hit for {}", effective_date);
            self.emit_event(EngineEvent::CacheHit {
                date: effective_date,
            });
            return Resolution {
                requested: request,
                effective_date,
                clamped,
                origin: Origin::Cache,
                outcome: FetchOutcome::Success(record),
            };
        }

        debug!("Cache miss for {}", effective_date);
        self.emit_event(EngineEvent::CacheMiss {
            date: effective_date,
        });

        let (origin, outcome) = if self.coalesce {
            self.fetch_coalesced(effective_date).await
        } else {
            (Origin::Remote, self.fetch_and_store(effective_date).await)
        };

        Resolution {
            requested: request,
            effective_date,
            clamped,
            origin,
            outcome,
        }
    }

    /// Cached record for `date`, without any network access
    ///
    /// A storage error is logged and reported as a miss.
    pub async fn cached(&self, date: NaiveDate) -> Option<ContentRecord> {
        match self.cache.get(date).await {
            Ok(record) => record,
            Err(e) => {
                warn!("Cache read failed for {}: {}", date, e);
                None
            }
        }
    }

    /// Persist any pending cache writes
    pub async fn flush(&self) -> Result<()> {
        self.cache.flush().await
    }

    async fn fetch_coalesced(&self, date: NaiveDate) -> (Origin, FetchOutcome) {
        let gate = GateGuard::acquire(&self.gates, date);
        let _permit = gate.lock().await;

        // An earlier holder of the gate may have filled the cache
        if let Some(record) = self.cached(date).await {
            debug!("Served {} from a concurrent lookup", date);
            self.emit_event(EngineEvent::CacheHit { date });
            return (Origin::Cache, FetchOutcome::Success(record));
        }

        (Origin::Remote, self.fetch_and_store(date).await)
    }

    /// One remote lookup; caches a confirmed success
    async fn fetch_and_store(&self, date: NaiveDate) -> FetchOutcome {
        let outcome = match self.client.fetch(Some(date)).await {
            FetchOutcome::Success(record) if record.date() != date => {
                FetchOutcome::InvalidResponse(format!(
                    "requested {} but {} returned a record for {}",
                    date,
                    self.client.client_name(),
                    record.date()
                ))
            }
            other => other,
        };

        match &outcome {
            FetchOutcome::Success(record) => {
                if let Err(e) = self.cache.put(date, record).await {
                    warn!("Failed to cache record for {}: {}", date, e);
                }
                info!("Fetched {} from {}: {}", date, self.client.client_name(), record.title());
                self.emit_event(EngineEvent::Fetched { date });
            }
            FetchOutcome::NotYetPublished => {
                info!("Nothing published for {} yet", date);
                self.emit_failure(date, &outcome, String::new());
            }
            FetchOutcome::RemoteUnavailable(cause) => {
                warn!("Remote unavailable for {}: {}", date, cause);
                self.emit_failure(date, &outcome, cause.clone());
            }
            FetchOutcome::InvalidResponse(cause) => {
                error!("Invalid response for {}: {}", date, cause);
                self.emit_failure(date, &outcome, cause.clone());
            }
        }

        outcome
    }

    fn emit_failure(&self, date: NaiveDate, outcome: &FetchOutcome, reason: String) {
        self.emit_event(EngineEvent::FetchFailed {
            date,
            kind: outcome.kind(),
            reason,
        });
    }

    fn emit_event(&self, event: EngineEvent) {
        let Some(tx) = &self.event_tx else {
            return;
        };
        match tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            // Nobody listening
            Err(TrySendError::Closed(_)) => {}
        }
    }
}

impl std::fmt::Debug for DateResolutionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DateResolutionEngine")
            .field("client", &self.client.client_name())
            .field("cache", &self.cache)
            .field("coalesce", &self.coalesce)
            .finish_non_exhaustive()
    }
}

/// Holds a per-date gate and removes it from the map once unused
///
/// Runs on drop, so a cancelled resolve does not leave its gate behind.
struct GateGuard<'a> {
    gates: &'a Gates,
    date: NaiveDate,
    gate: Arc<tokio::sync::Mutex<()>>,
}

impl<'a> GateGuard<'a> {
    fn acquire(gates: &'a Gates, date: NaiveDate) -> Self {
        let gate = {
            let mut map = gates.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(map.entry(date).or_default())
        };
        Self { gates, date, gate }
    }

    async fn lock(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.gate.lock().await
    }
}

impl Drop for GateGuard<'_> {
    fn drop(&mut self) {
        let mut map = self.gates.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference in the map, one here: nobody else is waiting
        if Arc::strong_count(&self.gate) == 2 {
            map.remove(&self.date);
        }
    }
}
