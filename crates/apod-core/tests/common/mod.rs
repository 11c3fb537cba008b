//! Test doubles and common utilities for contract tests
//!
//! Minimal doubles that count calls so tests can assert what the engine did
//! (or did not do) without a network.

#![allow(dead_code)]

use apod_core::traits::{ContentClient, FetchOutcome, KeyValueStore};
use apod_core::{
    ContentCache, ContentRecord, DateResolutionEngine, FixedClock, MediaType, MemoryStore,
};
use chrono::NaiveDate;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// The publisher's current valid date in every contract test
pub fn today() -> NaiveDate {
    day(2024, 6, 15)
}

pub fn image_record(date: NaiveDate) -> ContentRecord {
    ContentRecord::new(
        date,
        format!("Picture for {}", date),
        "An explanation.",
        MediaType::Image,
        format!("https://example.test/{}.jpg", date),
    )
}

/// A ContentClient that replays scripted outcomes
///
/// Scripted outcomes are consumed in order; once exhausted the client answers
/// with a success for whatever date was asked.
pub struct ScriptedClient {
    script: Arc<Mutex<VecDeque<FetchOutcome>>>,
    fetch_call_count: Arc<AtomicUsize>,
    requested: Arc<Mutex<Vec<Option<NaiveDate>>>>,
    delay: Duration,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            fetch_call_count: Arc::new(AtomicUsize::new(0)),
            requested: Arc::new(Mutex::new(Vec::new())),
            delay: Duration::ZERO,
        }
    }

    /// Queue the next outcome
    pub fn then(self, outcome: FetchOutcome) -> Self {
        self.script.lock().unwrap().push_back(outcome);
        self
    }

    /// Sleep before answering (to make calls overlap)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Get the number of times fetch() was called
    pub fn fetch_call_count(&self) -> usize {
        self.fetch_call_count.load(Ordering::SeqCst)
    }

    /// Dates passed to fetch(), in call order
    pub fn requested(&self) -> Vec<Option<NaiveDate>> {
        self.requested.lock().unwrap().clone()
    }

    /// Create a ScriptedClient that shares script and counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            script: Arc::clone(&other.script),
            fetch_call_count: Arc::clone(&other.fetch_call_count),
            requested: Arc::clone(&other.requested),
            delay: other.delay,
        }
    }
}

#[async_trait::async_trait]
impl ContentClient for ScriptedClient {
    async fn fetch(&self, date: Option<NaiveDate>) -> FetchOutcome {
        self.fetch_call_count.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(date);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let scripted = self.script.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| FetchOutcome::Success(image_record(date.unwrap_or_else(today))))
    }

    fn client_name(&self) -> &'static str {
        "scripted"
    }
}

/// A KeyValueStore over a MemoryStore that counts writes
#[derive(Clone)]
pub struct CountingStore {
    inner: MemoryStore,
    write_call_count: Arc<AtomicUsize>,
}

impl CountingStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            write_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get the number of times write() was called
    pub fn write_call_count(&self) -> usize {
        self.write_call_count.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.inner.len().await
    }
}

#[async_trait::async_trait]
impl KeyValueStore for CountingStore {
    async fn read(&self, key: &str) -> apod_core::Result<Option<String>> {
        self.inner.read(key).await
    }

    async fn write(&self, key: &str, value: &str) -> apod_core::Result<()> {
        self.write_call_count.fetch_add(1, Ordering::SeqCst);
        self.inner.write(key, value).await
    }

    async fn delete(&self, key: &str) -> apod_core::Result<()> {
        self.inner.delete(key).await
    }

    async fn keys(&self) -> apod_core::Result<Vec<String>> {
        self.inner.keys().await
    }

    async fn flush(&self) -> apod_core::Result<()> {
        self.inner.flush().await
    }
}

/// A KeyValueStore whose every operation fails
pub struct BrokenStore;

#[async_trait::async_trait]
impl KeyValueStore for BrokenStore {
    async fn read(&self, _key: &str) -> apod_core::Result<Option<String>> {
        Err(apod_core::Error::store("disk unavailable"))
    }

    async fn write(&self, _key: &str, _value: &str) -> apod_core::Result<()> {
        Err(apod_core::Error::store("disk unavailable"))
    }

    async fn delete(&self, _key: &str) -> apod_core::Result<()> {
        Err(apod_core::Error::store("disk unavailable"))
    }

    async fn keys(&self) -> apod_core::Result<Vec<String>> {
        Err(apod_core::Error::store("disk unavailable"))
    }

    async fn flush(&self) -> apod_core::Result<()> {
        Err(apod_core::Error::store("disk unavailable"))
    }
}

/// Engine over the given client and store, clock fixed at [`today`]
pub fn engine_with(client: ScriptedClient, store: CountingStore) -> DateResolutionEngine {
    DateResolutionEngine::new(
        Box::new(FixedClock(today())),
        Box::new(client),
        ContentCache::new(Box::new(store), "apod"),
    )
}
