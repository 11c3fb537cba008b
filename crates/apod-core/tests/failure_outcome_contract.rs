//! Contract Test: Failure Outcomes
//!
//! Constraints verified:
//! - NotYetPublished, RemoteUnavailable and InvalidResponse are returned, never cached
//! - A failure does not poison later lookups of the same date
//! - The engine performs no hidden retries
//! - Storage faults degrade to cache misses instead of failing the lookup
//!
//! If this test fails, failures are being cached or retried behind the caller's back.

mod common;

use apod_core::traits::FetchOutcome;
use apod_core::{ContentCache, DateResolutionEngine, FixedClock, Origin};
use common::*;

#[tokio::test]
async fn scenario_not_found_is_not_yet_published_and_not_cached() {
    let client = ScriptedClient::new().then(FetchOutcome::NotYetPublished);
    let store = CountingStore::new();
    let engine = engine_with(client, store.clone());

    let outcome = engine.resolve(day(1900, 1, 1)).await;

    assert_eq!(outcome, FetchOutcome::NotYetPublished);
    assert_eq!(store.write_call_count(), 0);
    assert_eq!(store.len().await, 0);
    assert_eq!(engine.cache().get(day(1900, 1, 1)).await.unwrap(), None);
}

#[tokio::test]
async fn unavailable_then_success_is_reflected() {
    let date = day(2024, 1, 1);
    let client = ScriptedClient::new().then(FetchOutcome::RemoteUnavailable(
        "connection refused".into(),
    ));
    let client_probe = ScriptedClient::sharing_counters_with(&client);
    let store = CountingStore::new();
    let engine = engine_with(client, store.clone());

    let failed = engine.resolve_detailed(date.into()).await;
    assert_eq!(failed.origin, Origin::Remote);
    assert_eq!(
        failed.outcome,
        FetchOutcome::RemoteUnavailable("connection refused".into())
    );
    assert_eq!(store.len().await, 0);

    // Caller-initiated retry
    let retried = engine.resolve_detailed(date.into()).await;
    assert_eq!(retried.origin, Origin::Remote);
    assert!(retried.outcome.is_success());
    assert_eq!(store.len().await, 1);
    assert_eq!(client_probe.fetch_call_count(), 2);
}

#[tokio::test]
async fn engine_does_not_retry_on_its_own() {
    let client = ScriptedClient::new()
        .then(FetchOutcome::RemoteUnavailable("timeout".into()))
        .then(FetchOutcome::RemoteUnavailable("timeout".into()));
    let client_probe = ScriptedClient::sharing_counters_with(&client);
    let engine = engine_with(client, CountingStore::new());

    let outcome = engine.resolve(day(2024, 1, 1)).await;

    assert!(matches!(outcome, FetchOutcome::RemoteUnavailable(_)));
    assert_eq!(client_probe.fetch_call_count(), 1);
}

#[tokio::test]
async fn invalid_response_is_surfaced_and_not_cached() {
    let client =
        ScriptedClient::new().then(FetchOutcome::InvalidResponse("missing field `title`".into()));
    let store = CountingStore::new();
    let engine = engine_with(client, store.clone());

    let outcome = engine.resolve(day(2024, 1, 1)).await;

    assert_eq!(
        outcome,
        FetchOutcome::InvalidResponse("missing field `title`".into())
    );
    assert_eq!(store.write_call_count(), 0);
}

#[tokio::test]
async fn cache_hit_is_distinguishable_from_failure_after_miss() {
    let cached_date = day(2024, 1, 1);
    let uncached_date = day(2024, 1, 2);

    let client = ScriptedClient::new()
        .then(FetchOutcome::Success(image_record(cached_date)))
        .then(FetchOutcome::RemoteUnavailable("offline".into()));
    let engine = engine_with(client, CountingStore::new());

    engine.resolve(cached_date).await;

    let hit = engine.resolve_detailed(cached_date.into()).await;
    let miss = engine.resolve_detailed(uncached_date.into()).await;

    assert_eq!(hit.origin, Origin::Cache);
    assert!(hit.outcome.is_success());
    assert_eq!(miss.origin, Origin::Remote);
    assert!(matches!(miss.outcome, FetchOutcome::RemoteUnavailable(_)));
}

#[tokio::test]
async fn storage_faults_do_not_fail_the_lookup() {
    let client = ScriptedClient::new();
    let client_probe = ScriptedClient::sharing_counters_with(&client);

    let engine = DateResolutionEngine::new(
        Box::new(FixedClock(today())),
        Box::new(client),
        ContentCache::new(Box::new(BrokenStore), "apod"),
    );

    // Read fault → treated as a miss; write fault → success still returned
    assert!(engine.resolve(day(2024, 1, 1)).await.is_success());
    assert!(engine.resolve(day(2024, 1, 1)).await.is_success());
    assert_eq!(client_probe.fetch_call_count(), 2);
    assert!(engine.flush().await.is_err());
}
