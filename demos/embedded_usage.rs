//! Minimal embedding example for apod-core
//!
//! Uses an in-process catalog instead of the NASA API, so it runs offline.
//! Shows clamping, cache hits, a "not yet published" date and the share payload.

use apod_core::traits::{ContentClient, FetchOutcome};
use apod_core::{
    ContentCache, ContentRecord, DateRequest, DateResolutionEngine, FixedClock, MediaType,
    MemoryStore, SharePayload,
};
use chrono::{Duration, NaiveDate};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;

/// Content client backed by a fixed set of records
struct CatalogClient {
    records: HashMap<NaiveDate, ContentRecord>,
    latest: NaiveDate,
    fetch_calls: Arc<AtomicUsize>,
}

impl CatalogClient {
    fn new(latest: NaiveDate) -> Self {
        let mut records = HashMap::new();
        for offset in 0..3 {
            let date = latest - Duration::days(offset);
            records.insert(
                date,
                ContentRecord::new(
                    date,
                    format!("Catalog entry {}", date),
                    "A picture from the embedded catalog.",
                    MediaType::Image,
                    format!("https://example.test/apod/{}.jpg", date),
                )
                .with_hd_media_url(format!("https://example.test/apod/{}_hd.jpg", date)),
            );
        }
        Self {
            records,
            latest,
            fetch_calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait::async_trait]
impl ContentClient for CatalogClient {
    async fn fetch(&self, date: Option<NaiveDate>) -> FetchOutcome {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let date = date.unwrap_or(self.latest);
        println!("[Catalog] Lookup for {}", date);

        match self.records.get(&date) {
            Some(record) => FetchOutcome::Success(record.clone()),
            None => FetchOutcome::NotYetPublished,
        }
    }

    fn client_name(&self) -> &'static str {
        "catalog"
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("=== Embedded apod-core Example ===\n");

    let today = NaiveDate::from_ymd_opt(2024, 6, 15)
        .ok_or_else(|| anyhow::anyhow!("invalid demo date"))?;

    let client = CatalogClient::new(today);
    let fetch_calls = Arc::clone(&client.fetch_calls);

    // Create engine
    println!("1. Creating engine...");
    let (engine, event_rx) = DateResolutionEngine::new(
        Box::new(FixedClock(today)),
        Box::new(client),
        ContentCache::new(Box::new(MemoryStore::new()), "apod"),
    )
    .with_events(100);

    // Event listener (optional)
    let event_listener = tokio::spawn(async move {
        let mut events = ReceiverStream::new(event_rx);
        while let Some(event) = events.next().await {
            println!("[Event] {:?}", event);
        }
    });

    println!("2. Resolving requests...\n");
    let requests = [
        DateRequest::Today,
        DateRequest::On(today + Duration::days(5)),
        DateRequest::On(today - Duration::days(1)),
        DateRequest::On(today - Duration::days(1)),
        DateRequest::On(NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(today)),
    ];

    for request in requests {
        let resolution = engine.resolve_detailed(request).await;
        let summary = match resolution.outcome.record() {
            Some(record) => record.title().to_string(),
            None => resolution.outcome.kind().to_string(),
        };
        println!(
            "   {:<10} -> {} ({:?}{}): {}",
            request.to_string(),
            resolution.effective_date,
            resolution.origin,
            if resolution.clamped { ", clamped" } else { "" },
            summary
        );
    }

    println!("\n3. Share payload for today:");
    if let Some(record) = engine.cached(today).await {
        let payload = SharePayload::from_record(&record);
        println!("   file:    {}", payload.file_name);
        println!("   media:   {}", payload.media_url);
        println!("   message: {:?}", payload.message);
    }

    println!(
        "\n4. {} remote lookup(s) for {} request(s); cached dates: {:?}",
        fetch_calls.load(Ordering::SeqCst),
        requests.len(),
        engine.cache().cached_dates().await?
    );

    // Dropping the engine closes the event channel
    drop(engine);
    event_listener.await?;

    println!("\n=== Embedding Successful ===");
    println!("Key Points:");
    println!("- Future dates resolve to the current valid date");
    println!("- Viewed dates are served from the cache");
    println!("- Failures are outcomes, not errors, and are never cached");

    Ok(())
}
