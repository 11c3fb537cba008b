// # NASA Client Real Environment Validation Tool
//
// Resolves one date against the real APOD API through a fully configured
// engine, then resolves it again to confirm the cache hit.
//
// ## Usage
//
// ```bash
// APOD_API_KEY=DEMO_KEY \
// APOD_DATE=2024-01-01 \
// APOD_CACHE_PATH=/tmp/apod-cache.json \
// cargo run --bin nasa_validation
// ```
//
// ## Environment Variables
//
// Required:
// - `APOD_API_KEY`: api.nasa.gov key (`DEMO_KEY` is rate limited)
//
// Optional:
// - `APOD_DATE`: `today` or `YYYY-MM-DD` (default: today)
// - `APOD_CACHE_PATH`: file cache location (default: in-memory)
// - `APOD_BASE_URL`, `APOD_TIMEOUT_SECS`, `APOD_UTC_OFFSET_SECS`, `APOD_KEY_PREFIX`
// - `APOD_LOG_LEVEL`: trace, debug, info, warn, error (default: info)

use anyhow::Context;
use apod_core::traits::FetchOutcome;
use apod_core::{ApodConfig, DateRequest, DateResolutionEngine, ProviderRegistry, SharePayload};
use std::env;
use std::process::ExitCode;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> ExitCode {
    let log_level = env::var("APOD_LOG_LEVEL")
        .ok()
        .and_then(|level| level.parse::<Level>().ok())
        .unwrap_or(Level::INFO);

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ExitCode::FAILURE;
    }

    match run().await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            error!("Validation failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Returns whether the date resolved to a record
async fn run() -> anyhow::Result<bool> {
    info!("=== NASA APOD Client Real Environment Validation ===");

    let config = ApodConfig::from_env().context("loading configuration")?;
    let request: DateRequest = env::var("APOD_DATE")
        .unwrap_or_else(|_| "today".to_string())
        .parse()
        .context("parsing APOD_DATE")?;

    info!("Client: {:?}", config.client);
    info!("Cache: {}", config.cache.type_name());

    let registry = ProviderRegistry::with_builtin_stores();
    apod_client_nasa::register(&registry);

    let (engine, event_rx) = DateResolutionEngine::from_config(config, &registry)
        .await
        .context("building engine")?;

    let event_logger = tokio::spawn(async move {
        let mut events = ReceiverStream::new(event_rx);
        while let Some(event) = events.next().await {
            info!("[Event] {:?}", event);
        }
    });

    info!(
        "Current valid date: {} (requested: {})",
        engine.current_valid_date(),
        request
    );

    let first = engine.resolve_detailed(request).await;
    let resolved = match &first.outcome {
        FetchOutcome::Success(record) => {
            info!("✓ {} ({}): {}", record.date(), record.media_type(), record.title());
            if let Some(attribution) = record.attribution() {
                info!("  © {}", attribution);
            }
            let share = SharePayload::from_record(record);
            info!("  Share file: {} <- {}", share.file_name, share.media_url);
            true
        }
        FetchOutcome::NotYetPublished => {
            warn!("✗ No APOD found for {}", first.effective_date);
            false
        }
        FetchOutcome::RemoteUnavailable(cause) => {
            warn!("✗ NASA API unavailable: {}", cause);
            false
        }
        FetchOutcome::InvalidResponse(cause) => {
            error!("✗ Unusable response: {}", cause);
            false
        }
    };

    if resolved {
        let second = engine.resolve_detailed(request).await;
        if second.is_cache_hit() && second.outcome == first.outcome {
            info!("✓ Second lookup served from cache");
        } else {
            warn!("✗ Second lookup was not a cache hit: {:?}", second.origin);
        }
    }

    engine.flush().await.context("flushing cache")?;
    drop(engine);
    event_logger.await.context("event logger")?;

    Ok(resolved)
}
