//! Contract Test: Configuration Wiring
//!
//! Constraints verified:
//! - An engine built from configuration uses the registered client and store
//! - A file cache configured by path survives an engine rebuild
//! - Unknown provider names and invalid settings fail at construction, not at lookup
//!
//! If this test fails, configuration is silently ignored or misrouted.

mod common;

use apod_core::traits::{ContentClient, ContentClientFactory};
use apod_core::{
    ApodConfig, CacheConfig, ClientConfig, DateResolutionEngine, EngineEvent, Error,
    ProviderRegistry,
};
use common::*;

/// Hands out clients that share counters with one template
struct ScriptedFactory(ScriptedClient);

impl ContentClientFactory for ScriptedFactory {
    fn create(&self, _config: &ClientConfig) -> apod_core::Result<Box<dyn ContentClient>> {
        Ok(Box::new(ScriptedClient::sharing_counters_with(&self.0)))
    }
}

fn scripted_config(cache: CacheConfig) -> ApodConfig {
    ApodConfig {
        client: ClientConfig::Custom {
            factory: "scripted".to_string(),
            config: serde_json::json!({}),
        },
        cache,
        clock: Default::default(),
        engine: Default::default(),
    }
}

fn registry_with(client: &ScriptedClient) -> ProviderRegistry {
    let registry = ProviderRegistry::with_builtin_stores();
    registry.register_client(
        "scripted",
        Box::new(ScriptedFactory(ScriptedClient::sharing_counters_with(client))),
    );
    registry
}

#[tokio::test]
async fn file_cache_survives_engine_rebuild() {
    let dir = tempfile::tempdir().unwrap();
    let cache = CacheConfig::File {
        path: dir.path().join("cache.json").to_string_lossy().into_owned(),
    };

    let client = ScriptedClient::new();
    let registry = registry_with(&client);
    let date = day(2024, 1, 1);

    {
        let (engine, _events) =
            DateResolutionEngine::from_config(scripted_config(cache.clone()), &registry)
                .await
                .unwrap();
        assert!(engine.resolve(date).await.is_success());
        engine.flush().await.unwrap();
    }

    let (engine, _events) = DateResolutionEngine::from_config(scripted_config(cache), &registry)
        .await
        .unwrap();
    let resolution = engine.resolve_detailed(date.into()).await;

    assert!(resolution.is_cache_hit());
    assert_eq!(client.fetch_call_count(), 1);
}

#[tokio::test]
async fn configured_engine_reports_events() {
    let client = ScriptedClient::new();
    let registry = registry_with(&client);

    let (engine, mut events) =
        DateResolutionEngine::from_config(scripted_config(CacheConfig::Memory), &registry)
            .await
            .unwrap();

    engine.resolve(day(2024, 1, 1)).await;

    assert_eq!(
        events.recv().await,
        Some(EngineEvent::CacheMiss {
            date: day(2024, 1, 1)
        })
    );
    assert_eq!(
        events.recv().await,
        Some(EngineEvent::Fetched {
            date: day(2024, 1, 1)
        })
    );
}

#[tokio::test]
async fn configured_key_prefix_namespaces_the_cache() {
    let client = ScriptedClient::new();
    let registry = registry_with(&client);

    let mut config = scripted_config(CacheConfig::Memory);
    config.engine.key_prefix = "neo".to_string();

    let (engine, _events) = DateResolutionEngine::from_config(config, &registry)
        .await
        .unwrap();

    assert_eq!(engine.cache().key_for(day(2024, 1, 1)), "neo_2024-01-01");
}

#[tokio::test]
async fn unknown_client_type_is_rejected() {
    let registry = ProviderRegistry::with_builtin_stores();

    let result = DateResolutionEngine::from_config(ApodConfig::nasa("DEMO_KEY"), &registry).await;

    assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("nasa")));
}

#[tokio::test]
async fn unknown_store_type_is_rejected() {
    let client = ScriptedClient::new();
    let registry = registry_with(&client);

    let config = scripted_config(CacheConfig::Custom {
        factory: "sqlite".to_string(),
        config: serde_json::json!({}),
    });
    let result = DateResolutionEngine::from_config(config, &registry).await;

    assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("sqlite")));
}

#[tokio::test]
async fn invalid_settings_are_rejected_before_any_lookup() {
    let client = ScriptedClient::new();
    let registry = registry_with(&client);

    let mut config = scripted_config(CacheConfig::Memory);
    config.clock.utc_offset_secs = 24 * 60 * 60;

    let result = DateResolutionEngine::from_config(config, &registry).await;

    assert!(matches!(result, Err(Error::Config(_))));
    assert_eq!(client.fetch_call_count(), 0);
}
