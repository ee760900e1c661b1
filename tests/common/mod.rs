//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`], which starts a wiremock server standing in for
//! every provider API and the image service, and wires a [`ManifestEngine`]
//! to it with an in-memory cache and a manual clock. [`TestHarness::serve`]
//! starts Axum on a random port for HTTP-level testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use wiremock::MockServer;

use iiif_presenter::cache::MemoryManifestCache;
use iiif_presenter::clock::ManualClock;
use iiif_presenter::config::{CacheBackend, Config, ProvidersConfig};
use iiif_presenter::engine::{ManifestEngine, ManifestRequest, RenderedManifest};
use iiif_presenter::queue::{ConversionJob, ConversionQueue};
use iiif_presenter::server::{create_router, ServerContext};

pub const BASE_URL: &str = "https://iiif.test";

pub struct TestHarness {
    pub mock: MockServer,
    pub engine: Arc<ManifestEngine>,
    pub cache: Arc<MemoryManifestCache>,
    pub clock: Arc<ManualClock>,
    pub jobs: mpsc::Receiver<ConversionJob>,
}

/// Config whose provider endpoints and image service all point at `mock`.
pub fn mock_config(mock: &str) -> Config {
    let mut config = Config::default();
    config.cache.backend = CacheBackend::Memory;
    config.image_service.service_url = format!("{}/iiif/2", mock);
    config.image_service.poster_url = format!("{}/posters", mock);
    config.providers = ProvidersConfig {
        github_api: mock.to_string(),
        github_raw: format!("{}/raw", mock),
        flickr_api: format!("{}/flickr", mock),
        flickr_api_key: Some("flickr-key".to_string()),
        commons_api: format!("{}/commons", mock),
        wikidata_api: format!("{}/wikidata", mock),
        wikidata_sparql: format!("{}/sparql", mock),
        jstor_api: format!("{}/jstor", mock),
        jstor_api_key: Some("jstor-key".to_string()),
        jstor_iiif: format!("{}/jstor-iiif", mock),
        related_entities_url: format!("{}/related", mock),
        met_api: format!("{}/met", mock),
        openverse_api: format!("{}/openverse", mock),
        ..ProvidersConfig::default()
    };
    config
}

impl TestHarness {
    pub async fn new() -> Self {
        let mock = MockServer::start().await;
        let config = mock_config(&mock.uri());
        let cache = Arc::new(MemoryManifestCache::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let (queue, jobs) = ConversionQueue::channel();
        let engine = ManifestEngine::with_parts(&config, cache.clone(), queue, clock.clone())
            .expect("failed to build engine");
        Self {
            mock,
            engine: Arc::new(engine),
            cache,
            clock,
            jobs,
        }
    }

    pub fn uri(&self) -> String {
        self.mock.uri()
    }

    pub async fn get(&self, id: &str, refresh: bool) -> RenderedManifest {
        self.engine
            .get_manifest(&ManifestRequest {
                id: id.to_string(),
                base_url: BASE_URL.to_string(),
                refresh,
            })
            .await
            .expect("manifest request failed")
    }

    pub async fn get_json(&self, id: &str, refresh: bool) -> serde_json::Value {
        let rendered = self.get(id, refresh).await;
        serde_json::from_slice(&rendered.body).expect("manifest is not JSON")
    }

    /// Start Axum on a random port and return its address.
    pub async fn serve(&self, base_url: Option<String>) -> SocketAddr {
        let app = create_router(ServerContext::new(self.engine.clone(), base_url));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        addr
    }
}

/// Values of the metadata entry labelled `label` in a rendered manifest.
pub fn metadata_values(manifest: &serde_json::Value, label: &str) -> Vec<String> {
    manifest["metadata"]
        .as_array()
        .into_iter()
        .flatten()
        .find(|m| m["label"]["en"][0] == label)
        .and_then(|m| m["value"]["en"].as_array())
        .map(|values| {
            values
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

pub fn body(manifest: &serde_json::Value) -> &serde_json::Value {
    &manifest["items"][0]["items"][0]["items"][0]["body"]
}
