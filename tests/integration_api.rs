//! Router tests using axum's test utilities, without binding a port.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::Utc;
use http_body_util::BodyExt;
use iiif_presenter::cache::MemoryManifestCache;
use iiif_presenter::clock::ManualClock;
use iiif_presenter::config::Config;
use iiif_presenter::engine::ManifestEngine;
use iiif_presenter::queue::ConversionQueue;
use iiif_presenter::server::{create_router, ServerContext};
use std::sync::Arc;
use tower::ServiceExt;

/// Router over a default-config engine with an in-memory cache
fn create_test_router(base_url: Option<&str>) -> axum::Router {
    let config = Config::default();
    let (queue, _jobs) = ConversionQueue::channel();
    let engine = ManifestEngine::with_parts(
        &config,
        Arc::new(MemoryManifestCache::new()),
        queue,
        Arc::new(ManualClock::new(Utc::now())),
    )
    .unwrap();
    create_router(ServerContext::new(Arc::new(engine), base_url.map(str::to_string)))
}

async fn body_to_string(body: Body) -> String {
    let bytes = body.collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let response = create_test_router(None)
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_resolve_uses_host_header() {
    let response = create_test_router(None)
        .oneshot(
            Request::get("/?url=https%3A%2F%2Fwww.wikidata.org%2Fwiki%2FQ12418")
                .header("host", "presenter.local:8080")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_to_string(response.into_body()).await,
        "http://presenter.local:8080/wd:Q12418/manifest.json"
    );
}

#[tokio::test]
async fn test_resolve_prefers_configured_base_url() {
    let response = create_test_router(Some("https://iiif.example.org"))
        .oneshot(
            Request::get("/?url=https%3A%2F%2Fwww.flickr.com%2Fphotos%2Fsomeone%2F52011234567")
                .header("host", "internal:8080")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        body_to_string(response.into_body()).await,
        "https://iiif.example.org/flickr:52011234567/manifest.json"
    );
}

#[tokio::test]
async fn test_presentation_2_returns_501() {
    let response = create_test_router(None)
        .oneshot(Request::get("/iiif/2/wd:Q1/manifest.json").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    let json: serde_json::Value =
        serde_json::from_str(&body_to_string(response.into_body()).await).unwrap();
    assert_eq!(json["code"], "not_implemented");
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_cors_preflight() {
    let response = create_test_router(None)
        .oneshot(
            Request::options("/wd:Q1/manifest.json")
                .header("origin", "https://viewer.example.org")
                .header("access-control-request-method", "GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
}
