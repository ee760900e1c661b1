//! Manifest and resolver routes.

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::IntoResponse;
use presenter_core::Error;
use serde::Deserialize;
use tracing::debug;

use super::error::AppError;
use super::ServerContext;
use crate::engine::ManifestRequest;

const MANIFEST_SUFFIX: &str = "/manifest.json";

// ---------------------------------------------------------------------------
// Request parsing
// ---------------------------------------------------------------------------

/// A parsed manifest path.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct ManifestPath {
    pub version: Option<u8>,
    pub id: String,
}

/// Split `/[iiif/[{version}/]]{id}/manifest.json` without percent-decoding.
pub(crate) fn parse_manifest_path(path: &str) -> Option<ManifestPath> {
    let rest = path.strip_prefix('/')?.strip_suffix(MANIFEST_SUFFIX)?;
    let (version, id) = match rest.strip_prefix("iiif/") {
        Some(after) => match after.split_once('/') {
            Some((v @ ("2" | "3"), id)) => (v.parse().ok(), id),
            _ => (None, after),
        },
        None => (None, rest),
    };
    (!id.is_empty()).then(|| ManifestPath {
        version,
        id: id.to_string(),
    })
}

/// `refresh`, `refresh=` and `refresh=true` all ask for a rebuild.
pub(crate) fn wants_refresh(query: Option<&str>) -> bool {
    query.is_some_and(|q| {
        q.split('&').any(|pair| match pair.split_once('=') {
            Some((key, value)) => key == "refresh" && (value.is_empty() || value.eq_ignore_ascii_case("true")),
            None => pair == "refresh",
        })
    })
}

/// Characters allowed in a `host[:port]` authority.
fn is_authority(host: &str) -> bool {
    host.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~' | ':' | '[' | ']'))
}

/// Scheme and host the client used, from forwarding headers or `Host`.
///
/// Values outside the scheme and authority grammar are ignored.
pub(crate) fn request_base_url(headers: &HeaderMap) -> String {
    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };
    let scheme = header_value("x-forwarded-proto")
        .filter(|s| matches!(*s, "http" | "https"))
        .unwrap_or("http");
    let host = header_value("x-forwarded-host")
        .filter(|h| is_authority(h))
        .or_else(|| header_value(header::HOST.as_str()).filter(|h| is_authority(h)))
        .unwrap_or("localhost");
    format!("{}://{}", scheme, host)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    pub url: Option<String>,
}

/// GET /?url=... -- canonical manifest URL for a provider URL.
pub async fn resolve(
    State(ctx): State<ServerContext>,
    headers: HeaderMap,
    Query(params): Query<ResolveQuery>,
) -> Result<String, AppError> {
    let url = params
        .url
        .filter(|u| !u.is_empty())
        .ok_or_else(|| Error::Validation("missing url parameter".into()))?;
    let base_url = ctx.base_url(&headers);
    Ok(ctx.engine.resolve_url(&url, &base_url).await)
}

/// GET /{id}/manifest.json, /iiif/{id}/manifest.json, /iiif/{version}/{id}/manifest.json
pub async fn manifest(
    State(ctx): State<ServerContext>,
    headers: HeaderMap,
    uri: Uri,
) -> Result<impl IntoResponse, AppError> {
    let path = parse_manifest_path(uri.path())
        .ok_or_else(|| Error::not_found("route", uri.path()))?;
    if path.version == Some(2) {
        return Err(Error::NotImplemented("Presentation 2 manifests".into()).into());
    }

    let request = ManifestRequest {
        id: path.id,
        base_url: ctx.base_url(&headers),
        refresh: wants_refresh(uri.query()),
    };
    debug!(id = %request.id, refresh = request.refresh, "Manifest request");
    let rendered = ctx.engine.get_manifest(&request).await?;
    Ok(([(header::CONTENT_TYPE, "application/json")], rendered.body))
}
