//! Shared HTTP client plumbing for provider calls.

use std::time::Duration;

use presenter_core::{Error, Result};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::ProvidersConfig;

/// Build the client every provider call goes through.
pub fn build_client(config: &ProvidersConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(config.user_agent.clone())
        .build()
        .map_err(|e| Error::Internal(format!("failed to build HTTP client: {e}")))
}

/// Send `request` and decode a JSON body.
///
/// 404 yields `Ok(None)`; other failure statuses and transport errors map to
/// [`Error::ProviderUnavailable`], undecodable bodies to [`Error::MalformedResponse`].
pub async fn fetch_json<T: DeserializeOwned>(
    request: RequestBuilder,
    provider: &str,
) -> Result<Option<T>> {
    let resp = request.send().await.map_err(|e| Error::provider(provider, e))?;
    let status = resp.status();
    debug!(provider, url = %resp.url(), status = status.as_u16(), "Provider response");

    if status == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !status.is_success() {
        return Err(Error::provider(provider, format!("status {status}")));
    }
    resp.json::<T>()
        .await
        .map(Some)
        .map_err(|e| Error::malformed(provider, e))
}

/// Like [`fetch_json`], but a 404 is an error too.
pub async fn require_json<T: DeserializeOwned>(request: RequestBuilder, provider: &str) -> Result<T> {
    fetch_json(request, provider)
        .await?
        .ok_or_else(|| Error::provider(provider, "status 404 Not Found"))
}
