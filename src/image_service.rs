//! Binding to the external IIIF image service.
//!
//! Pixel work happens elsewhere. This side computes the content id for an
//! image URL, checks whether the service already has it, and if not queues a
//! conversion and hands back the endpoint the image will live at.

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::config::ImageServiceConfig;
use crate::queue::{ConversionJob, ConversionQueue, JobKind};

/// SHA-256 hex of the absolute image URL.
pub fn image_id(url: &str) -> String {
    hex::encode(Sha256::digest(url.as_bytes()))
}

/// Fixed-width thumbnail derived from an image service endpoint.
pub fn thumbnail_for(endpoint: &str) -> String {
    format!("{}/full/150,/0/default.jpg", endpoint)
}

#[derive(Debug, Clone)]
pub struct ImageServiceBinding {
    client: reqwest::Client,
    queue: ConversionQueue,
    service_url: String,
    poster_url: String,
    quality: u8,
}

impl ImageServiceBinding {
    pub fn new(client: reqwest::Client, queue: ConversionQueue, config: &ImageServiceConfig) -> Self {
        Self {
            client,
            queue,
            service_url: config.service_url.trim_end_matches('/').to_string(),
            poster_url: config.poster_url.trim_end_matches('/').to_string(),
            quality: config.quality,
        }
    }

    /// `{service}/{id}` for `url`.
    pub fn endpoint_for(&self, url: &str) -> String {
        format!("{}/{}", self.service_url, image_id(url))
    }

    /// True when `HEAD {endpoint}/info.json` answers 200.
    pub async fn is_ready(&self, endpoint: &str) -> bool {
        let info_json = format!("{}/info.json", endpoint);
        match self.client.head(&info_json).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!(url = %info_json, error = %e, "Readiness probe failed");
                false
            }
        }
    }

    /// Endpoint for `url`, queueing a conversion when missing or refreshing.
    ///
    /// Returns immediately; the endpoint may not serve tiles until the
    /// pipeline catches up.
    pub async fn endpoint(&self, url: &str, refresh: bool) -> String {
        let endpoint = self.endpoint_for(url);
        if refresh || !self.is_ready(&endpoint).await {
            self.queue.submit(ConversionJob {
                url: url.to_string(),
                quality: self.quality,
                refresh,
                kind: JobKind::Tiles,
            });
        }
        endpoint
    }

    /// Request a poster frame for audio or video and return where it will appear.
    pub fn poster(&self, url: &str, refresh: bool) -> String {
        self.queue.submit(ConversionJob {
            url: url.to_string(),
            quality: self.quality,
            refresh,
            kind: JobKind::Poster,
        });
        format!("{}/{}.jpg", self.poster_url, image_id(url))
    }
}
