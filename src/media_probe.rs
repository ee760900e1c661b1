//! Lightweight media inspection.
//!
//! Reads what can be learned without decoding pixels: the `Content-Type` and
//! `Content-Length` from a HEAD request and, for raster images, the pixel
//! dimensions from the first bytes of the file header.

use std::io::Cursor;

use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, RANGE};
use tracing::{debug, warn};

/// Bytes requested when sniffing image dimensions.
const HEADER_BYTES: u64 = 64 * 1024;

/// What the probe learned about a media URL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaInfo {
    pub format: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration: Option<f64>,
    pub size: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct MediaProbe {
    client: reqwest::Client,
}

impl MediaProbe {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// MIME type from a HEAD request, parameters stripped.
    pub async fn content_type(&self, url: &str) -> Option<String> {
        let resp = match self.client.head(url).send().await {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                debug!(url = %url, status = resp.status().as_u16(), "HEAD rejected");
                return None;
            }
            Err(e) => {
                debug!(url = %url, error = %e, "HEAD failed");
                return None;
            }
        };
        resp.headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(mime_essence)
    }

    /// Format, size and, for raster images, dimensions.
    pub async fn probe(&self, url: &str) -> MediaInfo {
        let mut info = MediaInfo::default();

        match self.client.head(url).send().await {
            Ok(resp) if resp.status().is_success() => {
                let headers = resp.headers();
                info.format = headers
                    .get(CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map(mime_essence);
                info.size = headers
                    .get(CONTENT_LENGTH)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok());
            }
            Ok(resp) => debug!(url = %url, status = resp.status().as_u16(), "HEAD rejected"),
            Err(e) => warn!(url = %url, error = %e, "Media probe HEAD failed"),
        }

        if info.format.as_deref().map_or(true, |f| f == "application/octet-stream") {
            info.format = mime_from_extension(url).map(str::to_string);
        }

        let is_raster = info
            .format
            .as_deref()
            .is_some_and(|f| f.starts_with("image/") && f != "image/svg+xml");
        if is_raster {
            if let Some((width, height)) = self.sniff_dimensions(url).await {
                info.width = Some(width);
                info.height = Some(height);
            }
        }

        debug!(url = %url, info = ?info, "Media probe");
        info
    }

    /// Dimensions from at most [`HEADER_BYTES`] of the file, whether or not
    /// the server honors `Range`.
    async fn sniff_dimensions(&self, url: &str) -> Option<(u32, u32)> {
        let mut resp = self
            .client
            .get(url)
            .header(RANGE, format!("bytes=0-{}", HEADER_BYTES - 1))
            .send()
            .await
            .ok()?;
        if !resp.status().is_success() {
            return None;
        }
        let head = read_head(&mut resp, HEADER_BYTES as usize).await;
        drop(resp);
        image_dimensions(&head)
    }
}

/// Up to `limit` leading body bytes; the rest of the body is never read.
async fn read_head(resp: &mut reqwest::Response, limit: usize) -> Vec<u8> {
    let mut head = Vec::with_capacity(limit);
    while head.len() < limit {
        match resp.chunk().await {
            Ok(Some(chunk)) => {
                let take = chunk.len().min(limit - head.len());
                head.extend_from_slice(&chunk[..take]);
            }
            Ok(None) => break,
            Err(e) => {
                debug!(url = %resp.url(), error = %e, "Header read failed");
                break;
            }
        }
    }
    head
}

/// Pixel dimensions from an image header.
pub fn image_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

fn mime_essence(raw: &str) -> String {
    raw.split(';').next().unwrap_or(raw).trim().to_lowercase()
}

/// Guess a MIME type from the URL's file extension.
pub fn mime_from_extension(url: &str) -> Option<&'static str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let ext = path.rsplit_once('.')?.1.to_lowercase();
    let mime = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "tif" | "tiff" => "image/tiff",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "ogv" => "video/ogg",
        "mov" => "video/quicktime",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "oga" | "ogg" => "application/ogg",
        "flac" => "audio/flac",
        _ => return None,
    };
    Some(mime)
}
