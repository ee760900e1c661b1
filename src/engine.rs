//! Manifest composition.
//!
//! A request runs cache lookup, staleness check, handler build,
//! post-processing and persist, in that order. Nothing here fails a request
//! because a provider, the cache, the entity index or the image service
//! misbehaved; the worst outcome is a descriptor with fewer fields.

use std::sync::Arc;

use bytes::Bytes;
use chrono::Duration;
use presenter_core::{ManifestId, Result};
use tracing::{debug, info, warn};

use crate::cache::{self, Freshness, ManifestCache};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::entities::{props, EntityService};
use crate::handlers::{HandlerContext, HandlerRegistry, ManifestBuild, DEPICTS};
use crate::http::build_client;
use crate::image_service::{thumbnail_for, ImageServiceBinding};
use crate::media_probe::MediaProbe;
use crate::memo::{MemoCache, DEFAULT_MAX_LEN, DEFAULT_TTL_SECS};
use crate::queue::ConversionQueue;

/// A manifest request.
#[derive(Debug, Clone)]
pub struct ManifestRequest {
    /// Manifest id as it appears in the URL path.
    pub id: String,
    /// Externally visible base URL substituted for the placeholder.
    pub base_url: String,
    pub refresh: bool,
}

/// Where a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestOrigin {
    Cache,
    Built,
    /// A provider-published manifest, passed through verbatim.
    External,
}

#[derive(Debug, Clone)]
pub struct RenderedManifest {
    pub body: Bytes,
    pub origin: ManifestOrigin,
}

pub struct ManifestEngine {
    registry: HandlerRegistry,
    ctx: HandlerContext,
    cache: Arc<dyn ManifestCache>,
    images: ImageServiceBinding,
    external: MemoCache<String, Bytes>,
    clock: Arc<dyn Clock>,
    max_age: Duration,
}

impl ManifestEngine {
    /// Engine wired from configuration, with the system clock.
    pub fn from_config(config: &Config, queue: ConversionQueue) -> Result<Self> {
        Self::with_parts(config, cache::from_config(&config.cache), queue, Arc::new(SystemClock))
    }

    /// Engine with an explicit cache and clock.
    pub fn with_parts(
        config: &Config,
        cache: Arc<dyn ManifestCache>,
        queue: ConversionQueue,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let client = build_client(&config.providers)?;
        let providers = Arc::new(config.providers.clone());
        let ctx = HandlerContext {
            entities: Arc::new(EntityService::new(client.clone(), providers.clone(), clock.clone())),
            probe: MediaProbe::new(client.clone()),
            client: client.clone(),
            providers,
            language: config.language.clone(),
        };
        Ok(Self {
            registry: HandlerRegistry::with_defaults(),
            images: ImageServiceBinding::new(client, queue, &config.image_service),
            external: MemoCache::with_clock(
                DEFAULT_MAX_LEN,
                Duration::seconds(DEFAULT_TTL_SECS),
                clock.clone(),
            ),
            max_age: Duration::days(config.cache.max_age_days),
            ctx,
            cache,
            clock,
        })
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Canonical manifest URL for a provider URL.
    pub async fn resolve_url(&self, url: &str, base_url: &str) -> String {
        self.registry.manifest_url(&self.ctx, url, base_url).await
    }

    /// Serve a manifest from cache or build it.
    pub async fn get_manifest(&self, request: &ManifestRequest) -> Result<RenderedManifest> {
        let (handler, parsed) = self.registry.resolve_id(&request.id);
        let sourceid = handler.normalize_sourceid(&self.ctx, &parsed.sourceid).await;
        let manifest_id = match parsed.tag {
            Some(tag) => ManifestId::new(tag, sourceid),
            None => ManifestId::raw(sourceid),
        };
        let key = manifest_id.to_string();

        if !request.refresh {
            if let Some(rendered) = self.cached(&key, &request.base_url).await? {
                return Ok(rendered);
            }
        }

        info!(id = %key, tag = handler.tag(), refresh = request.refresh, "Building manifest");
        let mut build = ManifestBuild::new(manifest_id, request.refresh);
        if let Err(e) = handler.init_manifest(&self.ctx, &mut build).await {
            warn!(id = %key, error = %e, "Handler failed; keeping partial manifest");
        }

        if let Some(url) = build.external_manifest.clone() {
            match self.external_manifest(&url).await {
                Some(body) => {
                    return Ok(RenderedManifest {
                        body,
                        origin: ManifestOrigin::External,
                    })
                }
                None => warn!(id = %key, url = %url, "External manifest unavailable"),
            }
        }

        build.descriptor.stamp_updated(&self.ctx.language, self.clock.now());
        self.bind_media(&mut build).await;
        self.link_related(&mut build).await;

        if build.descriptor.image_url().is_some() {
            let bytes = build.descriptor.to_vec()?;
            if let Err(e) = self.cache.put(&key, &bytes).await {
                warn!(id = %key, error = %e, "Cache write failed");
            }
        } else {
            debug!(id = %key, "No image URL; not caching");
        }

        Ok(RenderedManifest {
            body: Bytes::from(build.descriptor.render(&request.base_url)?),
            origin: ManifestOrigin::Built,
        })
    }

    /// A fresh cache entry, rendered. Read failures count as a miss.
    async fn cached(&self, key: &str, base_url: &str) -> Result<Option<RenderedManifest>> {
        let bytes = match self.cache.get(key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Ok(None),
            Err(e) => {
                warn!(id = %key, error = %e, "Cache read failed; rebuilding");
                return Ok(None);
            }
        };
        match cache::evaluate(&bytes, self.clock.now(), self.max_age) {
            Freshness::Fresh(descriptor) => {
                info!(id = %key, "Cache hit");
                Ok(Some(RenderedManifest {
                    body: Bytes::from(descriptor.render(base_url)?),
                    origin: ManifestOrigin::Cache,
                }))
            }
            Freshness::Stale => {
                info!(id = %key, "Cache entry stale");
                Ok(None)
            }
            Freshness::Corrupt => {
                warn!(id = %key, "Cache entry unreadable");
                Ok(None)
            }
        }
    }

    /// Provider manifest bytes, memoized.
    async fn external_manifest(&self, url: &str) -> Option<Bytes> {
        let key = url.to_string();
        if let Some(body) = self.external.get(&key) {
            debug!(url = %url, "External manifest memo hit");
            return Some(body);
        }
        debug!(url = %url, "Fetching external manifest");
        let resp = match self.ctx.client.get(url).send().await {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                warn!(url = %url, status = resp.status().as_u16(), "External manifest refused");
                return None;
            }
            Err(e) => {
                warn!(url = %url, error = %e, "External manifest fetch failed");
                return None;
            }
        };
        let body = resp.bytes().await.ok()?;
        self.external.insert(key, body.clone());
        Some(body)
    }

    /// Fill unknown media facts and attach the image service or poster.
    async fn bind_media(&self, build: &mut ManifestBuild) {
        let Some(url) = build.descriptor.image_url().map(str::to_string) else {
            return;
        };
        let descriptor = &mut build.descriptor;
        if descriptor.format().is_none() {
            let info = self.ctx.probe.probe(&url).await;
            if let Some(format) = &info.format {
                descriptor.set_format(format);
            }
            descriptor.set_width(info.width.unwrap_or(0));
            descriptor.set_height(info.height.unwrap_or(0));
            descriptor.set_duration(info.duration.unwrap_or(0.0));
            // canvas label follows the body type
            if let Some(label) = descriptor.label().and_then(|l| l.first()).map(str::to_string) {
                descriptor.set_label(&self.ctx.language, &label);
            }
        }

        let is_gif = descriptor.format() == Some("image/gif");
        match descriptor.body_type() {
            Some("Image") if !is_gif => {
                let endpoint = match build.service_endpoint.clone() {
                    Some(endpoint) => endpoint,
                    None => self.images.endpoint(&url, build.refresh).await,
                };
                descriptor.set_service(&endpoint);
                if descriptor.thumbnail().is_none() {
                    descriptor.set_thumbnail(thumbnail_for(&endpoint));
                }
            }
            Some("Video") | Some("Sound") => {
                let poster = self.images.poster(&url, build.refresh);
                if descriptor.thumbnail().is_none() {
                    descriptor.set_thumbnail(poster);
                }
            }
            _ => {}
        }
    }

    /// Union related `depicts` entities into the descriptor.
    async fn link_related(&self, build: &mut ManifestBuild) {
        let Some(url) = build.descriptor.image_url().map(str::to_string) else {
            return;
        };
        let related = self.ctx.entities.related_entities(&url).await;
        let Some(entities) = related.get(props::DEPICTS) else {
            return;
        };
        let ids: Vec<String> = entities.iter().map(|e| e.id.clone()).collect();
        debug!(url = %url, count = ids.len(), "Related depicts entities");
        self.ctx.add_metadata(&mut build.descriptor, DEPICTS, ids).await;
    }
}
