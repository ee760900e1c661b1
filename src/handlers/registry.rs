//! Handler registration and dispatch.

use std::sync::Arc;

use presenter_core::ids::unescape_sourceid;
use presenter_core::ManifestId;
use tracing::debug;

use super::default::DefaultHandler;
use super::edison::EdisonHandler;
use super::flickr::FlickrHandler;
use super::github::GithubHandler;
use super::harvard::HarvardHandler;
use super::internet_archive::{archivelab_manifest, details_id, InternetArchiveHandler};
use super::jstor::JstorHandler;
use super::met::MetHandler;
use super::openverse::OpenverseHandler;
use super::wikidata::WikidataHandler;
use super::wikimedia_commons::WikimediaCommonsHandler;
use super::{HandlerContext, SourceHandler};

/// Ordered handler table plus the generic fallback.
pub struct HandlerRegistry {
    handlers: Vec<Arc<dyn SourceHandler>>,
    default: Arc<dyn SourceHandler>,
}

impl HandlerRegistry {
    pub fn new(handlers: Vec<Arc<dyn SourceHandler>>, default: Arc<dyn SourceHandler>) -> Self {
        Self { handlers, default }
    }

    /// Every provider, in dispatch order, with the image-URL fallback last.
    pub fn with_defaults() -> Self {
        let handlers: Vec<Arc<dyn SourceHandler>> = vec![
            Arc::new(OpenverseHandler::default()),
            Arc::new(EdisonHandler),
            Arc::new(FlickrHandler),
            Arc::new(GithubHandler::default()),
            Arc::new(HarvardHandler),
            Arc::new(InternetArchiveHandler),
            Arc::new(JstorHandler),
            Arc::new(MetHandler),
            Arc::new(WikimediaCommonsHandler),
            Arc::new(WikidataHandler),
        ];
        Self::new(handlers, Arc::new(DefaultHandler))
    }

    pub fn tags(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.handlers.iter().map(|h| h.tag()).chain(std::iter::once(self.default.tag()))
    }

    pub fn by_tag(&self, tag: &str) -> Option<Arc<dyn SourceHandler>> {
        if tag == self.default.tag() {
            return Some(self.default.clone());
        }
        self.handlers.iter().find(|h| h.tag() == tag).cloned()
    }

    /// Handler and parsed id for a manifest id.
    ///
    /// An absent or unregistered tag means the whole id is a URL for the
    /// default handler, so `https://x.org/a.jpg` is not read as tag `https`.
    /// Escapes are decoded once either way.
    pub fn resolve_id(&self, id: &str) -> (Arc<dyn SourceHandler>, ManifestId) {
        let parsed = ManifestId::parse(id);
        if let Some(handler) = parsed.tag.as_deref().and_then(|tag| self.by_tag(tag)) {
            return (handler, parsed);
        }
        debug!(id = %id, "No registered tag; using default handler");
        (self.default.clone(), ManifestId::raw(unescape_sourceid(id)))
    }

    /// First handler whose URL test accepts `url`.
    pub async fn handler_for_url(&self, ctx: &HandlerContext, url: &str) -> Option<Arc<dyn SourceHandler>> {
        for handler in &self.handlers {
            if handler.can_handle(ctx, url).await {
                return Some(handler.clone());
            }
        }
        if self.default.can_handle(ctx, url).await {
            return Some(self.default.clone());
        }
        None
    }

    /// Canonical manifest URL for a provider URL.
    ///
    /// Falls back to the archivelab bridge for archive item pages, and to
    /// `url` itself when nothing matches.
    pub async fn manifest_url(&self, ctx: &HandlerContext, url: &str, baseurl: &str) -> String {
        if let Some(handler) = self.handler_for_url(ctx, url).await {
            if let Some(manifest) = handler.manifest_url(url, baseurl) {
                debug!(url = %url, tag = handler.tag(), manifest = %manifest, "Resolved URL");
                return manifest;
            }
        }
        if let Some(id) = details_id(url) {
            return archivelab_manifest(&id);
        }
        debug!(url = %url, "No handler for URL");
        url.to_string()
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::context;

    const BASE: &str = "https://iiif.test";

    #[test]
    fn registration_order() {
        let registry = HandlerRegistry::with_defaults();
        let tags: Vec<_> = registry.tags().collect();
        assert_eq!(
            tags,
            vec!["cc", "edison", "flickr", "gh", "harvard", "ia", "jstor", "met", "wc", "wd", "default"]
        );
    }

    #[test]
    fn known_tag_resolves() {
        let registry = HandlerRegistry::with_defaults();
        let (handler, id) = registry.resolve_id("wc:Mona_Lisa.jpg");
        assert_eq!(handler.tag(), "wc");
        assert_eq!(id.sourceid, "Mona_Lisa.jpg");
    }

    #[test]
    fn url_id_goes_to_default() {
        let registry = HandlerRegistry::with_defaults();
        let (handler, id) = registry.resolve_id("https://example.org/a.jpg");
        assert_eq!(handler.tag(), "default");
        assert_eq!(id, ManifestId::raw("https://example.org/a.jpg"));
    }

    #[test]
    fn url_id_is_unescaped_once() {
        let registry = HandlerRegistry::with_defaults();
        let (handler, id) = registry.resolve_id("https://x.org/a.jpg%3Fw%3D1%26h%3D2");
        assert_eq!(handler.tag(), "default");
        assert_eq!(id.sourceid, "https://x.org/a.jpg?w=1&h=2");

        let (_, untagged) = registry.resolve_id("x.org/a.jpg%3Fw%3D1");
        assert_eq!(untagged.sourceid, "x.org/a.jpg?w=1");
    }

    #[test]
    fn explicit_default_tag_keeps_sourceid() {
        let registry = HandlerRegistry::with_defaults();
        let (handler, id) = registry.resolve_id("default:https%3A//example.org/a.jpg%3Fw%3D1");
        assert_eq!(handler.tag(), "default");
        assert_eq!(id.sourceid, "https://example.org/a.jpg?w=1");
    }

    #[tokio::test]
    async fn provider_urls_resolve_locally() {
        let registry = HandlerRegistry::with_defaults();
        let ctx = context("http://127.0.0.1:9");
        assert_eq!(
            registry
                .manifest_url(&ctx, "https://github.com/acct/repo/blob/main/img.jpg", BASE)
                .await,
            "https://iiif.test/gh:acct/repo/img.jpg/manifest.json"
        );
        assert_eq!(
            registry
                .manifest_url(&ctx, "https://www.metmuseum.org/art/collection/search/436535", BASE)
                .await,
            "https://iiif.test/met:436535/manifest.json"
        );
    }

    #[tokio::test]
    async fn archive_urls_use_the_bridge() {
        let registry = HandlerRegistry::with_defaults();
        let ctx = context("http://127.0.0.1:9");
        assert_eq!(
            registry.manifest_url(&ctx, "https://archive.org/details/item1", BASE).await,
            "https://iiif.archivelab.org/iiif/item1/manifest.json"
        );
        assert_eq!(
            registry
                .manifest_url(&ctx, "http://127.0.0.1:9/archive.org/details/item2?x=1", BASE)
                .await,
            "https://iiif.archivelab.org/iiif/item2/manifest.json"
        );
    }

    #[tokio::test]
    async fn unmatched_url_is_returned_unchanged() {
        let registry = HandlerRegistry::with_defaults();
        let ctx = context("http://127.0.0.1:9");
        let url = "http://127.0.0.1:9/not-an-image";
        assert_eq!(registry.manifest_url(&ctx, url, BASE).await, url);
    }
}
