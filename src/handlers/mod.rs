//! Source handlers: one per content provider.
//!
//! A handler knows three things about its provider: which URLs belong to it,
//! how to turn such a URL into a stable source id (and back into a manifest
//! URL), and how to populate a fresh [`ManifestDescriptor`] from the
//! provider's API. Handlers hold no per-request state; everything a build
//! needs travels in [`HandlerContext`] and [`ManifestBuild`].
//!
//! # Module layout
//!
//! - [`registry`] -- Static registration order and by-id / by-url dispatch.
//! - One submodule per provider.

pub mod default;
pub mod edison;
pub mod flickr;
pub mod github;
pub mod harvard;
pub mod internet_archive;
pub mod jstor;
pub mod met;
pub mod openverse;
pub mod registry;
pub mod wikidata;
pub mod wikimedia_commons;

use std::sync::Arc;

use async_trait::async_trait;
use presenter_core::{ManifestDescriptor, ManifestId, MetadataEntry, Result};

use crate::config::ProvidersConfig;
use crate::entities::EntityService;
use crate::media_probe::MediaProbe;

pub use registry::HandlerRegistry;

/// Metadata label whose Q-id values are linked and merged.
pub const DEPICTS: &str = "depicts";

/// Metadata label for the entity an image digitally represents.
pub const REPRESENTS: &str = "digital representation of";

// ---------------------------------------------------------------------------
// Build state
// ---------------------------------------------------------------------------

/// Everything a single manifest build reads and writes.
#[derive(Debug)]
pub struct ManifestBuild {
    pub manifest_id: ManifestId,
    /// Unescaped, normalized provider-native id.
    pub sourceid: String,
    pub descriptor: ManifestDescriptor,
    pub refresh: bool,
    /// Set when the provider publishes its own manifest; the engine then
    /// proxies that document instead of the descriptor.
    pub external_manifest: Option<String>,
    /// Set when the provider hosts its own image service.
    pub service_endpoint: Option<String>,
}

impl ManifestBuild {
    pub fn new(manifest_id: ManifestId, refresh: bool) -> Self {
        let descriptor = ManifestDescriptor::skeleton(&manifest_id);
        Self {
            sourceid: manifest_id.sourceid.clone(),
            manifest_id,
            descriptor,
            refresh,
            external_manifest: None,
            service_endpoint: None,
        }
    }
}

/// Shared services handed to every handler call.
#[derive(Clone)]
pub struct HandlerContext {
    pub client: reqwest::Client,
    pub providers: Arc<ProvidersConfig>,
    pub entities: Arc<EntityService>,
    pub probe: MediaProbe,
    pub language: String,
}

impl HandlerContext {
    /// Add a metadata pair under the merge rule.
    ///
    /// `depicts` and `digital representation of` values have their Q-ids
    /// linked and are unioned into the existing `depicts` entry; any other
    /// label replaces a same-label entry or appends.
    pub async fn add_metadata(&self, descriptor: &mut ManifestDescriptor, label: &str, values: Vec<String>) {
        let values: Vec<String> = values.into_iter().filter(|v| !v.is_empty()).collect();
        if values.is_empty() {
            return;
        }
        let mut entry = MetadataEntry::new(&self.language, label, values);
        if label == DEPICTS || label == REPRESENTS {
            self.entities.link_qids(&mut entry, &self.language).await;
            match descriptor.find_metadata(DEPICTS) {
                Some(existing) => {
                    let mut merged = existing.clone();
                    merged.value.merge_union(&entry.value);
                    descriptor.upsert_metadata(merged);
                }
                None => descriptor.merge_metadata(entry),
            }
        } else {
            descriptor.upsert_metadata(entry);
        }
    }
}

// ---------------------------------------------------------------------------
// Handler trait
// ---------------------------------------------------------------------------

/// Async trait every provider implements.
///
/// Handlers are registered once and shared behind `Arc`, so implementations
/// keep only configuration-independent state (memoized tokens at most).
#[async_trait]
pub trait SourceHandler: Send + Sync {
    /// Short tag used as the manifest id prefix (e.g. `"gh"`).
    fn tag(&self) -> &'static str;

    /// Whether `url` belongs to this provider.
    ///
    /// A pure URL-shape test for every provider but the default.
    async fn can_handle(&self, ctx: &HandlerContext, url: &str) -> bool;

    /// Provider-native id for a URL this handler accepts.
    fn sourceid_from_url(&self, url: &str) -> Option<String>;

    /// Manifest URL for `url`: local by default, external for providers that
    /// publish their own manifests.
    fn manifest_url(&self, url: &str, baseurl: &str) -> Option<String> {
        let sourceid = self.sourceid_from_url(url)?;
        Some(ManifestId::new(self.tag(), sourceid).manifest_url(baseurl))
    }

    /// Canonical form of a source id before the cache key is computed.
    async fn normalize_sourceid(&self, _ctx: &HandlerContext, sourceid: &str) -> String {
        sourceid.to_string()
    }

    /// Populate `build.descriptor` from the provider.
    ///
    /// Errors are logged by the engine and the partial descriptor is kept.
    async fn init_manifest(&self, ctx: &HandlerContext, build: &mut ManifestBuild) -> Result<()>;
}

// ---------------------------------------------------------------------------
// URL helpers shared by handlers
// ---------------------------------------------------------------------------

/// `url` split on `/`, query string dropped.
pub(crate) fn path_elements(url: &str) -> Vec<&str> {
    url.split('?').next().unwrap_or_default().split('/').collect()
}

/// Last non-empty path element, query string dropped.
pub(crate) fn last_element(url: &str) -> Option<String> {
    path_elements(url)
        .into_iter()
        .rev()
        .find(|e| !e.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::clock::SystemClock;

    /// Context whose provider endpoints all point at `mock_uri`.
    pub fn context(mock_uri: &str) -> HandlerContext {
        let providers = ProvidersConfig {
            github_api: mock_uri.to_string(),
            github_raw: format!("{}/raw", mock_uri),
            flickr_api: format!("{}/flickr", mock_uri),
            flickr_api_key: Some("flickr-key".to_string()),
            commons_api: format!("{}/commons", mock_uri),
            wikidata_api: format!("{}/wikidata", mock_uri),
            wikidata_sparql: format!("{}/sparql", mock_uri),
            jstor_api: format!("{}/jstor", mock_uri),
            jstor_api_key: Some("jstor-key".to_string()),
            jstor_iiif: format!("{}/jstor-iiif", mock_uri),
            related_entities_url: format!("{}/related", mock_uri),
            met_api: format!("{}/met", mock_uri),
            openverse_api: format!("{}/openverse", mock_uri),
            ..ProvidersConfig::default()
        };
        let providers = Arc::new(providers);
        let client = reqwest::Client::new();
        HandlerContext {
            entities: Arc::new(EntityService::new(
                client.clone(),
                providers.clone(),
                Arc::new(SystemClock),
            )),
            probe: MediaProbe::new(client.clone()),
            client,
            providers,
            language: "en".to_string(),
        }
    }

    pub fn build(tag: &str, sourceid: &str) -> ManifestBuild {
        ManifestBuild::new(ManifestId::new(tag, sourceid), false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_helpers() {
        let url = "https://example.org/a/b/c/?x=1";
        assert_eq!(path_elements(url), vec!["https:", "", "example.org", "a", "b", "c", ""]);
        assert_eq!(last_element(url).as_deref(), Some("c"));
    }

    #[tokio::test]
    async fn plain_metadata_replaces() {
        let ctx = test_support::context("http://127.0.0.1:9");
        let mut build = test_support::build("gh", "a/b/c.jpg");
        ctx.add_metadata(&mut build.descriptor, "creator", vec!["A".into()]).await;
        ctx.add_metadata(&mut build.descriptor, "creator", vec!["B".into()]).await;
        assert_eq!(build.descriptor.metadata_value("creator"), Some("B"));
        assert_eq!(
            build.descriptor.metadata().iter().filter(|m| m.has_label("creator")).count(),
            1
        );
    }

    #[tokio::test]
    async fn overlapping_depicts_merge_into_one_entry() {
        let ctx = test_support::context("http://127.0.0.1:9");
        let mut build = test_support::build("gh", "a/b/c.jpg");
        ctx.add_metadata(&mut build.descriptor, DEPICTS, vec!["Q1".into(), "Q2".into()]).await;
        ctx.add_metadata(&mut build.descriptor, REPRESENTS, vec!["Q2".into(), "Q3".into()]).await;

        let entries: Vec<_> = build.descriptor.metadata().iter().filter(|m| m.has_label(DEPICTS)).collect();
        assert_eq!(entries.len(), 1);
        assert!(build.descriptor.find_metadata(REPRESENTS).is_none());
        let values = entries[0].value.values("en");
        assert_eq!(values.len(), 3);
        for (value, qid) in values.iter().zip(["Q1", "Q2", "Q3"]) {
            assert!(value.ends_with(&format!("/wiki/{}\">{}</a>", qid, qid)), "{}", value);
        }
    }

    #[tokio::test]
    async fn empty_values_are_skipped() {
        let ctx = test_support::context("http://127.0.0.1:9");
        let mut build = test_support::build("gh", "a/b/c.jpg");
        ctx.add_metadata(&mut build.descriptor, "tags", vec![String::new()]).await;
        assert!(build.descriptor.find_metadata("tags").is_none());
    }
}
