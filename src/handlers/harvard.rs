//! Harvard Art Museums: objects already published as IIIF manifests.

use async_trait::async_trait;
use presenter_core::Result;

use super::{path_elements, HandlerContext, ManifestBuild, SourceHandler};

pub const TAG: &str = "harvard";

const MANIFEST_BASE: &str = "https://iiif.harvardartmuseums.org/manifests/object";

fn external_manifest(sourceid: &str) -> String {
    format!("{}/{}", MANIFEST_BASE, sourceid)
}

#[derive(Debug, Default)]
pub struct HarvardHandler;

#[async_trait]
impl SourceHandler for HarvardHandler {
    fn tag(&self) -> &'static str {
        TAG
    }

    async fn can_handle(&self, _ctx: &HandlerContext, url: &str) -> bool {
        let elems = path_elements(url);
        elems.len() > 3 && elems[2] == "harvardartmuseums.org" && elems[3] == "collections"
    }

    /// `https://harvardartmuseums.org/collections/object/{id}` -> `{id}`
    fn sourceid_from_url(&self, url: &str) -> Option<String> {
        path_elements(url)
            .get(5)
            .filter(|e| !e.is_empty())
            .map(|e| e.to_string())
    }

    fn manifest_url(&self, url: &str, _baseurl: &str) -> Option<String> {
        self.sourceid_from_url(url).map(|id| external_manifest(&id))
    }

    async fn init_manifest(&self, _ctx: &HandlerContext, build: &mut ManifestBuild) -> Result<()> {
        build.external_manifest = Some(external_manifest(&build.sourceid));
        Ok(())
    }
}
