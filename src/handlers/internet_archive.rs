//! Internet Archive items, served through the archivelab IIIF bridge.

use async_trait::async_trait;
use presenter_core::Result;

use super::{HandlerContext, ManifestBuild, SourceHandler};

pub const TAG: &str = "ia";

/// Manifest URL for an archive item id.
pub fn archivelab_manifest(id: &str) -> String {
    format!("https://iiif.archivelab.org/iiif/{}/manifest.json", id)
}

/// Item id from an `archive.org/details/{id}` URL, any scheme or subdomain.
pub fn details_id(url: &str) -> Option<String> {
    let (_, rest) = url.split_once("archive.org/details/")?;
    rest.split(['/', '?', '#'])
        .next()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Default)]
pub struct InternetArchiveHandler;

#[async_trait]
impl SourceHandler for InternetArchiveHandler {
    fn tag(&self) -> &'static str {
        TAG
    }

    async fn can_handle(&self, _ctx: &HandlerContext, url: &str) -> bool {
        let elems: Vec<&str> = url.split('/').collect();
        elems.len() > 4 && matches!(elems[2], "archive.org" | "www.archive.org") && elems[3] == "details"
    }

    fn sourceid_from_url(&self, url: &str) -> Option<String> {
        url.split('/')
            .nth(4)
            .map(|e| e.split('?').next().unwrap_or(e))
            .filter(|e| !e.is_empty())
            .map(str::to_string)
    }

    fn manifest_url(&self, url: &str, _baseurl: &str) -> Option<String> {
        self.sourceid_from_url(url).map(|id| archivelab_manifest(&id))
    }

    async fn init_manifest(&self, _ctx: &HandlerContext, build: &mut ManifestBuild) -> Result<()> {
        build.external_manifest = Some(archivelab_manifest(&build.sourceid));
        Ok(())
    }
}
