//! Thomas A. Edison Papers at Rutgers.

use async_trait::async_trait;
use presenter_core::Result;

use super::{HandlerContext, ManifestBuild, SourceHandler};

pub const TAG: &str = "edison";

fn external_manifest(sourceid: &str) -> String {
    format!("https://edisondigital.rutgers.edu/iiif/{}", sourceid)
}

#[derive(Debug, Default)]
pub struct EdisonHandler;

#[async_trait]
impl SourceHandler for EdisonHandler {
    fn tag(&self) -> &'static str {
        TAG
    }

    async fn can_handle(&self, _ctx: &HandlerContext, url: &str) -> bool {
        let elems: Vec<&str> = url.split('/').collect();
        elems.len() > 3
            && elems[2] == "edisondigital.rutgers.edu"
            && matches!(elems[3], "document" | "iiif")
    }

    fn sourceid_from_url(&self, url: &str) -> Option<String> {
        url.split('/')
            .nth(4)
            .filter(|e| !e.is_empty())
            .map(str::to_string)
    }

    fn manifest_url(&self, url: &str, _baseurl: &str) -> Option<String> {
        self.sourceid_from_url(url).map(|id| external_manifest(&id))
    }

    async fn init_manifest(&self, _ctx: &HandlerContext, build: &mut ManifestBuild) -> Result<()> {
        build.external_manifest = Some(external_manifest(&build.sourceid));
        Ok(())
    }
}
