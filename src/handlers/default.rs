//! Fallback handler for any directly addressable image URL.

use async_trait::async_trait;
use presenter_core::{rights_url, Result};
use tracing::debug;

use super::{HandlerContext, ManifestBuild, SourceHandler};

pub const TAG: &str = "default";

#[derive(Debug, Default)]
pub struct DefaultHandler;

#[async_trait]
impl SourceHandler for DefaultHandler {
    fn tag(&self) -> &'static str {
        TAG
    }

    async fn can_handle(&self, ctx: &HandlerContext, url: &str) -> bool {
        let content_type = ctx.probe.content_type(url).await;
        debug!(url = %url, content_type = ?content_type, "Default handler probe");
        content_type.is_some_and(|ct| ct.starts_with("image"))
    }

    fn sourceid_from_url(&self, url: &str) -> Option<String> {
        Some(url.to_string())
    }

    async fn init_manifest(&self, ctx: &HandlerContext, build: &mut ManifestBuild) -> Result<()> {
        let url = build.sourceid.clone();
        let descriptor = &mut build.descriptor;
        descriptor.set_image_url(&ctx.language, &url);
        descriptor.set_label(&ctx.language, &url);
        if let Some(rights) = rights_url("CNE", None) {
            descriptor.set_rights(rights);
        }
        Ok(())
    }
}
