//! JSTOR Community Collections via the JSTOR labs search service.

use async_trait::async_trait;
use presenter_core::{rights_url, Agent, Error, ResourceRef, Result};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{HandlerContext, ManifestBuild, SourceHandler};
use crate::http::{fetch_json, require_json};

pub const TAG: &str = "jstor";

const DOI_PREFIX: &str = "10.2307";
const COLLECTIONS_PAGE: &str = "https://about.jstor.org/whats-in-jstor/open-community-collections/";
const LOGO: &str = "https://about.jstor.org/wp-content/themes/aboutjstor2017/static/JSTOR_Logo2017_90.png";

// ---------------------------------------------------------------------------
// JSTOR API response types (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct ItemMetadata {
    #[serde(default)]
    item_title: Option<String>,
    #[serde(default)]
    ps_desc: Vec<String>,
    #[serde(default, rename = "iiifUrls")]
    iiif_urls: Vec<String>,
    #[serde(default)]
    primary_agents: Vec<String>,
    #[serde(default)]
    cc_reuse_license: Vec<String>,
    #[serde(default)]
    ps_source: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InfoJson {
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
}

/// Short rights code for a JSTOR reuse-license label.
fn license_code(label: &str) -> &str {
    match label {
        "Creative Commons: Free Reuse (CC0)" => "CC0",
        "Creative Commons: Public Domain Mark" => "PDM",
        "Creative Commons: Attribution" => "CC BY",
        "Creative Commons: Attribution-ShareAlike" => "CC BY-SA",
        "Creative Commons: Attribution-NonCommercial" => "CC BY-NC",
        "Creative Commons: Attribution-NoDerivs" => "CC BY-ND",
        "Creative Commons: Attribution-NonCommercial-ShareAlike" => "CC BY-NC-SA",
        "Creative Commons: Attribution-NonCommercial-NoDerivs" => "CC BY-NC-ND",
        other => other,
    }
}

fn jstor_agent(language: &str) -> Agent {
    let mut logo = ResourceRef::image(LOGO);
    logo.width = Some(90);
    let mut agent = Agent::new(language, "JSTOR Community Collections", COLLECTIONS_PAGE, Some(logo));
    agent.homepage = Some(vec![ResourceRef::text("https://www.jstor.org", language, "JSTOR")]);
    agent
}

// ---------------------------------------------------------------------------
// Handler
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct JstorHandler;

#[async_trait]
impl SourceHandler for JstorHandler {
    fn tag(&self) -> &'static str {
        TAG
    }

    async fn can_handle(&self, _ctx: &HandlerContext, url: &str) -> bool {
        url.starts_with("https://www.jstor.org")
    }

    /// `https://www.jstor.org/stable/community.31063498` -> `community.31063498`
    fn sourceid_from_url(&self, url: &str) -> Option<String> {
        let base = url.split('?').next().unwrap_or_default();
        let id = base.split('/').skip(4).collect::<Vec<_>>().join("/");
        (!id.is_empty()).then_some(id)
    }

    async fn init_manifest(&self, ctx: &HandlerContext, build: &mut ManifestBuild) -> Result<()> {
        let api_key = ctx
            .providers
            .jstor_api_key
            .as_deref()
            .ok_or_else(|| Error::provider(TAG, "no API key configured"))?;
        let url = format!(
            "{}/metadata/{}/{}",
            ctx.providers.jstor_api.trim_end_matches('/'),
            DOI_PREFIX,
            build.sourceid
        );
        debug!(url = %url, "Fetching JSTOR item");
        let request = ctx
            .client
            .get(&url)
            .header("Content-Type", "application/json")
            .bearer_auth(api_key);
        let item: ItemMetadata = require_json(request, TAG).await?;

        let lang = ctx.language.as_str();
        let descriptor = &mut build.descriptor;
        descriptor.set_format("image/jpeg");
        if let Some(title) = &item.item_title {
            descriptor.set_label(lang, title);
        }
        if !item.ps_desc.is_empty() {
            descriptor.set_summary(lang, &item.ps_desc.join(" "));
        }
        descriptor.set_source_url(lang, &format!("https://www.jstor.org/stable/{}", build.sourceid));

        let fragment = item
            .iiif_urls
            .first()
            .and_then(|u| u.split_once("/iiif/"))
            .map(|(_, fragment)| fragment.trim_end_matches("/info.json"));
        if let Some(fragment) = fragment {
            let service = format!("{}/{}", ctx.providers.jstor_iiif.trim_end_matches('/'), fragment);
            descriptor.set_image_url(lang, &format!("{}/full/full/0/default.jpg", service));
            descriptor.set_thumbnail(format!("{}/full/150,/0/default.jpg", service));

            let info_url = format!("{}/info.json", service);
            match fetch_json::<InfoJson>(ctx.client.get(&info_url), TAG).await {
                Ok(Some(info)) => {
                    descriptor.set_width(info.width);
                    descriptor.set_height(info.height);
                }
                Ok(None) => debug!(url = %info_url, "No info.json"),
                Err(e) => warn!(url = %info_url, error = %e, "JSTOR info.json lookup failed"),
            }
            build.service_endpoint = Some(service);
        }

        ctx.add_metadata(descriptor, "creator", vec![item.primary_agents.join("; ")])
            .await;
        ctx.add_metadata(descriptor, "tags", item.primary_agents.clone()).await;

        if let [license] = item.cc_reuse_license.as_slice() {
            if let Some(rights) = rights_url(license_code(license), None) {
                descriptor.set_rights(rights);
            }
        }
        descriptor.set_provider(vec![jstor_agent(lang)]);

        if descriptor.is_attribution_required() && !descriptor.has_attribution_statement() {
            if let Some(source) = &item.ps_source {
                descriptor.set_required_statement(lang, "attribution", source);
            }
        }
        Ok(())
    }
}
