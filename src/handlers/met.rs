//! The Metropolitan Museum of Art open-access collection API.

use std::sync::LazyLock;

use async_trait::async_trait;
use presenter_core::{rights_url, Agent, Error, ResourceRef, Result};
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use super::{last_element, HandlerContext, ManifestBuild, SourceHandler, DEPICTS, REPRESENTS};
use crate::entities::qid_from_url;
use crate::http::fetch_json;

pub const TAG: &str = "met";

const HOMEPAGE: &str = "https://www.metmuseum.org/";
const LOGO: &str = "https://seeklogo.com/images/M/metropolitan-art-museum-logo-3B8686F789-seeklogo.com.png";

static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(\d{4})\b").expect("valid year regex"));

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetObject {
    #[serde(default)]
    primary_image: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    is_public_domain: bool,
    #[serde(default)]
    credit_line: Option<String>,
    #[serde(default)]
    object_date: Option<String>,
    #[serde(default, rename = "objectWikidata_URL")]
    object_wikidata_url: Option<String>,
    #[serde(default, rename = "artistWikidata_URL")]
    artist_wikidata_url: Option<String>,
    #[serde(default)]
    tags: Option<Vec<MetTag>>,
}

#[derive(Debug, Deserialize)]
struct MetTag {
    #[serde(default, rename = "Wikidata_URL")]
    wikidata_url: Option<String>,
}

/// `navDate` for a free-text object date: January 1st of its first year.
fn nav_date(object_date: &str) -> Option<String> {
    YEAR.captures(object_date)
        .and_then(|c| c.get(1))
        .map(|year| format!("{}-01-01T00:00:00Z", year.as_str()))
}

#[derive(Debug, Default)]
pub struct MetHandler;

#[async_trait]
impl SourceHandler for MetHandler {
    fn tag(&self) -> &'static str {
        TAG
    }

    async fn can_handle(&self, _ctx: &HandlerContext, url: &str) -> bool {
        url.starts_with("https://www.metmuseum.org/art/collection/")
    }

    fn sourceid_from_url(&self, url: &str) -> Option<String> {
        last_element(url)
    }

    async fn init_manifest(&self, ctx: &HandlerContext, build: &mut ManifestBuild) -> Result<()> {
        let url = format!("{}/objects/{}", ctx.providers.met_api.trim_end_matches('/'), build.sourceid);
        debug!(url = %url, "Fetching Met object");
        let object: MetObject = fetch_json(ctx.client.get(&url), TAG)
            .await?
            .ok_or_else(|| Error::not_found("met object", &build.sourceid))?;

        let lang = ctx.language.as_str();
        let descriptor = &mut build.descriptor;
        descriptor.set_source_url(
            lang,
            &format!("https://www.metmuseum.org/art/collection/search/{}", build.sourceid),
        );

        if let Some(qid) = object.object_wikidata_url.as_deref().and_then(qid_from_url) {
            ctx.add_metadata(descriptor, REPRESENTS, vec![qid]).await;
        }
        let tag_qids: Vec<String> = object
            .tags
            .iter()
            .flatten()
            .filter_map(|t| t.wikidata_url.as_deref().and_then(qid_from_url))
            .collect();
        ctx.add_metadata(descriptor, DEPICTS, tag_qids).await;
        if let Some(qid) = object.artist_wikidata_url.as_deref().and_then(qid_from_url) {
            ctx.add_metadata(descriptor, "artist", vec![qid]).await;
        }
        if let Some(date) = object.object_date.as_deref().and_then(nav_date) {
            descriptor.set_nav_date(date);
        }

        let code = if object.is_public_domain { "CC0" } else { "UND" };
        if let Some(rights) = rights_url(code, None) {
            descriptor.set_rights(rights);
        }
        if let Some(credit) = object.credit_line.as_deref().filter(|c| !c.is_empty()) {
            ctx.add_metadata(descriptor, "creditLine", vec![credit.to_string()]).await;
            if descriptor.is_attribution_required() {
                descriptor.set_required_statement(lang, "attribution", credit);
            }
        }

        if let Some(image) = object.primary_image.as_deref().filter(|i| !i.is_empty()) {
            let info = ctx.probe.probe(image).await;
            if let Some(format) = &info.format {
                descriptor.set_format(format);
            }
            descriptor.set_width(info.width.unwrap_or(0));
            descriptor.set_height(info.height.unwrap_or(0));
            if let Some(size) = info.size {
                ctx.add_metadata(descriptor, "size", vec![size.to_string()]).await;
            }
            descriptor.set_image_url(lang, image);
        }
        if let Some(title) = &object.title {
            descriptor.set_label(lang, title);
        }

        let mut logo = ResourceRef::image(LOGO);
        logo.width = Some(150);
        descriptor.set_provider(vec![Agent::new(
            lang,
            "Metropolitan Museum of Art",
            HOMEPAGE,
            Some(logo),
        )]);
        Ok(())
    }
}
