//! Wikimedia Commons files.
//!
//! File metadata comes from the `imageinfo` query (`extmetadata`, size, mime);
//! depicted entities from the file's structured-data entity. The image URL
//! itself is derived from the file title, the same way MediaWiki lays out its
//! upload directory.

use std::sync::LazyLock;

use async_trait::async_trait;
use md5::{Digest, Md5};
use presenter_core::ids::{escape_sourceid, unescape_sourceid};
use presenter_core::{Agent, Error, ManifestDescriptor, ResourceRef, Result, Rights};
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;

use super::{HandlerContext, ManifestBuild, SourceHandler, DEPICTS};
use crate::entities;

pub const TAG: &str = "wc";

const UPLOAD_BASE: &str = "https://upload.wikimedia.org/wikipedia/commons";
const MAIN_PAGE: &str = "https://commons.wikimedia.org/wiki/Main_Page";
const LOGO: &str = "https://upload.wikimedia.org/wikipedia/en/4/4a/Commons-logo.svg";

/// Long side of the derived thumbnail.
const THUMBNAIL_SIDE: u32 = 240;

static LICENSE_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?(\d\.\d)\s*$").expect("valid license regex"));

// ---------------------------------------------------------------------------
// Title helpers
// ---------------------------------------------------------------------------

/// Upload URL for a file title, or its `{width}px` thumbnail.
pub fn image_url_for_title(title: &str, width: Option<u32>) -> String {
    let title = title.replace(' ', "_");
    let md5 = hex::encode(Md5::digest(title.as_bytes()));
    let quoted = escape_sourceid(&title);
    match width {
        None => format!("{}/{}/{}/{}", UPLOAD_BASE, &md5[..1], &md5[..2], quoted),
        Some(width) => {
            let mut url = format!(
                "{}/thumb/{}/{}/{}/{}px-{}",
                UPLOAD_BASE,
                &md5[..1],
                &md5[..2],
                quoted,
                width,
                quoted
            );
            match title.rsplit('.').next().map(str::to_lowercase).as_deref() {
                Some("svg") => url.push_str(".png"),
                Some("tif") | Some("tiff") => url.push_str(".jpg"),
                _ => {}
            }
            url
        }
    }
}

/// Thumbnail width that puts the long side at [`THUMBNAIL_SIDE`].
fn thumbnail_width(width: u32, height: u32) -> u32 {
    if height == 0 || height > width {
        THUMBNAIL_SIDE
    } else {
        (u64::from(THUMBNAIL_SIDE) * u64::from(width) / u64::from(height)) as u32
    }
}

/// Visible text of an `extmetadata` HTML value, preferring the `lang` element.
fn extract_text(html: &str, lang: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let localized = Selector::parse(&format!(r#"[lang="{}"]"#, lang))
        .ok()
        .and_then(|selector| {
            fragment
                .select(&selector)
                .next()
                .map(|el| el.text().collect::<String>())
        });
    localized
        .unwrap_or_else(|| fragment.root_element().text().collect())
        .trim()
        .to_string()
}

/// Rights URI from a Commons license string like `CC BY-SA 4.0`.
fn license_rights(license: &str) -> Option<String> {
    let version = LICENSE_VERSION
        .captures(license)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());
    let code = LICENSE_VERSION.replace(license, "").trim().to_string();
    Rights::resolve(&code, version.as_deref())
        .or_else(|| Rights::resolve(&code.to_uppercase(), version.as_deref()))
        .map(|r| r.url())
}

fn commons_agent(language: &str) -> Agent {
    let mut logo = ResourceRef::image(LOGO);
    logo.width = Some(150);
    Agent::new(language, "Wikimedia Commons", MAIN_PAGE, Some(logo))
}

// ---------------------------------------------------------------------------
// Shared population
// ---------------------------------------------------------------------------

/// Fill `descriptor` from the Commons file `title`.
///
/// Returns the file's structured-data entity when it could be fetched, so
/// callers can read depicted or represented entities from it.
pub(crate) async fn populate_from_commons(
    ctx: &HandlerContext,
    descriptor: &mut ManifestDescriptor,
    title: &str,
) -> Result<Option<Value>> {
    let page = ctx
        .entities
        .commons_file(title)
        .await
        .ok_or_else(|| Error::not_found("commons file", title))?;
    let info = page
        .imageinfo
        .first()
        .ok_or_else(|| Error::not_found("commons imageinfo", title))?;
    let lang = ctx.language.as_str();

    if let Some(mime) = &info.mime {
        descriptor.set_format(mime);
    }
    descriptor.set_image_url(lang, &image_url_for_title(title, None));
    descriptor.set_source_url(lang, &format!("https://commons.wikimedia.org/wiki/File:{}", title));

    if matches!(descriptor.body_type(), Some("Image") | Some("Video")) {
        let (width, height) = (info.width.unwrap_or(0), info.height.unwrap_or(0));
        descriptor.set_width(width);
        descriptor.set_height(height);
        if descriptor.body_type() == Some("Image") && width > 0 {
            descriptor.set_thumbnail(image_url_for_title(title, Some(thumbnail_width(width, height))));
        }
    }
    if let Some(duration) = info.duration {
        descriptor.set_duration((duration * 10.0).round() / 10.0);
    }

    if let Some(name) = info.ext("ObjectName") {
        descriptor.set_label(lang, &extract_text(&name, lang));
    }
    if let Some(description) = info.ext("ImageDescription") {
        descriptor.set_summary(lang, &extract_text(&description, lang));
    }
    descriptor.set_provider(vec![commons_agent(lang)]);

    let license = info.ext("LicenseShortName").or_else(|| info.ext("License"));
    if let Some(rights) = license.as_deref().and_then(license_rights) {
        descriptor.set_rights(rights);
    }
    if descriptor.is_attribution_required() && !descriptor.has_attribution_statement() {
        if let Some(owner) = info.ext("Attribution").or_else(|| info.ext("Artist")) {
            let owner = owner.replace("<big>", "").replace("</big>", "");
            descriptor.set_required_statement(lang, "attribution", &owner);
        }
    }

    let entity = match page.pageid {
        Some(pageid) => ctx.entities.commons_entity(pageid).await,
        None => None,
    };
    debug!(title = %title, has_entity = entity.is_some(), "Commons file populated");
    Ok(entity)
}

// ---------------------------------------------------------------------------
// Handler
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct WikimediaCommonsHandler;

#[async_trait]
impl SourceHandler for WikimediaCommonsHandler {
    fn tag(&self) -> &'static str {
        TAG
    }

    async fn can_handle(&self, _ctx: &HandlerContext, url: &str) -> bool {
        url.starts_with("https://commons.wikimedia.org")
            || url.starts_with("https://commons.m.wikimedia.org")
            || url.starts_with(UPLOAD_BASE)
            || (url.contains("wikipedia.org/wiki/") && url.contains("/File:"))
    }

    fn sourceid_from_url(&self, url: &str) -> Option<String> {
        let id = if url.starts_with(UPLOAD_BASE) {
            let elems: Vec<&str> = url.split('/').collect();
            if elems.get(5) == Some(&"thumb") {
                elems.get(8).copied()
            } else {
                elems.last().copied()
            }
        } else {
            url.rsplit("File:").next().filter(|_| url.contains("File:"))
        };
        id.filter(|s| !s.is_empty()).map(unescape_sourceid)
    }

    async fn init_manifest(&self, ctx: &HandlerContext, build: &mut ManifestBuild) -> Result<()> {
        let entity = populate_from_commons(ctx, &mut build.descriptor, &build.sourceid).await?;
        if let Some(entity) = entity {
            let depicted = entities::depicts(&entity);
            ctx.add_metadata(&mut build.descriptor, DEPICTS, depicted).await;
        }
        Ok(())
    }
}
