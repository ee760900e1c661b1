//! Openverse (formerly CC Search) image records.

use async_trait::async_trait;
use chrono::Duration;
use presenter_core::{rights_url, Agent, Error, ResourceRef, Result};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{last_element, HandlerContext, ManifestBuild, SourceHandler};
use crate::http::{fetch_json, require_json};
use crate::memo::{MemoCache, DEFAULT_TTL_SECS};

pub const TAG: &str = "cc";

const HOMEPAGE: &str = "https://wordpress.org/openverse/";
const LOGO: &str = "https://i0.wp.com/wordpressfoundation.org/content/uploads/2022/02/openverse.jpeg";

const URL_PREFIXES: &[&str] = &[
    "https://search.creativecommons.org/",
    "https://openverse.org/image",
    "https://search.openverse.engineering/",
    "https://wordpress.org/openverse/",
    "https://search-production.openverse.engineering/image",
];

// ---------------------------------------------------------------------------
// Openverse API response types (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct ImageRecord {
    url: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    license: Option<String>,
    #[serde(default)]
    license_version: Option<String>,
    #[serde(default)]
    attribution: Option<String>,
    #[serde(default)]
    creator: Option<String>,
    #[serde(default)]
    creator_url: Option<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    foreign_landing_url: Option<String>,
    #[serde(default)]
    tags: Option<Vec<ImageTag>>,
}

#[derive(Debug, Deserialize)]
struct ImageTag {
    name: String,
}

/// Rights code for an Openverse license slug (`by-sa`, `cc0`, `pdm`).
fn license_code(license: &str) -> String {
    let upper = license.to_uppercase();
    match upper.as_str() {
        "PDM" | "CC0" => upper,
        _ => format!("CC {}", upper),
    }
}

/// MIME type from the image URL's extension.
fn format_from_url(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let file = path.rsplit('/').next().unwrap_or_default();
    let (_, ext) = file.rsplit_once('.')?;
    let ext = ext.to_lowercase();
    Some(format!("image/{}", if ext == "jpg" { "jpeg" } else { ext.as_str() }))
}

fn link(href: Option<&str>, text: &str) -> String {
    match href {
        Some(href) => format!(r#"<a href="{}">{}</a>"#, href, text),
        None => text.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Handler
// ---------------------------------------------------------------------------

pub struct OpenverseHandler {
    tokens: MemoCache<String, String>,
}

impl Default for OpenverseHandler {
    fn default() -> Self {
        Self {
            tokens: MemoCache::new(1, Duration::seconds(DEFAULT_TTL_SECS)),
        }
    }
}

impl OpenverseHandler {
    /// Client-credentials token, memoized per client id.
    async fn access_token(&self, ctx: &HandlerContext) -> Option<String> {
        let providers = &ctx.providers;
        let client_id = providers.openverse_client_id.as_deref()?;
        let client_secret = providers.openverse_client_secret.as_deref()?;
        if let Some(token) = self.tokens.get(&client_id.to_string()) {
            return Some(token);
        }

        let url = format!("{}/auth_tokens/token/", providers.openverse_api.trim_end_matches('/'));
        debug!(url = %url, "Requesting Openverse token");
        let request = ctx.client.post(&url).form(&[
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("grant_type", "client_credentials"),
        ]);
        match require_json::<TokenResponse>(request, TAG).await {
            Ok(token) => {
                self.tokens.insert(client_id.to_string(), token.access_token.clone());
                Some(token.access_token)
            }
            Err(e) => {
                warn!(error = %e, "Openverse token request failed, continuing anonymously");
                None
            }
        }
    }
}

#[async_trait]
impl SourceHandler for OpenverseHandler {
    fn tag(&self) -> &'static str {
        TAG
    }

    async fn can_handle(&self, _ctx: &HandlerContext, url: &str) -> bool {
        URL_PREFIXES.iter().any(|prefix| url.starts_with(prefix))
    }

    fn sourceid_from_url(&self, url: &str) -> Option<String> {
        last_element(url)
    }

    async fn init_manifest(&self, ctx: &HandlerContext, build: &mut ManifestBuild) -> Result<()> {
        let url = format!(
            "{}/images/{}/",
            ctx.providers.openverse_api.trim_end_matches('/'),
            build.sourceid
        );
        let mut request = ctx.client.get(&url);
        if let Some(token) = self.access_token(ctx).await {
            request = request.bearer_auth(token);
        }
        debug!(url = %url, "Fetching Openverse image");
        let record: ImageRecord = fetch_json(request, TAG)
            .await?
            .ok_or_else(|| Error::not_found("openverse image", &build.sourceid))?;

        let lang = ctx.language.as_str();
        let descriptor = &mut build.descriptor;
        if let Some(format) = format_from_url(&record.url) {
            descriptor.set_format(&format);
        }
        descriptor.set_image_url(lang, &record.url);
        if let Some(title) = &record.title {
            descriptor.set_label(lang, title);
        }
        descriptor.set_width(record.width.unwrap_or(0));
        descriptor.set_height(record.height.unwrap_or(0));

        if let Some(license) = &record.license {
            let version = record.license_version.as_deref();
            if let Some(rights) = rights_url(&license_code(license), version) {
                descriptor.set_rights(rights);
            }
            if descriptor.is_attribution_required() {
                if let Some(attribution) = &record.attribution {
                    descriptor.set_required_statement(lang, "attribution", attribution);
                }
            }
        }
        if let Some(creator) = &record.creator {
            let value = link(record.creator_url.as_deref(), creator);
            ctx.add_metadata(descriptor, "creator", vec![value]).await;
        }
        if let Some(source) = &record.source {
            let value = link(record.foreign_landing_url.as_deref(), source);
            ctx.add_metadata(descriptor, "source_url", vec![value]).await;
        }
        let tags: Vec<String> = record.tags.into_iter().flatten().map(|t| t.name).collect();
        ctx.add_metadata(descriptor, "tags", tags).await;

        let mut logo = ResourceRef::image(LOGO);
        logo.width = Some(150);
        descriptor.set_provider(vec![Agent::new(lang, "openverse", HOMEPAGE, Some(logo))]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{build, context};
    use serde_json::json;
    use std::sync::Arc;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn license_codes() {
        assert_eq!(license_code("by-sa"), "CC BY-SA");
        assert_eq!(license_code("cc0"), "CC0");
        assert_eq!(license_code("pdm"), "PDM");
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(format_from_url("https://x/a.JPG?w=1").as_deref(), Some("image/jpeg"));
        assert_eq!(format_from_url("https://x/a.png").as_deref(), Some("image/png"));
        assert_eq!(format_from_url("https://x/noext"), None);
    }

    #[test]
    fn sourceid_strips_query() {
        assert_eq!(
            OpenverseHandler::default()
                .sourceid_from_url("https://openverse.org/image/8e3a0d7c-51aa?q=cat")
                .as_deref(),
            Some("8e3a0d7c-51aa")
        );
    }

    #[tokio::test]
    async fn token_is_memoized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/openverse/auth_tokens/token/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"access_token": "tok-1"})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/openverse/images/abc/"))
            .and(header("authorization", "Bearer tok-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "url": "https://live.staticflickr.com/1/cat.jpg",
                "title": "Cat",
                "width": 640,
                "height": 480,
                "license": "by",
                "license_version": "2.0",
                "attribution": "\"Cat\" by Jo is licensed under CC BY 2.0.",
                "creator": "Jo",
                "creator_url": "https://www.flickr.com/photos/jo",
                "source": "flickr",
                "foreign_landing_url": "https://www.flickr.com/photos/jo/1",
                "tags": [{"name": "cat"}, {"name": "pet"}]
            })))
            .mount(&server)
            .await;

        let mut ctx = context(&server.uri());
        let mut providers = (*ctx.providers).clone();
        providers.openverse_client_id = Some("client".into());
        providers.openverse_client_secret = Some("secret".into());
        ctx.providers = Arc::new(providers);

        let handler = OpenverseHandler::default();
        for _ in 0..2 {
            let mut b = build(TAG, "abc");
            handler.init_manifest(&ctx, &mut b).await.unwrap();
            let d = &b.descriptor;
            assert_eq!(d.format(), Some("image/jpeg"));
            assert_eq!(d.rights(), Some("http://creativecommons.org/licenses/by/2.0/"));
            assert!(d.required_statement().is_some());
            assert_eq!(
                d.metadata_value("creator"),
                Some(r#"<a href="https://www.flickr.com/photos/jo">Jo</a>"#)
            );
        }
    }
}
