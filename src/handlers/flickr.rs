//! Flickr photos via the Flickr REST API.

use async_trait::async_trait;
use presenter_core::{rights_url, Agent, Error, ResourceRef, Result};
use serde::{Deserialize, Deserializer};
use tracing::debug;

use super::{HandlerContext, ManifestBuild, SourceHandler};
use crate::http::require_json;

pub const TAG: &str = "flickr";

const PHOTOS_PREFIX: &str = "https://www.flickr.com/photos";
const STATIC_PREFIX: &str = "https://live.staticflickr.com";
const LOGO: &str = "https://upload.wikimedia.org/wikipedia/commons/4/44/Flickr.svg";

// ---------------------------------------------------------------------------
// Flickr API response types (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct InfoResponse {
    photo: Option<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    owner: Owner,
    #[serde(default)]
    title: Content,
    #[serde(default)]
    description: Content,
    #[serde(default)]
    license: String,
    #[serde(default)]
    tags: Tags,
}

#[derive(Debug, Deserialize)]
struct Owner {
    nsid: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    realname: String,
}

#[derive(Debug, Default, Deserialize)]
struct Content {
    #[serde(rename = "_content", default)]
    content: String,
}

#[derive(Debug, Default, Deserialize)]
struct Tags {
    #[serde(default)]
    tag: Vec<Content>,
}

#[derive(Debug, Deserialize)]
struct SizesResponse {
    sizes: Sizes,
}

#[derive(Debug, Deserialize)]
struct Sizes {
    #[serde(default)]
    size: Vec<Size>,
}

#[derive(Debug, Deserialize)]
struct Size {
    #[serde(deserialize_with = "lenient_u32", default)]
    width: u32,
    #[serde(deserialize_with = "lenient_u32", default)]
    height: u32,
    source: String,
}

/// Flickr reports sizes as numbers or numeric strings.
fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u32, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrString {
        Num(u32),
        Str(String),
    }
    Ok(match NumOrString::deserialize(deserializer)? {
        NumOrString::Num(n) => n,
        NumOrString::Str(s) => s.parse().unwrap_or(0),
    })
}

/// Rights URI for a Flickr license id.
///
/// Ids 7 (no known copyright restrictions) and 8 (US Government work) have no
/// equivalent code and yield `None`.
fn license_rights(license: &str) -> Option<String> {
    let (code, version) = match license {
        "0" => ("InC", None),
        "1" => ("CC BY-NC-SA", Some("2.0")),
        "2" => ("CC BY-NC", Some("2.0")),
        "3" => ("CC BY-NC-ND", Some("2.0")),
        "4" => ("CC BY", Some("2.0")),
        "5" => ("CC BY-SA", Some("2.0")),
        "6" => ("CC BY-ND", Some("2.0")),
        "9" => ("CC0", None),
        "10" => ("PDM", None),
        _ => return None,
    };
    rights_url(code, version)
}

// ---------------------------------------------------------------------------
// Handler
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct FlickrHandler;

impl FlickrHandler {
    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        ctx: &HandlerContext,
        api_method: &str,
        photo_id: &str,
    ) -> Result<T> {
        let api_key = ctx
            .providers
            .flickr_api_key
            .as_deref()
            .ok_or_else(|| Error::provider(TAG, "no API key configured"))?;
        let url = format!("{}/", ctx.providers.flickr_api.trim_end_matches('/'));
        debug!(url = %url, method = api_method, photo_id, "Calling Flickr");
        let request = ctx.client.get(&url).query(&[
            ("method", api_method),
            ("api_key", api_key),
            ("photo_id", photo_id),
            ("format", "json"),
            ("nojsoncallback", "1"),
        ]);
        require_json(request, TAG).await
    }
}

#[async_trait]
impl SourceHandler for FlickrHandler {
    fn tag(&self) -> &'static str {
        TAG
    }

    async fn can_handle(&self, _ctx: &HandlerContext, url: &str) -> bool {
        url.starts_with(PHOTOS_PREFIX) || url.starts_with(STATIC_PREFIX)
    }

    /// Photo id: the first all-digit path element after the owner, or the
    /// leading part of a static file name (`{id}_{secret}_b.jpg`).
    fn sourceid_from_url(&self, url: &str) -> Option<String> {
        let elems: Vec<&str> = url.split('/').collect();
        if url.starts_with(PHOTOS_PREFIX) {
            elems
                .iter()
                .skip(4)
                .find(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_digit()))
                .map(|e| e.to_string())
        } else {
            elems
                .get(4)
                .and_then(|e| e.split('_').next())
                .filter(|e| !e.is_empty())
                .map(str::to_string)
        }
    }

    async fn init_manifest(&self, ctx: &HandlerContext, build: &mut ManifestBuild) -> Result<()> {
        let info: InfoResponse = self.call(ctx, "flickr.photos.getInfo", &build.sourceid).await?;
        let photo = info
            .photo
            .ok_or_else(|| Error::not_found("flickr photo", &build.sourceid))?;
        let sizes: SizesResponse = self.call(ctx, "flickr.photos.getSizes", &build.sourceid).await?;
        let largest = sizes.sizes.size.into_iter().max_by_key(|s| s.width);

        let lang = ctx.language.as_str();
        let descriptor = &mut build.descriptor;
        descriptor.set_format("image/jpeg");
        if let Some(size) = &largest {
            descriptor.set_image_url(lang, &size.source);
            descriptor.set_width(size.width);
            descriptor.set_height(size.height);
        }
        if !photo.title.content.is_empty() {
            descriptor.set_label(lang, &photo.title.content);
        }
        if !photo.description.content.is_empty() {
            descriptor.set_summary(lang, &photo.description.content);
        }
        descriptor.set_source_url(
            lang,
            &format!("https://www.flickr.com/photos/{}/{}", photo.owner.nsid, build.sourceid),
        );
        if let Some(rights) = license_rights(&photo.license) {
            descriptor.set_rights(rights);
        }

        let name = if photo.owner.realname.is_empty() {
            &photo.owner.username
        } else {
            &photo.owner.realname
        };
        let owner = format!(
            r#"<a href="https://www.flickr.com/photos/{}/">{}</a>"#,
            photo.owner.nsid, name
        );
        ctx.add_metadata(descriptor, "creator", vec![owner.clone()]).await;
        if descriptor.is_attribution_required() && !descriptor.has_attribution_statement() {
            descriptor.set_required_statement(lang, "attribution", &format!("Provided by {}", owner));
        }

        let mut logo = ResourceRef::image(LOGO);
        logo.width = Some(150);
        let mut agent = Agent::new(lang, "Flickr", "https://www.flickr.com/", Some(logo));
        agent.id = "https://www.flickr.com/about".to_string();
        descriptor.set_provider(vec![agent]);

        let tags: Vec<String> = photo.tags.tag.into_iter().map(|t| t.content).collect();
        ctx.add_metadata(descriptor, "tags", tags).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{build, context};
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn sourceid_from_page_and_static_urls() {
        let h = FlickrHandler;
        assert_eq!(
            h.sourceid_from_url("https://www.flickr.com/photos/someuser/51234567890/in/album-1/")
                .as_deref(),
            Some("51234567890")
        );
        assert_eq!(
            h.sourceid_from_url("https://live.staticflickr.com/65535/51234567890_abcdef_b.jpg")
                .as_deref(),
            Some("51234567890")
        );
    }

    #[test]
    fn license_map() {
        assert_eq!(
            license_rights("4").as_deref(),
            Some("http://creativecommons.org/licenses/by/2.0/")
        );
        assert_eq!(
            license_rights("0").as_deref(),
            Some("http://rightsstatements.org/vocab/InC/1.0/")
        );
        assert_eq!(license_rights("7"), None);
    }

    #[test]
    fn sizes_accept_string_widths() {
        let sizes: SizesResponse = serde_json::from_value(json!({
            "sizes": {"size": [
                {"label": "Large", "width": "1024", "height": 768, "source": "https://x/l.jpg"}
            ]}
        }))
        .unwrap();
        assert_eq!(sizes.sizes.size[0].width, 1024);
    }

    #[tokio::test]
    async fn init_populates_from_api() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flickr/"))
            .and(query_param("method", "flickr.photos.getInfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "photo": {
                    "owner": {"nsid": "123@N01", "username": "shutter", "realname": ""},
                    "title": {"_content": "Harbor at dusk"},
                    "description": {"_content": "Boats"},
                    "license": "4",
                    "tags": {"tag": [{"_content": "harbor"}, {"_content": "boats"}]}
                },
                "stat": "ok"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flickr/"))
            .and(query_param("method", "flickr.photos.getSizes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sizes": {"size": [
                    {"width": 100, "height": 75, "source": "https://live.staticflickr.com/s.jpg"},
                    {"width": 2048, "height": 1536, "source": "https://live.staticflickr.com/o.jpg"}
                ]}
            })))
            .mount(&server)
            .await;

        let ctx = context(&server.uri());
        let mut b = build(TAG, "51234567890");
        FlickrHandler.init_manifest(&ctx, &mut b).await.unwrap();

        let d = &b.descriptor;
        assert_eq!(d.image_url(), Some("https://live.staticflickr.com/o.jpg"));
        assert_eq!(d.width(), Some(2048));
        assert_eq!(d.body_type(), Some("Image"));
        assert_eq!(d.rights(), Some("http://creativecommons.org/licenses/by/2.0/"));
        assert!(d.metadata_value("creator").unwrap().contains(">shutter</a>"));
        let statement = d.required_statement().unwrap();
        assert!(statement.value.first().unwrap().starts_with("Provided by <a"));
        assert_eq!(d.find_metadata("tags").unwrap().value.values("en").len(), 2);
        assert_eq!(d.provider().unwrap()[0].id, "https://www.flickr.com/about");
    }

    #[tokio::test]
    async fn missing_key_is_provider_error() {
        let mut ctx = context("http://127.0.0.1:9");
        let mut providers = (*ctx.providers).clone();
        providers.flickr_api_key = None;
        ctx.providers = std::sync::Arc::new(providers);
        let mut b = build(TAG, "1");
        let err = FlickrHandler.init_manifest(&ctx, &mut b).await.unwrap_err();
        assert!(matches!(err, Error::ProviderUnavailable { .. }));
    }
}
