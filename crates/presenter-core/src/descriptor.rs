//! The manifest descriptor.
//!
//! A [`ManifestDescriptor`] is an IIIF Presentation 3 manifest restricted to
//! the shape this service produces: exactly one canvas, holding one annotation
//! page, holding one painting annotation. The single canvas and body are plain
//! struct fields so setters can keep them consistent without walking a tree.
//!
//! All internal ids carry the [`BASE_URL_PLACEHOLDER`]; [`ManifestDescriptor::render`]
//! substitutes the request's base URL on the way out.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ids::ManifestId;
use crate::language::{LanguageMap, MetadataEntry};
use crate::rights::is_attribution_required;

/// Placeholder for the externally visible base URL.
pub const BASE_URL_PLACEHOLDER: &str = "{BASE_URL}";

/// JSON-LD context for Presentation 3.
pub const PRESENTATION_CONTEXT: &str = "http://iiif.io/api/presentation/3/context.json";

/// Format of the `updated` metadata value.
pub const UPDATED_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Metadata label carrying the build timestamp.
pub const UPDATED_LABEL: &str = "updated";

// ---------------------------------------------------------------------------
// Resource types
// ---------------------------------------------------------------------------

/// A linked resource: thumbnails, homepages, logos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRef {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<LanguageMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl ResourceRef {
    /// An `Image` reference with no extra fields.
    pub fn image(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: "Image".to_string(),
            format: None,
            label: None,
            language: None,
            width: None,
            height: None,
        }
    }

    /// A `Text` reference (homepage) with a label.
    pub fn text(id: impl Into<String>, language: &str, label: &str) -> Self {
        Self {
            id: id.into(),
            kind: "Text".to_string(),
            format: Some("text/html".to_string()),
            label: Some(LanguageMap::single(language, label)),
            language: Some(vec![language.to_string()]),
            width: None,
            height: None,
        }
    }
}

/// A provider agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub label: LanguageMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<Vec<ResourceRef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<Vec<ResourceRef>>,
}

impl Agent {
    /// An agent with a homepage and an optional logo.
    pub fn new(language: &str, name: &str, homepage: &str, logo: Option<ResourceRef>) -> Self {
        Self {
            id: homepage.to_string(),
            kind: "Agent".to_string(),
            label: LanguageMap::single(language, name),
            homepage: Some(vec![ResourceRef::text(homepage, language, name)]),
            logo: logo.map(|l| vec![l]),
        }
    }
}

/// An IIIF Image API service reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageService {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub profile: String,
}

impl ImageService {
    pub fn level2(endpoint: impl Into<String>) -> Self {
        Self {
            id: endpoint.into(),
            kind: "ImageService2".to_string(),
            profile: "level2".to_string(),
        }
    }
}

/// The painting annotation body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Body {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<LanguageMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<Vec<ImageService>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Annotation {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    motivation: String,
    target: String,
    body: Body,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct AnnotationPage {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(with = "single")]
    items: Annotation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Canvas {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<LanguageMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    duration: Option<f64>,
    #[serde(with = "single")]
    items: AnnotationPage,
}

/// Serialize one value as a one-element array and require exactly one on read.
mod single {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<T: Serialize, S: Serializer>(item: &T, serializer: S) -> Result<S::Ok, S::Error> {
        std::slice::from_ref(item).serialize(serializer)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        let mut items = Vec::<T>::deserialize(deserializer)?;
        if items.len() != 1 {
            return Err(D::Error::invalid_length(items.len(), &"exactly one item"));
        }
        Ok(items.remove(0))
    }
}

// ---------------------------------------------------------------------------
// Descriptor
// ---------------------------------------------------------------------------

/// One manifest per (source, sourceid).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestDescriptor {
    #[serde(rename = "@context")]
    context: String,
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<LanguageMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    summary: Option<LanguageMap>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    metadata: Vec<MetadataEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rights: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    required_statement: Option<MetadataEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    provider: Option<Vec<Agent>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    thumbnail: Option<Vec<ResourceRef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    nav_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    homepage: Option<Vec<ResourceRef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    logo: Option<Vec<ResourceRef>>,
    #[serde(with = "single")]
    items: Canvas,
}

impl ManifestDescriptor {
    /// An empty descriptor with placeholder-based ids for `manifest_id`.
    pub fn skeleton(manifest_id: &ManifestId) -> Self {
        let prefix = format!("{}/{}", BASE_URL_PLACEHOLDER, manifest_id);
        let canvas_id = format!("{}/canvas/p1", prefix);
        Self {
            context: PRESENTATION_CONTEXT.to_string(),
            id: format!("{}/manifest.json", prefix),
            kind: "Manifest".to_string(),
            label: None,
            summary: None,
            metadata: Vec::new(),
            rights: None,
            required_statement: None,
            provider: None,
            thumbnail: None,
            nav_date: None,
            homepage: None,
            logo: None,
            items: Canvas {
                id: canvas_id.clone(),
                kind: "Canvas".to_string(),
                label: None,
                width: None,
                height: None,
                duration: None,
                items: AnnotationPage {
                    id: format!("{}/p1/1", prefix),
                    kind: "AnnotationPage".to_string(),
                    items: Annotation {
                        id: format!("{}/annotation/p0001-image", prefix),
                        kind: "Annotation".to_string(),
                        motivation: "painting".to_string(),
                        target: canvas_id,
                        body: Body::default(),
                    },
                },
            },
        }
    }

    /// Parse stored bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Serialize for storage, placeholders intact.
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Serialize with `{BASE_URL}` replaced by `baseurl`.
    ///
    /// The placeholder only ever occurs inside JSON strings, so `baseurl` is
    /// substituted in its JSON-escaped form.
    pub fn render(&self, baseurl: &str) -> Result<String> {
        let json = serde_json::to_string(self)?;
        let quoted = serde_json::to_string(baseurl.trim_end_matches('/'))?;
        let escaped = &quoted[1..quoted.len() - 1];
        Ok(json.replace(BASE_URL_PLACEHOLDER, escaped))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn body(&self) -> &Body {
        &self.items.items.items.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.items.items.items.body
    }

    // -- label / summary ----------------------------------------------------

    pub fn label(&self) -> Option<&LanguageMap> {
        self.label.as_ref()
    }

    /// Set the manifest label; image bodies and their canvas get it too.
    pub fn set_label(&mut self, language: &str, label: &str) {
        let map = LanguageMap::single(language, label);
        if self.format().is_some_and(|f| f.starts_with("image")) {
            self.items.label = Some(map.clone());
            self.body_mut().label = Some(map.clone());
        }
        self.label = Some(map);
    }

    pub fn summary(&self) -> Option<&LanguageMap> {
        self.summary.as_ref()
    }

    pub fn set_summary(&mut self, language: &str, summary: &str) {
        self.summary = Some(LanguageMap::single(language, summary));
    }

    // -- metadata -----------------------------------------------------------

    pub fn metadata(&self) -> &[MetadataEntry] {
        &self.metadata
    }

    pub fn find_metadata(&self, label: &str) -> Option<&MetadataEntry> {
        self.metadata.iter().find(|md| md.has_label(label))
    }

    /// First value of the metadata entry labelled `label`.
    pub fn metadata_value(&self, label: &str) -> Option<&str> {
        self.find_metadata(label).and_then(|md| md.value.first())
    }

    /// Replace the entry with the same label, or append.
    pub fn upsert_metadata(&mut self, entry: MetadataEntry) {
        let label = entry.label.first().unwrap_or_default().to_string();
        match self.metadata.iter_mut().find(|md| md.has_label(&label)) {
            Some(existing) => *existing = entry,
            None => self.metadata.push(entry),
        }
    }

    /// Union values into the entry with the same label, or append.
    pub fn merge_metadata(&mut self, entry: MetadataEntry) {
        let label = entry.label.first().unwrap_or_default().to_string();
        match self.metadata.iter_mut().find(|md| md.has_label(&label)) {
            Some(existing) => existing.value.merge_union(&entry.value),
            None => self.metadata.push(entry),
        }
    }

    // -- rights / attribution ----------------------------------------------

    pub fn rights(&self) -> Option<&str> {
        self.rights.as_deref()
    }

    pub fn set_rights(&mut self, rights: impl Into<String>) {
        self.rights = Some(rights.into());
    }

    pub fn required_statement(&self) -> Option<&MetadataEntry> {
        self.required_statement.as_ref()
    }

    pub fn set_required_statement(&mut self, language: &str, label: &str, value: &str) {
        self.required_statement = Some(MetadataEntry::new(language, label, vec![value.to_string()]));
    }

    /// True when the rights URI is a CC license requiring attribution.
    pub fn is_attribution_required(&self) -> bool {
        is_attribution_required(self.rights())
    }

    /// True when a requiredStatement labelled `attribution` exists.
    pub fn has_attribution_statement(&self) -> bool {
        self.required_statement
            .as_ref()
            .is_some_and(|rs| rs.label.any_value_contains("attribution"))
    }

    // -- provider / links ---------------------------------------------------

    pub fn provider(&self) -> Option<&[Agent]> {
        self.provider.as_deref()
    }

    /// Set the provider list; an empty list clears it.
    pub fn set_provider(&mut self, agents: Vec<Agent>) {
        self.provider = if agents.is_empty() { None } else { Some(agents) };
    }

    pub fn thumbnail(&self) -> Option<&[ResourceRef]> {
        self.thumbnail.as_deref()
    }

    pub fn set_thumbnail(&mut self, url: impl Into<String>) {
        self.thumbnail = Some(vec![ResourceRef::image(url)]);
    }

    pub fn set_thumbnail_refs(&mut self, refs: Vec<ResourceRef>) {
        self.thumbnail = Some(refs);
    }

    pub fn nav_date(&self) -> Option<&str> {
        self.nav_date.as_deref()
    }

    pub fn set_nav_date(&mut self, nav_date: impl Into<String>) {
        self.nav_date = Some(nav_date.into());
    }

    pub fn homepage(&self) -> Option<&[ResourceRef]> {
        self.homepage.as_deref()
    }

    pub fn set_homepage(&mut self, homepage: Vec<ResourceRef>) {
        self.homepage = Some(homepage);
    }

    pub fn set_logo(&mut self, logo: Vec<ResourceRef>) {
        self.logo = Some(logo);
    }

    // -- body ---------------------------------------------------------------

    pub fn image_url(&self) -> Option<&str> {
        self.body().id.as_deref()
    }

    /// Set the body id and record it as `image_url` metadata.
    pub fn set_image_url(&mut self, language: &str, url: &str) {
        self.body_mut().id = Some(url.to_string());
        self.upsert_metadata(MetadataEntry::new(language, "image_url", vec![url.to_string()]));
    }

    /// Record the provider page as `source_url` metadata.
    pub fn set_source_url(&mut self, language: &str, url: &str) {
        self.upsert_metadata(MetadataEntry::new(language, "source_url", vec![url.to_string()]));
    }

    pub fn format(&self) -> Option<&str> {
        self.body().format.as_deref()
    }

    /// Set the body format and derive its type. Empty formats are ignored.
    pub fn set_format(&mut self, format: &str) {
        if format.is_empty() {
            return;
        }
        let kind = body_type_for(format);
        let body = self.body_mut();
        body.format = Some(format.to_string());
        body.kind = Some(kind);
    }

    pub fn body_type(&self) -> Option<&str> {
        self.body().kind.as_deref()
    }

    pub fn width(&self) -> Option<u32> {
        self.body().width
    }

    pub fn height(&self) -> Option<u32> {
        self.body().height
    }

    pub fn duration(&self) -> Option<f64> {
        self.body().duration
    }

    /// Set width on body and canvas. Zero is ignored.
    pub fn set_width(&mut self, width: u32) {
        if width > 0 {
            self.body_mut().width = Some(width);
            self.items.width = Some(width);
        }
    }

    /// Set height on body and canvas. Zero is ignored.
    pub fn set_height(&mut self, height: u32) {
        if height > 0 {
            self.body_mut().height = Some(height);
            self.items.height = Some(height);
        }
    }

    /// Set duration on body and canvas. Non-positive values are ignored.
    pub fn set_duration(&mut self, duration: f64) {
        if duration > 0.0 {
            self.body_mut().duration = Some(duration);
            self.items.duration = Some(duration);
        }
    }

    pub fn service(&self) -> Option<&ImageService> {
        self.body().service.as_ref().and_then(|s| s.first())
    }

    /// Bind the body to a level-2 image service at `endpoint`.
    pub fn set_service(&mut self, endpoint: &str) {
        self.body_mut().service = Some(vec![ImageService::level2(endpoint)]);
    }

    // -- staleness ------------------------------------------------------------

    /// Record `now` as the `updated` metadata value.
    pub fn stamp_updated(&mut self, language: &str, now: DateTime<Utc>) {
        let stamp = now.format(UPDATED_FORMAT).to_string();
        self.upsert_metadata(MetadataEntry::new(language, UPDATED_LABEL, vec![stamp]));
    }

    /// The `updated` timestamp, if present and parseable.
    pub fn updated(&self) -> Option<DateTime<Utc>> {
        let raw = self.metadata_value(UPDATED_LABEL)?;
        NaiveDateTime::parse_from_str(raw, UPDATED_FORMAT)
            .ok()
            .map(|naive| naive.and_utc())
    }
}

/// Derive the body `type` from a MIME type.
fn body_type_for(format: &str) -> String {
    if format == "application/ogg" {
        return "Sound".to_string();
    }
    match format.split('/').next().unwrap_or_default() {
        "image" => "Image".to_string(),
        "video" => "Video".to_string(),
        "audio" => "Sound".to_string(),
        other => {
            let mut chars = other.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn descriptor() -> ManifestDescriptor {
        ManifestDescriptor::skeleton(&ManifestId::new("gh", "acct/repo/img.jpg"))
    }

    #[test]
    fn skeleton_ids_use_placeholder() {
        let m = descriptor();
        assert_eq!(m.id(), "{BASE_URL}/gh:acct/repo/img.jpg/manifest.json");
        let json: serde_json::Value = serde_json::from_slice(&m.to_vec().unwrap()).unwrap();
        assert_eq!(json["type"], "Manifest");
        assert_eq!(json["@context"], PRESENTATION_CONTEXT);
        let canvas = &json["items"][0];
        assert_eq!(canvas["id"], "{BASE_URL}/gh:acct/repo/img.jpg/canvas/p1");
        let annotation = &canvas["items"][0]["items"][0];
        assert_eq!(annotation["motivation"], "painting");
        assert_eq!(annotation["target"], canvas["id"]);
        assert_eq!(annotation["id"], "{BASE_URL}/gh:acct/repo/img.jpg/annotation/p0001-image");
    }

    #[test]
    fn format_derives_type() {
        let mut m = descriptor();
        m.set_format("image/jpeg");
        assert_eq!(m.body_type(), Some("Image"));
        m.set_format("video/mp4");
        assert_eq!(m.body_type(), Some("Video"));
        m.set_format("audio/mpeg");
        assert_eq!(m.body_type(), Some("Sound"));
        m.set_format("application/ogg");
        assert_eq!(m.body_type(), Some("Sound"));
        m.set_format("text/html");
        assert_eq!(m.body_type(), Some("Text"));
    }

    #[test]
    fn empty_format_is_ignored() {
        let mut m = descriptor();
        m.set_format("image/png");
        m.set_format("");
        assert_eq!(m.format(), Some("image/png"));
    }

    #[test]
    fn dimensions_propagate_to_canvas() {
        let mut m = descriptor();
        m.set_width(640);
        m.set_height(480);
        m.set_duration(12.5);
        m.set_width(0);
        let json: serde_json::Value = serde_json::from_str(&m.render("http://h").unwrap()).unwrap();
        let canvas = &json["items"][0];
        assert_eq!(canvas["width"], 640);
        assert_eq!(canvas["height"], 480);
        assert_eq!(canvas["duration"], 12.5);
        assert_eq!(canvas["items"][0]["items"][0]["body"]["width"], 640);
    }

    #[test]
    fn label_reaches_canvas_for_images_only() {
        let mut m = descriptor();
        m.set_label("en", "before format");
        assert!(m.items.label.is_none());
        m.set_format("image/jpeg");
        m.set_label("en", "after format");
        assert_eq!(m.items.label.as_ref().and_then(|l| l.first()), Some("after format"));
        assert_eq!(m.body().label.as_ref().and_then(|l| l.first()), Some("after format"));
    }

    #[test]
    fn upsert_replaces_same_label() {
        let mut m = descriptor();
        m.upsert_metadata(MetadataEntry::new("en", "creator", vec!["a".into()]));
        m.upsert_metadata(MetadataEntry::new("en", "tags", vec!["t".into()]));
        m.upsert_metadata(MetadataEntry::new("en", "creator", vec!["b".into()]));
        assert_eq!(m.metadata().len(), 2);
        assert_eq!(m.metadata_value("creator"), Some("b"));
        assert!(m.metadata()[0].has_label("creator"));
    }

    #[test]
    fn merge_unions_same_label() {
        let mut m = descriptor();
        m.merge_metadata(MetadataEntry::new("en", "depicts", vec!["a".into(), "b".into()]));
        m.merge_metadata(MetadataEntry::new("en", "depicts", vec!["b".into(), "c".into()]));
        assert_eq!(m.metadata().len(), 1);
        assert_eq!(m.metadata()[0].value.values("en"), ["a", "b", "c"]);
    }

    #[test]
    fn image_url_recorded_as_metadata() {
        let mut m = descriptor();
        m.set_image_url("en", "https://x.org/a.jpg");
        assert_eq!(m.image_url(), Some("https://x.org/a.jpg"));
        assert_eq!(m.metadata_value("image_url"), Some("https://x.org/a.jpg"));
    }

    #[test]
    fn render_substitutes_base_url() {
        let m = descriptor();
        let rendered = m.render("https://iiif.example/").unwrap();
        assert!(!rendered.contains(BASE_URL_PLACEHOLDER));
        assert!(rendered.contains("https://iiif.example/gh:acct/repo/img.jpg/manifest.json"));
    }

    #[test]
    fn render_escapes_quotes_in_base_url() {
        let m = descriptor();
        let rendered = m.render(r#"http://evil","rights":"x"#).unwrap();
        let json: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert!(json.get("rights").is_none());
        assert_eq!(
            json["id"],
            r#"http://evil","rights":"x/gh:acct/repo/img.jpg/manifest.json"#
        );

        let rendered = m.render(r#"http://a"b"#).unwrap();
        assert!(serde_json::from_str::<serde_json::Value>(&rendered).is_ok());
    }

    #[test]
    fn stored_bytes_round_trip() {
        let mut m = descriptor();
        m.set_format("image/jpeg");
        m.set_service("https://img.example/iiif/2/abc");
        m.set_rights("http://creativecommons.org/licenses/by/4.0/");
        let back = ManifestDescriptor::from_slice(&m.to_vec().unwrap()).unwrap();
        assert_eq!(back, m);
        assert_eq!(back.service().map(|s| s.profile.as_str()), Some("level2"));
    }

    #[test]
    fn rejects_multiple_canvases() {
        let m = descriptor();
        let mut json: serde_json::Value = serde_json::from_slice(&m.to_vec().unwrap()).unwrap();
        let canvas = json["items"][0].clone();
        json["items"].as_array_mut().unwrap().push(canvas);
        let bytes = serde_json::to_vec(&json).unwrap();
        assert!(ManifestDescriptor::from_slice(&bytes).is_err());
    }

    #[test]
    fn updated_stamp_round_trip() {
        let mut m = descriptor();
        assert!(m.updated().is_none());
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap();
        m.stamp_updated("en", now);
        assert_eq!(m.metadata_value("updated"), Some("2024-03-01T12:30:05Z"));
        assert_eq!(m.updated(), Some(now));
    }

    #[test]
    fn unparseable_updated_is_none() {
        let mut m = descriptor();
        m.upsert_metadata(MetadataEntry::new("en", "updated", vec!["last tuesday".into()]));
        assert!(m.updated().is_none());
    }

    #[test]
    fn attribution_checks() {
        let mut m = descriptor();
        m.set_rights("http://creativecommons.org/licenses/by-sa/4.0/");
        assert!(m.is_attribution_required());
        assert!(!m.has_attribution_statement());
        m.set_required_statement("en", "Attribution", "Photo by someone");
        assert!(m.has_attribution_statement());
    }

    #[test]
    fn empty_provider_clears() {
        let mut m = descriptor();
        m.set_provider(vec![Agent::new("en", "Flickr", "https://www.flickr.com", None)]);
        assert_eq!(m.provider().map(<[Agent]>::len), Some(1));
        m.set_provider(Vec::new());
        assert!(m.provider().is_none());
    }

    #[test]
    fn serialized_field_names_are_camel_case() {
        let mut m = descriptor();
        m.set_required_statement("en", "attribution", "x");
        m.set_nav_date("1900-01-01T00:00:00Z");
        let json: serde_json::Value = serde_json::from_slice(&m.to_vec().unwrap()).unwrap();
        assert!(json.get("requiredStatement").is_some());
        assert!(json.get("navDate").is_some());
        assert!(json.get("metadata").is_none());
    }
}
