use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub image_service: ImageServiceConfig,

    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Language used for labels, summaries and metadata
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            cache: CacheConfig::default(),
            image_service: ImageServiceConfig::default(),
            providers: ProvidersConfig::default(),
            language: default_language(),
        }
    }
}

fn default_language() -> String {
    "en".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Externally visible base URL. When unset it is derived from each
    /// request's scheme and host.
    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_url: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Fs,
    Memory,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: CacheBackend,

    /// Root directory of the filesystem store
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,

    /// Entries older than this are rebuilt
    #[serde(default = "default_max_age_days")]
    pub max_age_days: i64,
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(shellexpand::tilde("~/.cache/iiif-presenter/manifests").as_ref())
}

fn default_max_age_days() -> i64 {
    30
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            dir: default_cache_dir(),
            max_age_days: default_max_age_days(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImageServiceConfig {
    /// IIIF Image API base, e.g. `https://host/iiif/2`
    #[serde(default = "default_image_service_url")]
    pub service_url: String,

    /// Endpoint accepting conversion jobs as JSON. Jobs are dropped when unset.
    #[serde(default)]
    pub queue_url: Option<String>,

    /// Base URL where extracted poster frames are published
    #[serde(default = "default_poster_url")]
    pub poster_url: String,

    #[serde(default = "default_quality")]
    pub quality: u8,
}

fn default_image_service_url() -> String {
    "https://iiif-image.juncture-digital.org/iiif/2".to_string()
}

fn default_poster_url() -> String {
    "https://iiif-image.juncture-digital.org/posters".to_string()
}

fn default_quality() -> u8 {
    50
}

impl Default for ImageServiceConfig {
    fn default() -> Self {
        Self {
            service_url: default_image_service_url(),
            queue_url: None,
            poster_url: default_poster_url(),
            quality: default_quality(),
        }
    }
}

/// Provider endpoints and credentials.
///
/// Base URLs are configurable so deployments can route through proxies and
/// tests can point them at a local mock.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProvidersConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_github_api")]
    pub github_api: String,

    #[serde(default = "default_github_raw")]
    pub github_raw: String,

    #[serde(default)]
    pub github_token: Option<String>,

    #[serde(default = "default_flickr_api")]
    pub flickr_api: String,

    #[serde(default)]
    pub flickr_api_key: Option<String>,

    #[serde(default = "default_commons_api")]
    pub commons_api: String,

    #[serde(default = "default_wikidata_api")]
    pub wikidata_api: String,

    #[serde(default = "default_wikidata_sparql")]
    pub wikidata_sparql: String,

    #[serde(default = "default_jstor_api")]
    pub jstor_api: String,

    #[serde(default)]
    pub jstor_api_key: Option<String>,

    /// Base of JSTOR's IIIF image service
    #[serde(default = "default_jstor_iiif")]
    pub jstor_iiif: String,

    #[serde(default = "default_related_entities_url")]
    pub related_entities_url: String,

    #[serde(default = "default_met_api")]
    pub met_api: String,

    #[serde(default = "default_openverse_api")]
    pub openverse_api: String,

    #[serde(default)]
    pub openverse_client_id: Option<String>,

    #[serde(default)]
    pub openverse_client_secret: Option<String>,
}

fn default_user_agent() -> String {
    concat!("iiif-presenter/", env!("CARGO_PKG_VERSION")).to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_github_api() -> String {
    "https://api.github.com".to_string()
}
fn default_github_raw() -> String {
    "https://raw.githubusercontent.com".to_string()
}
fn default_flickr_api() -> String {
    "https://www.flickr.com/services/rest".to_string()
}
fn default_commons_api() -> String {
    "https://commons.wikimedia.org".to_string()
}
fn default_wikidata_api() -> String {
    "https://www.wikidata.org".to_string()
}
fn default_wikidata_sparql() -> String {
    "https://query.wikidata.org/sparql".to_string()
}
fn default_jstor_api() -> String {
    "https://www.jstor.org/api/labs-search-service".to_string()
}
fn default_jstor_iiif() -> String {
    "https://www.jstor.org/iiif".to_string()
}
fn default_related_entities_url() -> String {
    "https://www.jstor.org/api/labs-search-service/labs/about/".to_string()
}
fn default_met_api() -> String {
    "https://collectionapi.metmuseum.org/public/collection/v1".to_string()
}
fn default_openverse_api() -> String {
    "https://api.openverse.engineering/v1".to_string()
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            github_api: default_github_api(),
            github_raw: default_github_raw(),
            github_token: None,
            flickr_api: default_flickr_api(),
            flickr_api_key: None,
            commons_api: default_commons_api(),
            wikidata_api: default_wikidata_api(),
            wikidata_sparql: default_wikidata_sparql(),
            jstor_api: default_jstor_api(),
            jstor_api_key: None,
            jstor_iiif: default_jstor_iiif(),
            related_entities_url: default_related_entities_url(),
            met_api: default_met_api(),
            openverse_api: default_openverse_api(),
            openverse_client_id: None,
            openverse_client_secret: None,
        }
    }
}

impl ProvidersConfig {
    /// Fill unset credentials from the environment.
    pub fn apply_env(&mut self) {
        let from_env = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        if self.flickr_api_key.is_none() {
            self.flickr_api_key = from_env("FLICKR_API_KEY");
        }
        if self.jstor_api_key.is_none() {
            self.jstor_api_key = from_env("JSTOR_API_KEY");
        }
        if self.openverse_client_secret.is_none() {
            self.openverse_client_secret = from_env("OPENVERSE_CLIENT_SECRET");
        }
        if self.openverse_client_id.is_none() {
            self.openverse_client_id = from_env("OPENVERSE_CLIENT_ID");
        }
        if self.github_token.is_none() {
            self.github_token = from_env("GITHUB_TOKEN");
        }
    }
}
