mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    check_config(&config)?;
    config.providers.apply_env();

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./config.toml",
        "./iiif-presenter.toml",
        "~/.config/iiif-presenter/config.toml",
        "/etc/iiif-presenter/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    let mut config = Config::default();
    config.providers.apply_env();
    Ok(config)
}

/// Hard errors that make the config unusable
fn check_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }
    if config.cache.max_age_days <= 0 {
        anyhow::bail!("cache.max_age_days must be positive");
    }
    if config.image_service.quality == 0 || config.image_service.quality > 100 {
        anyhow::bail!("image_service.quality must be between 1 and 100");
    }
    url::Url::parse(&config.image_service.service_url)
        .with_context(|| format!("Invalid image_service.service_url: {}", config.image_service.service_url))?;
    Ok(())
}

/// Soft problems worth reporting, e.g. providers that will degrade
pub fn validate(config: &Config) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.providers.flickr_api_key.is_none() {
        warnings.push("No Flickr API key configured; flickr manifests will be empty".to_string());
    }
    if config.providers.jstor_api_key.is_none() {
        warnings.push("No JSTOR API key configured; jstor manifests will be empty".to_string());
    }
    if config.providers.openverse_client_id.is_none()
        || config.providers.openverse_client_secret.is_none()
    {
        warnings.push("Openverse credentials incomplete; requests will be anonymous".to_string());
    }
    if config.image_service.queue_url.is_none() {
        warnings.push("No image_service.queue_url; conversion jobs will be dropped".to_string());
    }
    if let Some(base) = &config.server.base_url {
        if url::Url::parse(base).is_err() {
            warnings.push(format!("server.base_url is not a valid URL: {}", base));
        }
    }
    if config.cache.backend == CacheBackend::Fs && !config.cache.dir.exists() {
        warnings.push(format!(
            "Cache directory {:?} does not exist and will be created",
            config.cache.dir
        ));
    }

    warnings
}
