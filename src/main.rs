mod cli;

use iiif_presenter::{
    config,
    engine::{ManifestEngine, ManifestRequest},
    http::build_client,
    queue::ConversionQueue,
    server,
};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;

async fn start_server(host: Option<String>, port: Option<u16>, config_path: Option<&Path>) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting iiif-presenter");
    for warning in config::validate(&config) {
        tracing::warn!("{}", warning);
    }

    server::start_server(config).await
}

async fn print_manifest(id: &str, refresh: bool, base_url: &str, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let client = build_client(&config.providers)?;
    let queue = ConversionQueue::new(client, config.image_service.queue_url.clone());
    let engine = ManifestEngine::from_config(&config, queue)?;

    let request = ManifestRequest {
        id: id.to_string(),
        base_url: base_url.to_string(),
        refresh,
    };
    let rendered = engine
        .get_manifest(&request)
        .await
        .with_context(|| format!("Failed to build manifest {}", id))?;
    println!("{}", String::from_utf8_lossy(&rendered.body));
    Ok(())
}

async fn resolve_url(url: &str, base_url: &str, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let (queue, _jobs) = ConversionQueue::channel();
    let engine = ManifestEngine::from_config(&config, queue)?;
    println!("{}", engine.resolve_url(url, base_url).await);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "iiif_presenter=trace,presenter_core=debug,tower_http=debug".to_string()
        } else {
            "iiif_presenter=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Manifest { id, refresh, base_url } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(print_manifest(&id, refresh, &base_url, cli.config.as_deref()))
        }
        Commands::Resolve { url, base_url } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(resolve_url(&url, &base_url, cli.config.as_deref()))
        }
        Commands::Validate { config: config_path } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("iiif-presenter {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            config::load_config(p)?
        }
        None => {
            println!("No config file specified, using defaults");
            config::Config::default()
        }
    };

    println!("✓ Configuration is valid");
    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Cache: {:?} at {:?}", config.cache.backend, config.cache.dir);
    println!("  Max age: {} days", config.cache.max_age_days);
    println!("  Image service: {}", config.image_service.service_url);
    println!("  Language: {}", config.language);

    let warnings = config::validate(&config);
    if !warnings.is_empty() {
        println!("Warnings:");
        for warning in warnings {
            println!("  - {}", warning);
        }
    }
    Ok(())
}
