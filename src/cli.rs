use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "iiif-presenter")]
#[command(author, version, about = "IIIF Presentation 3 manifests for images hosted anywhere")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the manifest server
    Start {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Build or fetch one manifest and print it
    Manifest {
        /// Manifest id, e.g. `wd:Q12418` or an image URL
        #[arg(required = true)]
        id: String,

        /// Rebuild even when a fresh copy is cached
        #[arg(long)]
        refresh: bool,

        /// Base URL substituted into manifest ids
        #[arg(long, default_value = "http://localhost:8080")]
        base_url: String,
    },

    /// Print the manifest URL for a provider URL
    Resolve {
        #[arg(required = true)]
        url: String,

        /// Base URL for locally served manifests
        #[arg(long, default_value = "http://localhost:8080")]
        base_url: String,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
