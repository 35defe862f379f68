//! CLI command handlers
//!
//! Each subcommand has its own module with handler functions.

pub mod analyze;
pub mod config;
pub mod serve;
pub mod transform;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Spatial analysis for care facility maps
#[derive(Parser)]
#[command(name = "care-atlas")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a spatial analysis over a point file
    Analyze(analyze::AnalyzeArgs),

    /// Convert a GeoJSON FeatureCollection between coordinate systems
    Transform(transform::TransformArgs),

    /// Manage configuration
    Config(config::ConfigArgs),

    /// Start web server (foreground)
    Serve(serve::ServeArgs),
}

/// Install the global subscriber; `RUST_LOG` overrides `default_level`
fn init_tracing(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .init();
}

/// Run the CLI
pub async fn run() -> crate::error::Result<()> {
    let cli = Cli::parse();

    let level = if matches!(cli.command, Commands::Serve(_)) { "info" } else { "warn" };
    init_tracing(level);

    match cli.command {
        Commands::Analyze(args) => analyze::run(args),
        Commands::Transform(args) => transform::run(args),
        Commands::Config(args) => config::run(args),
        Commands::Serve(args) => serve::run(args).await,
    }
}
