//! CLI command handlers
//!
//! Each subcommand has its own module with handler functions.

pub mod config;
pub mod list;
pub mod serve;
pub mod sweep;
pub mod track;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Shipment tracking with simulated road progression
#[derive(Parser)]
#[command(name = "cargowatch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start web server (foreground)
    Serve(serve::ServeArgs),

    /// Show one shipment with a freshly computed position
    Track(track::TrackArgs),

    /// Run the progression sweep without the web server
    Sweep(sweep::SweepArgs),

    /// List stored shipments
    List(list::ListArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

/// Install the tracing subscriber
///
/// Logs go to stderr so command output on stdout stays machine-readable.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Run the CLI
pub async fn run() -> crate::error::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => serve::run(args).await,
        Commands::Track(args) => track::run(args).await,
        Commands::Sweep(args) => sweep::run(args).await,
        Commands::List(args) => list::run(args).await,
        Commands::Config(args) => config::run(args),
    }
}
