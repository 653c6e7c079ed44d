//! Parlor relay server
//!
//! Main entry point: WebSocket chat listener plus health and metrics over HTTP.

mod startup;

use clap::Parser;
use parlor_shared::config::ConfigLoader;
use startup::run;
use std::path::PathBuf;

/// CLI arguments for parlor-server
#[derive(clap::Parser, Debug)]
#[command(name = "parlor-server")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Parlor presence and broadcast relay", long_about = None)]
struct Args {
    /// Load variables from this .env file before reading the environment
    #[arg(long, value_name = "PATH")]
    env_file: Option<PathBuf>,

    /// Enable debug mode
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse CLI arguments
    let args = Args::parse();

    // Build configuration
    let config = ConfigLoader::new(args.env_file).load_relay_config()?;

    // Initialize logging
    setup_logging(&config.logging.level, args.debug)?;

    // Run until a shutdown signal arrives
    run(config).await?;

    Ok(())
}

/// Setup logging. `RUST_LOG` wins over the configured level.
fn setup_logging(level: &str, debug: bool) -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    let level = if debug { "debug" } else { level };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
