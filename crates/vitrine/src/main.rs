//! Vitrine CLI binary.
//!
//! This binary provides command-line access to an image store:
//! - Upload, fetch and delete images
//! - List records and show occupancy
//! - Clear the whole store

use clap::Parser;
#[cfg(feature = "pdf")]
use std::sync::Arc;
#[cfg(feature = "pdf")]
use vitrine::HayroRenderer;
use vitrine::{ImageStore, LoggingConfig, init_logging};

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{Cli, handle_command, load_config};

    // Parse command-line arguments
    let cli = Cli::parse();

    // Initialize tracing
    let mut logging = LoggingConfig::default().with_json_logs(cli.json_logs);
    if cli.verbose {
        logging = logging.with_log_level("debug");
    }
    init_logging(&logging)?;

    let config = load_config(cli.config.as_deref())?;
    #[cfg(feature = "pdf")]
    let store = ImageStore::with_renderer(config, Arc::new(HayroRenderer)).await?;
    #[cfg(not(feature = "pdf"))]
    let store = ImageStore::open(config).await?;

    let result = handle_command(&store, cli.command).await;
    store.shutdown().await;

    result?;
    Ok(())
}
