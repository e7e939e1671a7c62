//! Image-Ripper main entry point
//!
//! This is the command-line interface for the Image-Ripper image crawler.

use clap::Parser;
use image_ripper::config::load_config_with_hash;
use image_ripper::crawler::crawl;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Image-Ripper: a site-scoped image crawler
///
/// Image-Ripper crawls the pages of a single host, picks image references
/// out of them with configurable selector rules, and downloads the images
/// into a local folder tree.
#[derive(Parser, Debug)]
#[command(name = "image-ripper")]
#[command(version = "1.0.0")]
#[command(about = "A site-scoped image crawler", long_about = None)]
struct Cli {
    /// Path to the JSON or TOML configuration file
    #[arg(value_name = "CONFIG", default_value = "conf/config.json")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    tracing::info!(
        "Image rules: {}, link rules: {}, page patterns: {}, image page patterns: {}",
        config.image_rules.len(),
        config.link_rules.len(),
        config.page_patterns.len(),
        config.image_page_patterns.len()
    );

    match crawl(config).await {
        Ok(summary) => {
            tracing::info!(
                "Saved {} of {} images from {} pages",
                summary.images_saved,
                summary.images.total(),
                summary.pages.done
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("image_ripper=info,warn"),
            1 => EnvFilter::new("image_ripper=debug,info"),
            2 => EnvFilter::new("image_ripper=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
