//! Site-Harvest main entry point
//!
//! This is the command-line interface for the Site-Harvest crawler.

use anyhow::Context;
use clap::Parser;
use site_harvest::config::{load_optional_config, resolve_config, CliOverrides};
use site_harvest::output::print_summary;
use site_harvest::Coordinator;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Site-Harvest: a resumable same-site crawler
///
/// Site-Harvest walks every page reachable from a start URL within its
/// domain, saves page text, and downloads linked documents. Progress is
/// checkpointed so an interrupted crawl picks up where it stopped.
#[derive(Parser, Debug)]
#[command(name = "site-harvest")]
#[command(version)]
#[command(about = "A resumable same-site crawler", long_about = None)]
struct Cli {
    /// URL to start crawling from
    #[arg(value_name = "URL")]
    url: String,

    /// Directory for results, crawler state, and documents
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Maximum number of pages to scrape
    #[arg(long)]
    max_pages: Option<usize>,

    /// Seconds to wait after each page load
    #[arg(long)]
    wait_time: Option<f64>,

    /// Comma-separated document extensions to download
    #[arg(long)]
    doc_extensions: Option<String>,

    /// Maximum number of pages rendered at once
    #[arg(long)]
    max_concurrent: Option<usize>,

    /// Path to TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Start a fresh crawl, ignoring previous state
    #[arg(long)]
    fresh: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            output_dir: self.output_dir.clone(),
            max_pages: self.max_pages,
            wait_time: self.wait_time,
            doc_extensions: self.doc_extensions.clone(),
            max_concurrent: self.max_concurrent,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let file_config = load_optional_config(cli.config.as_deref());
    let config = resolve_config(&cli.url, &cli.overrides(), &file_config)
        .context("invalid crawl configuration")?;

    tracing::info!(
        "Crawling {} (max {} pages, {} at a time) into {}",
        config.start_url,
        config.max_pages,
        config.max_concurrent,
        config.output_dir.display()
    );

    let mut coordinator = Coordinator::from_config(config)
        .context("failed to set up crawler")?
        .with_fresh(cli.fresh);

    let interrupt = coordinator.interrupt_handle();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if interrupt.interrupt() {
                tracing::error!("Second interrupt, exiting without a final checkpoint");
                std::process::exit(130);
            }
            tracing::warn!("Interrupt received, finishing current batch (Ctrl-C again to exit now)");
        }
    });

    match coordinator.run().await {
        Ok(summary) => {
            if !cli.quiet {
                print_summary(&summary);
            }
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
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_harvest=info,warn"),
            1 => EnvFilter::new("site_harvest=debug,info"),
            2 => EnvFilter::new("site_harvest=trace,debug"),
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
