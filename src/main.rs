//! Listing-Harvest main entry point
//!
//! This is the command-line interface for the Listing-Harvest pipeline.

use clap::Parser;
use listing_harvest::config::{load_config_with_hash, validate, Config};
use listing_harvest::crawler::harvest;
use listing_harvest::output::print_report;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Listing-Harvest: a paginated listing harvester
///
/// Walks a site's paginated listing index, fetches every listing's detail
/// page, and writes all of them to one CSV file with a unified header.
#[derive(Parser, Debug)]
#[command(name = "listing-harvest")]
#[command(version = "0.1.0")]
#[command(about = "A paginated listing harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Override the maximum number of index pages to walk
    #[arg(long, value_name = "N")]
    max_pages: Option<u32>,

    /// Override the output CSV path
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Validate config and show what would be harvested without fetching anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let mut config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    apply_overrides(&mut config, &cli)?;

    if cli.dry_run {
        handle_dry_run(&config);
    } else {
        handle_harvest(config, cli.quiet).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("listing_harvest=info,warn"),
            1 => EnvFilter::new("listing_harvest=debug,info"),
            2 => EnvFilter::new("listing_harvest=trace,debug"),
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

/// Applies command-line overrides and re-validates
fn apply_overrides(config: &mut Config, cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(max_pages) = cli.max_pages {
        config.source.max_pages = Some(max_pages);
    }
    if let Some(output) = &cli.output {
        config.output.csv_path = output.display().to_string();
    }
    validate(config)?;
    Ok(())
}

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &Config) {
    println!("=== Listing-Harvest Dry Run ===\n");

    println!("Source:");
    println!("  Index: {}", config.source.index_url);
    println!("  Detail: {}", config.source.detail_url_template);
    println!(
        "  Sort: {}",
        config.source.sort_option.as_deref().unwrap_or("(none)")
    );
    match config.source.max_pages {
        Some(n) => println!("  Max pages: {}", n),
        None => println!("  Max pages: unbounded"),
    }
    if let Some(days) = config.source.max_age_days {
        println!("  Only listings from the last {} days", days);
    }

    println!("\nFetching:");
    println!("  Timeout: {}s", config.fetch.timeout_secs);
    println!(
        "  Retries on 429: {} (default wait {}s, cap {}s, backoff x{})",
        config.fetch.max_retries,
        config.fetch.default_retry_after_secs,
        config.fetch.max_retry_after_secs,
        config.fetch.backoff_factor
    );
    println!(
        "  Page delay: {}-{}ms",
        config.fetch.page_delay_min_ms, config.fetch.page_delay_max_ms
    );
    println!("  Detail concurrency: {}", config.collector.concurrency);
    println!("  User agents: {}", config.identity.user_agents.len());

    println!("\nOutput:");
    println!("  CSV: {}", config.output.csv_path);
    println!(
        "  Delimiter: {:?}, BOM: {}",
        config.output.delimiter, config.output.write_bom
    );

    println!("\n✓ Configuration is valid");
}

/// Handles the main harvest operation
async fn handle_harvest(config: Config, quiet: bool) -> Result<(), Box<dyn std::error::Error>> {
    ensure_parent_dir(Path::new(&config.output.csv_path))?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing with partial results");
            on_signal.cancel();
        }
    });

    match harvest(config, cancel).await {
        Ok(report) => {
            if report.cancelled {
                tracing::warn!("Harvest cancelled after {} records", report.records);
            } else {
                tracing::info!("Harvest completed successfully");
            }
            if !quiet {
                print_report(&report);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}

/// Creates the directory that will hold the output file
fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}
