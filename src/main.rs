//! Frontier-Crawl main entry point
//!
//! This is the command-line interface for the Frontier-Crawl site crawler.

use anyhow::Context;
use clap::Parser;
use frontier_crawl::config::{load_config_with_hash, validate, Config};
use frontier_crawl::output::print_statistics;
use frontier_crawl::{crawl, SiteScope};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Frontier-Crawl: a polite single-site crawler
///
/// Frontier-Crawl starts from one URL and follows links within the same site
/// while respecting robots.txt, backing off when rate limited and retrying
/// transient failures. Every visited URL is written to the output file along
/// with the links found on it.
#[derive(Parser, Debug)]
#[command(name = "frontier-crawl")]
#[command(version)]
#[command(about = "A polite single-site crawler", long_about = None)]
struct Cli {
    /// URL to start crawling from (overrides the config file)
    #[arg(short, long)]
    url: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Number of concurrent workers
    #[arg(short, long)]
    workers: Option<u32>,

    /// Attempts per URL before a transient failure is given up on
    #[arg(short, long)]
    retries: Option<u32>,

    /// Base rate-limit backoff in seconds
    #[arg(short, long)]
    backoff: Option<u64>,

    /// Output file (.json, or .db/.sqlite/.sqlite3 for SQLite)
    #[arg(short, long, value_name = "PATH")]
    output: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load(&cli)?;

    if cli.dry_run {
        handle_dry_run(&config)
    } else {
        handle_crawl(config, cli.quiet).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("frontier_crawl=info,warn"),
            1 => EnvFilter::new("frontier_crawl=debug,info"),
            2 => EnvFilter::new("frontier_crawl=trace,debug"),
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

/// Loads the config file (if any), applies command-line overrides and validates the result
fn load(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if let Some(url) = &cli.url {
        config.crawler.start_url = Some(url.clone());
    }
    if let Some(workers) = cli.workers {
        config.crawler.workers = workers;
    }
    if let Some(retries) = cli.retries {
        config.crawler.max_retries = retries;
    }
    if let Some(backoff) = cli.backoff {
        config.crawler.backoff_ms = backoff.saturating_mul(1000);
    }
    if let Some(output) = &cli.output {
        config.output.storage_path = output.clone();
    }

    validate(&config).context("Invalid configuration")?;
    Ok(config)
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Frontier-Crawl Dry Run ===\n");

    println!("Crawler Configuration:");
    println!(
        "  Start URL: {}",
        config.crawler.start_url.as_deref().unwrap_or("(none)")
    );
    println!("  Workers: {}", config.crawler.workers);
    println!("  Attempts per URL: {}", config.crawler.max_retries);
    println!("  Base backoff: {}ms", config.crawler.backoff_ms);
    match config.crawler.max_rate_limit_retries {
        Some(cap) => println!("  Rate-limit attempts: {}", cap),
        None => println!("  Rate-limit attempts: unlimited"),
    }
    println!(
        "  Default crawl delay: {}ms (+ up to {}ms jitter)",
        config.crawler.default_crawl_delay_ms, config.crawler.politeness_jitter_ms
    );
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Results: {}", config.output.storage_path);

    let start = config
        .crawler
        .start_url
        .as_deref()
        .context("No start URL given; pass --url or set crawler.start-url")?;
    let scope = SiteScope::new(start).with_context(|| format!("Invalid start URL {}", start))?;

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would crawl {} and every link matching {}",
        scope.base(),
        scope.pattern()
    );

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, quiet: bool) -> anyhow::Result<()> {
    let started = Instant::now();
    let storage_path = config.output.storage_path.clone();

    let stats = crawl(config).await.context("Crawl failed")?;

    tracing::info!(
        "Crawl completed in {:.1}s, results written to {}",
        started.elapsed().as_secs_f64(),
        storage_path
    );
    if !quiet {
        print_statistics(&stats);
    }

    Ok(())
}
