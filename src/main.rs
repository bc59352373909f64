//! polite-crawler main entry point
//!
//! This is the command-line interface for the polite-crawler link mapper.

use anyhow::{bail, Context};
use clap::Parser;
use polite_crawler::config::{load_config_with_hash, validate, Config};
use polite_crawler::crawler::crawl;
use polite_crawler::graph::load_graph;
use polite_crawler::output::{print_statistics, print_summary, GraphStatistics};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// polite-crawler: a polite, stateful web crawler
///
/// Starting from a seed URL, polite-crawler follows links while respecting
/// robots.txt, downloads each distinct image once, and keeps the discovered
/// link graph in a JSON file.
#[derive(Parser, Debug)]
#[command(name = "polite-crawler")]
#[command(version)]
#[command(about = "A polite, stateful web crawler", long_about = None)]
struct Cli {
    /// Absolute http(s) URL to start crawling from
    #[arg(value_name = "SEED", required_unless_present = "stats")]
    seed: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Maximum number of pages to fetch
    #[arg(long)]
    max_pages: Option<usize>,

    /// Maximum link depth from the seed (the seed is depth 0)
    #[arg(long)]
    max_depth: Option<u32>,

    /// Stop the crawl after this many seconds
    #[arg(long, value_name = "SECONDS")]
    deadline: Option<u64>,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the saved link graph and exit
    #[arg(long)]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load(&cli)?;

    if cli.stats {
        handle_stats(&config)
    } else if cli.dry_run {
        handle_dry_run(&config, seed(&cli)?)
    } else {
        handle_crawl(config, seed(&cli)?).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("polite_crawler=info,warn"),
            1 => EnvFilter::new("polite_crawler=debug,info"),
            2 => EnvFilter::new("polite_crawler=trace,debug"),
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

/// Loads the configuration file (if any) and applies command-line overrides
fn load(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::debug!("No configuration file given, using defaults");
            Config::default()
        }
    };

    if let Some(max_pages) = cli.max_pages {
        config.limits.max_pages = Some(max_pages);
    }
    if let Some(max_depth) = cli.max_depth {
        config.limits.max_depth = Some(max_depth);
    }
    if let Some(deadline) = cli.deadline {
        config.limits.deadline_secs = Some(deadline);
    }

    validate(&config).context("invalid configuration")?;
    Ok(config)
}

fn seed(cli: &Cli) -> anyhow::Result<&str> {
    match cli.seed.as_deref() {
        Some(seed) => Ok(seed),
        None => bail!("a seed URL is required"),
    }
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config, seed: &str) -> anyhow::Result<()> {
    let seed = polite_crawler::url::parse_absolute(seed).context("invalid seed URL")?;

    println!("=== polite-crawler Dry Run ===\n");

    println!("Seed: {}", seed);
    println!("  robots.txt: {}", polite_crawler::robots_url(&seed));

    println!("\nCrawler Configuration:");
    println!(
        "  Politeness delay: {}ms + up to {}ms jitter",
        config.crawler.min_delay_ms, config.crawler.jitter_ms
    );
    println!(
        "  Max concurrent fetches: {}",
        config.crawler.max_concurrent_fetches
    );
    println!(
        "  Max concurrent downloads: {}",
        config.crawler.max_concurrent_downloads
    );
    println!(
        "  Request timeout: {}s",
        config.crawler.request_timeout_secs
    );

    println!("\nLimits:");
    println!("  Max pages: {}", describe(config.limits.max_pages));
    println!("  Max depth: {}", describe(config.limits.max_depth));
    println!("  Deadline: {}", describe(config.limits.deadline_secs));

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Link graph: {}", config.output.data_path);
    println!("  Images: {}", config.output.image_dir);

    println!("\n✓ Configuration is valid");

    Ok(())
}

fn describe<T: std::fmt::Display>(limit: Option<T>) -> String {
    limit
        .map(|value| value.to_string())
        .unwrap_or_else(|| "unbounded".to_string())
}

/// Handles the --stats mode: shows statistics from the saved link graph
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let path = Path::new(&config.output.data_path);
    println!("Link graph: {}\n", path.display());

    let graph =
        load_graph(path).with_context(|| format!("failed to read {}", path.display()))?;
    print_statistics(&GraphStatistics::from_graph(&graph));

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, seed: &str) -> anyhow::Result<()> {
    tracing::info!("User agent: {}", config.user_agent.header_value());

    match crawl(config, seed).await {
        Ok(summary) => {
            print_summary(&summary);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
