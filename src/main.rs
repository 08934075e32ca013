//! Shopcrawl main entry point
//!
//! Command-line interface for the product URL discovery crawler.

use anyhow::Context;
use clap::Parser;
use shopcrawl::config::{load_config_with_hash, Config};
use shopcrawl::crawler::run_discovery;
use shopcrawl::output;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Shopcrawl: discover product URLs on e-commerce domains
///
/// Crawls each configured domain up to a bounded depth, classifies links
/// against retailer-specific URL patterns, and writes the discovered product
/// URLs per domain to a JSON file.
#[derive(Parser, Debug)]
#[command(name = "shopcrawl")]
#[command(version = "1.0.0")]
#[command(about = "Discover product URLs on e-commerce domains", long_about = None)]
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

    /// Validate config and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,

    /// Write results to this path instead of the configured one
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(config, cli.output).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("shopcrawl=info,warn"),
            1 => EnvFilter::new("shopcrawl=debug,info"),
            2 => EnvFilter::new("shopcrawl=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would run
fn handle_dry_run(config: &Config) {
    println!("=== Shopcrawl Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Concurrency limit: {}", config.crawler.concurrency_limit);
    println!(
        "  Delay range: {}-{}ms",
        config.crawler.delay_range_ms[0], config.crawler.delay_range_ms[1]
    );
    println!("  Domain timeout: {}s", config.crawler.domain_timeout_secs);
    println!(
        "  Rotate user-agents: {}",
        config.crawler.rotate_user_agents
    );
    println!("  Use rendering: {}", config.crawler.use_rendering);

    println!("\nRetry Policy:");
    println!("  Max attempts: {}", config.retry.max_attempts);
    println!(
        "  Backoff: {}ms start, {}ms cap, factor {}",
        config.retry.start_delay_ms, config.retry.max_delay_ms, config.retry.backoff_factor
    );
    println!("  Retryable statuses: {:?}", config.retry.retryable_statuses);

    if !config.headers.is_empty() {
        println!("\nCustom Headers ({}):", config.headers.len());
        for name in config.headers.keys() {
            println!("  - {}", name);
        }
    }

    println!("\nOutput:");
    println!("  Results: {}", config.output.results_path);

    println!("\nDomains ({}):", config.domains.len());
    for domain in &config.domains {
        println!("  - {}", domain);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, output_override: Option<PathBuf>) -> anyhow::Result<()> {
    let results_path =
        output_override.unwrap_or_else(|| PathBuf::from(&config.output.results_path));

    tracing::info!(
        "Starting discovery across {} domains",
        config.domains.len()
    );

    let (results, stats) = run_discovery(config).await?;

    output::write_results(&results_path, &results)
        .with_context(|| format!("failed to write {}", results_path.display()))?;
    output::print_summary(&results, &stats);

    println!("\n✓ Results written to: {}", results_path.display());
    Ok(())
}
