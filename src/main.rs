//! Product-Scout main entry point
//!
//! This is the command-line interface for the Product-Scout product-page crawler.

use anyhow::Context;
use clap::Parser;
use product_scout::config::{load_config_with_hash, Config};
use product_scout::crawler::crawl;
use product_scout::output::{print_statistics, write_results};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Product-Scout: a polite product-page discovery crawler
///
/// Product-Scout crawls e-commerce sites while respecting robots.txt and
/// rate limits, and writes the product page URLs it finds to a JSON file.
#[derive(Parser, Debug)]
#[command(name = "product-scout")]
#[command(version)]
#[command(about = "A polite product-page discovery crawler", long_about = None)]
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

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// Write results here instead of the configured results path
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

    let results_path = cli
        .output
        .unwrap_or_else(|| PathBuf::from(&config.output.results_path));

    if cli.dry_run {
        handle_dry_run(&config, &results_path);
        return Ok(());
    }

    handle_crawl(&config, &results_path).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("product_scout=info,warn"),
            1 => EnvFilter::new("product_scout=debug,info"),
            2 => EnvFilter::new("product_scout=trace,debug"),
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

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config, results_path: &Path) {
    println!("=== Product-Scout Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max depth: {}", config.crawler.max_depth);
    println!(
        "  Concurrent requests per domain: {}",
        config.crawler.concurrent_requests
    );
    println!(
        "  Delay range: {:.1}s - {:.1}s",
        config.crawler.delay_range.0, config.crawler.delay_range.1
    );
    println!("  Domain timeout: {}s", config.crawler.domain_timeout_secs);
    println!("  Max retries: {}", config.crawler.max_retries);
    println!("  Respect robots.txt: {}", config.crawler.respect_robots);
    println!("  JavaScript rendering: {}", config.crawler.use_js_rendering);

    println!("\nUser Agent:");
    if config.user_agent.rotate {
        println!("  Rotating browser user agents");
    } else {
        println!("  {}", config.user_agent.default);
    }
    println!("  Robots token: {}", config.user_agent.robots_token);

    println!("\nOutput:");
    println!("  Results: {}", results_path.display());

    println!("\nDomains ({}):", config.domains.len());
    for entry in &config.domains {
        let seeds = entry.seed_urls();
        println!("  - {} ({} seeds)", entry.domain, seeds.len());
        for seed in &seeds {
            println!("    * {}", seed);
        }
        for pattern in &entry.also_allow {
            println!("    + also follows {}", pattern);
        }
    }

    if !config.retailers.is_empty() {
        println!("\nCustom Retailer Rules ({}):", config.retailers.len());
        for entry in &config.retailers {
            println!(
                "  - {} ({} product, {} pagination, {} exclusion patterns)",
                entry.domain,
                entry.product.len(),
                entry.pagination.len(),
                entry.exclude.len()
            );
        }
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would start crawling with {} seed URLs",
        config
            .domains
            .iter()
            .map(|entry| entry.seed_urls().len())
            .sum::<usize>()
    );
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, results_path: &Path) -> anyhow::Result<()> {
    let seed_count: usize = config
        .domains
        .iter()
        .map(|entry| entry.seed_urls().len())
        .sum();
    tracing::info!(
        "Domains: {}, total seed URLs: {}",
        config.domains.len(),
        seed_count
    );

    let report = crawl(config).await.context("crawl failed")?;

    for domain in &report.timed_out {
        tracing::warn!("[{}] Results are partial: domain timeout reached", domain);
    }

    write_results(&report.results, results_path)
        .with_context(|| format!("failed to write {}", results_path.display()))?;
    tracing::info!("Results written to {}", results_path.display());

    print_statistics(&report.totals, &report.domains, &report.results);

    Ok(())
}
