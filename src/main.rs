//! fin-doc-crawler main entry point
//!
//! This is the command-line interface for the API documentation crawler.

use anyhow::Context;
use clap::Parser;
use fin_doc_crawler::config::{load_config_with_hash, Config};
use fin_doc_crawler::crawler::CrawlOrchestrator;
use fin_doc_crawler::index::{generate_indices, load_completed_keys, remaining_indices};
use fin_doc_crawler::output::print_summary;
use fin_doc_crawler::renderer::HttpRenderService;
use fin_doc_crawler::storage::{sweep, ArtifactStore};
use fin_doc_crawler::PageIndex;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Number of indices crawled in `--test` mode
const TEST_INDEX_COUNT: usize = 5;

/// fin-doc-crawler: a polite crawler for API documentation pages
///
/// Renders every documentation page index through a headless-browser render
/// service, normalizes titles, parameter tables and example code, and writes
/// one JSON snapshot per page.
#[derive(Parser, Debug)]
#[command(name = "fin-doc-crawler")]
#[command(version = "1.0.0")]
#[command(about = "A polite crawler for API documentation pages", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Crawl only the first five page indices and skip housekeeping
    #[arg(long)]
    test: bool,

    /// Skip page indices already present in the results file
    #[arg(long)]
    resume: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Mirror log output to this file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet, cli.log_file.as_deref())?;

    match &cli.config {
        Some(path) => tracing::info!("Loading configuration from: {}", path.display()),
        None => tracing::info!("No configuration file given, using defaults"),
    }
    let (config, config_hash) =
        load_config_with_hash(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let indices = select_indices(&config, cli.resume, cli.test);

    if cli.dry_run {
        handle_dry_run(&config, &indices);
        return Ok(());
    }

    handle_crawl(config, config_hash, indices, cli.test).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool, log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("fin_doc_crawler=info,warn"),
            1 => EnvFilter::new("fin_doc_crawler=debug,info"),
            2 => EnvFilter::new("fin_doc_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false),
        )
        .with(file_layer)
        .init();

    Ok(())
}

/// Enumerates the indices of this run
///
/// `--resume` drops the keys of the results file first, then `--test` keeps
/// the first few of what is left.
fn select_indices(config: &Config, resume: bool, test: bool) -> Vec<PageIndex> {
    let mut indices = generate_indices(&config.index);
    tracing::info!("Generated {} page indices", indices.len());

    if resume {
        let results_file = Path::new(&config.output.directory).join(&config.output.results_file);
        let completed = load_completed_keys(&results_file);
        indices = remaining_indices(&indices, &completed);
        tracing::info!("Resuming with {} page indices left", indices.len());
    }

    if test {
        indices.truncate(TEST_INDEX_COUNT);
        tracing::info!("Test mode: crawling {} page indices", indices.len());
    }

    indices
}

/// Handles the --dry-run mode: shows the configuration and the planned indices
fn handle_dry_run(config: &Config, indices: &[PageIndex]) {
    println!("=== fin-doc-crawler Dry Run ===\n");

    println!("Crawler Configuration:");
    println!(
        "  Max concurrent renders: {}",
        config.crawler.max_concurrent_renders
    );
    println!("  Max attempts: {}", config.crawler.max_attempts);
    println!(
        "  Attempt jitter: {}-{}ms",
        config.crawler.attempt_jitter_ms.0, config.crawler.attempt_jitter_ms.1
    );
    println!(
        "  Visit jitter: {}-{}ms",
        config.crawler.visit_jitter_ms.0, config.crawler.visit_jitter_ms.1
    );
    println!("  Retry backoff: {}ms", config.crawler.retry_backoff_ms);

    println!("\nRenderer:");
    println!("  Endpoint: {}", config.renderer.endpoint);
    println!("  Base URL: {}", config.renderer.base_url);
    println!("  Locale: {}", config.renderer.locale);
    println!("  Page timeout: {}ms", config.renderer.page_timeout_ms);

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);
    println!("  Results file: {}", config.output.results_file);

    println!("\nPage Indices ({}):", indices.len());
    for index in indices {
        println!("  - {}", index);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: Config,
    config_hash: String,
    indices: Vec<PageIndex>,
    test: bool,
) -> anyhow::Result<()> {
    let store = ArtifactStore::open(&config.output.directory).with_context(|| {
        format!(
            "failed to open output directory {}",
            config.output.directory
        )
    })?;
    let renderer = HttpRenderService::new(config.renderer.clone())
        .context("failed to build render service client")?;

    let orchestrator = CrawlOrchestrator::new(&config, Arc::new(renderer), store)
        .with_config_hash(config_hash);

    let shutdown = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::warn!("Received Ctrl-C"),
            Err(e) => {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    let mut summary = orchestrator.run_until(&indices, shutdown).await;

    if test {
        tracing::info!("Test mode: skipping housekeeping");
    } else if summary.interrupted {
        tracing::info!("Run interrupted: skipping housekeeping");
    } else {
        let report = sweep(orchestrator.store().dir(), &config.output.results_file)
            .context("housekeeping sweep failed")?;
        summary.removed = Some(report.removed);
    }

    print_summary(&summary);
    Ok(())
}
