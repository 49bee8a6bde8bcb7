//! AgentCommits - daily tracker of public GitHub commits made by AI agents
//!
//! A CLI tool that counts public commits per day through the GitHub search
//! API and reports the share attributable to AI coding agents.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Usage error, fatal collection error, or no usable data
//!   2 - Invalid command-line syntax (reported by clap)

mod agents;
mod analysis;
mod cli;
mod collector;
mod config;
mod github;
mod models;
mod report;
mod store;

use anyhow::{Context, Result};
use cli::{Args, CollectArgs, Command};
use collector::Collector;
use config::{Config, CONFIG_FILE};
use github::GitHubSearch;
use std::time::Instant;
use store::RecordStore;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args)?;

    info!("AgentCommits v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    let result = match load_config(&args) {
        Ok(mut config) => {
            config.merge_with_args(&args);
            match args.command {
                Some(Command::Collect(ref collect)) => run_collect(&config, collect, args.quiet).await,
                Some(Command::Report(_)) => run_report(&config),
                None => Ok(()),
            }
        }
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        error!("Run failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .agentcommits.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to customize the store directory, chart and document paths.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// `RUST_LOG` takes precedence over `--verbose` / `--quiet`.
fn init_logging(args: &Args) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level().as_str().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Collect every date of the requested range.
async fn run_collect(config: &Config, args: &CollectArgs, quiet: bool) -> Result<()> {
    let start_time = Instant::now();
    let (start, end) = (args.start, args.end_date());
    let store = RecordStore::new(&config.store.dir);

    if args.dry_run {
        return handle_dry_run(&store, args);
    }

    // validate() already rejected a missing token
    let token = args.token.clone().unwrap_or_default();

    println!("📥 Collecting {} to {}", start, end);
    println!("   Store: {}", store.dir().display());
    println!("   API: {}", config.github.api_url);
    println!("   Pace: {} requests/min", config.github.requests_per_minute);

    let client = GitHubSearch::new(&config.github, token)?;
    let collector = Collector::new(&client, &store).with_progress(!quiet);
    let summary = collector.collect_range(start, end, args.skip_existing).await?;

    if summary.retries > 0 {
        warn!("{} requests were retried after rate limiting", summary.retries);
    }

    println!("\n✅ Collection complete!");
    println!("   Dates collected: {}", summary.collected.len());
    if !summary.skipped.is_empty() {
        println!("   Dates skipped (already stored): {}", summary.skipped.len());
    }
    println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());
    Ok(())
}

/// Handle --dry-run: print the queries each date would issue.
fn handle_dry_run(store: &RecordStore, args: &CollectArgs) -> Result<()> {
    println!("\n🔍 Dry run: no API calls will be made\n");

    for date in collector::dates_in_range(args.start, args.end_date()) {
        let note = if args.skip_existing && store.contains(date) {
            " (skipped, record exists)"
        } else {
            ""
        };
        println!("📅 {} -> {}{}", date, store.path_for(date).display(), note);
        for (label, query) in collector::planned_queries(date) {
            println!("     {:<24} {}", label, query);
        }
    }

    println!("\n✅ Dry run complete.");
    Ok(())
}

/// Render the chart and trend table from every stored record.
fn run_report(config: &Config) -> Result<()> {
    let store = RecordStore::new(&config.store.dir);

    println!("📝 Generating report from {}", store.dir().display());
    let outcome = report::generate_report(&store, &config.report)?;

    println!("\n📊 Report Summary:");
    println!("   Dates used: {}", outcome.dates_used);
    if outcome.dates_skipped > 0 {
        println!("   Dates skipped (missing or zero total): {}", outcome.dates_skipped);
    }
    if let Some(latest) = outcome.latest {
        println!(
            "   Latest: {} -> {:.2}% of {} public commits",
            latest.date, latest.combined, latest.total
        );
    }
    println!("   Chart: {}", config.report.chart_path.display());
    println!(
        "   Document: {} ({})",
        config.report.document_path.display(),
        if outcome.document_changed { "updated" } else { "unchanged" }
    );
    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
