use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use claimscout_api::tmdb::TmdbClient;
use claimscout_core::config::{AppConfig, API_KEY_ENV};
use claimscout_core::error::ScanError;
use claimscout_core::navigator::{HttpNavigator, NavigatorSettings};
use claimscout_core::scanner::{ScanSummary, Scanner};
use claimscout_core::storage::Storage;

const DEFAULT_FILTER: &str = "claimscout=info";

#[derive(Parser)]
#[command(name = "claimscout")]
#[command(about = "Find streaming links to rights-holder content on index sites")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Also write logs to a daily rotated file in this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl the configured site and store verified links
    Scan {
        /// Number of listing pages to scan
        #[arg(short, long)]
        pages: Option<u32>,

        /// Database file
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// Show what has been stored so far
    Stats {
        /// List the links stored for one rights holder
        #[arg(long)]
        company: Option<String>,

        /// Database file
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_dir.as_deref());

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "claimscout failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Console logging filtered by `RUST_LOG`, plus an optional rolling file.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "claimscout.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    guard
}

async fn run(cli: Cli) -> Result<(), ScanError> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };

    match cli.command {
        Commands::Scan { pages, db } => {
            if let Some(pages) = pages {
                config.site.listing_pages = pages;
            }
            if let Some(db) = db {
                config.storage.db_path = Some(db);
            }
            scan(&config).await
        }
        Commands::Stats { company, db } => {
            if let Some(db) = db {
                config.storage.db_path = Some(db);
            }
            stats(&config, company.as_deref())
        }
    }
}

async fn scan(config: &AppConfig) -> Result<(), ScanError> {
    let api_key = config.api_key().ok_or_else(|| {
        ScanError::Config(format!(
            "no catalog API key: set catalog.api_key or {API_KEY_ENV}"
        ))
    })?;
    let catalog = TmdbClient::with_options(
        api_key,
        &config.catalog.base_url,
        &config.catalog.language,
        config.scan.request_timeout(),
    )
    .map_err(|e| ScanError::Catalog(e.to_string()))?;

    let db_path = config.ensure_db_path()?;
    let storage = Storage::open(&db_path)?;
    let navigator = HttpNavigator::new(NavigatorSettings::from_config(&config.scan));

    let mut scanner = Scanner::new(config, navigator, catalog, storage);
    let summary = scanner.run().await?;

    print_summary(&summary);
    for item in scanner.findings() {
        println!(
            "  {} ({}) - {} links",
            item.display_title(),
            item.holder_name.as_deref().unwrap_or("?"),
            item.video_links.len()
        );
    }
    println!("Database: {}", db_path.display());
    println!("Links in database: {}", scanner.storage().link_count()?);
    Ok(())
}

fn stats(config: &AppConfig, company: Option<&str>) -> Result<(), ScanError> {
    let storage = Storage::open(&config.db_path())?;

    match company {
        Some(company) => {
            let rows = storage.links_by_company(company)?;
            println!("{} links for {company}", rows.len());
            for row in rows {
                println!("  [{}] {} {} ({})", row.id, row.host, row.url, row.website);
            }
        }
        None => {
            println!("Links in database: {}", storage.link_count()?);
            for (company, count) in storage.company_counts()? {
                println!("  {count:>6}  {company}");
            }
        }
    }
    Ok(())
}

fn print_summary(s: &ScanSummary) {
    println!();
    println!("Pages scanned:    {}", s.pages_scanned);
    println!("Items checked:    {}", s.items_checked);
    println!("Verified:         {}", s.verified);
    println!("Findings:         {}", s.findings);
    println!("Links collected:  {}", s.links_collected);
    println!("Links persisted:  {}", s.links_persisted);
    println!("Catalog calls:    {}", s.api_calls);
    println!("Errors:           {}", s.errors);
}
