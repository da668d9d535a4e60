//! Command-line interface for litsearch.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use litsearch::cache::RequestCache;
use litsearch::config::load_config;
use litsearch::models::{Record, SearchRequest, SortMode};
use litsearch::providers::ProviderRegistry;
use litsearch::search::{run_combined, search};
use litsearch::utils::HttpTransport;

/// Search academic literature across metadata providers
#[derive(Debug, Parser)]
#[command(name = "litsearch", version, about)]
struct Cli {
    /// Free-text search query
    query: String,

    /// Provider to search: crossref, openalex, semantic, scopus, wos, or
    /// "cos" for the combined open-source search
    #[arg(short, long, default_value = "cos")]
    provider: String,

    /// Total number of records to fetch (0 = fetch all pages)
    #[arg(short, long, default_value_t = 20)]
    limit: usize,

    /// Earliest publication year
    #[arg(long)]
    year_from: Option<i32>,

    /// Latest publication year
    #[arg(long)]
    year_to: Option<i32>,

    /// Sort order
    #[arg(long, value_enum, default_value_t = SortArg::Relevance)]
    sort: SortArg,

    /// Cache directory (default: platform cache dir)
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Disable the on-disk response cache
    #[arg(long)]
    no_cache: bool,

    /// Emit records as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SortArg {
    Relevance,
    Year,
}

impl From<SortArg> for SortMode {
    fn from(sort: SortArg) -> Self {
        match sort {
            SortArg::Relevance => SortMode::Relevance,
            SortArg::Year => SortMode::Year,
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "litsearch=warn",
        1 => "litsearch=info",
        _ => "litsearch=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_records(records: &[Record], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(records)?);
        return Ok(());
    }

    for (i, record) in records.iter().enumerate() {
        println!("{}. {} ({})", i + 1, record.title, record.year);
        if !record.authors.is_empty() {
            println!("   {}", record.authors);
        }
        if !record.venue.is_empty() {
            println!("   {}", record.venue);
        }
        if !record.doi.is_empty() {
            println!("   doi:{}", record.doi);
        }
        println!("   [{}]", record.source);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config().context("failed to load configuration")?;
    let registry = ProviderRegistry::from_config(&config);

    let mut request = SearchRequest::new(&cli.query).limit(cli.limit);
    request.year_from = cli.year_from;
    request.year_to = cli.year_to;
    request.sort = cli.sort.into();

    let transport = Arc::new(HttpTransport::new().context("failed to build HTTP client")?);

    let cache = if cli.no_cache || !config.cache.enabled {
        RequestCache::in_memory()
    } else {
        let dir = cli.cache_dir.unwrap_or_else(|| config.cache.directory());
        RequestCache::on_disk(dir)
    };

    if cli.provider == "cos" {
        let outcome = run_combined(&registry, transport, cache, &request).await;
        for (provider, reason) in &outcome.skipped {
            eprintln!("warning: {} skipped: {}", provider, reason);
        }
        print_records(&outcome.records, cli.json)?;
        eprintln!(
            "{} records from {} provider(s)",
            outcome.records.len(),
            outcome.fetched
        );
    } else {
        if !registry.has(&cli.provider) {
            let known: Vec<&str> = registry.searchable().iter().map(|p| p.id()).collect();
            bail!(
                "unknown provider '{}' (available: {}, cos)",
                cli.provider,
                known.join(", ")
            );
        }
        let outcome = search(&registry, &cli.provider, transport, cache, request).await?;
        print_records(&outcome.records, cli.json)?;
        eprintln!(
            "{} records in {} page(s), stopped: {}",
            outcome.records.len(),
            outcome.fetched,
            outcome.reason
        );
    }

    Ok(())
}
