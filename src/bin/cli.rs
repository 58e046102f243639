//! CLI binary for serp-harvest.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serp_harvest::store::{self, Snapshot};
use serp_harvest::{CrawlBatch, CrawlConfig};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// serp-harvest: crawl search results pages for a batch of keywords.
#[derive(Parser)]
#[command(name = "serp-harvest", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Command,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Fetch and extract results for each keyword.
    Crawl {
        /// Keyword to search for (repeatable).
        #[arg(short, long = "keyword")]
        keywords: Vec<String>,

        /// File with one keyword per line (`#` starts a comment).
        #[arg(long)]
        keywords_file: Option<PathBuf>,

        /// Results kept per keyword (defaults to the configured value).
        #[arg(short, long)]
        max_per_query: Option<usize>,

        /// Maximum number of keywords fetched at once.
        #[arg(long)]
        concurrency: Option<usize>,

        /// Proxy token (overrides the config file).
        #[arg(long, env = "CRAWLBASE_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Where to write the JSON snapshot.
        #[arg(short, long, default_value = "results.json")]
        out: PathBuf,

        /// Also export the results as CSV to this path.
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Convert a saved JSON snapshot to CSV.
    Export {
        /// Snapshot written by `crawl`.
        #[arg(short, long, default_value = "results.json")]
        snapshot: PathBuf,

        /// CSV destination; prints to stdout when omitted.
        #[arg(long)]
        csv: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Users can override with RUST_LOG=debug to see everything.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("serp_harvest=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = if let Some(ref path) = cli.config {
        CrawlConfig::from_file(path)?
    } else {
        CrawlConfig::default()
    };

    match cli.command {
        Command::Crawl {
            keywords,
            keywords_file,
            max_per_query,
            concurrency,
            token,
            out,
            csv,
        } => {
            if token.is_some() {
                config.token = token;
            }
            if let Some(concurrency) = concurrency {
                config.concurrency = concurrency;
            }
            let mut queries = keywords;
            if let Some(ref path) = keywords_file {
                queries.extend(read_keywords(path)?);
            }
            run_crawl(&config, &queries, max_per_query, &out, csv.as_deref()).await
        }
        Command::Export { snapshot, csv } => run_export(&snapshot, csv.as_deref()),
    }
}

async fn run_crawl(
    config: &CrawlConfig,
    queries: &[String],
    max_per_query: Option<usize>,
    out: &Path,
    csv: Option<&Path>,
) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received Ctrl+C, finishing with partial results...");
            cancel_clone.cancel();
        }
    });

    let batch = serp_harvest::crawl_with_cancel(queries, max_per_query, config, &cancel).await?;
    print_batch(&batch);

    let snapshot = Snapshot::from(&batch);
    store::write_snapshot(&snapshot, out)
        .with_context(|| format!("writing snapshot to {}", out.display()))?;
    println!("\nResults saved in {}", out.display());

    if let Some(path) = csv {
        store::export_csv(&snapshot, path)
            .with_context(|| format!("writing CSV to {}", path.display()))?;
        println!("CSV exported to {}", path.display());
    }

    Ok(())
}

fn run_export(snapshot_path: &Path, csv: Option<&Path>) -> anyhow::Result<()> {
    let snapshot = store::read_snapshot(snapshot_path)
        .with_context(|| format!("reading snapshot {}", snapshot_path.display()))?;
    match csv {
        Some(path) => {
            store::export_csv(&snapshot, path)?;
            println!("CSV exported to {}", path.display());
        }
        None => store::write_csv(&snapshot, std::io::stdout().lock())?,
    }
    Ok(())
}

fn read_keywords(path: &Path) -> anyhow::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading keywords from {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

fn print_batch(batch: &CrawlBatch) {
    for (query, outcome) in batch {
        println!("\n\"{query}\": {}", outcome.status);
        for result in &outcome.results {
            println!("{:>3}. {}\n     {}", result.rank, result.title, result.link);
        }
    }
}
