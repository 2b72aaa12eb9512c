mod builder;
mod chunker;
mod config;
mod fetch;
mod parser;
mod store;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::warn;

use crate::config::Config;
use crate::store::Store;

#[derive(Parser)]
#[command(name = "wiki_rag", about = "Faction wiki scraper + RAG database builder")]
struct Cli {
    /// JSON config overriding the built-in page list and classification data
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch raw markup for configured pages from the wiki API
    Fetch {
        /// Max pages to fetch (default: all missing)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Parse raw markup into structured pages
    Parse,
    /// Classify parsed pages into per-faction database buckets
    Build,
    /// Export database buckets as flat chunks for embedding
    Chunk,
    /// Fetch + parse + build + chunk in one pipeline
    Run {
        /// Max pages to fetch
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Show pipeline statistics
    Stats,
    /// Parsed pages overview table
    Overview,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let store = Store::open_default();

    let result = match cli.command {
        Commands::Fetch { limit } => {
            let stats = fetch::fetch_pages(&config, &store, limit).await?;
            if stats.total == 0 {
                println!("Nothing to fetch: all configured pages are already on disk.");
            } else {
                println!(
                    "Fetched {} pages ({} ok, {} errors).",
                    stats.total, stats.ok, stats.errors
                );
            }
            Ok(())
        }
        Commands::Parse => {
            let parsed = parse_pages(&store)?;
            println!("Parsed {} pages.", parsed);
            Ok(())
        }
        Commands::Build => {
            let built = build_pages(&store, &config)?;
            println!("Built database for {} factions.", built);
            Ok(())
        }
        Commands::Chunk => {
            let chunks = chunk_pages(&store, &config)?;
            println!("Exported {} chunks to {}.", chunks, store.chunks_path().display());
            Ok(())
        }
        Commands::Run { limit } => {
            let stats = fetch::fetch_pages(&config, &store, limit).await?;
            println!(
                "Fetched {} pages ({} ok, {} errors).",
                stats.total, stats.ok, stats.errors
            );
            let parsed = parse_pages(&store)?;
            let built = build_pages(&store, &config)?;
            let chunks = chunk_pages(&store, &config)?;
            println!(
                "Parsed {}, built {}, exported {} chunks.",
                parsed, built, chunks
            );
            Ok(())
        }
        Commands::Stats => {
            let s = store.stats()?;
            println!("Raw pages:    {}", s.raw);
            println!("Parsed pages: {}", s.parsed);
            println!("Built dbs:    {}", s.built);
            println!("Chunks:       {}", s.chunks);
            Ok(())
        }
        Commands::Overview => {
            let pages = store.load_parsed_pages()?;
            if pages.is_empty() {
                println!("No parsed pages. Run 'parse' first.");
                return Ok(());
            }
            println!(
                "{:>3} | {:<20} | {:<20} | {:>8} | {:>7} | {:>5}",
                "#", "Id", "Name", "Sections", "Infobox", "Lists"
            );
            println!("{}", "-".repeat(78));
            for (i, page) in pages.iter().enumerate() {
                let lists = page
                    .sections
                    .values()
                    .filter(|s| s.list_items.is_some())
                    .count();
                println!(
                    "{:>3} | {:<20} | {:<20} | {:>8} | {:>7} | {:>5}",
                    i + 1,
                    truncate(&page.id, 20),
                    truncate(&page.name, 20),
                    page.sections.len(),
                    page.infobox.len(),
                    lists
                );
            }
            println!("\n{} pages", pages.len());
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

/// Parse every raw page on disk in parallel. A page with an empty body
/// is logged and skipped; it must never sink the rest of the batch.
fn parse_pages(store: &Store) -> Result<usize> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let raw_pages = store.load_raw_pages()?;
    if raw_pages.is_empty() {
        println!("No raw pages. Run 'fetch' first.");
        return Ok(0);
    }

    let pb = ProgressBar::new(raw_pages.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
            .unwrap()
            .progress_chars("#>-"),
    );

    let mut parsed = 0usize;
    for chunk in raw_pages.chunks(64) {
        let results: Vec<_> = chunk
            .par_iter()
            .map(|(id, markup)| (id, parser::parse_page(markup, &title_from_id(id))))
            .collect();

        for (id, result) in results {
            match result {
                Ok(page) => {
                    store.save_parsed(&page)?;
                    parsed += 1;
                }
                Err(e) => warn!("Skipping {}: {}", id, e),
            }
        }
        pb.inc(chunk.len() as u64);
    }

    pb.finish_and_clear();
    Ok(parsed)
}

fn build_pages(store: &Store, config: &Config) -> Result<usize> {
    let pages = store.load_parsed_pages()?;
    if pages.is_empty() {
        println!("No parsed pages. Run 'parse' first.");
        return Ok(0);
    }
    for page in &pages {
        let db = builder::build(page, config);
        store.save_faction_db(&db)?;
    }
    Ok(pages.len())
}

fn chunk_pages(store: &Store, config: &Config) -> Result<usize> {
    let pages = store.load_parsed_pages()?;
    if pages.is_empty() {
        println!("No parsed pages. Run 'parse' first.");
        return Ok(0);
    }
    let mut all_chunks = Vec::new();
    for page in &pages {
        let db = builder::build(page, config);
        all_chunks.extend(chunker::chunk_faction(&db));
    }
    store.save_chunks(&all_chunks)?;
    Ok(all_chunks.len())
}

/// Raw files are named by slug; recover a display title ("grand_cathay"
/// -> "Grand_Cathay") for the parser to derive id and name from.
fn title_from_id(id: &str) -> String {
    id.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("_")
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
