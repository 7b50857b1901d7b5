use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use paperdex_core::{rebuild_index, search_with, ExtractConfig, IndexConfig, IndexStore, Language, SearchOptions};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build and query paragraph-level TF-IDF indexes over a folder of papers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract every PDF/text file in a folder and publish a new index generation
    Build {
        /// Corpus directory (files directly inside it are indexed)
        #[arg(long)]
        input: PathBuf,
        /// Index root directory
        #[arg(long)]
        output: PathBuf,
        /// Stopword list used for the corpus and, later, for queries
        #[arg(long, default_value_t = Language::English)]
        language: Language,
        /// Use 1 + ln(count) as term frequency instead of the raw count
        #[arg(long, default_value_t = false)]
        sublinear_tf: bool,
        /// Drop paragraphs with fewer words than this
        #[arg(long)]
        min_words: Option<usize>,
        /// Flush the paragraph buffer once it holds more words than this
        #[arg(long)]
        flush_words: Option<usize>,
    },
    /// Run one query against the current generation and print JSON results
    Search {
        #[arg(long)]
        index: PathBuf,
        #[arg(long, short)]
        query: String,
        #[arg(short, long, default_value_t = 3)]
        k: usize,
        /// Sentences per summary
        #[arg(long, default_value_t = 2)]
        sentences: usize,
    },
    /// Print the manifest of the current generation
    Inspect {
        #[arg(long)]
        index: PathBuf,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, language, sublinear_tf, min_words, flush_words } => {
            let mut extract = ExtractConfig::default();
            if let Some(n) = min_words {
                extract.min_words = n;
            }
            if let Some(n) = flush_words {
                extract.flush_words = n;
            }
            build(&input, &output, &extract, IndexConfig { language, sublinear_tf })
        }
        Commands::Search { index, query, k, sentences } => run_search(&index, &query, k, sentences),
        Commands::Inspect { index } => inspect(&index),
    }
}

fn build(input: &Path, output: &Path, extract: &ExtractConfig, config: IndexConfig) -> Result<()> {
    let store = IndexStore::new(output);
    let (report, _) = rebuild_index(input, &store, extract, config)
        .with_context(|| format!("building index from {}", input.display()))?;
    for skipped in &report.skipped {
        tracing::warn!(document = %skipped.name, reason = %skipped.reason, "document skipped");
    }
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_search(index: &Path, query: &str, k: usize, sentences: usize) -> Result<()> {
    let store = IndexStore::new(index);
    let handle = store.load_current()?;
    if handle.is_none() {
        tracing::warn!(index = %index.display(), "no index generation published yet");
    }
    let options = SearchOptions { summary_sentences: sentences, ..SearchOptions::new(k) };
    let results = search_with(handle.as_ref(), query, &options)?;
    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}

fn inspect(index: &Path) -> Result<()> {
    let store = IndexStore::new(index);
    match store.load_current()? {
        Some(handle) => println!("{}", serde_json::to_string_pretty(handle.meta())?),
        None => anyhow::bail!("no index generation published under {}", index.display()),
    }
    Ok(())
}
