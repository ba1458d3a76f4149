//! groundqa CLI
//!
//! Index a document folder, ask grounded questions against it, and evaluate
//! or sweep retrieval settings.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use groundqa_core::config::{Config, Settings};
use groundqa_core::traits::VectorIndex;
use groundqa_embed::shared_embedder;
use groundqa_rag::sweep::DEFAULT_SWEEP_QUESTIONS;
use groundqa_rag::{load_questions, run_eval, write_report, RagPipeline, Sweep, SweepSpace};
use groundqa_vector::{build_index, IndexOptions, LanceVectorIndex};

/// Grounded question answering over a local document folder
#[derive(Parser)]
#[command(name = "groundqa")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory relative paths in the configuration resolve against
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chunk, embed and upsert every supported document
    Index {
        #[arg(long)]
        docs: Option<PathBuf>,
        #[arg(long)]
        index: Option<PathBuf>,
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        chunk_size: Option<usize>,
        #[arg(long)]
        chunk_overlap: Option<usize>,
        #[arg(long)]
        batch_size: Option<usize>,
        /// Delete trailing chunks left over from a longer earlier version
        #[arg(long)]
        prune: bool,
    },

    /// Answer a question from the index
    Ask {
        question: String,
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
        /// Attach relevance and support scores
        #[arg(long)]
        eval: bool,
        /// Print the full response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Re-index, then answer every question in the question file and write a report
    Eval {
        #[arg(long)]
        questions: Option<PathBuf>,
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
        /// Use the index as it is
        #[arg(long)]
        no_reindex: bool,
    },

    /// Grid search over model, chunk size, overlap and k
    Sweep {
        /// Question file; the built-in pair is used when omitted
        #[arg(long)]
        questions: Option<PathBuf>,
        #[arg(long, value_delimiter = ',')]
        models: Option<Vec<String>>,
        #[arg(long, value_delimiter = ',')]
        chunk_sizes: Option<Vec<usize>>,
        #[arg(long, value_delimiter = ',')]
        chunk_overlaps: Option<Vec<usize>>,
        #[arg(long, value_delimiter = ',')]
        ks: Option<Vec<usize>>,
        /// Where per-configuration indexes are built
        #[arg(long)]
        work_dir: Option<PathBuf>,
    },

    /// Show stored chunk count and index location
    Stats,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Config::load()?.settings()?;
    let base = match cli.base_dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Index { docs, index, model, chunk_size, chunk_overlap, batch_size, prune } => {
            let mut options = IndexOptions::from(&settings.index);
            options.chunk_size = chunk_size.unwrap_or(options.chunk_size);
            options.chunk_overlap = chunk_overlap.unwrap_or(options.chunk_overlap);
            options.batch_size = batch_size.unwrap_or(options.batch_size);
            options.prune_stale |= prune;
            let docs = docs.unwrap_or_else(|| settings.index.docs_dir(&base));
            let index = index.unwrap_or_else(|| settings.index.index_dir(&base));
            let model = model.unwrap_or_else(|| settings.index.embed_model.clone());
            cmd_index(&docs, &index, &settings.index.table, &model, options)
        }
        Commands::Ask { question, top_k, eval, json } => cmd_ask(&settings, &base, &question, top_k, eval, json),
        Commands::Eval { questions, top_k, no_reindex } => cmd_eval(&settings, &base, questions, top_k, no_reindex),
        Commands::Sweep { questions, models, chunk_sizes, chunk_overlaps, ks, work_dir } => {
            let defaults = SweepSpace::default();
            let space = SweepSpace {
                embed_models: models.unwrap_or(defaults.embed_models),
                chunk_sizes: chunk_sizes.unwrap_or(defaults.chunk_sizes),
                chunk_overlaps: chunk_overlaps.unwrap_or(defaults.chunk_overlaps),
                ks: ks.unwrap_or(defaults.ks),
            };
            cmd_sweep(&settings, &base, questions, space, work_dir)
        }
        Commands::Stats => cmd_stats(&settings, &base),
    }
}

fn open_pipeline(settings: &Settings, base: &Path) -> Result<RagPipeline> {
    let embedder = shared_embedder(&settings.index.embed_model)?;
    let index: Arc<dyn VectorIndex> = Arc::new(LanceVectorIndex::open(&settings.index.index_dir(base), &settings.index.table)?);
    Ok(RagPipeline::new(embedder, index).with_query_settings(&settings.query))
}

fn cmd_index(docs: &Path, index: &Path, table: &str, model: &str, options: IndexOptions) -> Result<()> {
    let embedder = shared_embedder(model)?;
    let stats = build_index(docs, index, table, embedder.as_ref(), options)?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    if !stats.failures.is_empty() {
        tracing::warn!(failed = stats.failures.len(), "Some documents could not be indexed");
    }
    Ok(())
}

fn cmd_ask(settings: &Settings, base: &Path, question: &str, top_k: Option<usize>, eval: bool, json: bool) -> Result<()> {
    let pipeline = open_pipeline(settings, base)?;
    let res = pipeline.ask(question, top_k.unwrap_or(settings.query.top_k), eval)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&res)?);
        return Ok(());
    }
    println!("{}\n", res.answer);
    for s in &res.sources {
        println!("  [{}] {} #{} (distance {:.3})", s.id, s.source, s.chunk_index, s.distance);
    }
    if let Some(e) = res.eval {
        println!("\nrelevance {:.3}{}  support {:.3}{}", e.relevance, if e.low_relevance { " (low)" } else { "" }, e.support_rate, if e.low_support { " (low)" } else { "" });
    }
    Ok(())
}

fn cmd_eval(settings: &Settings, base: &Path, questions: Option<PathBuf>, top_k: Option<usize>, no_reindex: bool) -> Result<()> {
    if !no_reindex {
        let embedder = shared_embedder(&settings.index.embed_model)?;
        build_index(&settings.index.docs_dir(base), &settings.index.index_dir(base), &settings.index.table, embedder.as_ref(), IndexOptions::from(&settings.index))?;
    }
    let pipeline = open_pipeline(settings, base)?;
    let questions = questions.unwrap_or_else(|| settings.eval.questions_file(base));
    let (rows, report) = run_eval(&pipeline, &questions, top_k.unwrap_or(settings.query.top_k), &settings.eval.reports_dir(base))?;
    for row in &rows {
        println!("{:.3}  {:.3}  {}", row.support_rate, row.relevance, row.question);
    }
    println!("wrote {}", report.display());
    Ok(())
}

fn cmd_sweep(settings: &Settings, base: &Path, questions: Option<PathBuf>, space: SweepSpace, work_dir: Option<PathBuf>) -> Result<()> {
    let questions = match questions {
        Some(path) => load_questions(&path)?,
        None => DEFAULT_SWEEP_QUESTIONS.iter().map(|q| q.to_string()).collect(),
    };
    let docs = settings.index.docs_dir(base);
    let work_dir = work_dir.unwrap_or_else(|| settings.index.index_dir(base).join("sweep"));
    let sweep = Sweep { docs_dir: &docs, work_dir: &work_dir, table: &settings.index.table, batch_size: settings.index.batch_size, questions };
    let rows = sweep.run(&space, shared_embedder)?;
    for r in &rows {
        println!("{:.3}  {} cs={} co={} k={}", r.composite_score, r.embed_model, r.chunk_size, r.chunk_overlap, r.k);
    }
    let report = write_report(&settings.eval.reports_dir(base), "sweep", &rows)?;
    println!("wrote {}", report.display());
    Ok(())
}

fn cmd_stats(settings: &Settings, base: &Path) -> Result<()> {
    let dir = settings.index.index_dir(base);
    let index = LanceVectorIndex::open(&dir, &settings.index.table)?;
    let stats = serde_json::json!({
        "table": index.table_name(),
        "chunks": index.count()?,
        "path": index.location().display().to_string(),
    });
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
