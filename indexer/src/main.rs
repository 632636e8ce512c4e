use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use jobrec_core::persist::{load_index, save_index};
use jobrec_core::{recommend, IndexHeader, JobIndex, Language, VectorizerConfig};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};

mod corpus;

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build, inspect and query the job recommendation index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit a new index from JSON/JSONL postings and atomically replace the artifact
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: PathBuf,
        /// Index artifact to write
        #[arg(long, default_value = "./index/jobs.idx")]
        output: PathBuf,
        #[command(flatten)]
        weighting: WeightingArgs,
    },
    /// Print the header and vectorizer settings of an index as JSON
    Inspect {
        #[arg(long, default_value = "./index/jobs.idx")]
        index: PathBuf,
    },
    /// Recommend postings for a free-text query, one JSON object per line
    Query {
        #[arg(long, default_value = "./index/jobs.idx")]
        index: PathBuf,
        /// Free-text query, e.g. "data engineer paris"
        #[arg(long)]
        q: String,
        #[arg(long, default_value_t = 5)]
        top_n: usize,
    },
}

#[derive(clap::Args)]
struct WeightingArgs {
    /// Stop-word list and stemmer language (french, english)
    #[arg(long, default_value = "french")]
    language: Language,
    /// Extra stop word, repeatable
    #[arg(long = "stop-word")]
    stop_words: Vec<String>,
    /// Apply the Snowball stemmer
    #[arg(long, default_value_t = false)]
    stem: bool,
    /// Use 1 + ln(tf) instead of raw term counts
    #[arg(long, default_value_t = false)]
    sublinear_tf: bool,
    /// Use ln(N/df) + 1 instead of the add-one smoothed IDF
    #[arg(long, default_value_t = false)]
    no_smooth_idf: bool,
    /// Keep raw TF-IDF rows instead of L2-normalizing them
    #[arg(long, default_value_t = false)]
    no_normalize: bool,
    /// Ignore terms present in fewer postings than this
    #[arg(long, default_value_t = 1)]
    min_df: u32,
    /// Keep only the most frequent terms
    #[arg(long)]
    max_features: Option<usize>,
}

impl From<WeightingArgs> for VectorizerConfig {
    fn from(a: WeightingArgs) -> Self {
        VectorizerConfig {
            language: a.language,
            extra_stop_words: a.stop_words,
            stem: a.stem,
            sublinear_tf: a.sublinear_tf,
            smooth_idf: !a.no_smooth_idf,
            normalize: !a.no_normalize,
            min_df: a.min_df.max(1),
            max_features: a.max_features,
        }
    }
}

#[derive(Serialize)]
struct InspectReport<'a> {
    header: &'a IndexHeader,
    config: &'a VectorizerConfig,
    num_docs_fitted: u32,
    non_zero_weights: usize,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, weighting } => build(&input, &output, weighting.into()),
        Commands::Inspect { index } => inspect(&index),
        Commands::Query { index, q, top_n } => query(&index, &q, top_n),
    }
}

/// Loader, vectorizer, persistence. Nothing is written unless every step
/// before the final rename succeeds.
fn build(input: &Path, output: &Path, config: VectorizerConfig) -> Result<()> {
    let postings = corpus::load_corpus(input).with_context(|| format!("loading corpus from {}", input.display()))?;
    let index = JobIndex::build(config, postings).context("fitting index")?;
    save_index(output, &index)?;
    tracing::info!(output = %output.display(), num_postings = index.len(), num_terms = index.dims(), "index build complete");
    Ok(())
}

fn inspect(path: &Path) -> Result<()> {
    let index = load_index(path)?;
    let report = InspectReport {
        header: &index.header,
        config: &index.vectorizer.config,
        num_docs_fitted: index.vectorizer.num_docs,
        non_zero_weights: index.matrix.rows.iter().map(|r| r.indices.len()).sum(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn query(path: &Path, q: &str, top_n: usize) -> Result<()> {
    let index = load_index(path)?;
    let recs = recommend(&index, q, top_n)?;
    if recs.iter().all(|r| r.score == 0.0) {
        tracing::warn!(query = q, "no vocabulary overlap; results are unranked");
    }
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for rec in &recs {
        writeln!(out, "{}", serde_json::to_string(rec)?)?;
    }
    Ok(())
}
