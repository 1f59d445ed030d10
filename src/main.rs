// src/main.rs
use clap::{Args, Parser, Subcommand};
use mda_sentiment::extractors::section::{DEFAULT_MAX_RETRIES, DEFAULT_MIN_SECTION_BYTES};
use mda_sentiment::lexicon::Lexicon;
use mda_sentiment::pipeline::{self, BatchOptions};
use mda_sentiment::storage::{StorageManager, SECTION_EXTENSION};
use mda_sentiment::utils::{self, AppError};
use mda_sentiment::{ExtractorConfig, SectionExtractor, SectionMarkers, ScoringOptions};
use std::path::{Path, PathBuf};

/// Command Line Interface for MD&A extraction and sentiment scoring
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Worker threads (default: available cores, at most 8)
    #[arg(short, long, global = true, env = "MDA_JOBS")]
    jobs: Option<usize>,

    /// Debug-level logging when RUST_LOG is not set
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Flatten and normalize raw filings (.htm, .html, .txt) into text files
    Prepare {
        /// Directory of downloaded filings
        #[arg(long, default_value = "./raw")]
        raw_dir: PathBuf,

        /// Output directory for normalized text
        #[arg(long, default_value = "./txt")]
        txt_dir: PathBuf,
    },
    /// Extract MD&A sections from normalized text files
    Extract(ExtractArgs),
    /// Score documents against the master dictionary
    Score(ScoreArgs),
    /// Extract MD&A sections, then score them
    Run {
        #[command(flatten)]
        extract: ExtractArgs,

        #[command(flatten)]
        dictionary: DictionaryArgs,
    },
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// Directory of normalized .txt filings
    #[arg(long, default_value = "./txt")]
    txt_dir: PathBuf,

    /// Output directory for extracted .mda sections
    #[arg(long, default_value = "./mda")]
    mda_dir: PathBuf,

    /// Minimum section size in bytes before retrying past a short match
    #[arg(long, env = "MIN_SECTION_SIZE", default_value_t = DEFAULT_MIN_SECTION_BYTES)]
    min_section_size: usize,

    /// Extra extraction attempts after a short match
    #[arg(long, default_value_t = DEFAULT_MAX_RETRIES)]
    max_retries: usize,

    /// JSON file overriding the start/end section markers
    #[arg(long)]
    markers: Option<PathBuf>,

    /// Debug mode - save annotated marker reports next to the sections
    #[arg(short, long)]
    debug: bool,
}

#[derive(Args, Debug)]
struct ScoreArgs {
    /// Directory of documents to score
    #[arg(long, default_value = "./mda")]
    input_dir: PathBuf,

    /// Extension of the documents to score
    #[arg(long, default_value = "mda")]
    extension: String,

    #[command(flatten)]
    dictionary: DictionaryArgs,
}

#[derive(Args, Debug)]
struct DictionaryArgs {
    /// Loughran-McDonald master dictionary CSV
    #[arg(long, env = "MASTER_DICTIONARY", default_value = "./LoughranMcDonald_MasterDictionary_2014.csv")]
    dictionary: PathBuf,

    /// Output CSV for score rows
    #[arg(short, long, default_value = "./result.csv")]
    output: PathBuf,

    /// Keep "MAY" tokens instead of blanking them before scoring
    #[arg(long)]
    keep_may: bool,
}

fn main() -> Result<(), AppError> {
    let cli = Cli::parse();

    // 1. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging(cli.verbose);
    tracing::info!("Starting processing for args: {:?}", cli);

    let options = BatchOptions {
        jobs: cli.jobs.unwrap_or_else(pipeline::default_jobs),
        debug: false,
    };

    match cli.command {
        Command::Prepare { raw_dir, txt_dir } => {
            let storage = StorageManager::new(&txt_dir)?;
            let summary = pipeline::prepare_directory(&raw_dir, &storage, &options)?;
            tracing::info!("Prepared {} of {} filings", summary.succeeded, summary.documents);
            Ok(())
        }
        Command::Extract(args) => run_extract(&args, &options),
        Command::Score(args) => run_score(&args.input_dir, &args.extension, &args.dictionary, &options),
        Command::Run { extract, dictionary } => {
            // Load the dictionary first so a corrupt file fails before any extraction work
            let lexicon = Lexicon::load(&dictionary.dictionary)?;
            run_extract(&extract, &options)?;
            score_with(&lexicon, &extract.mda_dir, SECTION_EXTENSION, &dictionary, &options)
        }
    }
}

fn run_extract(args: &ExtractArgs, options: &BatchOptions) -> Result<(), AppError> {
    let markers = match &args.markers {
        Some(path) => SectionMarkers::from_json_file(path)?,
        None => SectionMarkers::mda(),
    };
    let config = ExtractorConfig {
        min_section_bytes: args.min_section_size,
        max_retries: args.max_retries,
    };
    tracing::debug!("Extractor config: {:?}", config);
    let extractor = SectionExtractor::new(markers, config);

    let storage = StorageManager::new(&args.mda_dir)?;
    let options = BatchOptions { debug: args.debug, ..*options };
    let (_, summary) = pipeline::extract_directory(&args.txt_dir, &storage, &extractor, &options)?;

    tracing::info!(
        "Processing finished. Success: {}, Failures: {}, Retried: {}",
        summary.succeeded,
        summary.failed,
        summary.retried
    );

    if summary.succeeded == 0 && summary.failed > 0 {
        return Err(AppError::Processing(format!(
            "Failed to extract any MD&A sections from {} documents",
            summary.failed
        )));
    }
    Ok(())
}

fn run_score(input_dir: &Path, extension: &str, args: &DictionaryArgs, options: &BatchOptions) -> Result<(), AppError> {
    let lexicon = Lexicon::load(&args.dictionary)?;
    score_with(&lexicon, input_dir, extension, args, options)
}

fn score_with(
    lexicon: &Lexicon,
    input_dir: &Path,
    extension: &str,
    args: &DictionaryArgs,
    options: &BatchOptions,
) -> Result<(), AppError> {
    let scoring = ScoringOptions { drop_may: !args.keep_may };
    let records = pipeline::score_directory(input_dir, extension, lexicon, &scoring, options)?;

    let parent = args
        .output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = args
        .output
        .file_name()
        .ok_or_else(|| AppError::Config(format!("Invalid output path: {}", args.output.display())))?;

    let storage = StorageManager::new(parent)?;
    let path = storage.save_scores(file_name, &records)?;
    tracing::info!("Scored {} documents, results in {}", records.len(), path.display());
    Ok(())
}
