// src/pipeline/mod.rs

//! Directory-level batch drivers. Documents are processed independently on a
//! rayon pool; a failing document is logged and counted, never fatal.

use crate::extractors::section::{ExtractedSection, SectionExtractor};
use crate::lexicon::Lexicon;
use crate::prepare::prepare_filing;
use crate::scoring::{prepare_for_scoring, score, ScoreRecord, ScoringOptions};
use crate::storage::{StorageManager, SECTION_EXTENSION};
use crate::utils::error::AppError;
use crate::utils::marker_debug;
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Upper bound on worker threads when none is configured.
pub const MAX_DEFAULT_JOBS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParseStatus {
    Success,
    NotFound,
    WriteFailed,
}

impl ParseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseStatus::Success => "SUCCESS",
            ParseStatus::NotFound => "MDA NOT FOUND",
            ParseStatus::WriteFailed => "WRITE FAILED",
        }
    }
}

/// Per-document result of the extraction stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseOutcome {
    pub file_name: String,
    pub status: ParseStatus,
    pub section_bytes: usize,
    /// Whether the reported section came from a retry past a short match.
    pub retried: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub stage: String,
    pub documents: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub retried: usize,
    pub elapsed_seconds: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    pub jobs: usize,
    /// Write an annotated marker report next to each extracted section.
    pub debug: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self { jobs: default_jobs(), debug: false }
    }
}

/// Available cores, capped at [`MAX_DEFAULT_JOBS`].
pub fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(MAX_DEFAULT_JOBS)
}

fn build_pool(jobs: usize) -> Result<rayon::ThreadPool, AppError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(jobs.max(1))
        .build()
        .map_err(|e| AppError::Config(format!("Failed to build worker pool: {}", e)))
}

/// Files directly inside `dir` with the given extension, sorted by name.
pub fn list_documents(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, AppError> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && has_extension(&path, extension) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Raw file contents. Unreadable files yield no bytes.
pub fn read_document_bytes(path: &Path) -> Vec<u8> {
    fs::read(path).unwrap_or_else(|e| {
        tracing::warn!("Could not read {}: {}; treating as empty", path.display(), e);
        Vec::new()
    })
}

/// Reads a document, replacing invalid UTF-8. Unreadable files yield empty text.
pub fn read_document(path: &Path) -> String {
    String::from_utf8_lossy(&read_document_bytes(path)).into_owned()
}

fn same_directory(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

/// File stem used as the document name in outputs.
pub fn document_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// The filer code (CIK) leading a `<cik>_<rest>` document name.
pub fn filer_id_from_name(name: &str) -> &str {
    name.split('_').next().unwrap_or(name)
}

fn summarize(stage: &str, outcomes: impl Iterator<Item = (bool, bool)>, started: Instant) -> RunSummary {
    let mut summary = RunSummary {
        stage: stage.to_string(),
        documents: 0,
        succeeded: 0,
        failed: 0,
        retried: 0,
        elapsed_seconds: 0.0,
    };
    for (ok, retried) in outcomes {
        summary.documents += 1;
        if ok {
            summary.succeeded += 1;
        } else {
            summary.failed += 1;
        }
        if retried {
            summary.retried += 1;
        }
    }
    summary.elapsed_seconds = started.elapsed().as_secs_f64();
    summary
}

// --- Preparation stage ---

/// Converts every raw filing (`.htm`, `.html`, `.txt`) in `raw_dir` to
/// normalized text under `storage`. Existing outputs are skipped. When both
/// are the same directory only `.htm`/`.html` filings are read, since any
/// `.txt` there may be a prepared output.
pub fn prepare_directory(
    raw_dir: &Path,
    storage: &StorageManager,
    options: &BatchOptions,
) -> Result<RunSummary, AppError> {
    let started = Instant::now();
    let mut paths = Vec::new();
    for extension in ["htm", "html", "txt"] {
        paths.extend(list_documents(raw_dir, extension)?);
    }
    if same_directory(raw_dir, storage.base_dir()) {
        paths.retain(|p| !has_extension(p, "txt"));
    }
    tracing::info!("Preparing {} filings from {}", paths.len(), raw_dir.display());

    let pool = build_pool(options.jobs)?;
    let results: Vec<bool> = pool.install(|| {
        paths
            .par_iter()
            .map(|path| {
                let target = storage.base_dir().join(format!("{}.txt", document_name(path)));
                if target.exists() {
                    tracing::info!("Already exists, skipping {}", path.display());
                    return true;
                }
                let text = prepare_filing(&read_document(path));
                match fs::write(&target, text) {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::error!("Failed to write {}: {}", target.display(), e);
                        false
                    }
                }
            })
            .collect()
    });

    let summary = summarize("prepare", results.into_iter().map(|ok| (ok, false)), started);
    storage.save_run_summary(&summary)?;
    Ok(summary)
}

// --- Extraction stage ---

/// Extracts the MD&A section of one normalized document and saves it.
pub fn extract_document(extractor: &SectionExtractor, path: &Path, storage: &StorageManager, debug: bool) -> ParseOutcome {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = document_name(path);
    tracing::info!("Parsing: {}", file_name);

    let text = read_document(path);
    let found = extractor.extract_with_retry(&text);
    let retried = found.retried;

    if debug {
        let report_path = storage.base_dir().join(format!("{}.markers.html", name));
        if let Err(e) = marker_debug::save_marker_report(&text, &report_path, extractor.markers(), &found) {
            tracing::warn!("Failed to create marker report for {}: {}", name, e);
        }
    }

    if !found.found {
        tracing::warn!("{},{}", name, ParseStatus::NotFound.as_str());
        return ParseOutcome { file_name, status: ParseStatus::NotFound, section_bytes: 0, retried: false };
    }

    let section_bytes = found.byte_len();
    let section = ExtractedSection::new(&name, found);
    let status = match storage.save_section(&section) {
        Ok(_) => ParseStatus::Success,
        Err(e) => {
            tracing::error!("Failed to save section for {}: {}", name, e);
            ParseStatus::WriteFailed
        }
    };
    tracing::info!("{},{} ({} bytes)", name, status.as_str(), section_bytes);

    ParseOutcome { file_name, status, section_bytes, retried }
}

/// Extracts MD&A sections from every `.txt` document in `txt_dir`.
pub fn extract_directory(
    txt_dir: &Path,
    storage: &StorageManager,
    extractor: &SectionExtractor,
    options: &BatchOptions,
) -> Result<(Vec<ParseOutcome>, RunSummary), AppError> {
    let started = Instant::now();
    let paths = list_documents(txt_dir, "txt")?;
    tracing::info!("Extracting MD&A from {} documents in {}", paths.len(), txt_dir.display());

    let pool = build_pool(options.jobs)?;
    let outcomes: Vec<ParseOutcome> = pool.install(|| {
        paths
            .par_iter()
            .map(|path| extract_document(extractor, path, storage, options.debug))
            .collect()
    });

    let summary = summarize(
        "extract",
        outcomes.iter().map(|o| (o.status == ParseStatus::Success, o.retried)),
        started,
    );
    tracing::info!("MDA parsing time taken: {:.2} seconds.", summary.elapsed_seconds);
    tracing::info!("Number of failed text: {}", summary.failed);

    storage.save_parsing_log(&outcomes)?;
    storage.save_run_summary(&summary)?;
    Ok((outcomes, summary))
}

// --- Scoring stage ---

/// Scores one document. Byte size is measured on the raw file contents.
pub fn score_document(path: &Path, lexicon: &Lexicon, options: &ScoringOptions) -> ScoreRecord {
    let bytes = read_document_bytes(path);
    let raw = String::from_utf8_lossy(&bytes);
    let document = document_name(path);
    let profile = score(&prepare_for_scoring(&raw, options), lexicon);
    tracing::debug!("Scored {}: {} dictionary words", document, profile.word_count);

    ScoreRecord {
        filer_id: filer_id_from_name(&document).to_string(),
        document,
        byte_size: bytes.len(),
        profile,
    }
}

/// Scores every section file in `dir` and returns the rows sorted by document.
pub fn score_directory(
    dir: &Path,
    extension: &str,
    lexicon: &Lexicon,
    scoring: &ScoringOptions,
    options: &BatchOptions,
) -> Result<Vec<ScoreRecord>, AppError> {
    let paths = list_documents(dir, extension)?;
    tracing::info!("Scoring {} documents in {}", paths.len(), dir.display());

    let pool = build_pool(options.jobs)?;
    let mut records: Vec<ScoreRecord> = pool.install(|| {
        paths
            .par_iter()
            .map(|path| score_document(path, lexicon, scoring))
            .collect()
    });
    records.sort_by(|a, b| a.document.cmp(&b.document));
    Ok(records)
}

/// Scores extracted sections using the default `.mda` extension.
pub fn score_sections(
    mda_dir: &Path,
    lexicon: &Lexicon,
    scoring: &ScoringOptions,
    options: &BatchOptions,
) -> Result<Vec<ScoreRecord>, AppError> {
    score_directory(mda_dir, SECTION_EXTENSION, lexicon, scoring, options)
}
