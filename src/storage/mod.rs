// src/storage/mod.rs
use crate::extractors::section::ExtractedSection;
use crate::pipeline::{ParseOutcome, RunSummary};
use crate::scoring::{ScoreRecord, OUTPUT_FIELDS};
use crate::utils::error::StorageError;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Extension given to extracted MD&A files.
pub const SECTION_EXTENSION: &str = "mda";
pub const PARSING_LOG_NAME: &str = "parsing.log";
pub const RUN_SUMMARY_NAME: &str = "run_summary.json";

pub struct StorageManager {
    base_dir: PathBuf,
}

impl StorageManager {
    /// Creates a new StorageManager with the specified base directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        // Create the base directory if it doesn't exist
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(StorageError::IoError)?;
        }

        Ok(Self { base_dir: base_path })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Path an extracted section for `document_name` is written to.
    pub fn section_path(&self, document_name: &str) -> PathBuf {
        self.base_dir.join(format!("{}.{}", document_name, SECTION_EXTENSION))
    }

    /// Saves the extracted section text as `<document>.mda`
    pub fn save_section(&self, section: &ExtractedSection) -> Result<PathBuf, StorageError> {
        let file_path = self.section_path(&section.document_name);

        let mut file = fs::File::create(&file_path).map_err(StorageError::IoError)?;
        file.write_all(section.content.as_bytes()).map_err(StorageError::IoError)?;

        tracing::debug!("Saved {} to {}", section.section_name, file_path.display());

        Ok(file_path)
    }

    /// Writes one `<file>,<status>` line per parsed document.
    pub fn save_parsing_log(&self, outcomes: &[ParseOutcome]) -> Result<PathBuf, StorageError> {
        let file_path = self.base_dir.join(PARSING_LOG_NAME);
        let mut file = fs::File::create(&file_path).map_err(StorageError::IoError)?;
        for outcome in outcomes {
            writeln!(file, "{},{}", outcome.file_name, outcome.status.as_str())
                .map_err(StorageError::IoError)?;
        }
        tracing::info!("Writing parsing results to {}", file_path.display());
        Ok(file_path)
    }

    /// Writes the score CSV with its header row.
    pub fn save_scores<P: AsRef<Path>>(&self, path: P, records: &[ScoreRecord]) -> Result<PathBuf, StorageError> {
        let file_path = self.resolve(path.as_ref());
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_path(&file_path)?;

        writer.write_record(OUTPUT_FIELDS)?;
        for record in records {
            writer.write_record(record.to_csv_fields())?;
        }
        writer.flush().map_err(StorageError::IoError)?;

        tracing::info!("Saved {} score rows to {}", records.len(), file_path.display());
        Ok(file_path)
    }

    /// Saves the batch summary in JSON format
    pub fn save_run_summary(&self, summary: &RunSummary) -> Result<PathBuf, StorageError> {
        let file_path = self.base_dir.join(RUN_SUMMARY_NAME);

        let metadata = serde_json::json!({
            "stage": summary.stage,
            "documents": summary.documents,
            "succeeded": summary.succeeded,
            "failed": summary.failed,
            "retried": summary.retried,
            "elapsed_seconds": summary.elapsed_seconds,
            "completed_at": chrono::Utc::now().to_rfc3339(),
        });

        let metadata_str = serde_json::to_string_pretty(&metadata)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        fs::write(&file_path, metadata_str).map_err(StorageError::IoError)?;

        tracing::info!("Saved run summary to {}", file_path.display());

        Ok(file_path)
    }

    // Relative paths land under the base directory
    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::SectionMatch;
    use crate::pipeline::ParseStatus;
    use crate::scoring::SentimentProfile;

    #[test]
    fn test_creates_base_dir_and_saves_section() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageManager::new(dir.path().join("mda")).unwrap();
        assert!(storage.base_dir().is_dir());

        let found = SectionMatch {
            text: "ITEM 7. MD&A".to_string(),
            begin: 3,
            end_offset: 20,
            found: true,
            retried: false,
        };
        let section = ExtractedSection::new("0000320193_10K_2019", found);
        let path = storage.save_section(&section).unwrap();

        assert_eq!(path.file_name().unwrap(), "0000320193_10K_2019.mda");
        assert_eq!(fs::read_to_string(path).unwrap(), "ITEM 7. MD&A");
    }

    #[test]
    fn test_parsing_log_lines() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageManager::new(dir.path()).unwrap();
        let outcomes = vec![
            ParseOutcome {
                file_name: "a.txt".to_string(),
                status: ParseStatus::Success,
                section_bytes: 1200,
                retried: false,
            },
            ParseOutcome {
                file_name: "b.txt".to_string(),
                status: ParseStatus::NotFound,
                section_bytes: 0,
                retried: false,
            },
        ];
        let path = storage.save_parsing_log(&outcomes).unwrap();
        assert_eq!(
            fs::read_to_string(path).unwrap(),
            "a.txt,SUCCESS\nb.txt,MDA NOT FOUND\n"
        );
    }

    #[test]
    fn test_scores_csv_has_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageManager::new(dir.path()).unwrap();
        let record = ScoreRecord {
            document: "123_10K".to_string(),
            byte_size: 10,
            profile: SentimentProfile {
                word_count: 0,
                category_counts: [0; 8],
                category_percentages: [0.0; 8],
                alpha_count: 0,
                digit_count: 0,
                number_count: 0,
                avg_syllables: 0.0,
                avg_word_length: 0.0,
                vocabulary_size: 0,
            },
            filer_id: "123".to_string(),
        };

        let path = storage.save_scores("result.csv", &[record]).unwrap();
        let content = fs::read_to_string(path).unwrap();
        let mut lines = content.lines();
        assert!(lines.next().unwrap().starts_with("filename,file size,number of words,% positive"));
        assert_eq!(
            lines.next().unwrap(),
            "123_10K,10,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,123"
        );
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_run_summary_is_json() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageManager::new(dir.path()).unwrap();
        let summary = RunSummary {
            stage: "extract".to_string(),
            documents: 3,
            succeeded: 2,
            failed: 1,
            retried: 1,
            elapsed_seconds: 0.5,
        };
        let path = storage.save_run_summary(&summary).unwrap();
        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(value["succeeded"], 2);
        assert_eq!(value["stage"], "extract");
        assert!(value["completed_at"].is_string());
    }
}
