// src/utils/error.rs
use thiserror::Error;

// Define specific error types for different parts of the application
#[derive(Error, Debug)]
pub enum LexiconError {
    #[error("I/O error reading dictionary: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed dictionary file: {0}")]
    Csv(#[from] csv::Error), // Reader-level failures (bad quoting, invalid UTF-8)

    #[error("Dictionary line {line}: expected {expected} fields, found {found}")]
    FieldCount {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("Dictionary line {line}: field '{field}' has invalid value '{value}'")]
    InvalidField {
        line: u64,
        field: &'static str,
        value: String,
    },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("Dictionary load failed: {0}")]
    Lexicon(#[from] LexiconError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Data processing failed: {0}")]
    Processing(String),
}
