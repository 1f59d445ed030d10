// src/scoring/mod.rs
pub mod profile;
pub mod scorer;

pub use profile::{ScoreRecord, SentimentProfile, OUTPUT_FIELDS};
pub use scorer::{prepare_for_scoring, score, ScoringOptions};
