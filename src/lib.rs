// src/lib.rs
//! MD&A extraction and Loughran-McDonald dictionary scoring for 10-K filings.
//!
//! The two engines, [`extractors::SectionExtractor`] and [`scoring::score`],
//! are pure over their inputs. The [`lexicon::Lexicon`] is loaded once and
//! shared read-only across workers.

pub mod extractors;
pub mod lexicon;
pub mod pipeline;
pub mod prepare;
pub mod scoring;
pub mod storage;
pub mod utils;

pub use extractors::{ExtractorConfig, SectionExtractor, SectionMarkers, SectionMatch};
pub use lexicon::{Category, Lexicon, WordEntry};
pub use scoring::{prepare_for_scoring, score, ScoreRecord, ScoringOptions, SentimentProfile};
pub use utils::AppError;
