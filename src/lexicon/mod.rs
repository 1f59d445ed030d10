// src/lexicon/mod.rs

//! Loughran-McDonald style master dictionary.
//!
//! The dictionary is loaded once from a 19-column CSV file and is immutable
//! afterwards. Batch workers share it by reference.

mod stopwords;

use crate::utils::error::LexiconError;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

pub use stopwords::{is_stopword, STOPWORDS};

/// Number of columns every dictionary row must carry.
pub const DICTIONARY_FIELD_COUNT: usize = 19;

const PROGRESS_INTERVAL: usize = 5_000;

// Column positions in the master dictionary
const COL_WORD: usize = 0;
const COL_SEQUENCE: usize = 1;
const COL_WORD_COUNT: usize = 2;
const COL_WORD_PROPORTION: usize = 3;
const COL_AVERAGE_PROPORTION: usize = 4;
const COL_STD_DEV_PROPORTION: usize = 5;
const COL_DOC_COUNT: usize = 6;
const COL_NEGATIVE: usize = 7;
const COL_POSITIVE: usize = 8;
const COL_UNCERTAINTY: usize = 9;
const COL_LITIGIOUS: usize = 10;
const COL_CONSTRAINING: usize = 11;
const COL_SUPERFLUOUS: usize = 12;
const COL_INTERESTING: usize = 13;
const COL_MODAL: usize = 14;
const COL_IRREGULAR_VERB: usize = 15;
const COL_HARVARD_IV: usize = 16;
const COL_SYLLABLES: usize = 17;
const COL_SOURCE: usize = 18;

/// The eight sentiment categories reported per document, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Positive,
    Negative,
    Uncertainty,
    Litigious,
    WeakModal,
    ModerateModal,
    StrongModal,
    Constraining,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Positive,
        Category::Negative,
        Category::Uncertainty,
        Category::Litigious,
        Category::WeakModal,
        Category::ModerateModal,
        Category::StrongModal,
        Category::Constraining,
    ];

    /// Position of this category in [`Category::ALL`] and in per-category count arrays.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Category::Positive => "positive",
            Category::Negative => "negative",
            Category::Uncertainty => "uncertainty",
            Category::Litigious => "litigious",
            Category::WeakModal => "weak_modal",
            Category::ModerateModal => "moderate_modal",
            Category::StrongModal => "strong_modal",
            Category::Constraining => "constraining",
        }
    }
}

/// Modal strength encoded in the dictionary's single modal column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModalCategory {
    #[default]
    None,
    Strong,
    Moderate,
    Weak,
}

impl ModalCategory {
    /// 1 is strong, 2 moderate, 3 weak; anything else carries no modal flag.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => ModalCategory::Strong,
            2 => ModalCategory::Moderate,
            3 => ModalCategory::Weak,
            _ => ModalCategory::None,
        }
    }
}

/// One dictionary row after normalization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordEntry {
    pub word: String,
    pub sequence_number: u64,
    /// Occurrences of the word in the dictionary's source corpus.
    pub corpus_count: u64,
    /// Number of corpus documents containing the word.
    pub doc_count: u64,
    pub negative: bool,
    pub positive: bool,
    pub uncertainty: bool,
    pub litigious: bool,
    pub constraining: bool,
    pub superfluous: bool,
    pub interesting: bool,
    pub modal: ModalCategory,
    pub irregular_verb: bool,
    pub harvard_iv: bool,
    pub syllables: u32,
    pub source: String,
    pub is_stopword: bool,
}

impl WordEntry {
    /// Builds an entry with every flag cleared; the word is upper-cased.
    pub fn new(word: &str, syllables: u32) -> Self {
        let word = word.to_uppercase();
        let is_stopword = is_stopword(&word);
        Self {
            word,
            sequence_number: 0,
            corpus_count: 0,
            doc_count: 0,
            negative: false,
            positive: false,
            uncertainty: false,
            litigious: false,
            constraining: false,
            superfluous: false,
            interesting: false,
            modal: ModalCategory::None,
            irregular_verb: false,
            harvard_iv: false,
            syllables,
            source: String::new(),
            is_stopword,
        }
    }

    pub fn strong_modal(&self) -> bool {
        self.modal == ModalCategory::Strong
    }

    pub fn moderate_modal(&self) -> bool {
        self.modal == ModalCategory::Moderate
    }

    pub fn weak_modal(&self) -> bool {
        self.modal == ModalCategory::Weak
    }

    /// Whether this entry belongs to `category`. Categories overlap freely
    /// except the three modal ones.
    pub fn has(&self, category: Category) -> bool {
        match category {
            Category::Positive => self.positive,
            Category::Negative => self.negative,
            Category::Uncertainty => self.uncertainty,
            Category::Litigious => self.litigious,
            Category::WeakModal => self.weak_modal(),
            Category::ModerateModal => self.moderate_modal(),
            Category::StrongModal => self.strong_modal(),
            Category::Constraining => self.constraining,
        }
    }

    fn from_record(record: &csv::StringRecord, line: u64) -> Result<Self, LexiconError> {
        if record.len() != DICTIONARY_FIELD_COUNT {
            return Err(LexiconError::FieldCount {
                line,
                expected: DICTIONARY_FIELD_COUNT,
                found: record.len(),
            });
        }

        // Proportion statistics are validated but not retained.
        parse_field::<f64>(record, COL_WORD_PROPORTION, "word_proportion", line)?;
        parse_field::<f64>(record, COL_AVERAGE_PROPORTION, "average_proportion", line)?;
        parse_field::<f64>(record, COL_STD_DEV_PROPORTION, "std_dev_proportion", line)?;

        let mut entry = WordEntry::new(&record[COL_WORD], 0);
        entry.sequence_number = parse_field(record, COL_SEQUENCE, "sequence_number", line)?;
        entry.corpus_count = parse_field(record, COL_WORD_COUNT, "word_count", line)?;
        entry.doc_count = parse_field(record, COL_DOC_COUNT, "doc_count", line)?;
        entry.negative = parse_flag(record, COL_NEGATIVE, "negative", line)?;
        entry.positive = parse_flag(record, COL_POSITIVE, "positive", line)?;
        entry.uncertainty = parse_flag(record, COL_UNCERTAINTY, "uncertainty", line)?;
        entry.litigious = parse_flag(record, COL_LITIGIOUS, "litigious", line)?;
        entry.constraining = parse_flag(record, COL_CONSTRAINING, "constraining", line)?;
        entry.superfluous = parse_flag(record, COL_SUPERFLUOUS, "superfluous", line)?;
        entry.interesting = parse_flag(record, COL_INTERESTING, "interesting", line)?;
        entry.modal = ModalCategory::from_code(parse_field(record, COL_MODAL, "modal", line)?);
        entry.irregular_verb = parse_flag(record, COL_IRREGULAR_VERB, "irregular_verb", line)?;
        entry.harvard_iv = parse_flag(record, COL_HARVARD_IV, "harvard_iv", line)?;
        entry.syllables = parse_field(record, COL_SYLLABLES, "syllables", line)?;
        entry.source = record[COL_SOURCE].to_string();
        Ok(entry)
    }
}

fn parse_field<T: FromStr>(
    record: &csv::StringRecord,
    index: usize,
    field: &'static str,
    line: u64,
) -> Result<T, LexiconError> {
    let raw = &record[index];
    raw.parse::<T>().map_err(|_| LexiconError::InvalidField {
        line,
        field,
        value: raw.to_string(),
    })
}

/// Flag columns hold the year a word entered the category (negative when it
/// was later removed); any non-zero value sets the flag.
fn parse_flag(
    record: &csv::StringRecord,
    index: usize,
    field: &'static str,
    line: u64,
) -> Result<bool, LexiconError> {
    parse_field::<i64>(record, index, field, line).map(|v| v != 0)
}

/// Immutable word table keyed by upper-cased word.
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    entries: HashMap<String, WordEntry>,
    total_documents: u64,
}

impl Lexicon {
    /// Loads the master dictionary from a CSV file with one header row.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LexiconError> {
        let path = path.as_ref();
        tracing::info!("Loading master dictionary from {}", path.display());
        let file = File::open(path)?;
        let lexicon = Self::from_reader(file)?;
        tracing::info!(
            "{} words loaded in master dictionary from {}",
            lexicon.len(),
            path.display()
        );
        for category in Category::ALL {
            tracing::debug!("  {}: {} words", category.name(), lexicon.words_in(category).len());
        }
        Ok(lexicon)
    }

    /// Loads the dictionary from any reader. Any malformed row aborts the load.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, LexiconError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // Field counts are checked per row below
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut entries = HashMap::new();
        let mut total_documents = 0u64;

        for result in csv_reader.records() {
            let record = result?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            let entry = WordEntry::from_record(&record, line)?;

            total_documents = total_documents.saturating_add(entry.doc_count);
            if let Some(previous) = entries.insert(entry.word.clone(), entry) {
                tracing::warn!("Duplicate dictionary word '{}' on line {}; keeping the later row", previous.word, line);
            }

            if entries.len() % PROGRESS_INTERVAL == 0 {
                tracing::debug!("...Loading master dictionary {}", entries.len());
            }
        }

        Ok(Self { entries, total_documents })
    }

    /// Builds a lexicon from in-memory entries. Words are re-keyed upper-case.
    pub fn from_entries<I: IntoIterator<Item = WordEntry>>(entries: I) -> Self {
        let mut map = HashMap::new();
        let mut total_documents = 0u64;
        for mut entry in entries {
            entry.word = entry.word.to_uppercase();
            entry.is_stopword = is_stopword(&entry.word);
            total_documents = total_documents.saturating_add(entry.doc_count);
            map.insert(entry.word.clone(), entry);
        }
        Self { entries: map, total_documents }
    }

    pub fn get(&self, word: &str) -> Option<&WordEntry> {
        self.entries.get(word)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.entries.contains_key(word)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of the per-word document counts across the dictionary.
    pub fn total_documents(&self) -> u64 {
        self.total_documents
    }

    /// Sorted list of every word flagged with `category`.
    pub fn words_in(&self, category: Category) -> Vec<&str> {
        let mut words: Vec<&str> = self
            .entries
            .values()
            .filter(|entry| entry.has(category))
            .map(|entry| entry.word.as_str())
            .collect();
        words.sort_unstable();
        words
    }
}
