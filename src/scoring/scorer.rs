// src/scoring/scorer.rs

//! Dictionary-driven scoring of normalized text.

use super::profile::SentimentProfile;
use crate::lexicon::{Category, Lexicon};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashSet;

// \w+ splits hyphenated compounds into separate tokens
static WORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\w+").expect("Failed to compile WORD_RE")
});

// Tokens made only of decimal digits never count as words
static NUMERIC_TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d+$").expect("Failed to compile NUMERIC_TOKEN_RE")
});

// Optional sign, currency symbol or opening parenthesis, digits, optional closing parenthesis
static NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[-+(]?[$€£]?[-+(]?\d+\)?\b").expect("Failed to compile NUMBER_RE")
});

/// Token replaced before scoring so the month is not counted as the modal verb.
const MONTH_TOKEN: &str = "MAY";

/// Pre-normalization applied to raw text before [`score`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringOptions {
    /// Replace every occurrence of "MAY" with a space, regardless of context.
    pub drop_may: bool,
}

impl Default for ScoringOptions {
    fn default() -> Self {
        Self { drop_may: true }
    }
}

/// Upper-cases `raw` and applies the month bias correction when enabled.
///
/// The correction is crude on purpose: "MAYBE" becomes " BE" as well.
pub fn prepare_for_scoring(raw: &str, options: &ScoringOptions) -> String {
    let upper = raw.to_uppercase();
    if options.drop_may {
        upper.replace(MONTH_TOKEN, " ")
    } else {
        upper
    }
}

/// Scores normalized text against the lexicon.
///
/// Pure: identical text and lexicon always produce an identical profile.
pub fn score(text: &str, lexicon: &Lexicon) -> SentimentProfile {
    let mut word_count = 0usize;
    let mut category_counts = [0usize; 8];
    let mut total_syllables = 0u64;
    let mut total_chars = 0usize;
    let mut vocabulary: HashSet<Cow<'_, str>> = HashSet::new();

    for token in WORD_RE.find_iter(text).map(|m| m.as_str()) {
        let length = token.chars().count();
        if length <= 1 || NUMERIC_TOKEN_RE.is_match(token) {
            continue;
        }
        let key = normalize_token(token);
        let Some(entry) = lexicon.get(&key) else {
            continue;
        };

        word_count += 1;
        total_chars += length;
        total_syllables += u64::from(entry.syllables);
        for category in Category::ALL {
            if entry.has(category) {
                category_counts[category.index()] += 1;
            }
        }
        vocabulary.insert(key);
    }

    let alpha_count = text.chars().filter(char::is_ascii_uppercase).count();
    let digit_count = text.chars().filter(char::is_ascii_digit).count();
    let number_count = NUMBER_RE.find_iter(&strip_number_punctuation(text)).count();

    let mut category_percentages = [0.0f64; 8];
    if word_count > 0 {
        for (pct, count) in category_percentages.iter_mut().zip(category_counts) {
            *pct = (count as f64 / word_count as f64) * 100.0;
        }
    }

    SentimentProfile {
        word_count,
        category_counts,
        category_percentages,
        alpha_count,
        digit_count,
        number_count,
        avg_syllables: ratio(total_syllables as f64, word_count),
        avg_word_length: ratio(total_chars as f64, word_count),
        vocabulary_size: vocabulary.len(),
    }
}

fn normalize_token(token: &str) -> Cow<'_, str> {
    if token.chars().any(char::is_lowercase) {
        Cow::Owned(token.to_uppercase())
    } else {
        Cow::Borrowed(token)
    }
}

fn ratio(total: f64, word_count: usize) -> f64 {
    if word_count == 0 {
        0.0
    } else {
        total / word_count as f64
    }
}

/// Joins digit groups ("1,000.50" becomes "100050") and blanks all other ASCII
/// punctuation so each numeric expression reads as one token.
fn strip_number_punctuation(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev: Option<char> = None;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        let between_digits = matches!(c, '.' | ',')
            && prev.is_some_and(|p| p.is_ascii_digit())
            && chars.peek().is_some_and(char::is_ascii_digit);
        if !between_digits {
            out.push(if c.is_ascii_punctuation() { ' ' } else { c });
        }
        prev = Some(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::{ModalCategory, WordEntry};

    fn entry(word: &str, syllables: u32, configure: impl FnOnce(&mut WordEntry)) -> WordEntry {
        let mut e = WordEntry::new(word, syllables);
        configure(&mut e);
        e
    }

    fn two_word_lexicon() -> Lexicon {
        Lexicon::from_entries([
            entry("GOOD", 1, |e| e.positive = true),
            entry("RISK", 1, |e| e.negative = true),
        ])
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 0.01, "expected {expected}, got {actual}");
    }

    #[test]
    fn test_good_good_risk() {
        let profile = score("GOOD GOOD RISK", &two_word_lexicon());

        assert_eq!(profile.word_count, 3);
        assert_close(profile.percent(Category::Positive), 66.67);
        assert_close(profile.percent(Category::Negative), 33.33);
        assert_eq!(profile.percent(Category::Litigious), 0.0);
        assert_eq!(profile.vocabulary_size, 2);
        assert_eq!(profile.avg_syllables, 1.0);
        assert_eq!(profile.avg_word_length, 4.0);
        assert_eq!(profile.alpha_count, 12);
        assert_eq!(profile.digit_count, 0);
        assert_eq!(profile.number_count, 0);
    }

    #[test]
    fn test_zero_words_is_fully_defined() {
        let profile = score("THE QUICK BROWN FOX 2023", &two_word_lexicon());
        assert_eq!(profile.word_count, 0);
        assert_eq!(profile.category_percentages, [0.0; 8]);
        assert_eq!(profile.avg_syllables, 0.0);
        assert_eq!(profile.avg_word_length, 0.0);
        assert_eq!(profile.vocabulary_size, 0);
        assert_eq!(profile.digit_count, 4);
        assert_eq!(profile.number_count, 1);

        let empty = score("", &two_word_lexicon());
        assert_eq!(empty.word_count, 0);
        assert_eq!(empty.category_percentages, [0.0; 8]);
    }

    #[test]
    fn test_categories_are_not_a_partition() {
        let lexicon = Lexicon::from_entries([
            entry("SETTLEMENT", 3, |e| {
                e.positive = true;
                e.litigious = true;
            }),
            entry("MUST", 1, |e| {
                e.constraining = true;
                e.modal = ModalCategory::Strong;
            }),
        ]);
        let profile = score("SETTLEMENT MUST", &lexicon);

        assert_eq!(profile.word_count, 2);
        assert_eq!(profile.count(Category::Positive), 1);
        assert_eq!(profile.count(Category::Litigious), 1);
        assert_eq!(profile.count(Category::Constraining), 1);
        assert_eq!(profile.count(Category::StrongModal), 1);
        assert_eq!(profile.count(Category::Negative), 0);
        assert_eq!(profile.count(Category::WeakModal), 0);
        let total: usize = profile.category_counts.iter().sum();
        assert!(total > profile.word_count);
        assert_close(profile.avg_syllables, 2.0);
    }

    #[test]
    fn test_qualifying_token_rules() {
        let lexicon = Lexicon::from_entries([
            entry("A", 1, |e| e.positive = true),
            entry("10", 1, |e| e.positive = true),
            entry("LOSS", 1, |e| e.negative = true),
        ]);
        // Single characters and numbers never qualify, even when listed
        let profile = score("A 10 LOSS LOSSES", &lexicon);
        assert_eq!(profile.word_count, 1);
        assert_eq!(profile.count(Category::Positive), 0);
        assert_eq!(profile.count(Category::Negative), 1);
    }

    #[test]
    fn test_numeral_letters_are_not_digits() {
        // Roman numeral code points are letters, not decimal digits
        let lexicon = Lexicon::from_entries([entry("ⅫⅫ", 1, |e| e.litigious = true)]);
        let profile = score("ⅫⅫ ١٢٣", &lexicon);
        assert_eq!(profile.word_count, 1);
        assert_eq!(profile.count(Category::Litigious), 1);
    }

    #[test]
    fn test_hyphenated_words_split() {
        let lexicon = Lexicon::from_entries([
            entry("LONG", 1, |_| {}),
            entry("TERM", 1, |_| {}),
        ]);
        let profile = score("LONG-TERM", &lexicon);
        assert_eq!(profile.word_count, 2);
        assert_eq!(profile.vocabulary_size, 2);
    }

    #[test]
    fn test_lower_case_tokens_are_normalized() {
        let profile = score("good Good GOOD", &two_word_lexicon());
        assert_eq!(profile.word_count, 3);
        assert_eq!(profile.vocabulary_size, 1);
        assert_eq!(profile.alpha_count, 5); // Only upper-case letters are counted
    }

    #[test]
    fn test_vocabulary_never_exceeds_word_count() {
        let lexicon = two_word_lexicon();
        for text in ["", "GOOD", "GOOD RISK GOOD", "RISK RISK RISK RISK", "NOTHING HERE"] {
            let profile = score(text, &lexicon);
            assert!(profile.vocabulary_size <= profile.word_count);
        }
    }

    #[test]
    fn test_score_is_deterministic() {
        let lexicon = two_word_lexicon();
        let text = "GOOD RISK, GOOD; $1,000.50 AND (25) RISKS GOOD";
        assert_eq!(score(text, &lexicon), score(text, &lexicon));
    }

    #[test]
    fn test_number_count_collapses_digit_groups() {
        let lexicon = Lexicon::default();
        let profile = score("REVENUE WAS $1,234,567.89 UP 12.5% FROM (300) IN 2023", &lexicon);
        assert_eq!(profile.number_count, 4);
        assert_eq!(profile.digit_count, 9 + 3 + 3 + 4);
    }

    #[test]
    fn test_number_count_separates_non_grouping_punctuation() {
        let profile = score("1-2 3/4 A,5", &Lexicon::default());
        // "1 2 3 4 A 5" after punctuation is blanked
        assert_eq!(profile.number_count, 5);
    }

    #[test]
    fn test_strip_number_punctuation() {
        assert_eq!(strip_number_punctuation("1,000.25"), "100025");
        assert_eq!(strip_number_punctuation("END. 5"), "END  5");
        assert_eq!(strip_number_punctuation("$(5)"), "  5 ");
    }

    #[test]
    fn test_may_is_dropped_before_scoring() {
        let lexicon = Lexicon::from_entries([
            entry("WE", 1, |_| {}),
            entry("MAY", 1, |e| {
                e.uncertainty = true;
                e.modal = ModalCategory::Weak;
            }),
            entry("GROW", 1, |e| e.positive = true),
        ]);
        let options = ScoringOptions::default();

        let prepared = prepare_for_scoring("We may grow", &options);
        assert_eq!(score(&prepared, &lexicon), score("WE GROW", &lexicon));

        let kept = prepare_for_scoring("We may grow", &ScoringOptions { drop_may: false });
        assert_eq!(kept, "WE MAY GROW");
        let profile = score(&kept, &lexicon);
        assert_eq!(profile.count(Category::WeakModal), 1);
    }

    #[test]
    fn test_may_removal_ignores_context() {
        let options = ScoringOptions::default();
        assert_eq!(prepare_for_scoring("MAYBE", &options), " BE");
        assert_eq!(prepare_for_scoring("dismay", &options), "DIS ");
    }
}
