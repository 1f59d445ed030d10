// src/scoring/profile.rs
use crate::lexicon::Category;
use serde::Serialize;

/// Column headers of the score CSV, in output order.
pub const OUTPUT_FIELDS: [&str; 18] = [
    "filename",
    "file size",
    "number of words",
    "% positive",
    "% negative",
    "% uncertainty",
    "% litigious",
    "% modal-weak",
    "% modal moderate",
    "% modal strong",
    "% constraining",
    "# of alphabetic",
    "# of digits",
    "# of numbers",
    "avg # of syllables per word",
    "average word length",
    "vocabulary",
    "CIK",
];

/// Fixed-shape statistics for one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentProfile {
    /// Qualifying dictionary tokens, repeats included.
    pub word_count: usize,
    /// Per-category token counts, indexed by [`Category::index`].
    pub category_counts: [usize; 8],
    /// Per-category share of `word_count` in percent; all zero when `word_count` is 0.
    pub category_percentages: [f64; 8],
    pub alpha_count: usize,
    pub digit_count: usize,
    pub number_count: usize,
    pub avg_syllables: f64,
    pub avg_word_length: f64,
    pub vocabulary_size: usize,
}

impl SentimentProfile {
    pub fn count(&self, category: Category) -> usize {
        self.category_counts[category.index()]
    }

    pub fn percent(&self, category: Category) -> f64 {
        self.category_percentages[category.index()]
    }
}

/// One row of the score CSV: the profile plus caller-supplied identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRecord {
    pub document: String,
    pub byte_size: usize,
    pub profile: SentimentProfile,
    pub filer_id: String,
}

impl ScoreRecord {
    /// Fields in [`OUTPUT_FIELDS`] order.
    pub fn to_csv_fields(&self) -> Vec<String> {
        let p = &self.profile;
        let mut fields = Vec::with_capacity(OUTPUT_FIELDS.len());
        fields.push(self.document.clone());
        fields.push(self.byte_size.to_string());
        fields.push(p.word_count.to_string());
        fields.extend(Category::ALL.iter().map(|c| p.percent(*c).to_string()));
        fields.push(p.alpha_count.to_string());
        fields.push(p.digit_count.to_string());
        fields.push(p.number_count.to_string());
        fields.push(p.avg_syllables.to_string());
        fields.push(p.avg_word_length.to_string());
        fields.push(p.vocabulary_size.to_string());
        fields.push(self.filer_id.clone());
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_fields_follow_header_order() {
        let mut percentages = [0.0; 8];
        percentages[Category::Positive.index()] = 50.0;
        percentages[Category::Constraining.index()] = 25.0;
        let record = ScoreRecord {
            document: "0000320193_10K".to_string(),
            byte_size: 2048,
            profile: SentimentProfile {
                word_count: 4,
                category_counts: [2, 0, 0, 0, 0, 0, 0, 1],
                category_percentages: percentages,
                alpha_count: 30,
                digit_count: 4,
                number_count: 1,
                avg_syllables: 1.5,
                avg_word_length: 5.25,
                vocabulary_size: 3,
            },
            filer_id: "0000320193".to_string(),
        };

        let fields = record.to_csv_fields();
        assert_eq!(fields.len(), OUTPUT_FIELDS.len());
        assert_eq!(fields[0], "0000320193_10K");
        assert_eq!(fields[1], "2048");
        assert_eq!(fields[2], "4");
        assert_eq!(fields[3], "50");
        assert_eq!(fields[10], "25");
        assert_eq!(fields[11], "30");
        assert_eq!(fields[14], "1.5");
        assert_eq!(fields[15], "5.25");
        assert_eq!(fields[16], "3");
        assert_eq!(fields[17], "0000320193");
    }
}
