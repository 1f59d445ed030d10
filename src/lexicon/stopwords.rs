// src/lexicon/stopwords.rs
use once_cell::sync::Lazy;
use std::collections::HashSet;

/// nltk English stopwords, upper-cased. A, I, S, T, DON, WILL and AGAINST
/// are deliberately absent.
pub const STOPWORDS: &[&str] = &[
    "ME", "MY", "MYSELF", "WE", "OUR", "OURS", "OURSELVES", "YOU", "YOUR", "YOURS",
    "YOURSELF", "YOURSELVES", "HE", "HIM", "HIS", "HIMSELF", "SHE", "HER", "HERS", "HERSELF",
    "IT", "ITS", "ITSELF", "THEY", "THEM", "THEIR", "THEIRS", "THEMSELVES", "WHAT", "WHICH",
    "WHO", "WHOM", "THIS", "THAT", "THESE", "THOSE", "AM", "IS", "ARE", "WAS", "WERE", "BE",
    "BEEN", "BEING", "HAVE", "HAS", "HAD", "HAVING", "DO", "DOES", "DID", "DOING", "AN",
    "THE", "AND", "BUT", "IF", "OR", "BECAUSE", "AS", "UNTIL", "WHILE", "OF", "AT", "BY",
    "FOR", "WITH", "ABOUT", "BETWEEN", "INTO", "THROUGH", "DURING", "BEFORE",
    "AFTER", "ABOVE", "BELOW", "TO", "FROM", "UP", "DOWN", "IN", "OUT", "ON", "OFF", "OVER",
    "UNDER", "AGAIN", "FURTHER", "THEN", "ONCE", "HERE", "THERE", "WHEN", "WHERE", "WHY",
    "HOW", "ALL", "ANY", "BOTH", "EACH", "FEW", "MORE", "MOST", "OTHER", "SOME", "SUCH",
    "NO", "NOR", "NOT", "ONLY", "OWN", "SAME", "SO", "THAN", "TOO", "VERY", "CAN",
    "JUST", "SHOULD", "NOW", "AMONG",
];

static STOPWORD_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| STOPWORDS.iter().copied().collect());

/// Expects an upper-cased word.
pub fn is_stopword(word: &str) -> bool {
    STOPWORD_SET.contains(word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stopword_membership() {
        assert!(is_stopword("THE"));
        assert!(is_stopword("AMONG"));
        assert!(!is_stopword("the")); // Case-sensitive; callers pass normalized words
        assert!(!is_stopword("AGAINST"));
        assert!(!is_stopword("WILL"));
    }
}
