// src/prepare/mod.rs

//! Turns a raw filing into the normalized text the section extractor expects:
//! upper-case, one blank line between paragraphs, and item headings repaired
//! where HTML flattening split them apart.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use unicode_normalization::UnicodeNormalization;

static HTML_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<(?:html|body|div|p|table|font|span|br)\b").expect("Failed to compile HTML_TAG_RE")
});

static TRAILING_SPACES_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[ ]+\n").expect("Failed to compile TRAILING_SPACES_RE")
});

static LEADING_SPACES_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\n[ ]+").expect("Failed to compile LEADING_SPACES_RE")
});

static NEWLINE_RUN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\n+").expect("Failed to compile NEWLINE_RUN_RE")
});

// Applied in order after whitespace cleanup
const HEADING_REPAIRS: &[(&str, &str)] = &[
    ("\n.\n", ".\n"), // Period split onto its own line
    ("\nI\nTEM", "\nITEM"),
    ("\nITEM\n", "\nITEM "),
    ("\nITEM  ", "\nITEM "),
    (":\n", ".\n"),
    ("$\n", "$"),
    ("\n%", "%"),
];

/// Whether `raw` looks like markup rather than plain text.
pub fn looks_like_html(raw: &str) -> bool {
    HTML_TAG_RE.is_match(raw)
}

/// Flattens an HTML document to text, one text node per line.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    document.root_element().text().collect::<Vec<_>>().join("\n")
}

/// Normalizes flattened filing text for section extraction.
pub fn normalize_filing_text(text: &str) -> String {
    let decomposed: String = text.nfkd().collect();
    let mut text = unify_line_breaks(&decomposed).to_uppercase();

    text = TRAILING_SPACES_RE.replace_all(&text, "\n").into_owned();
    text = LEADING_SPACES_RE.replace_all(&text, "\n").into_owned();
    text = NEWLINE_RUN_RE.replace_all(&text, "\n").into_owned();

    for (from, to) in HEADING_REPAIRS {
        text = text.replace(from, to);
    }

    text.replace('\n', "\n\n")
}

/// Flattens markup when present, then normalizes.
pub fn prepare_filing(raw: &str) -> String {
    if looks_like_html(raw) {
        tracing::debug!("Flattening HTML filing ({} bytes)", raw.len());
        normalize_filing_text(&html_to_text(raw))
    } else {
        normalize_filing_text(raw)
    }
}

/// Maps every Unicode line boundary to '\n' and drops a single trailing break.
fn unify_line_breaks(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push('\n');
            }
            '\n' | '\u{0b}' | '\u{0c}' | '\u{1c}' | '\u{1d}' | '\u{1e}' | '\u{85}' | '\u{2028}'
            | '\u{2029}' => out.push('\n'),
            _ => out.push(c),
        }
    }
    if out.ends_with('\n') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_whitespace_and_doubles_breaks() {
        let text = "Item 7.   \n\n\n   Management's Discussion\r\nResults";
        assert_eq!(
            normalize_filing_text(text),
            "ITEM 7.\n\nMANAGEMENT'S DISCUSSION\n\nRESULTS"
        );
    }

    #[test]
    fn test_repairs_split_headings() {
        assert_eq!(normalize_filing_text("x\nI\nTEM 7. MD&A"), "X\n\nITEM 7. MD&A");
        assert_eq!(normalize_filing_text("x\nItem\n7\n.\nMD&A"), "X\n\nITEM 7.\n\nMD&A");
        assert_eq!(normalize_filing_text("x\nItem  7:\nMD&A"), "X\n\nITEM 7.\n\nMD&A");
        assert_eq!(normalize_filing_text("cost $\n100\n%"), "COST $100%");
    }

    #[test]
    fn test_nfkd_decomposes_compatibility_characters() {
        // Non-breaking space and the "fi" ligature
        assert_eq!(normalize_filing_text("pro\u{00a0}\u{fb01}t"), "PRO FIT");
    }

    #[test]
    fn test_html_is_flattened_before_normalizing() {
        let html = "<html><body><p>Item 7.</p><p>Management's Discussion</p><p>Item 7A.</p></body></html>";
        assert!(looks_like_html(html));
        let text = prepare_filing(html);
        assert!(text.contains("\nITEM 7A."));
        assert!(text.starts_with("ITEM 7.\n\nMANAGEMENT'S DISCUSSION"));
    }

    #[test]
    fn test_plain_text_passes_through() {
        assert!(!looks_like_html("REVENUE < COST"));
        assert_eq!(prepare_filing("a\nb\n"), "A\n\nB");
    }
}
