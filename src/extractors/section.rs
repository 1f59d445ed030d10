// src/extractors/section.rs

// --- Imports ---
use crate::utils::error::AppError;
use serde::{Deserialize, Serialize};
use std::path::Path;

// --- Constants ---
/// Sections shorter than this (in UTF-8 bytes) are treated as a table-of-contents hit.
pub const DEFAULT_MIN_SECTION_BYTES: usize = 1000;
/// Extra extraction attempts made after a short match.
pub const DEFAULT_MAX_RETRIES: usize = 1;

// --- Marker Configuration ---
// Start of Item 7, in priority order. Text extraction upstream tends to inject
// line breaks and odd punctuation into the heading.
const MDA_START_MARKERS: &[&str] = &[
    "\nITEM 7.",
    "\nITEM 7 –",
    "\nITEM 7 —",
    "\nITEM 7 -",
    "\nITEM 7:",
    "\nITEM 7 ",
    "\nITEM 7\n",
    "\nI\nTEM 7",
];

// Item 7A is the usual successor; Item 8 is the fallback when 7A is absent.
const MDA_END_NEXT_ITEM: &[&str] = &["\nITEM 7A", "\nITEM 7 A", "\nITEM 7(A)"];
const MDA_END_FOLLOWING_ITEM: &[&str] = &["\nITEM 8"];

// On a retry the real section may be followed by a repeated Item 7 heading.
const MDA_CONTINUATION_END: &[&str] = &["\nITEM 7"];

fn owned(markers: &[&str]) -> Vec<String> {
    markers.iter().map(|m| m.to_string()).collect()
}

/// Ordered marker lists describing where a section starts and ends.
///
/// Within `start` and each end group, earlier markers take priority over later
/// ones regardless of where in the text they match. End groups are tried in
/// order and the first group with any match decides the end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionMarkers {
    pub start: Vec<String>,
    pub end_groups: Vec<Vec<String>>,
    /// Appended to the first end group when extraction starts past offset 0.
    #[serde(default)]
    pub continuation_end: Vec<String>,
}

impl Default for SectionMarkers {
    fn default() -> Self {
        Self::mda()
    }
}

impl SectionMarkers {
    /// Markers for Item 7, Management's Discussion and Analysis.
    pub fn mda() -> Self {
        Self {
            start: owned(MDA_START_MARKERS),
            end_groups: vec![owned(MDA_END_NEXT_ITEM), owned(MDA_END_FOLLOWING_ITEM)],
            continuation_end: owned(MDA_CONTINUATION_END),
        }
    }

    /// Reads a marker set from a JSON file and validates it.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, AppError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let markers: SectionMarkers = serde_json::from_str(&raw).map_err(|e| {
            AppError::Config(format!("Invalid marker file '{}': {}", path.display(), e))
        })?;
        markers.validate()?;
        tracing::info!("Loaded section markers from {}", path.display());
        Ok(markers)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.start.is_empty() {
            return Err(AppError::Config("At least one start marker is required".to_string()));
        }
        if self.end_groups.iter().all(|group| group.is_empty()) {
            return Err(AppError::Config("At least one end marker is required".to_string()));
        }
        let all = self
            .start
            .iter()
            .chain(self.end_groups.iter().flatten())
            .chain(self.continuation_end.iter());
        for marker in all {
            if marker.is_empty() {
                return Err(AppError::Config("Section markers must not be empty".to_string()));
            }
        }
        Ok(())
    }

    fn end_groups_for(&self, continuing: bool) -> Vec<Vec<&str>> {
        self.end_groups
            .iter()
            .enumerate()
            .map(|(i, group)| {
                let mut markers: Vec<&str> = group.iter().map(String::as_str).collect();
                if continuing && i == 0 {
                    markers.extend(self.continuation_end.iter().map(String::as_str));
                }
                markers
            })
            .collect()
    }
}

/// Extraction thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractorConfig {
    pub min_section_bytes: usize,
    pub max_retries: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            min_section_bytes: DEFAULT_MIN_SECTION_BYTES,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

// --- Data Structures ---

/// Result of one extraction attempt.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SectionMatch {
    /// Trimmed section text; empty when not found.
    pub text: String,
    /// Byte offset of the winning start marker.
    pub begin: usize,
    /// Byte offset of the winning end marker, 0 when not found.
    pub end_offset: usize,
    pub found: bool,
    /// Set when this match came from a retry past a short first match.
    pub retried: bool,
}

impl SectionMatch {
    pub fn not_found() -> Self {
        Self::default()
    }

    /// Size of the extracted text in UTF-8 bytes.
    pub fn byte_len(&self) -> usize {
        self.text.len()
    }
}

/// A located section together with the document it came from.
#[derive(Debug, Clone)]
pub struct ExtractedSection {
    pub document_name: String, // File stem of the source document
    pub section_name: String,  // e.g., "Item 7"
    pub content: String,
    pub begin: usize,
    pub end_offset: usize,
}

impl ExtractedSection {
    pub fn new(document_name: &str, found: SectionMatch) -> Self {
        Self {
            document_name: document_name.to_string(),
            section_name: "Item 7".to_string(),
            content: found.text,
            begin: found.begin,
            end_offset: found.end_offset,
        }
    }
}

// --- Main Extractor Structure ---
#[derive(Debug, Clone, Default)]
pub struct SectionExtractor {
    markers: SectionMarkers,
    config: ExtractorConfig,
}

impl SectionExtractor {
    pub fn new(markers: SectionMarkers, config: ExtractorConfig) -> Self {
        Self { markers, config }
    }

    pub fn markers(&self) -> &SectionMarkers {
        &self.markers
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Locates the section at or after `start_offset` in normalized text.
    ///
    /// The returned offsets are absolute positions in `text`. A start marker
    /// without a following end marker is reported as not found.
    pub fn extract(&self, text: &str, start_offset: usize) -> SectionMatch {
        let Some(start) = align_to_char_boundary(text, start_offset) else {
            tracing::trace!("Start offset {} is past the end of the text ({} bytes)", start_offset, text.len());
            return SectionMatch::not_found();
        };

        // SEARCHING_START
        let Some((begin, start_marker)) = find_first(text, start, self.markers.start.iter().map(String::as_str)) else {
            tracing::trace!("No start marker found at or after offset {}", start);
            return SectionMatch::not_found();
        };
        tracing::trace!("Start marker {:?} matched at {}", start_marker, begin);

        // SEARCHING_END, strictly after the first character of the start marker
        let search_from = begin + text[begin..].chars().next().map_or(1, char::len_utf8);
        let end = self
            .markers
            .end_groups_for(start_offset > 0)
            .into_iter()
            .find_map(|group| find_first(text, search_from, group.into_iter()));

        let Some((end, end_marker)) = end else {
            tracing::debug!("Start marker {:?} at {} has no matching end marker", start_marker, begin);
            return SectionMatch::not_found();
        };
        if end <= begin {
            return SectionMatch::not_found();
        }
        tracing::trace!("End marker {:?} matched at {}", end_marker, end);

        SectionMatch {
            text: text[begin..end].trim().to_string(),
            begin,
            end_offset: end,
            found: true,
            retried: false,
        }
    }

    /// Extracts the section, retrying past a match that is too short to be the
    /// real section (typically a table-of-contents entry).
    ///
    /// A retry that fails or is also short leaves the first match in place.
    pub fn extract_with_retry(&self, text: &str) -> SectionMatch {
        let first = self.extract(text, 0);
        if !first.found || first.byte_len() >= self.config.min_section_bytes {
            return first;
        }

        let mut offset = first.end_offset;
        for attempt in 1..=self.config.max_retries {
            tracing::debug!(
                "Section is {} bytes (minimum {}), retrying from offset {} (attempt {})",
                first.byte_len(),
                self.config.min_section_bytes,
                offset,
                attempt
            );
            let retry = self.extract(text, offset);
            if !retry.found {
                break;
            }
            if retry.byte_len() >= self.config.min_section_bytes {
                return SectionMatch { retried: true, ..retry };
            }
            offset = retry.end_offset;
        }

        first
    }
}

/// Rounds `offset` up to the next char boundary; `None` when past the end.
fn align_to_char_boundary(text: &str, offset: usize) -> Option<usize> {
    if offset > text.len() {
        return None;
    }
    let mut offset = offset;
    while !text.is_char_boundary(offset) {
        offset += 1;
    }
    Some(offset)
}

/// Position of the first marker (in marker order) that occurs in `text[from..]`.
fn find_first<'m>(
    text: &str,
    from: usize,
    markers: impl Iterator<Item = &'m str>,
) -> Option<(usize, &'m str)> {
    let haystack = text.get(from..)?;
    markers
        .into_iter()
        .find_map(|marker| haystack.find(marker).map(|pos| (from + pos, marker)))
}
