// src/utils/marker_debug.rs
use crate::extractors::{SectionMarkers, SectionMatch};
use crate::utils::error::AppError;
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HighlightKind {
    Start,
    End,
    Selected,
}

impl HighlightKind {
    fn css_class(self) -> &'static str {
        match self {
            HighlightKind::Start => "highlight-start",
            HighlightKind::End => "highlight-end",
            HighlightKind::Selected => "highlight-selected",
        }
    }
}

/// Byte ranges of every marker occurrence in `text`. Occurrences at the
/// selected begin/end offsets are tagged as selected.
fn collect_highlights(text: &str, markers: &SectionMarkers, found: &SectionMatch) -> Vec<(usize, usize, HighlightKind)> {
    let mut highlights = Vec::new();

    for marker in &markers.start {
        for (pos, m) in text.match_indices(marker.as_str()) {
            let kind = if found.found && pos == found.begin { HighlightKind::Selected } else { HighlightKind::Start };
            highlights.push((pos, pos + m.len(), kind));
        }
    }
    for marker in markers.end_groups.iter().flatten().chain(markers.continuation_end.iter()) {
        for (pos, m) in text.match_indices(marker.as_str()) {
            let kind = if found.found && pos == found.end_offset { HighlightKind::Selected } else { HighlightKind::End };
            highlights.push((pos, pos + m.len(), kind));
        }
    }

    // Longer matches first at the same position, then drop overlaps
    highlights.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));
    let mut last_end = 0;
    highlights.retain(|(start, end, _)| {
        if *start < last_end {
            return false;
        }
        last_end = *end;
        true
    });
    highlights
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Renders normalized text as HTML with every section marker occurrence highlighted.
pub fn render_marker_report(text: &str, markers: &SectionMarkers, found: &SectionMatch) -> String {
    let mut debug_html = String::from("<!DOCTYPE html>\n<html>\n<head>\n<style>\n");

    // CSS for highlight colors
    debug_html.push_str(".highlight-start { background-color: #FFFF00; }\n");
    debug_html.push_str(".highlight-end { background-color: #FFA500; }\n");
    debug_html.push_str(".highlight-selected { background-color: #90EE90; font-weight: bold; }\n");
    debug_html.push_str("pre { white-space: pre-wrap; }\n");
    debug_html.push_str("</style>\n</head>\n<body>\n<pre>");

    let mut last_pos = 0;
    for (start, end, kind) in collect_highlights(text, markers, found) {
        debug_html.push_str(&escape_html(&text[last_pos..start]));
        debug_html.push_str(&format!(
            "<span class=\"{}\" title=\"Position: {}-{}\">",
            kind.css_class(),
            start,
            end
        ));
        debug_html.push_str(&escape_html(&text[start..end]));
        debug_html.push_str("</span>");
        last_pos = end;
    }
    debug_html.push_str(&escape_html(&text[last_pos..]));

    debug_html.push_str("</pre>\n</body>\n</html>");
    debug_html
}

/// Saves the marker report for one document.
pub fn save_marker_report(
    text: &str,
    filename: &Path,
    markers: &SectionMarkers,
    found: &SectionMatch,
) -> Result<(), AppError> {
    let mut file = File::create(filename)?;
    file.write_all(render_marker_report(text, markers, found).as_bytes())?;

    tracing::debug!("Saved marker report to {}", filename.display());
    Ok(())
}
