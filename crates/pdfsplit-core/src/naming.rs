//! Output file naming

use crate::range::PageRange;
use std::path::Path;

/// Longest sanitized bookmark title, in characters
pub const MAX_TITLE_CHARS: usize = 50;

/// Base name shared by every output of one source document
pub fn source_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string())
}

/// Make a bookmark title safe for use in a filename
///
/// Keeps alphanumerics, spaces, hyphens and underscores, trims the result and
/// caps it at [`MAX_TITLE_CHARS`]. Falls back to `section_<n>` when nothing
/// survives.
pub fn sanitize_title(title: &str, section: usize) -> String {
    let kept: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();

    let safe: String = kept.trim().chars().take(MAX_TITLE_CHARS).collect();
    if safe.is_empty() {
        format!("section_{}", section)
    } else {
        safe
    }
}

pub fn part_file_name(stem: &str, part: usize) -> String {
    format!("{}_part{}.pdf", stem, part)
}

/// Embeds the requested bounds, before any clamping
pub fn range_file_name(stem: &str, range: &PageRange) -> String {
    format!("{}_range_{}-{}.pdf", stem, range.start(), range.end())
}

pub fn bookmark_file_name(stem: &str, safe_title: &str) -> String {
    format!("{}_{}.pdf", stem, safe_title)
}

pub fn keyword_file_name(stem: &str, part: usize) -> String {
    format!("{}_keyword_{}.pdf", stem, part)
}
