//! Table of contents handling
//!
//! Turns a flat outline into top-level sections. A section runs from its
//! level-1 entry up to the next level-1 entry; nested entries in between
//! belong to it.

use crate::partition::Partition;
use serde::Serialize;

/// One outline entry, as read from or written to a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    /// Nesting depth, 1 = top level
    pub level: u32,
    pub title: String,
    /// 1-indexed page the entry points at
    pub page: u32,
}

impl TocEntry {
    pub fn new(level: u32, title: impl Into<String>, page: u32) -> Self {
        Self {
            level,
            title: title.into(),
            page,
        }
    }

    pub fn is_top_level(&self) -> bool {
        self.level <= 1
    }
}

/// A top-level outline entry resolved to a page span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// 1-indexed position of the entry in the full outline, nested entries
    /// included
    pub index: usize,
    pub title: String,
    /// Requested 1-indexed starting page
    pub start_page: u32,
    /// Pages covered, clamped to the document; may be empty
    pub partition: Partition,
    /// Entries nested under this section, in outline order
    pub children: Vec<TocEntry>,
}

impl Section {
    /// Outline for the extracted document: the section itself at page 1,
    /// followed by its nested entries renumbered relative to the section.
    /// Empty when the section has no nested entries.
    pub fn relative_toc(&self) -> Vec<TocEntry> {
        if self.children.is_empty() || self.partition.is_empty() {
            return Vec::new();
        }

        let first = self.partition.first_page();
        let last = self.partition.last_page();

        let mut toc = vec![TocEntry::new(1, self.title.clone(), 1)];
        toc.extend(
            self.children
                .iter()
                .filter(|entry| entry.page >= first && entry.page <= last)
                .map(|entry| TocEntry::new(entry.level, entry.title.clone(), entry.page - first + 1)),
        );
        toc
    }
}

/// Group an outline into top-level sections
///
/// Entries before the first top-level entry have no section to belong to and
/// are ignored. Section ends come from the next *top-level* entry, not the
/// next entry of any level.
pub fn sections(toc: &[TocEntry], total_pages: u32) -> Vec<Section> {
    let tops: Vec<usize> = toc
        .iter()
        .enumerate()
        .filter(|(_, entry)| entry.is_top_level())
        .map(|(i, _)| i)
        .collect();

    tops.iter()
        .enumerate()
        .map(|(n, &i)| {
            let entry = &toc[i];
            let next_top = tops.get(n + 1).copied();
            let end_page = next_top.map_or(total_pages, |j| toc[j].page.saturating_sub(1));

            let end = end_page.min(total_pages);
            let start = entry.page.saturating_sub(1).min(end);

            let children_end = next_top.unwrap_or(toc.len());
            Section {
                index: i + 1,
                title: entry.title.clone(),
                start_page: entry.page,
                partition: Partition::new(start, end),
                children: toc[i + 1..children_end].to_vec(),
            }
        })
        .collect()
}
