//! Page partitioning
//!
//! Pure arithmetic on page indices. Each strategy boils down to a list of
//! half-open, 0-indexed [`Partition`]s; nothing here touches a document.

use serde::Serialize;
use std::fmt;
use std::ops::Range;

/// Half-open interval of 0-indexed pages, `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Partition {
    pub start: u32,
    pub end: u32,
}

impl Partition {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn pages(&self) -> Range<u32> {
        self.start..self.end
    }

    /// First page as a user sees it (1-indexed)
    pub fn first_page(&self) -> u32 {
        self.start + 1
    }

    /// Last page as a user sees it (1-indexed, inclusive)
    pub fn last_page(&self) -> u32 {
        self.end
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pages {}-{}", self.first_page(), self.last_page())
    }
}

/// Fixed-size chunks: `ceil(total / pages_per_file)` partitions, the last one
/// possibly shorter. `pages_per_file` must be non-zero.
pub fn fixed_size(total_pages: u32, pages_per_file: u32) -> Vec<Partition> {
    debug_assert!(pages_per_file > 0);
    let count = total_pages.div_ceil(pages_per_file);
    (0..count)
        .map(|i| {
            let start = i * pages_per_file;
            let end = (start + pages_per_file).min(total_pages);
            Partition::new(start, end)
        })
        .collect()
}

/// Partitions starting at every matching page, each with its split number
///
/// `matches` are 0-indexed pages in scan order. Split points are `0`, every
/// match, then `total_pages`; partition `n` spans split points `n - 1` and
/// `n`, so numbers start at 1 and skip the empty span a match on page 0
/// leaves behind. Duplicate or out-of-order matches never yield an empty
/// partition.
pub fn at_boundaries(total_pages: u32, matches: &[u32]) -> Vec<(usize, Partition)> {
    let points = matches
        .iter()
        .map(|&page| page.min(total_pages))
        .chain(std::iter::once(total_pages));

    let mut parts = Vec::new();
    let mut start = 0;
    for (i, end) in points.enumerate() {
        if end > start {
            parts.push((i + 1, Partition::new(start, end)));
            start = end;
        }
    }
    parts
}
