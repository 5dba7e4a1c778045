//! Caller-supplied page ranges
//!
//! A [`PageRange`] is 1-indexed and inclusive on both ends, exactly as a user
//! types it on the command line (`"3-7"`).

use crate::error::PdfSplitError;
use crate::partition::Partition;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Inclusive 1-indexed page range, `1 <= start <= end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PageRange {
    start: u32,
    end: u32,
}

impl PageRange {
    pub fn new(start: u32, end: u32) -> Result<Self, PdfSplitError> {
        if start == 0 {
            return Err(PdfSplitError::InvalidArgument(
                "Page numbers must be >= 1".into(),
            ));
        }
        if start > end {
            return Err(PdfSplitError::InvalidArgument(format!(
                "Start {} > end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    /// Clamp against the document length and convert to a 0-indexed
    /// half-open partition. The result is empty when `start` lies past the
    /// last page.
    pub fn clamp_to(&self, total_pages: u32) -> Partition {
        let end = self.end.min(total_pages);
        let start = (self.start - 1).min(end);
        Partition::new(start, end)
    }
}

impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

impl FromStr for PageRange {
    type Err = PdfSplitError;

    /// Parse `"<start>-<end>"`, or a bare `"<n>"` meaning `n-n`
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let part = input.trim();
        if part.is_empty() {
            return Err(PdfSplitError::InvalidArgument("Empty page range".into()));
        }

        if let Some((start, end)) = part.split_once('-') {
            let start: u32 = start
                .trim()
                .parse()
                .map_err(|_| PdfSplitError::InvalidArgument(format!("Invalid start: {}", start)))?;
            let end: u32 = end
                .trim()
                .parse()
                .map_err(|_| PdfSplitError::InvalidArgument(format!("Invalid end: {}", end)))?;
            Self::new(start, end)
        } else {
            let page: u32 = part
                .parse()
                .map_err(|_| PdfSplitError::InvalidArgument(format!("Invalid page: {}", part)))?;
            Self::new(page, page)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range() {
        let range: PageRange = "1-3".parse().unwrap();
        assert_eq!((range.start(), range.end()), (1, 3));
    }

    #[test]
    fn test_parse_single_page() {
        let range: PageRange = "5".parse().unwrap();
        assert_eq!((range.start(), range.end()), (5, 5));
    }

    #[test]
    fn test_parse_tolerates_whitespace() {
        let range: PageRange = " 2 - 4 ".parse().unwrap();
        assert_eq!(range, PageRange::new(2, 4).unwrap());
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        assert!("a-3".parse::<PageRange>().is_err());
        assert!("1-b".parse::<PageRange>().is_err());
        assert!("".parse::<PageRange>().is_err());
    }

    #[test]
    fn test_parse_rejects_reversed() {
        assert!("5-2".parse::<PageRange>().is_err());
    }

    #[test]
    fn test_parse_rejects_page_zero() {
        assert!("0-2".parse::<PageRange>().is_err());
        assert!("0".parse::<PageRange>().is_err());
    }

    #[test]
    fn test_display_round_trips_bounds() {
        assert_eq!(PageRange::new(3, 12).unwrap().to_string(), "3-12");
    }

    #[test]
    fn test_clamp_within_document() {
        let partition = PageRange::new(2, 4).unwrap().clamp_to(10);
        assert_eq!(partition, Partition::new(1, 4));
    }

    #[test]
    fn test_clamp_end_past_document() {
        let partition = PageRange::new(8, 20).unwrap().clamp_to(10);
        assert_eq!(partition, Partition::new(7, 10));
    }

    #[test]
    fn test_clamp_start_past_document_is_empty() {
        let partition = PageRange::new(15, 20).unwrap().clamp_to(10);
        assert!(partition.is_empty());
    }
}
