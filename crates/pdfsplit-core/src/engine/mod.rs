//! PDF engine capability interface
//!
//! The splitter never touches PDF objects itself. Everything it needs from a
//! document goes through [`PdfEngine`]:
//! - `LopdfEngine`: real documents, backed by lopdf
//! - `MemoryEngine`: pages as strings, for exercising partition logic

mod lopdf_backend;
pub mod memory;
mod outline;

pub use lopdf_backend::LopdfEngine;
pub use memory::MemoryEngine;

use crate::error::Result;
use crate::toc::TocEntry;
use std::ops::Range;
use std::path::Path;

/// Flags applied when writing a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SaveOptions {
    /// Drop objects no longer reachable from the trailer
    pub garbage_collect: bool,
    /// Deflate uncompressed streams
    pub compress: bool,
    /// Compact object numbering after unused objects are gone
    pub clean: bool,
}

impl SaveOptions {
    /// Everything on; what every split output is saved with
    pub fn optimized() -> Self {
        Self {
            garbage_collect: true,
            compress: true,
            clean: true,
        }
    }
}

/// Operations the splitter needs from a PDF library
///
/// Page indices are 0-based; TOC pages are 1-based, matching how outlines are
/// presented to users.
pub trait PdfEngine {
    type Document;

    fn open(&self, path: &Path) -> Result<Self::Document>;

    fn page_count(&self, doc: &Self::Document) -> u32;

    /// Plain text of one page
    fn page_text(&self, doc: &Self::Document, index: u32) -> Result<String>;

    /// Flattened outline in document order; empty when there is none
    fn toc(&self, doc: &Self::Document) -> Result<Vec<TocEntry>>;

    /// Replace the document outline
    fn set_toc(&self, doc: &mut Self::Document, toc: &[TocEntry]) -> Result<()>;

    fn new_document(&self) -> Result<Self::Document>;

    /// Append `pages` of `source`, in order, to the end of `target`
    fn copy_pages(
        &self,
        target: &mut Self::Document,
        source: &Self::Document,
        pages: Range<u32>,
    ) -> Result<()>;

    fn save(&self, doc: &mut Self::Document, path: &Path, options: SaveOptions) -> Result<()>;

    /// Release a document. Consumes it, so it cannot be used afterwards.
    fn close(&self, doc: Self::Document);
}
