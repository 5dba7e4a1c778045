//! In-memory PDF engine
//!
//! Documents are lists of page strings. Saved documents are recorded instead
//! of written, and opened/created/closed documents are counted so callers can
//! check that every document was released.

use super::{PdfEngine, SaveOptions};
use crate::error::{PdfSplitError, Result};
use crate::toc::TocEntry;
use std::collections::HashMap;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryDocument {
    /// Page text, one entry per page
    pub pages: Vec<String>,
    pub toc: Vec<TocEntry>,
}

impl MemoryDocument {
    pub fn new(pages: Vec<String>) -> Self {
        Self {
            pages,
            toc: Vec::new(),
        }
    }

    /// `count` pages whose text is `"Page N"`
    pub fn numbered(count: u32) -> Self {
        Self::new((1..=count).map(|n| format!("Page {}", n)).collect())
    }

    pub fn with_toc(mut self, toc: Vec<TocEntry>) -> Self {
        self.toc = toc;
        self
    }
}

#[derive(Debug, Clone)]
pub struct SavedDocument {
    pub path: PathBuf,
    pub document: MemoryDocument,
    pub options: SaveOptions,
}

#[derive(Debug, Default)]
struct State {
    sources: HashMap<PathBuf, MemoryDocument>,
    saved: Vec<SavedDocument>,
    fail_saves_after: Option<usize>,
    opened: usize,
    closed: usize,
}

/// Cloning shares state, so a test can keep a handle after giving one to a
/// splitter.
#[derive(Debug, Clone, Default)]
pub struct MemoryEngine {
    state: Arc<Mutex<State>>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `document` openable at `path`
    pub fn register(&self, path: impl Into<PathBuf>, document: MemoryDocument) {
        self.lock().sources.insert(path.into(), document);
    }

    /// Let `count` saves succeed, then fail every later one
    pub fn fail_saves_after(&self, count: usize) {
        self.lock().fail_saves_after = Some(count);
    }

    pub fn saved(&self) -> Vec<SavedDocument> {
        self.lock().saved.clone()
    }

    /// Documents opened or created but not yet closed
    pub fn open_documents(&self) -> usize {
        let state = self.lock();
        state.opened.saturating_sub(state.closed)
    }

    pub fn closed_documents(&self) -> usize {
        self.lock().closed
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panicking test must not poison later assertions
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl PdfEngine for MemoryEngine {
    type Document = MemoryDocument;

    fn open(&self, path: &Path) -> Result<MemoryDocument> {
        let mut state = self.lock();
        let document = state
            .sources
            .get(path)
            .cloned()
            .ok_or_else(|| PdfSplitError::LoadError(format!("no such document: {}", path.display())))?;
        state.opened += 1;
        Ok(document)
    }

    fn page_count(&self, doc: &MemoryDocument) -> u32 {
        doc.pages.len() as u32
    }

    fn page_text(&self, doc: &MemoryDocument, index: u32) -> Result<String> {
        doc.pages
            .get(index as usize)
            .cloned()
            .ok_or_else(|| PdfSplitError::EngineError(format!("page index {} out of bounds", index)))
    }

    fn toc(&self, doc: &MemoryDocument) -> Result<Vec<TocEntry>> {
        Ok(doc.toc.clone())
    }

    fn set_toc(&self, doc: &mut MemoryDocument, toc: &[TocEntry]) -> Result<()> {
        doc.toc = toc.to_vec();
        Ok(())
    }

    fn new_document(&self) -> Result<MemoryDocument> {
        self.lock().opened += 1;
        Ok(MemoryDocument::default())
    }

    fn copy_pages(
        &self,
        target: &mut MemoryDocument,
        source: &MemoryDocument,
        pages: Range<u32>,
    ) -> Result<()> {
        let slice = source
            .pages
            .get((pages.start as usize)..(pages.end as usize))
            .ok_or_else(|| {
                PdfSplitError::EngineError(format!(
                    "pages {}..{} out of bounds ({} pages)",
                    pages.start,
                    pages.end,
                    source.pages.len()
                ))
            })?;
        target.pages.extend_from_slice(slice);
        Ok(())
    }

    fn save(&self, doc: &mut MemoryDocument, path: &Path, options: SaveOptions) -> Result<()> {
        let mut state = self.lock();
        if state
            .fail_saves_after
            .is_some_and(|limit| state.saved.len() >= limit)
        {
            return Err(PdfSplitError::EngineError(format!(
                "save failed: {}",
                path.display()
            )));
        }
        state.saved.push(SavedDocument {
            path: path.to_path_buf(),
            document: doc.clone(),
            options,
        });
        Ok(())
    }

    fn close(&self, _doc: MemoryDocument) {
        self.lock().closed += 1;
    }
}
