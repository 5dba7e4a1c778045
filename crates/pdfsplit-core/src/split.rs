//! PDF split strategies
//!
//! A [`Splitter`] owns one open source document. Each strategy consumes the
//! splitter, writes its partitions to the output directory one after another,
//! and closes the source before returning, whatever the outcome.

use crate::engine::{PdfEngine, SaveOptions};
use crate::error::{PdfSplitError, Result};
use crate::naming;
use crate::partition::{self, Partition};
use crate::range::PageRange;
use crate::toc::{self, TocEntry};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// One generated document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputFile {
    pub path: PathBuf,
    /// 1-indexed first page taken from the source
    pub first_page: u32,
    /// 1-indexed last page taken from the source, inclusive
    pub last_page: u32,
    pub page_count: u32,
}

impl OutputFile {
    fn new(path: PathBuf, partition: Partition) -> Self {
        Self {
            path,
            first_page: partition.first_page(),
            last_page: partition.last_page(),
            page_count: partition.len(),
        }
    }
}

pub struct Splitter<E: PdfEngine> {
    engine: E,
    source: E::Document,
    stem: String,
    total_pages: u32,
}

impl<E: PdfEngine> Splitter<E> {
    /// Open `input` through `engine`
    pub fn open(engine: E, input: &Path) -> Result<Self> {
        let source = engine.open(input)?;
        let total_pages = engine.page_count(&source);
        Ok(Self {
            engine,
            source,
            stem: naming::source_stem(input),
            total_pages,
        })
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    /// Chunks of `pages_per_file` pages; the last chunk may be shorter
    pub fn split_by_pages(self, pages_per_file: u32, output_dir: &Path) -> Result<Vec<OutputFile>> {
        self.run(output_dir, |s| {
            if pages_per_file == 0 {
                return Err(PdfSplitError::InvalidArgument(
                    "Pages per file must be >= 1".into(),
                ));
            }

            let parts = partition::fixed_size(s.total_pages, pages_per_file);
            let mut outputs = Vec::with_capacity(parts.len());
            for (i, part) in parts.into_iter().enumerate() {
                let path = output_dir.join(naming::part_file_name(&s.stem, i + 1));
                outputs.push(s.write_partition(part, &path, &[])?);
            }
            Ok(outputs)
        })
    }

    /// One file per requested range, in the order given
    ///
    /// Ends past the last page are clamped. Ranges with nothing left after
    /// clamping are skipped with a warning.
    pub fn split_by_range(self, ranges: &[PageRange], output_dir: &Path) -> Result<Vec<OutputFile>> {
        self.run(output_dir, |s| {
            let mut outputs = Vec::with_capacity(ranges.len());
            for range in ranges {
                let part = range.clamp_to(s.total_pages);
                if part.is_empty() {
                    warn!(
                        range = %range,
                        total_pages = s.total_pages,
                        "Range has no pages in this document, skipping"
                    );
                    continue;
                }
                let path = output_dir.join(naming::range_file_name(&s.stem, range));
                outputs.push(s.write_partition(part, &path, &[])?);
            }
            Ok(outputs)
        })
    }

    /// One file per top-level bookmark
    ///
    /// A section runs up to the next top-level bookmark. Nested bookmarks are
    /// carried over into the extracted file as its own outline. Returns an
    /// empty list when the document has no bookmarks.
    pub fn split_by_bookmark(self, output_dir: &Path) -> Result<Vec<OutputFile>> {
        self.run(output_dir, |s| {
            let outline = s.engine.toc(&s.source)?;
            if outline.is_empty() {
                warn!("Document has no bookmarks, nothing to split by bookmark");
                return Ok(Vec::new());
            }

            let sections = toc::sections(&outline, s.total_pages);
            let mut used_names = HashSet::new();
            let mut outputs = Vec::with_capacity(sections.len());
            for section in &sections {
                if section.partition.is_empty() {
                    warn!(
                        title = %section.title,
                        page = section.start_page,
                        total_pages = s.total_pages,
                        "Bookmark section has no pages, skipping"
                    );
                    continue;
                }

                let mut name = naming::sanitize_title(&section.title, section.index);
                if !used_names.insert(name.clone()) {
                    name = format!("{}_{}", name, section.index);
                    used_names.insert(name.clone());
                }

                let path = output_dir.join(naming::bookmark_file_name(&s.stem, &name));
                outputs.push(s.write_partition(section.partition, &path, &section.relative_toc())?);
            }
            Ok(outputs)
        })
    }

    /// Start a new file at every page whose text contains `keyword`
    ///
    /// Matching is a case-sensitive substring test. Pages before the first
    /// match form the first file; without any match the whole document is one
    /// file.
    pub fn split_by_keyword(self, keyword: &str, output_dir: &Path) -> Result<Vec<OutputFile>> {
        self.run(output_dir, |s| {
            if keyword.is_empty() {
                return Err(PdfSplitError::InvalidArgument(
                    "Keyword must not be empty".into(),
                ));
            }

            let mut matches = Vec::new();
            for index in 0..s.total_pages {
                if s.engine.page_text(&s.source, index)?.contains(keyword) {
                    matches.push(index);
                }
            }
            info!(keyword, matches = matches.len(), "Keyword scan complete");

            let parts = partition::at_boundaries(s.total_pages, &matches);
            let mut outputs = Vec::with_capacity(parts.len());
            for (number, part) in parts {
                let path = output_dir.join(naming::keyword_file_name(&s.stem, number));
                outputs.push(s.write_partition(part, &path, &[])?);
            }
            Ok(outputs)
        })
    }

    /// Run a strategy, then close the source on every path out
    fn run<F>(self, output_dir: &Path, strategy: F) -> Result<Vec<OutputFile>>
    where
        F: FnOnce(&Self) -> Result<Vec<OutputFile>>,
    {
        let result = fs::create_dir_all(output_dir)
            .map_err(PdfSplitError::from)
            .and_then(|_| strategy(&self));

        let Self { engine, source, .. } = self;
        engine.close(source);
        result
    }

    /// Copy `part` into a fresh document and save it to `path`
    fn write_partition(&self, part: Partition, path: &Path, outline: &[TocEntry]) -> Result<OutputFile> {
        let mut doc = self.engine.new_document()?;
        let saved = self
            .engine
            .copy_pages(&mut doc, &self.source, part.pages())
            .and_then(|_| {
                if outline.is_empty() {
                    Ok(())
                } else {
                    self.engine.set_toc(&mut doc, outline)
                }
            })
            .and_then(|_| self.engine.save(&mut doc, path, SaveOptions::optimized()));
        self.engine.close(doc);
        saved?;

        info!("Generated {} ({})", path.display(), part);
        Ok(OutputFile::new(path.to_path_buf(), part))
    }
}
