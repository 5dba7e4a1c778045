//! PDF split operations
//!
//! Splits one source PDF into several smaller ones, by:
//! - fixed page count (`Splitter::split_by_pages`)
//! - explicit page ranges (`Splitter::split_by_range`)
//! - top-level bookmarks (`Splitter::split_by_bookmark`)
//! - pages containing a keyword (`Splitter::split_by_keyword`)
//!
//! Reading and writing PDF bytes is left to a [`PdfEngine`]; [`LopdfEngine`]
//! is the real one.

pub mod engine;
pub mod error;
pub mod naming;
pub mod partition;
pub mod range;
pub mod report;
pub mod split;
pub mod toc;

pub use engine::{LopdfEngine, MemoryEngine, PdfEngine, SaveOptions};
pub use error::PdfSplitError;
pub use partition::Partition;
pub use range::PageRange;
pub use report::{SplitReport, Strategy};
pub use split::{OutputFile, Splitter};
pub use toc::TocEntry;

