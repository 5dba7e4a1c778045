use crate::split::OutputFile;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Which partitioning strategy produced a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Strategy {
    Pages { pages_per_file: u32 },
    Range { ranges: Vec<String> },
    Bookmark,
    Keyword { keyword: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct SplitReport {
    pub source: PathBuf,
    pub output_dir: PathBuf,
    pub total_pages: u32,
    pub strategy: Strategy,
    pub files: Vec<ReportedFile>,
    pub metrics: SplitMetrics,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportedFile {
    #[serde(flatten)]
    pub file: OutputFile,
    /// Size on disk, when the file could be stat'ed
    pub size_bytes: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SplitMetrics {
    pub input_size_bytes: Option<u64>,
    pub output_size_bytes: u64,
    pub file_count: usize,
    pub processing_time_ms: u64,
}

impl SplitReport {
    /// Build a report, reading file sizes from disk
    pub fn new(
        source: &Path,
        output_dir: &Path,
        total_pages: u32,
        strategy: Strategy,
        outputs: Vec<OutputFile>,
        processing_time_ms: u64,
    ) -> Self {
        let files: Vec<ReportedFile> = outputs
            .into_iter()
            .map(|file| {
                let size_bytes = file_size(&file.path);
                ReportedFile { file, size_bytes }
            })
            .collect();

        let metrics = SplitMetrics {
            input_size_bytes: file_size(source),
            output_size_bytes: files.iter().filter_map(|f| f.size_bytes).sum(),
            file_count: files.len(),
            processing_time_ms,
        };

        Self {
            source: source.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            total_pages,
            strategy,
            files,
            metrics,
        }
    }
}

fn file_size(path: &Path) -> Option<u64> {
    std::fs::metadata(path).map(|m| m.len()).ok()
}
