use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfSplitError {
    #[error("Input file does not exist: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Failed to load PDF: {0}")]
    LoadError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("PDF engine operation failed: {0}")]
    EngineError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PdfSplitError>;
