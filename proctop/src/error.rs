//! Error types shared by the data source, the views and the one-shot tools.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures reading process data.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The proc filesystem (or whatever backs the source) is missing.
    #[error("process information not available at {}", .0.display())]
    Unavailable(PathBuf),

    #[error("no such process: {0}")]
    NoSuchProcess(u32),

    #[error("malformed {}: {reason}", .file.display())]
    Parse { file: PathBuf, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Failures while a view renders a frame.
#[derive(Debug, Error)]
pub enum ViewError {
    /// Required runtime facilities are absent. The render loop treats this
    /// as fatal.
    #[error("required runtime components not found: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Source(SourceError),

    /// Writing to the terminal failed.
    #[error("terminal I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<SourceError> for ViewError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Unavailable(path) => ViewError::Unavailable(path.display().to_string()),
            other => ViewError::Source(other),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    View(#[from] ViewError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
