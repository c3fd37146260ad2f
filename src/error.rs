//! Error kinds surfaced by the editor.
//!
//! None of these is fatal: each is caught at the boundary of the operation
//! that raised it and shown as a non-blocking notification.

use std::path::PathBuf;

use thiserror::Error;

/// A file could not be imported as text.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is not valid UTF-8 text")]
    NotText { path: PathBuf },
    #[error("{path} is not a markdown file")]
    Unsupported { path: PathBuf },
}

/// Autosave storage failed. The editor keeps working without persistence.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(#[from] std::io::Error),
    #[error("storage is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("storage quota exceeded ({needed} bytes needed, {quota} allowed)")]
    QuotaExceeded { needed: usize, quota: usize },
}

/// The markdown renderer could not produce HTML.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to format html: {0}")]
    Format(#[from] std::io::Error),
    #[error("rendered html is not UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// An export could not be completed. No partial file is left behind.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to rasterize preview: {0}")]
    Raster(String),
    #[error("failed to encode page image: {0}")]
    Encode(#[from] image::ImageError),
    #[error("nothing to export")]
    Empty,
}
