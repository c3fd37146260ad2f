//! Export to markdown, HTML, and PDF files, and markdown import.

mod pdf;
mod raster;

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ExportError, ReadError};
use crate::render::{RenderOptions, render_html_lossy, standalone_document};

pub use pdf::{
    A4_HEIGHT_PT, A4_WIDTH_PT, PageSlice, RASTER_SCALE, build_pdf, export_as_pdf, page_slices,
};
pub use raster::{Rasterizer, SvgRasterizer};

/// Extensions accepted by [`import_from_file`].
pub const IMPORT_EXTENSIONS: [&str; 3] = ["md", "markdown", "txt"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Markdown,
    Html,
    Pdf,
}

impl ExportFormat {
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Html => "html",
            Self::Pdf => "pdf",
        }
    }

    pub const fn mime(self) -> &'static str {
        match self {
            Self::Markdown => "text/markdown",
            Self::Html => "text/html",
            Self::Pdf => "application/pdf",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Markdown => "Markdown",
            Self::Html => "HTML",
            Self::Pdf => "PDF",
        }
    }

    /// `document.<ext>`
    pub fn default_file_name(self) -> String {
        format!("document.{}", self.extension())
    }

    /// Target path for this format inside `dir`.
    pub fn path_in(self, dir: &Path) -> PathBuf {
        dir.join(self.default_file_name())
    }
}

/// Write `bytes` to `path` in one step.
///
/// The data goes to a sibling temp file first, then replaces `path`, so a
/// failed export never leaves a truncated file behind.
pub fn export_as_file(bytes: &[u8], path: &Path, mime: &str) -> Result<(), ExportError> {
    let write_err = |source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".partial");
    let tmp = path.with_file_name(tmp_name);

    let result = fs::write(&tmp, bytes).and_then(|()| fs::rename(&tmp, path));
    if let Err(err) = result {
        let _ = fs::remove_file(&tmp);
        tracing::error!(path = %path.display(), %err, "export failed");
        return Err(write_err(err));
    }
    tracing::debug!(path = %path.display(), mime, bytes = bytes.len(), "exported");
    Ok(())
}

/// Export the raw markdown.
pub fn export_as_markdown(markdown: &str, path: &Path) -> Result<(), ExportError> {
    export_as_file(markdown.as_bytes(), path, ExportFormat::Markdown.mime())
}

/// Render `markdown` into a standalone HTML page and write it.
pub fn export_as_html(
    markdown: &str,
    options: &RenderOptions,
    path: &Path,
) -> Result<(), ExportError> {
    let html = standalone_document(&render_html_lossy(markdown, options));
    export_as_file(html.as_bytes(), path, ExportFormat::Html.mime())
}

/// Read a markdown or text file as UTF-8.
pub fn import_from_file(path: &Path) -> Result<String, ReadError> {
    let accepted = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMPORT_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        });
    if !accepted {
        return Err(ReadError::Unsupported {
            path: path.to_path_buf(),
        });
    }

    let bytes = fs::read(path).map_err(|source| ReadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut text = String::from_utf8(bytes).map_err(|_| ReadError::NotText {
        path: path.to_path_buf(),
    })?;
    if text.starts_with('\u{feff}') {
        text.drain(..'\u{feff}'.len_utf8());
    }
    tracing::debug!(path = %path.display(), chars = text.chars().count(), "imported");
    Ok(text)
}
