//! Rasterizing the preview for PDF export.
//!
//! The default rasterizer lays the preview rows out as SVG text on a fixed
//! monospace grid and renders it with resvg.

use std::fmt::Write as _;
use std::sync::{Arc, OnceLock};

use image::{DynamicImage, RgbImage, RgbaImage};
use resvg::usvg::fontdb;
use unicode_width::UnicodeWidthStr;

use crate::error::ExportError;
use crate::preview::{InlineColor, LineKind, Preview, PreviewLine, PreviewStyle};
use crate::render::escape_html;

/// Turns the preview into a bitmap.
pub trait Rasterizer {
    /// Render `preview` at `scale` times its natural size.
    fn rasterize(&self, preview: &Preview, scale: f32) -> Result<RgbImage, ExportError>;
}

/// Preview rows as SVG text, rendered by resvg.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SvgRasterizer {
    pub font_size: f32,
    /// Advance of one terminal cell, in SVG units
    pub cell_width: f32,
    pub line_height: f32,
    pub padding: f32,
}

impl Default for SvgRasterizer {
    fn default() -> Self {
        Self {
            font_size: 14.0,
            cell_width: 8.4,
            line_height: 20.0,
            padding: 24.0,
        }
    }
}

impl SvgRasterizer {
    /// SVG document for `preview` at natural size.
    pub fn to_svg(&self, preview: &Preview) -> String {
        let style = preview.style();
        let lines = preview.lines();
        let columns = lines
            .iter()
            .map(|line| line.content().width())
            .max()
            .unwrap_or(0)
            .max(usize::from(preview.width()));
        let width = (columns as f32).mul_add(self.cell_width, self.padding * 2.0);
        let height = (lines.len().max(1) as f32).mul_add(self.line_height, self.padding * 2.0);

        let mut svg = String::with_capacity(lines.len() * 128 + 512);
        let _ = write!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
        );
        let _ = write!(
            svg,
            r#"<rect width="100%" height="100%" fill="{}"/>"#,
            style.page_color().to_hex()
        );
        for (row, line) in lines.iter().enumerate() {
            self.write_line(&mut svg, line, row, width, style);
        }
        svg.push_str("</svg>");
        svg
    }

    fn write_line(
        &self,
        svg: &mut String,
        line: &PreviewLine,
        row: usize,
        width: f32,
        style: PreviewStyle,
    ) {
        let top = (row as f32).mul_add(self.line_height, self.padding);
        if matches!(line.kind(), LineKind::CodeBlock | LineKind::CodeHeader) {
            let _ = write!(
                svg,
                r#"<rect x="{}" y="{top}" width="{}" height="{}" fill="{}"/>"#,
                self.padding / 2.0,
                self.padding.mul_add(-1.0, width),
                self.line_height,
                style.code_color().to_hex()
            );
        }

        let baseline = top + self.line_height * 0.75;
        let mut column = 0usize;
        for span in line.spans() {
            let text = span.text();
            let cells = text.width();
            if text.trim().is_empty() {
                column += cells;
                continue;
            }
            let span_style = span.style();
            let color = span_style.fg.unwrap_or_else(|| default_color(line.kind(), span_style.link, style));
            let x = (column as f32).mul_add(self.cell_width, self.padding);
            let bold = span_style.strong || matches!(line.kind(), LineKind::Heading(_));
            let mut decoration = Vec::new();
            if span_style.link {
                decoration.push("underline");
            }
            if span_style.strikethrough {
                decoration.push("line-through");
            }
            let _ = write!(
                svg,
                r#"<text x="{x}" y="{baseline}" font-family="DejaVu Sans Mono, Menlo, Consolas, monospace" font-size="{}" fill="{}" xml:space="preserve""#,
                self.font_size,
                color.to_hex()
            );
            if bold {
                svg.push_str(r#" font-weight="bold""#);
            }
            if span_style.emphasis {
                svg.push_str(r#" font-style="italic""#);
            }
            if !decoration.is_empty() {
                let _ = write!(svg, r#" text-decoration="{}""#, decoration.join(" "));
            }
            let _ = write!(svg, ">{}</text>", escape_html(text));
            column += cells;
        }
    }
}

fn default_color(kind: LineKind, link: bool, style: PreviewStyle) -> InlineColor {
    if link {
        return style.link_color();
    }
    match kind {
        LineKind::BlockQuote | LineKind::Image | LineKind::HorizontalRule => style.muted_color(),
        _ => style.text_color(),
    }
}

fn font_database() -> Arc<fontdb::Database> {
    static FONTS: OnceLock<Arc<fontdb::Database>> = OnceLock::new();
    FONTS
        .get_or_init(|| {
            let mut db = fontdb::Database::new();
            db.load_system_fonts();
            tracing::debug!(faces = db.len(), "loaded system fonts");
            Arc::new(db)
        })
        .clone()
}

impl Rasterizer for SvgRasterizer {
    fn rasterize(&self, preview: &Preview, scale: f32) -> Result<RgbImage, ExportError> {
        let svg = self.to_svg(preview);
        let opts = resvg::usvg::Options {
            fontdb: font_database(),
            ..Default::default()
        };
        let tree = resvg::usvg::Tree::from_str(&svg, &opts)
            .map_err(|err| ExportError::Raster(err.to_string()))?;
        let size = tree.size();

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let width = (size.width() * scale).ceil() as u32;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let height = (size.height() * scale).ceil() as u32;

        let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
            .ok_or_else(|| ExportError::Raster(format!("failed to create pixmap {width}x{height}")))?;
        resvg::render(
            &tree,
            resvg::tiny_skia::Transform::from_scale(scale, scale),
            &mut pixmap.as_mut(),
        );

        let rgba = RgbaImage::from_raw(width, height, pixmap.data().to_vec())
            .ok_or_else(|| ExportError::Raster("pixmap size mismatch".to_string()))?;
        Ok(DynamicImage::ImageRgba8(rgba).to_rgb8())
    }
}
