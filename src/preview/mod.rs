//! Rendered preview of the editor content.
//!
//! The preview is rebuilt from the settled markdown whenever the content,
//! width, or color style changes. Rows are styled spans ready for the
//! terminal and for the PDF rasterizer.

mod builder;
mod types;

use std::ops::Deref;

use crate::highlight::HighlightBackground;

pub use types::{
    CodeBlockRef, InlineColor, InlineSpan, InlineStyle, LineKind, PreviewLine, PreviewStyle,
};

/// The preview surface: source, layout width, style, and built lines.
#[derive(Debug, Clone)]
pub struct Preview {
    source: String,
    width: u16,
    style: PreviewStyle,
    lines: Vec<PreviewLine>,
    code_blocks: Vec<CodeBlockRef>,
}

impl Preview {
    pub fn new(source: &str, width: u16, style: PreviewStyle) -> Self {
        let mut preview = Self {
            source: source.to_string(),
            width,
            style,
            lines: Vec::new(),
            code_blocks: Vec::new(),
        };
        preview.rebuild();
        preview
    }

    /// Replace the markdown source.
    pub fn set_source(&mut self, source: &str) {
        if self.source == source {
            return;
        }
        self.source = source.to_string();
        self.rebuild();
    }

    /// Relayout for a new pane width.
    pub fn resize(&mut self, width: u16) {
        if self.width == width {
            return;
        }
        self.width = width;
        self.rebuild();
    }

    pub fn set_style(&mut self, style: PreviewStyle) {
        if self.style == style {
            return;
        }
        self.style = style;
        self.rebuild();
    }

    /// Force light colors until the guard drops.
    pub fn force_light(&mut self) -> StyleOverride<'_> {
        let saved = self.style;
        self.set_style(PreviewStyle::new(HighlightBackground::Light));
        StyleOverride {
            preview: self,
            saved,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub const fn width(&self) -> u16 {
        self.width
    }

    pub const fn style(&self) -> PreviewStyle {
        self.style
    }

    pub fn lines(&self) -> &[PreviewLine] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn code_blocks(&self) -> &[CodeBlockRef] {
        &self.code_blocks
    }

    /// Code block whose source covers `source_line` (0-based).
    pub fn code_block_at_source_line(&self, source_line: usize) -> Option<&CodeBlockRef> {
        self.code_blocks
            .iter()
            .find(|block| block.source_lines.contains(&source_line))
    }

    /// First code block whose header is at or below preview row `row`.
    pub fn code_block_from_row(&self, row: usize) -> Option<&CodeBlockRef> {
        self.code_blocks.iter().find(|block| block.header_line >= row)
    }

    fn rebuild(&mut self) {
        let built = builder::build(&self.source, self.width, self.style);
        tracing::debug!(
            lines = built.lines.len(),
            code_blocks = built.code_blocks.len(),
            "preview rebuilt"
        );
        self.lines = built.lines;
        self.code_blocks = built.code_blocks;
    }
}

/// Scoped style override; restores the previous style on drop.
#[derive(Debug)]
pub struct StyleOverride<'a> {
    preview: &'a mut Preview,
    saved: PreviewStyle,
}

impl Deref for StyleOverride<'_> {
    type Target = Preview;

    fn deref(&self) -> &Self::Target {
        self.preview
    }
}

impl Drop for StyleOverride<'_> {
    fn drop(&mut self) {
        self.preview.set_style(self.saved);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dark_preview(source: &str) -> Preview {
        Preview::new(
            source,
            60,
            PreviewStyle::new(HighlightBackground::Dark),
        )
    }

    #[test]
    fn test_set_source_rebuilds_lines() {
        let mut preview = dark_preview("# One");
        assert_eq!(preview.lines()[0].content(), "# One");
        preview.set_source("# Two");
        assert_eq!(preview.lines()[0].content(), "# Two");
        assert_eq!(preview.source(), "# Two");
    }

    #[test]
    fn test_resize_rewraps() {
        let mut preview = dark_preview("alpha beta gamma delta epsilon zeta eta theta");
        let wide = preview.line_count();
        preview.resize(10);
        assert!(preview.line_count() > wide);
    }

    #[test]
    fn test_force_light_restores_style_on_drop() {
        let mut preview = dark_preview("text");
        {
            let guard = preview.force_light();
            assert!(guard.style().is_light());
        }
        assert!(!preview.style().is_light());
    }

    #[test]
    fn test_force_light_restores_style_when_unwinding() {
        let mut preview = dark_preview("text");
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = preview.force_light();
            panic!("rasterizer blew up");
        }));
        assert!(result.is_err());
        assert!(!preview.style().is_light());
    }

    #[test]
    fn test_forced_light_recolors_code() {
        let source = "```rust\nlet value = \"text\";\n```";
        let mut preview = dark_preview(source);
        let colors = |p: &Preview| -> Vec<Option<InlineColor>> {
            p.lines()
                .iter()
                .filter(|l| l.kind() == LineKind::CodeBlock)
                .flat_map(PreviewLine::spans)
                .map(|s| s.style().fg)
                .collect()
        };
        let dark = colors(&preview);
        let light = colors(&preview.force_light());
        assert_ne!(dark, light);
        assert_eq!(colors(&preview), dark);
    }

    #[test]
    fn test_code_block_lookup_by_source_line_and_row() {
        let preview = dark_preview("text\n\n```sh\necho hi\n```\n");
        let block = preview.code_block_at_source_line(3).expect("inside fence");
        assert_eq!(block.code, "echo hi\n");
        assert!(preview.code_block_at_source_line(0).is_none());
        assert_eq!(
            preview.code_block_from_row(0).map(|b| b.header_line),
            Some(block.header_line)
        );
    }
}
