//! Core preview types.

use std::ops::Range;

use crate::highlight::HighlightBackground;

/// Text styling applied to an inline span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InlineStyle {
    pub emphasis: bool,
    pub strong: bool,
    pub code: bool,
    pub strikethrough: bool,
    pub link: bool,
    pub fg: Option<InlineColor>,
    pub bg: Option<InlineColor>,
}

/// RGB color for inline styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InlineColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl InlineColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `#rrggbb` form used by the SVG rasterizer.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// A styled inline span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineSpan {
    text: String,
    style: InlineStyle,
}

impl InlineSpan {
    pub const fn new(text: String, style: InlineStyle) -> Self {
        Self { text, style }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text.into(), InlineStyle::default())
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub const fn style(&self) -> InlineStyle {
        self.style
    }
}

/// Kind of a preview line, used for styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Paragraph,
    /// Heading with level (1-6)
    Heading(u8),
    /// Language header of a code block, carrying the copy badge
    CodeHeader,
    CodeBlock,
    BlockQuote,
    /// List item with nesting level
    ListItem(usize),
    Table,
    HorizontalRule,
    Image,
    Empty,
}

/// One rendered row of the preview pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewLine {
    kind: LineKind,
    spans: Vec<InlineSpan>,
}

impl PreviewLine {
    pub fn new(content: impl Into<String>, kind: LineKind) -> Self {
        let content = content.into();
        let spans = if content.is_empty() {
            Vec::new()
        } else {
            vec![InlineSpan::plain(content)]
        };
        Self { kind, spans }
    }

    pub const fn with_spans(kind: LineKind, spans: Vec<InlineSpan>) -> Self {
        Self { kind, spans }
    }

    pub fn empty() -> Self {
        Self::with_spans(LineKind::Empty, Vec::new())
    }

    pub const fn kind(&self) -> LineKind {
        self.kind
    }

    pub fn spans(&self) -> &[InlineSpan] {
        &self.spans
    }

    /// Plain text of the line.
    pub fn content(&self) -> String {
        self.spans.iter().map(InlineSpan::text).collect()
    }
}

/// A fenced or indented code block found while building the preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlockRef {
    /// Language token from the fence, if any
    pub language: Option<String>,
    /// Raw code, as the copy badge would place it on the clipboard
    pub code: String,
    /// Index of the header line in the preview
    pub header_line: usize,
    /// 0-based source lines from opening to closing fence
    pub source_lines: Range<usize>,
}

/// Color mode of the preview surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewStyle {
    background: HighlightBackground,
}

impl PreviewStyle {
    pub const fn new(background: HighlightBackground) -> Self {
        Self { background }
    }

    pub const fn background(self) -> HighlightBackground {
        self.background
    }

    pub const fn is_light(self) -> bool {
        matches!(self.background, HighlightBackground::Light)
    }

    /// Page color behind the text.
    pub const fn page_color(self) -> InlineColor {
        match self.background {
            HighlightBackground::Light => InlineColor::new(255, 255, 255),
            HighlightBackground::Dark => InlineColor::new(30, 30, 30),
        }
    }

    /// Default text color.
    pub const fn text_color(self) -> InlineColor {
        match self.background {
            HighlightBackground::Light => InlineColor::new(36, 41, 46),
            HighlightBackground::Dark => InlineColor::new(212, 212, 212),
        }
    }

    /// Background of code blocks.
    pub const fn code_color(self) -> InlineColor {
        match self.background {
            HighlightBackground::Light => InlineColor::new(246, 248, 250),
            HighlightBackground::Dark => InlineColor::new(45, 45, 45),
        }
    }

    pub const fn link_color(self) -> InlineColor {
        match self.background {
            HighlightBackground::Light => InlineColor::new(3, 102, 214),
            HighlightBackground::Dark => InlineColor::new(86, 156, 214),
        }
    }

    pub const fn muted_color(self) -> InlineColor {
        match self.background {
            HighlightBackground::Light => InlineColor::new(106, 115, 125),
            HighlightBackground::Dark => InlineColor::new(128, 128, 128),
        }
    }
}

impl Default for PreviewStyle {
    fn default() -> Self {
        Self::new(HighlightBackground::Dark)
    }
}
