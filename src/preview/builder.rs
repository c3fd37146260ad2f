//! Build preview lines from the comrak AST.

use comrak::nodes::{AstNode, ListDelimType, ListType, NodeValue, TableAlignment};
use comrak::{Arena, parse_document};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::highlight::highlight_code;
use crate::render::{RenderOptions, comrak_options};

use super::types::{CodeBlockRef, InlineSpan, InlineStyle, LineKind, PreviewLine, PreviewStyle};

/// Output of one build pass.
#[derive(Debug, Clone, Default)]
pub struct BuiltPreview {
    pub lines: Vec<PreviewLine>,
    pub code_blocks: Vec<CodeBlockRef>,
}

/// Lay `markdown` out at `width` columns.
pub fn build(markdown: &str, width: u16, style: PreviewStyle) -> BuiltPreview {
    let arena = Arena::new();
    let options = comrak_options(&RenderOptions::default());
    let root = parse_document(&arena, markdown, &options);

    let mut builder = Builder {
        out: BuiltPreview::default(),
        width: usize::from(width.max(8)),
        style,
    };
    builder.block(root, 0, None);
    while builder
        .out
        .lines
        .last()
        .is_some_and(|line| line.kind() == LineKind::Empty)
    {
        builder.out.lines.pop();
    }
    builder.out
}

struct Builder {
    out: BuiltPreview,
    width: usize,
    style: PreviewStyle,
}

impl Builder {
    fn push(&mut self, line: PreviewLine) {
        self.out.lines.push(line);
    }

    fn blank(&mut self) {
        if self
            .out
            .lines
            .last()
            .is_some_and(|line| line.kind() != LineKind::Empty)
        {
            self.push(PreviewLine::empty());
        }
    }

    fn block<'a>(&mut self, node: &'a AstNode<'a>, depth: usize, marker: Option<String>) {
        let value = node.data.borrow().value.clone();
        match value {
            NodeValue::Heading(heading) => {
                let mut spans = vec![InlineSpan::plain(format!(
                    "{} ",
                    "#".repeat(usize::from(heading.level))
                ))];
                spans.extend(inline_spans(node, InlineStyle {
                    strong: true,
                    ..InlineStyle::default()
                }));
                for line in wrap_spans(&spans, self.width, "", "") {
                    self.push(PreviewLine::with_spans(LineKind::Heading(heading.level), line));
                }
                self.blank();
            }

            NodeValue::Paragraph => {
                self.paragraph(node, LineKind::Paragraph, "", "");
                self.blank();
            }

            NodeValue::CodeBlock(block) => {
                let language = block
                    .info
                    .split_whitespace()
                    .next()
                    .filter(|s| !s.is_empty())
                    .map(ToString::to_string);
                self.code_block(node, language, &block.literal);
            }

            NodeValue::HtmlBlock(block) => {
                for raw in block.literal.lines() {
                    self.push(PreviewLine::new(raw, LineKind::Paragraph));
                }
                self.blank();
            }

            NodeValue::List(list) => {
                let count = node.children().count();
                let number_width = (list.start + count.saturating_sub(1)).to_string().len();
                let delimiter = match list.delimiter {
                    ListDelimType::Paren => ')',
                    ListDelimType::Period => '.',
                };
                for (index, item) in node.children().enumerate() {
                    let marker = match list.list_type {
                        ListType::Bullet => "• ".to_string(),
                        ListType::Ordered => {
                            format!("{:>number_width$}{delimiter} ", list.start + index)
                        }
                    };
                    self.block(item, depth + 1, Some(marker));
                }
                if depth == 0 {
                    self.blank();
                }
            }

            NodeValue::Item(_) | NodeValue::TaskItem(_) => {
                self.list_item(node, &value, depth, marker);
            }

            NodeValue::BlockQuote => {
                self.block_quote(node, 1);
                self.blank();
            }

            NodeValue::ThematicBreak => {
                self.push(PreviewLine::new(
                    "─".repeat(self.width.min(40)),
                    LineKind::HorizontalRule,
                ));
                self.blank();
            }

            NodeValue::Table(table) => {
                for line in render_table(node, &table.alignments, self.width) {
                    self.push(PreviewLine::new(line, LineKind::Table));
                }
                self.blank();
            }

            NodeValue::FootnoteDefinition(def) => {
                let label = format!("[^{}]: ", def.name);
                let continuation = " ".repeat(label.len());
                for child in node.children() {
                    self.paragraph(child, LineKind::Paragraph, &label, &continuation);
                }
                self.blank();
            }

            _ => {
                for child in node.children() {
                    self.block(child, depth, marker.clone());
                }
            }
        }
    }

    /// Wrap a paragraph, one output row group per hard line.
    fn paragraph<'a>(&mut self, node: &'a AstNode<'a>, kind: LineKind, first: &str, next: &str) {
        if let Some((alt, src)) = lone_image(node) {
            let label = if alt.is_empty() { src } else { alt };
            self.push(PreviewLine::new(format!("{first}[Image: {label}]"), LineKind::Image));
            return;
        }
        let mut prefix = first;
        for segment in split_hard_lines(inline_spans(node, InlineStyle::default())) {
            for line in wrap_spans(&segment, self.width, prefix, next) {
                self.push(PreviewLine::with_spans(kind, line));
            }
            prefix = next;
        }
    }

    fn list_item<'a>(
        &mut self,
        node: &'a AstNode<'a>,
        value: &NodeValue,
        depth: usize,
        marker: Option<String>,
    ) {
        let indent = "  ".repeat(depth.saturating_sub(1));
        let marker = match value {
            NodeValue::TaskItem(Some(_)) => "✓ ".to_string(),
            NodeValue::TaskItem(None) => "□ ".to_string(),
            _ => marker.unwrap_or_else(|| "• ".to_string()),
        };
        let first = format!("{indent}{marker}");
        let next = format!("{indent}{}", " ".repeat(marker.width()));
        let kind = LineKind::ListItem(depth);

        let mut rendered_any = false;
        for child in node.children() {
            let child_value = child.data.borrow().value.clone();
            match child_value {
                NodeValue::Paragraph => {
                    let prefix = if rendered_any { &next } else { &first };
                    self.paragraph(child, kind, prefix, &next);
                    rendered_any = true;
                }
                NodeValue::List(_) => self.block(child, depth, None),
                _ => {
                    if !rendered_any {
                        self.push(PreviewLine::new(first.trim_end(), kind));
                        rendered_any = true;
                    }
                    self.block(child, depth, None);
                }
            }
        }
        if !rendered_any {
            self.push(PreviewLine::new(first.trim_end(), kind));
        }
    }

    fn block_quote<'a>(&mut self, node: &'a AstNode<'a>, level: usize) {
        let prefix = "│ ".repeat(level);
        for child in node.children() {
            let is_quote = matches!(child.data.borrow().value, NodeValue::BlockQuote);
            let is_paragraph = matches!(child.data.borrow().value, NodeValue::Paragraph);
            if is_quote {
                self.block_quote(child, level + 1);
            } else if is_paragraph {
                self.paragraph(child, LineKind::BlockQuote, &prefix, &prefix);
            } else {
                let text = plain_text(child);
                for raw in text.lines() {
                    self.push(PreviewLine::new(format!("{prefix}{raw}"), LineKind::BlockQuote));
                }
            }
        }
    }

    fn code_block<'a>(&mut self, node: &'a AstNode<'a>, language: Option<String>, code: &str) {
        let sourcepos = node.data.borrow().sourcepos;
        let label = language.clone().unwrap_or_else(|| "text".to_string());
        let header_line = self.out.lines.len();

        let header_style = InlineStyle {
            code: true,
            strong: true,
            ..InlineStyle::default()
        };
        let badge_style = InlineStyle {
            link: true,
            ..InlineStyle::default()
        };
        let badge = "[copy]";
        let gap = self
            .width
            .saturating_sub(label.width() + badge.len() + 2)
            .max(1);
        self.push(PreviewLine::with_spans(LineKind::CodeHeader, vec![
            InlineSpan::new(format!(" {label}"), header_style),
            InlineSpan::new(" ".repeat(gap), InlineStyle {
                code: true,
                ..InlineStyle::default()
            }),
            InlineSpan::new(badge.to_string(), badge_style),
        ]));

        let highlighted = highlight_code(language.as_deref(), code, self.style.background());
        for spans in highlighted {
            let mut line = vec![InlineSpan::new("  ".to_string(), InlineStyle {
                code: true,
                ..InlineStyle::default()
            })];
            line.extend(truncate_spans(spans, self.width.saturating_sub(2)));
            self.push(PreviewLine::with_spans(LineKind::CodeBlock, line));
        }
        self.blank();

        self.out.code_blocks.push(CodeBlockRef {
            language,
            code: code.to_string(),
            header_line,
            source_lines: sourcepos.start.line.saturating_sub(1)..sourcepos.end.line,
        });
    }
}

fn inline_spans<'a>(node: &'a AstNode<'a>, style: InlineStyle) -> Vec<InlineSpan> {
    let mut spans = Vec::new();
    for child in node.children() {
        collect_inline(child, style, &mut spans);
    }
    spans
}

/// Marker span for a hard line break inside inline content.
const BREAK: &str = "\n";

fn collect_inline<'a>(node: &'a AstNode<'a>, style: InlineStyle, spans: &mut Vec<InlineSpan>) {
    let value = node.data.borrow().value.clone();
    let nested = |style: InlineStyle, spans: &mut Vec<InlineSpan>| {
        for child in node.children() {
            collect_inline(child, style, spans);
        }
    };
    match value {
        NodeValue::Text(text) | NodeValue::HtmlInline(text) => {
            spans.push(InlineSpan::new(text, style));
        }
        NodeValue::Code(code) => {
            spans.push(InlineSpan::new(code.literal, InlineStyle {
                code: true,
                emphasis: false,
                strong: false,
                strikethrough: false,
                ..style
            }));
        }
        NodeValue::Emph => nested(InlineStyle { emphasis: true, ..style }, spans),
        NodeValue::Strong => nested(InlineStyle { strong: true, ..style }, spans),
        NodeValue::Strikethrough => nested(InlineStyle { strikethrough: true, ..style }, spans),
        NodeValue::Link(_) => nested(InlineStyle { link: true, ..style }, spans),
        NodeValue::Image(image) => {
            let alt = plain_text(node);
            let label = if alt.is_empty() { image.url } else { alt };
            spans.push(InlineSpan::new(format!("[Image: {label}]"), style));
        }
        NodeValue::FootnoteReference(reference) => {
            spans.push(InlineSpan::new(format!("[^{}]", reference.name), style));
        }
        // Hard breaks are on, so every newline starts a new row.
        NodeValue::SoftBreak | NodeValue::LineBreak => {
            spans.push(InlineSpan::new(BREAK.to_string(), style));
        }
        NodeValue::List(_) | NodeValue::Item(_) => {}
        _ => nested(style, spans),
    }
}

fn split_hard_lines(spans: Vec<InlineSpan>) -> Vec<Vec<InlineSpan>> {
    let mut segments = vec![Vec::new()];
    for span in spans {
        if span.text() == BREAK {
            segments.push(Vec::new());
        } else if let Some(current) = segments.last_mut() {
            current.push(span);
        }
    }
    segments
}

fn plain_text<'a>(node: &'a AstNode<'a>) -> String {
    let mut text = String::new();
    for span in inline_spans(node, InlineStyle::default()) {
        if span.text() == BREAK {
            text.push(' ');
        } else {
            text.push_str(span.text());
        }
    }
    text
}

/// `(alt, src)` when a paragraph holds nothing but one image.
fn lone_image<'a>(node: &'a AstNode<'a>) -> Option<(String, String)> {
    let mut children = node.children();
    let only = children.next()?;
    if children.next().is_some() {
        return None;
    }
    let url = match &only.data.borrow().value {
        NodeValue::Image(image) => image.url.clone(),
        _ => return None,
    };
    Some((plain_text(only), url))
}

fn wrap_spans(
    spans: &[InlineSpan],
    width: usize,
    prefix_first: &str,
    prefix_next: &str,
) -> Vec<Vec<InlineSpan>> {
    let mut lines = Vec::new();
    let mut current = Vec::new();
    let mut current_width = 0;
    let mut has_word = false;
    let mut trailing_spaces = 0;

    let start_line = |prefix: &str, current: &mut Vec<InlineSpan>, current_width: &mut usize| {
        current.clear();
        *current_width = prefix.width();
        if !prefix.is_empty() {
            current.push(InlineSpan::plain(prefix));
        }
    };
    start_line(prefix_first, &mut current, &mut current_width);

    for token in spans.iter().flat_map(split_words) {
        let token_width = token.text().width();
        let is_space = token.text().chars().all(char::is_whitespace);

        if has_word && current_width + token_width > width {
            current.truncate(current.len() - trailing_spaces);
            lines.push(std::mem::take(&mut current));
            start_line(prefix_next, &mut current, &mut current_width);
            has_word = false;
            trailing_spaces = 0;
        }
        if is_space && !has_word {
            continue;
        }
        current_width += token_width;
        current.push(token);
        has_word = true;
        trailing_spaces = if is_space { trailing_spaces + 1 } else { 0 };
    }

    current.truncate(current.len() - trailing_spaces);
    lines.push(current);
    lines
}

/// Split a span into alternating word and whitespace runs.
fn split_words(span: &InlineSpan) -> Vec<InlineSpan> {
    let mut out = Vec::new();
    let mut buf = String::new();
    let mut in_space = None;
    for ch in span.text().chars() {
        let is_space = ch.is_whitespace();
        if in_space.is_some_and(|state| state != is_space) {
            out.push(InlineSpan::new(std::mem::take(&mut buf), span.style()));
        }
        in_space = Some(is_space);
        buf.push(ch);
    }
    if !buf.is_empty() {
        out.push(InlineSpan::new(buf, span.style()));
    }
    out
}

fn truncate_spans(spans: Vec<InlineSpan>, max_width: usize) -> Vec<InlineSpan> {
    let mut out = Vec::new();
    let mut remaining = max_width;
    for span in spans {
        let mut taken = String::new();
        for ch in span.text().chars() {
            let w = ch.width().unwrap_or(0);
            if w > remaining {
                remaining = 0;
                break;
            }
            remaining -= w;
            taken.push(ch);
        }
        if !taken.is_empty() {
            out.push(InlineSpan::new(taken, span.style()));
        }
        if remaining == 0 {
            break;
        }
    }
    out
}

fn render_table<'a>(
    table: &'a AstNode<'a>,
    alignments: &[TableAlignment],
    width: usize,
) -> Vec<String> {
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut has_header = false;
    for row in table.children() {
        if matches!(row.data.borrow().value, NodeValue::TableRow(true)) {
            has_header = true;
        }
        rows.push(
            row.children()
                .map(|cell| plain_text(cell).split_whitespace().collect::<Vec<_>>().join(" "))
                .collect(),
        );
    }
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    if columns == 0 {
        return Vec::new();
    }

    let mut widths = vec![1_usize; columns];
    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(cell.width());
        }
    }
    // Each column costs its width plus three border/padding cells.
    while 1 + widths.iter().sum::<usize>() + 3 * columns > width.max(4) {
        let Some(widest) = widths.iter_mut().max() else {
            break;
        };
        if *widest <= 1 {
            break;
        }
        *widest -= 1;
    }

    let border = |left: char, mid: char, right: char| {
        let inner: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
        format!("{left}{}{right}", inner.join(&mid.to_string()))
    };

    let mut out = vec![border('┌', '┬', '┐')];
    for (idx, row) in rows.iter().enumerate() {
        let mut line = String::from("│");
        for (col, width) in widths.iter().enumerate() {
            let cell = fit(row.get(col).map_or("", String::as_str), *width);
            let pad = width - cell.width();
            let (left, right) = match alignments.get(col).copied().unwrap_or(TableAlignment::None) {
                TableAlignment::Right => (pad, 0),
                TableAlignment::Center => (pad / 2, pad - pad / 2),
                TableAlignment::Left | TableAlignment::None => (0, pad),
            };
            line.push_str(&format!(
                " {}{cell}{} │",
                " ".repeat(left),
                " ".repeat(right)
            ));
        }
        out.push(line);
        if has_header && idx == 0 {
            out.push(border('├', '┼', '┤'));
        }
    }
    out.push(border('└', '┴', '┘'));
    out
}

fn fit(text: &str, max_width: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > max_width {
            break;
        }
        used += w;
        out.push(ch);
    }
    out
}
