use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Padding, Paragraph};

use crate::app::Model;
use crate::editor::MarkupToken;

use super::{DOCUMENT_LEFT_PADDING, EDITOR_WIDTH_PERCENT, PREVIEW_WIDTH_PERCENT, overlays, status};

/// Screen regions of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppLayout {
    pub toolbar: Rect,
    pub editor: Rect,
    /// Preview column including its left border
    pub preview: Rect,
    pub prompt: Option<Rect>,
    pub toast: Option<Rect>,
    pub status: Rect,
}

pub fn split_main_columns(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(EDITOR_WIDTH_PERCENT),
            Constraint::Percentage(PREVIEW_WIDTH_PERCENT),
        ])
        .split(area)
}

/// Columns available to preview text in a terminal `total_width` wide.
pub fn preview_content_width(total_width: u16) -> u16 {
    let area = Rect::new(0, 0, total_width, 1);
    split_main_columns(area)[1]
        .width
        .saturating_sub(1 + DOCUMENT_LEFT_PADDING)
        .max(1)
}

/// Split the frame: toolbar on top, editor and preview side by side, then
/// the optional prompt and toast rows above the status bar.
pub fn layout(area: Rect, model: &Model) -> AppLayout {
    let prompt_rows = u16::from(model.prompt.is_some());
    let toast_rows = u16::from(model.active_toast().is_some());
    let footer_rows = 1 + prompt_rows + toast_rows;

    let toolbar = Rect {
        height: area.height.min(1),
        ..area
    };
    let main = Rect {
        y: area.y + toolbar.height,
        height: area.height.saturating_sub(toolbar.height + footer_rows),
        ..area
    };
    let columns = split_main_columns(main);
    let footer_row = |offset: u16| Rect {
        y: area.y + area.height.saturating_sub(offset),
        height: 1,
        ..area
    };

    AppLayout {
        toolbar,
        editor: columns[0],
        preview: columns[1],
        prompt: (prompt_rows > 0).then(|| footer_row(2 + toast_rows)),
        toast: (toast_rows > 0).then(|| footer_row(2)),
        status: footer_row(1),
    }
}

/// Render the complete UI.
pub fn render(model: &mut Model, frame: &mut Frame) {
    let area = frame.area();
    let regions = layout(area, model);

    render_toolbar(model, frame, regions.toolbar);
    render_editor(model, frame, regions.editor);
    render_preview(model, frame, regions.preview);

    if let Some(prompt_area) = regions.prompt {
        status::render_prompt_bar(model, frame, prompt_area);
    }
    if let Some(toast_area) = regions.toast {
        status::render_toast_bar(model, frame, toast_area);
    }
    status::render_status_bar(model, frame, regions.status);

    if model.help_visible {
        overlays::render_help_overlay(model, frame, area);
    }
}

fn render_toolbar(model: &Model, frame: &mut Frame, area: Rect) {
    let key_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
    let mut spans = vec![Span::raw(" ")];
    for (idx, token) in MarkupToken::ALL.iter().enumerate() {
        spans.push(Span::styled(format!("M-{}", idx + 1), key_style));
        spans.push(Span::raw(format!(" {}  ", token.label())));
    }
    spans.push(Span::styled("^S", key_style));
    spans.push(Span::raw(" .md  "));
    spans.push(Span::styled("^E", key_style));
    spans.push(Span::raw(" .html  "));
    spans.push(Span::styled("^P", key_style));
    spans.push(Span::raw(" .pdf"));

    let toolbar_style = if model.preview.style().is_light() {
        Style::default().bg(Color::Indexed(252)).fg(Color::Indexed(235))
    } else {
        Style::default().bg(Color::Indexed(236)).fg(Color::Indexed(252))
    };
    frame.render_widget(Paragraph::new(Line::from(spans)).style(toolbar_style), area);
}

/// Width of the line number gutter plus its separating space.
pub fn editor_gutter_width(model: &Model) -> u16 {
    line_number_width(model.controller.buffer().line_count()) + 1
}

/// Keep the caret inside the visible editor rows and columns.
fn scroll_editor_to_caret(model: &mut Model, rows: usize, cols: usize) {
    let cursor = model.controller.buffer().cursor();
    if rows > 0 {
        if cursor.line < model.editor_scroll_offset {
            model.editor_scroll_offset = cursor.line;
        } else if cursor.line >= model.editor_scroll_offset + rows {
            model.editor_scroll_offset = cursor.line + 1 - rows;
        }
    }
    if cols > 0 {
        if cursor.col < model.editor_col_offset {
            model.editor_col_offset = cursor.col;
        } else if cursor.col >= model.editor_col_offset + cols {
            model.editor_col_offset = cursor.col + 1 - cols;
        }
    }
}

fn render_editor(model: &mut Model, frame: &mut Frame, area: Rect) {
    let gutter_width = editor_gutter_width(model);
    let rows = usize::from(area.height);
    let cols = usize::from(area.width.saturating_sub(gutter_width));
    scroll_editor_to_caret(model, rows, cols);

    let buf = model.controller.buffer();
    let total_lines = buf.line_count();
    let start = model.editor_scroll_offset;
    let end = (start + rows).min(total_lines);
    let cursor = buf.cursor();
    let selection = buf.selection();
    let caret_style = Style::default().bg(Color::White).fg(Color::Black);
    let selected_style = Style::default().bg(Color::DarkGray);

    let mut content: Vec<Line> = Vec::new();
    for line_idx in start..end {
        let line_text = buf.line_at(line_idx).unwrap_or_default();
        let line_start = buf.line_start(line_idx);
        let number = format!(
            "{:>width$} ",
            line_idx + 1,
            width = usize::from(gutter_width - 1)
        );
        let mut spans = vec![Span::styled(number, Style::default().fg(Color::DarkGray))];

        // Walk visible chars, grouping runs that share a style.
        let mut run = String::new();
        let mut run_style = Style::default();
        let visible = line_text
            .chars()
            .map(Some)
            .chain(std::iter::once(None))
            .enumerate()
            .skip(model.editor_col_offset)
            .take(cols);
        for (col, ch) in visible {
            let offset = line_start + col;
            let style = if line_idx == cursor.line && col == cursor.col {
                caret_style
            } else if selection.start <= offset && offset < selection.end && ch.is_some() {
                selected_style
            } else {
                Style::default()
            };
            let Some(ch) = ch.or((style == caret_style).then_some(' ')) else {
                continue;
            };
            if style != run_style && !run.is_empty() {
                spans.push(Span::styled(std::mem::take(&mut run), run_style));
            }
            run_style = style;
            run.push(ch);
        }
        if !run.is_empty() {
            spans.push(Span::styled(run, run_style));
        }
        content.push(Line::from(spans));
    }

    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(content), area);
}

fn render_preview(model: &Model, frame: &mut Frame, area: Rect) {
    let light = model.preview.style().is_light();
    let rows = usize::from(area.height);
    let start = model.preview_scroll_offset;

    let content: Vec<Line> = model
        .preview
        .lines()
        .iter()
        .skip(start)
        .take(rows)
        .map(|line| {
            let line_style = super::style::style_for_line_kind(line.kind(), light);
            let spans: Vec<Span> = line
                .spans()
                .iter()
                .map(|span| {
                    Span::styled(
                        span.text().to_string(),
                        super::style::style_for_inline(line_style, span.style(), light),
                    )
                })
                .collect();
            Line::from(spans).style(line_style)
        })
        .collect();

    let block = Block::default()
        .borders(Borders::LEFT)
        .border_style(Style::default().fg(Color::DarkGray))
        .padding(Padding::left(DOCUMENT_LEFT_PADDING));
    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(content).block(block), area);
}

/// Calculate the width needed for line numbers.
pub const fn line_number_width(total_lines: usize) -> u16 {
    if total_lines < 10 {
        1
    } else if total_lines < 100 {
        2
    } else if total_lines < 1_000 {
        3
    } else if total_lines < 10_000 {
        4
    } else if total_lines < 100_000 {
        5
    } else {
        6
    }
}
