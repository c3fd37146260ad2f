use std::time::{Duration, Instant};

use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;

use super::*;
use crate::app::{Message, Model, SaveStatus, update};
use crate::editor::{DEFAULT_QUIET_PERIOD, Motion};
use crate::highlight::HighlightBackground;

fn create_model(content: &str, size: (u16, u16)) -> Model {
    Model::new(content, size, DEFAULT_QUIET_PERIOD, HighlightBackground::Dark)
}

fn draw(model: &mut Model) -> Terminal<TestBackend> {
    let (width, height) = model.terminal_size();
    let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
    terminal.draw(|frame| render(model, frame)).unwrap();
    terminal
}

fn row_text(terminal: &Terminal<TestBackend>, y: u16) -> String {
    let buffer = terminal.backend().buffer();
    (0..buffer.area.width)
        .map(|x| buffer[(x, y)].symbol())
        .collect()
}

fn screen_text(terminal: &Terminal<TestBackend>) -> String {
    let buffer = terminal.backend().buffer();
    (0..buffer.area.height)
        .map(|y| row_text(terminal, y))
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn test_preview_content_width_excludes_border_and_padding() {
    assert_eq!(preview_content_width(80), 38);
    assert_eq!(preview_content_width(0), 1);
}

#[test]
fn test_layout_places_toolbar_panes_and_status() {
    let model = create_model("", (80, 24));
    let regions = layout(Rect::new(0, 0, 80, 24), &model);
    assert_eq!(regions.toolbar, Rect::new(0, 0, 80, 1));
    assert_eq!(regions.editor, Rect::new(0, 1, 40, 22));
    assert_eq!(regions.preview, Rect::new(40, 1, 40, 22));
    assert_eq!(regions.status, Rect::new(0, 23, 80, 1));
    assert!(regions.prompt.is_none());
    assert!(regions.toast.is_none());
}

#[test]
fn test_layout_reserves_prompt_row_when_open() {
    let model = update(create_model("", (80, 24)), Message::OpenImport);
    let regions = layout(Rect::new(0, 0, 80, 24), &model);
    assert_eq!(regions.prompt, Some(Rect::new(0, 22, 80, 1)));
    assert_eq!(regions.editor.height, 21);
}

#[test]
fn test_render_shows_toolbar_labels() {
    let mut model = create_model("", (100, 10));
    let terminal = draw(&mut model);
    let toolbar = row_text(&terminal, 0);
    assert!(toolbar.contains("Bold"), "toolbar: {toolbar}");
    assert!(toolbar.contains("Italic"), "toolbar: {toolbar}");
}

#[test]
fn test_render_shows_editor_text_and_preview_heading() {
    let mut model = create_model("# Hello\n\nworld", (80, 12));
    let terminal = draw(&mut model);
    let first_pane_row = row_text(&terminal, 1);
    assert!(first_pane_row.starts_with("1 # Hello"), "row: {first_pane_row}");
    let preview: String = first_pane_row.chars().skip(40).collect();
    assert!(preview.contains("# Hello"), "preview: {preview}");
}

#[test]
fn test_render_shows_copy_badge_on_code_header() {
    let mut model = create_model("```rust\nfn main() {}\n```", (80, 12));
    let terminal = draw(&mut model);
    assert!(screen_text(&terminal).contains("[copy]"));
}

#[test]
fn test_status_bar_shows_save_state_and_caret() {
    let mut model = create_model("abc", (80, 10));
    let terminal = draw(&mut model);
    let status = row_text(&terminal, 9);
    assert!(status.contains("Saved"), "status: {status}");
    assert!(status.contains("Ln 1, Col 1"), "status: {status}");
}

#[test]
fn test_status_bar_shows_saving_after_typing() {
    let model = update(create_model("", (80, 10)), Message::InsertChar('x'));
    let mut model = model;
    let terminal = draw(&mut model);
    let status = row_text(&terminal, 9);
    assert!(status.contains("Saving..."), "status: {status}");
    assert!(status.contains("[undo]"), "status: {status}");
}

#[test]
fn test_editor_scrolls_to_keep_caret_visible() {
    let content: String = (1..=100).map(|n| format!("line {n}\n")).collect();
    let model = create_model(&content, (80, 10));
    let mut model = update(model, Message::MoveCursor(Motion::BufferEnd));
    let terminal = draw(&mut model);
    assert!(model.editor_scroll_offset > 0);
    assert!(screen_text(&terminal).contains("line 100"));
}

#[test]
fn test_editor_scrolls_horizontally_on_long_line() {
    let content = format!("{}END", "x".repeat(120));
    let model = create_model(&content, (80, 10));
    let mut model = update(model, Message::MoveCursor(Motion::LineEnd));
    let terminal = draw(&mut model);
    assert!(model.editor_col_offset > 0);
    let editor_row: String = row_text(&terminal, 1).chars().take(40).collect();
    assert!(editor_row.contains("END"), "row: {editor_row}");
}

#[test]
fn test_toast_renders_above_status() {
    let model = update(create_model("", (80, 10)), Message::ClearSaved);
    let mut model = model;
    let terminal = draw(&mut model);
    let toast = row_text(&terminal, 8);
    assert!(toast.contains("[warn]"), "toast: {toast}");
}

#[test]
fn test_help_overlay_renders_when_visible() {
    let model = update(create_model("", (80, 30)), Message::ToggleHelp);
    let mut model = model;
    let terminal = draw(&mut model);
    let screen = screen_text(&terminal);
    assert!(screen.contains("Help"));
    assert!(screen.contains("Select all"));
}

#[test]
fn test_save_status_labels() {
    let now = Instant::now();
    assert_eq!(save_status_label(SaveStatus::Saving, now), "Saving...");
    assert_eq!(save_status_label(SaveStatus::Saved { at: None }, now), "Saved");
    assert_eq!(save_status_label(SaveStatus::Failed, now), "Not saved");
    let earlier = now.checked_sub(Duration::from_secs(5)).unwrap();
    assert_eq!(
        save_status_label(SaveStatus::Saved { at: Some(earlier) }, now),
        "Saved 5s ago"
    );
}

#[test]
fn test_centered_popup_rect_shrinks_to_area() {
    let area = Rect::new(0, 0, 20, 10);
    assert_eq!(centered_popup_rect(40, 40, area), area);
    assert_eq!(centered_popup_rect(10, 4, area), Rect::new(5, 3, 10, 4));
}

#[test]
fn test_line_number_width() {
    assert_eq!(line_number_width(9), 1);
    assert_eq!(line_number_width(10), 2);
    assert_eq!(line_number_width(12_345), 5);
}
