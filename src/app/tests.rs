use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use image::RgbImage;
use tempfile::tempdir;

use super::{App, Message, Model, SaveStatus, ToastLevel, WELCOME_CONTENT, update, update_at};
use crate::editor::{DEFAULT_QUIET_PERIOD, MarkupToken, Motion};
use crate::error::ExportError;
use crate::export::{ExportFormat, Rasterizer};
use crate::highlight::HighlightBackground;
use crate::preview::Preview;
use crate::storage::{AUTOSAVE_KEY, KeyValueStore, MemoryStore};

const QUIET: Duration = Duration::from_millis(100);

fn create_model(content: &str) -> Model {
    Model::new(content, (80, 24), QUIET, HighlightBackground::Dark)
}

fn create_app() -> App {
    App::new(Box::new(MemoryStore::new())).with_quiet_period(QUIET)
}

fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
    KeyEvent::new(code, modifiers)
}

/// Type `text` one char at a time at `now`.
fn type_text(mut model: Model, text: &str, now: Instant) -> Model {
    for ch in text.chars() {
        model = update_at(model, Message::InsertChar(ch), now);
    }
    model
}

/// Drain the debouncer as the event loop would, once the quiet period has passed.
fn settle(app: &mut App, model: &mut Model, now: Instant) {
    let later = now + QUIET;
    if let Some(content) = model.controller.poll_settled(later) {
        app.dispatch(model, Message::Settled(content), later);
    }
}

struct SolidRasterizer;

impl Rasterizer for SolidRasterizer {
    fn rasterize(&self, _preview: &Preview, _scale: f32) -> Result<RgbImage, ExportError> {
        Ok(RgbImage::from_pixel(64, 32, image::Rgb([255, 255, 255])))
    }
}

// ---- update ----

#[test]
fn test_typing_marks_saving() {
    let now = Instant::now();
    let model = type_text(create_model(""), "hi", now);
    assert_eq!(model.controller.content(), "hi");
    assert_eq!(model.save_status, SaveStatus::Saving);
}

#[test]
fn test_settled_refreshes_preview_and_queues_autosave() {
    let now = Instant::now();
    let mut model = type_text(create_model(""), "# Title", now);
    assert_eq!(model.preview.source(), "");

    let content = model.controller.poll_settled(now + QUIET).unwrap();
    let model = update_at(model, Message::Settled(content), now + QUIET);
    assert_eq!(model.preview.source(), "# Title");
    assert_eq!(model.pending_autosave.as_deref(), Some("# Title"));
}

#[test]
fn test_settled_initial_content_is_not_autosaved() {
    let now = Instant::now();
    let model = type_text(create_model("abc"), "x", now);
    let model = update_at(model, Message::DeleteBack, now);
    let model = update_at(model, Message::Settled("abc".to_string()), now + QUIET);
    assert!(model.pending_autosave.is_none());
    assert_eq!(model.save_status, SaveStatus::Saved { at: None });
}

#[test]
fn test_undo_and_redo_restore_content() {
    let now = Instant::now();
    let model = type_text(create_model(""), "ab", now);
    let model = update_at(model, Message::Undo, now);
    assert_eq!(model.controller.content(), "a");
    let model = update_at(model, Message::Redo, now);
    assert_eq!(model.controller.content(), "ab");
}

#[test]
fn test_undo_selection_restored_after_render_commit() {
    let now = Instant::now();
    let model = type_text(create_model(""), "abc", now);
    let mut model = update_at(model, Message::Undo, now);
    assert!(model.controller.pending_selection().is_some());
    assert!(model.controller.on_render_committed());
    assert_eq!(model.controller.buffer().caret(), 2);
}

#[test]
fn test_insert_markup_without_selection_inserts_literal() {
    let literal = MarkupToken::Bold.literal().to_string();
    let model = update(create_model(""), Message::InsertMarkup(literal));
    assert_eq!(model.controller.content(), "**bold**");
    assert_eq!(model.controller.buffer().caret(), 8);
}

#[test]
fn test_insert_markup_wraps_selection() {
    let model = update(create_model("word"), Message::SelectAll);
    let literal = MarkupToken::Italic.literal().to_string();
    let model = update(model, Message::InsertMarkup(literal));
    assert_eq!(model.controller.content(), "*word*");
}

#[test]
fn test_clear_saved_requires_two_presses() {
    let model = update(create_model("draft"), Message::ClearSaved);
    assert!(model.clear_confirmed);
    assert_eq!(model.controller.content(), "draft");
    assert_eq!(model.active_toast().map(|(_, level)| level), Some(ToastLevel::Warning));

    let model = update(model, Message::ClearSaved);
    assert!(!model.clear_confirmed);
    assert_eq!(model.controller.content(), WELCOME_CONTENT);
    assert!(model.pending_storage_clear);
}

#[test]
fn test_clear_confirmation_resets_on_other_action() {
    let model = update(create_model("draft"), Message::ClearSaved);
    let model = update(model, Message::MoveCursor(Motion::Right));
    assert!(!model.clear_confirmed);
    let model = update(model, Message::ClearSaved);
    assert_eq!(model.controller.content(), "draft");
}

#[test]
fn test_quit_without_pending_change_quits() {
    let model = update(create_model(""), Message::Quit);
    assert!(model.should_quit);
}

#[test]
fn test_quit_with_unsettled_change_needs_confirmation() {
    let model = update(create_model(""), Message::InsertChar('a'));
    let model = update(model, Message::Quit);
    assert!(!model.should_quit);
    assert!(model.quit_confirmed);
    let model = update(model, Message::Quit);
    assert!(model.should_quit);
}

#[test]
fn test_import_prompt_flow() {
    let model = update(create_model(""), Message::OpenImport);
    assert_eq!(model.prompt.as_deref(), Some(""));
    let model = update(model, Message::PromptInput("  notes.md ".to_string()));
    let model = update(model, Message::PromptSubmit);
    assert!(model.prompt.is_none());
    assert_eq!(model.pending_import, Some(PathBuf::from("notes.md")));
}

#[test]
fn test_empty_prompt_submit_imports_nothing() {
    let model = update(create_model(""), Message::OpenImport);
    let model = update(model, Message::PromptSubmit);
    assert!(model.pending_import.is_none());
}

#[test]
fn test_prompt_cancel_closes_prompt() {
    let model = update(create_model(""), Message::OpenImport);
    let model = update(model, Message::PromptCancel);
    assert!(model.prompt.is_none());
}

#[test]
fn test_pdf_export_is_parked_until_next_draw() {
    let model = update(create_model(""), Message::Export(ExportFormat::Pdf));
    assert!(model.pdf_export_pending);
    assert_eq!(
        model.active_toast(),
        Some(("Exporting PDF...", ToastLevel::Info))
    );
}

#[test]
fn test_toggle_help_resets_scroll() {
    let model = update(create_model(""), Message::ToggleHelp);
    let model = update(model, Message::HelpScrollDown);
    assert_eq!(model.help_scroll_offset, 1);
    let model = update(model, Message::HideHelp);
    let model = update(model, Message::ToggleHelp);
    assert!(model.help_visible);
    assert_eq!(model.help_scroll_offset, 0);
}

#[test]
fn test_preview_scroll_is_clamped() {
    let content: String = (1..=10).map(|n| format!("para {n}\n\n")).collect();
    let model = create_model(&content);
    let max = model.preview.line_count() - 1;
    let model = update(model, Message::PreviewScrollDown(1_000));
    assert_eq!(model.preview_scroll_offset, max);
    let model = update(model, Message::PreviewScrollUp(1_000));
    assert_eq!(model.preview_scroll_offset, 0);
}

#[test]
fn test_resize_relayouts_preview() {
    let model = update(create_model("text"), Message::Resize(120, 40));
    assert_eq!(model.terminal_size(), (120, 40));
    assert_eq!(model.preview.width(), crate::ui::preview_content_width(120));
}

#[test]
fn test_toast_expires() {
    let model = update(create_model(""), Message::ClearSaved);
    let mut model = model;
    assert!(!model.expire_toast(Instant::now()));
    assert!(model.expire_toast(Instant::now() + Duration::from_secs(10)));
    assert!(model.active_toast().is_none());
}

#[test]
fn test_code_block_to_copy_follows_caret() {
    let content = "intro\n\n```sh\necho one\n```\n\n```sh\necho two\n```\n";
    let model = create_model(content);
    let model = update(model, Message::MoveTo(7, 0));
    assert_eq!(model.code_block_to_copy().as_deref(), Some("echo two\n"));
}

#[test]
fn test_code_block_to_copy_falls_back_to_preview_top() {
    let content = "intro\n\n```sh\necho one\n```\n";
    let model = create_model(content);
    assert_eq!(model.code_block_to_copy().as_deref(), Some("echo one\n"));
}

#[test]
fn test_selection_to_copy() {
    let model = create_model("hello world");
    assert!(model.selection_to_copy().is_none());
    let model = update(model, Message::SelectAll);
    assert_eq!(model.selection_to_copy().as_deref(), Some("hello world"));
}

// ---- side effects ----

#[test]
fn test_autosave_writes_store_and_marks_saved() {
    let mut app = create_app();
    let now = Instant::now();
    let mut model = type_text(create_model(""), "draft", now);
    settle(&mut app, &mut model, now);

    assert!(matches!(model.save_status, SaveStatus::Saved { at: Some(_) }));
    assert_eq!(
        app.persistence.load(AUTOSAVE_KEY).as_deref(),
        Some("draft")
    );
}

#[test]
fn test_autosave_quota_failure_marks_failed() {
    let mut app = App::new(Box::new(MemoryStore::with_quota(8))).with_quiet_period(QUIET);
    let now = Instant::now();
    let mut model = type_text(create_model(""), "a much longer draft", now);
    settle(&mut app, &mut model, now);

    assert_eq!(model.save_status, SaveStatus::Failed);
    let (message, level) = model.active_toast().unwrap();
    assert_eq!(level, ToastLevel::Warning);
    assert!(message.starts_with("Autosave failed"), "toast: {message}");
}

#[test]
fn test_export_markdown_and_html_write_files() {
    let dir = tempdir().unwrap();
    let mut app = create_app();
    let mut model = create_model("# Title\n\nbody");
    model.export_dir = dir.path().to_path_buf();

    app.dispatch(&mut model, Message::Export(ExportFormat::Markdown), Instant::now());
    app.dispatch(&mut model, Message::Export(ExportFormat::Html), Instant::now());

    let md = fs::read_to_string(dir.path().join("document.md")).unwrap();
    assert_eq!(md, "# Title\n\nbody");
    let html = fs::read_to_string(dir.path().join("document.html")).unwrap();
    assert!(html.contains("Title"));
    assert!(html.contains("<html"));
    assert_eq!(model.active_toast().map(|(_, level)| level), Some(ToastLevel::Info));
}

#[test]
fn test_markdown_export_uses_unsettled_content() {
    let dir = tempdir().unwrap();
    let mut app = create_app();
    let mut model = create_model("");
    model.export_dir = dir.path().to_path_buf();
    let mut model = type_text(model, "fresh", Instant::now());

    app.dispatch(&mut model, Message::Export(ExportFormat::Markdown), Instant::now());
    let md = fs::read_to_string(dir.path().join("document.md")).unwrap();
    assert_eq!(md, "fresh");
}

#[test]
fn test_pending_pdf_export_writes_file() {
    let dir = tempdir().unwrap();
    let mut app = create_app().with_rasterizer(Box::new(SolidRasterizer));
    let mut model = create_model("# Title");
    model.export_dir = dir.path().to_path_buf();

    app.dispatch(&mut model, Message::Export(ExportFormat::Pdf), Instant::now());
    assert!(model.pdf_export_pending);
    app.run_pending_pdf_export(&mut model);

    assert!(!model.pdf_export_pending);
    let bytes = fs::read(dir.path().join("document.pdf")).unwrap();
    assert!(bytes.starts_with(b"%PDF-"));
}

#[test]
fn test_import_replaces_content() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.md");
    fs::write(&path, "# Notes\n").unwrap();

    let mut app = create_app();
    let mut model = create_model("old");
    let now = Instant::now();
    app.dispatch(&mut model, Message::OpenImport, now);
    app.dispatch(
        &mut model,
        Message::PromptInput(path.display().to_string()),
        now,
    );
    app.dispatch(&mut model, Message::PromptSubmit, now);

    assert_eq!(model.controller.content(), "# Notes\n");
    assert_eq!(model.save_status, SaveStatus::Saving);
    assert_eq!(model.active_toast().map(|(_, level)| level), Some(ToastLevel::Info));
}

#[test]
fn test_import_failure_keeps_content() {
    let dir = tempdir().unwrap();
    let mut app = create_app();
    let mut model = create_model("old");
    let now = Instant::now();
    app.dispatch(&mut model, Message::OpenImport, now);
    app.dispatch(
        &mut model,
        Message::PromptInput(dir.path().join("missing.md").display().to_string()),
        now,
    );
    app.dispatch(&mut model, Message::PromptSubmit, now);

    assert_eq!(model.controller.content(), "old");
    assert_eq!(model.active_toast().map(|(_, level)| level), Some(ToastLevel::Error));
}

#[test]
fn test_clear_saved_removes_draft_from_store() {
    let mut store = MemoryStore::new();
    store.set(AUTOSAVE_KEY, "draft").unwrap();
    let mut app = App::new(Box::new(store)).with_quiet_period(QUIET);
    let mut model = create_model("draft");

    app.dispatch(&mut model, Message::ClearSaved, Instant::now());
    assert_eq!(app.persistence.load(AUTOSAVE_KEY).as_deref(), Some("draft"));
    app.dispatch(&mut model, Message::ClearSaved, Instant::now());
    assert!(app.persistence.load(AUTOSAVE_KEY).is_none());
    assert_eq!(model.controller.content(), WELCOME_CONTENT);
}

#[test]
fn test_initial_content_prefers_file_then_draft() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("doc.md");
    fs::write(&path, "from file").unwrap();

    let mut store = MemoryStore::new();
    store.set(AUTOSAVE_KEY, "from draft").unwrap();
    let app = App::new(Box::new(store.clone()));
    assert_eq!(app.initial_content().unwrap(), "from draft");

    let app = App::new(Box::new(store.clone())).with_file(Some(path));
    assert_eq!(app.initial_content().unwrap(), "from file");

    let app = App::new(Box::new(store)).with_restore(false);
    assert_eq!(app.initial_content().unwrap(), "");
}

#[test]
fn test_initial_content_rejects_unsupported_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("image.png");
    fs::write(&path, "not markdown").unwrap();
    let app = create_app().with_file(Some(path));
    assert!(app.initial_content().is_err());
}

#[test]
fn test_initial_model_carries_export_dir() {
    let app = create_app().with_export_dir(PathBuf::from("/tmp/out"));
    let model = app.initial_model((80, 24)).unwrap();
    assert_eq!(model.export_dir, PathBuf::from("/tmp/out"));
    assert_eq!(model.controller.quiet_period(), QUIET);
}

#[test]
fn test_default_quiet_period_is_used_by_default_model() {
    let model = Model::default();
    assert_eq!(model.controller.quiet_period(), DEFAULT_QUIET_PERIOD);
}

// ---- input ----

#[test]
fn test_ctrl_z_undoes_and_ctrl_shift_z_redoes() {
    let model = create_model("");
    let undo = App::handle_key(key(KeyCode::Char('z'), KeyModifiers::CONTROL), &model);
    assert_eq!(undo, Some(Message::Undo));
    let redo = App::handle_key(
        key(KeyCode::Char('z'), KeyModifiers::CONTROL | KeyModifiers::SHIFT),
        &model,
    );
    assert_eq!(redo, Some(Message::Redo));
    let redo = App::handle_key(key(KeyCode::Char('Z'), KeyModifiers::CONTROL), &model);
    assert_eq!(redo, Some(Message::Redo));
    let redo = App::handle_key(key(KeyCode::Char('y'), KeyModifiers::CONTROL), &model);
    assert_eq!(redo, Some(Message::Redo));
}

#[test]
fn test_alt_digits_insert_toolbar_tokens() {
    let model = create_model("");
    let msg = App::handle_key(key(KeyCode::Char('1'), KeyModifiers::ALT), &model);
    assert_eq!(msg, Some(Message::InsertMarkup("**bold**".to_string())));
    let msg = App::handle_key(key(KeyCode::Char('6'), KeyModifiers::ALT), &model);
    assert_eq!(msg, Some(Message::InsertMarkup("- item".to_string())));
}

#[test]
fn test_plain_chars_insert_and_ctrl_chars_do_not() {
    let model = create_model("");
    let msg = App::handle_key(key(KeyCode::Char('x'), KeyModifiers::NONE), &model);
    assert_eq!(msg, Some(Message::InsertChar('x')));
    let msg = App::handle_key(key(KeyCode::Char('x'), KeyModifiers::CONTROL), &model);
    assert_eq!(msg, None);
}

#[test]
fn test_key_release_is_ignored() {
    let model = create_model("");
    let mut release = key(KeyCode::Char('x'), KeyModifiers::NONE);
    release.kind = KeyEventKind::Release;
    assert_eq!(App::handle_key(release, &model), None);
}

#[test]
fn test_shift_arrow_extends_selection() {
    let model = create_model("");
    let msg = App::handle_key(key(KeyCode::Right, KeyModifiers::SHIFT), &model);
    assert_eq!(msg, Some(Message::ExtendSelection(Motion::Right)));
    let msg = App::handle_key(key(KeyCode::Left, KeyModifiers::CONTROL), &model);
    assert_eq!(msg, Some(Message::MoveCursor(Motion::WordLeft)));
}

#[test]
fn test_tab_inserts_spaces() {
    let model = create_model("");
    let msg = App::handle_key(key(KeyCode::Tab, KeyModifiers::NONE), &model);
    assert_eq!(msg, Some(Message::InsertText("    ".to_string())));
}

#[test]
fn test_export_shortcuts() {
    let model = create_model("");
    let cases = [
        ('s', ExportFormat::Markdown),
        ('e', ExportFormat::Html),
        ('p', ExportFormat::Pdf),
    ];
    for (ch, format) in cases {
        let msg = App::handle_key(key(KeyCode::Char(ch), KeyModifiers::CONTROL), &model);
        assert_eq!(msg, Some(Message::Export(format)));
    }
}

#[test]
fn test_help_mode_any_key_closes_help() {
    let model = update(create_model(""), Message::ToggleHelp);
    let msg = App::handle_key(key(KeyCode::Char('x'), KeyModifiers::NONE), &model);
    assert_eq!(msg, Some(Message::HideHelp));
    let msg = App::handle_key(key(KeyCode::Char('j'), KeyModifiers::NONE), &model);
    assert_eq!(msg, Some(Message::HelpScrollDown));
}

#[test]
fn test_prompt_mode_edits_input() {
    let model = update(create_model(""), Message::OpenImport);
    let model = update(model, Message::PromptInput("ab".to_string()));
    let msg = App::handle_key(key(KeyCode::Char('c'), KeyModifiers::NONE), &model);
    assert_eq!(msg, Some(Message::PromptInput("abc".to_string())));
    let msg = App::handle_key(key(KeyCode::Backspace, KeyModifiers::NONE), &model);
    assert_eq!(msg, Some(Message::PromptInput("a".to_string())));
    let msg = App::handle_key(key(KeyCode::Esc, KeyModifiers::NONE), &model);
    assert_eq!(msg, Some(Message::PromptCancel));
}

#[test]
fn test_paste_inserts_text_with_normalized_newlines() {
    let model = create_model("");
    let msg = App::handle_event(&Event::Paste("a\r\nb".to_string()), &model);
    assert_eq!(msg, Some(Message::InsertText("a\nb".to_string())));
}

#[test]
fn test_mouse_click_in_editor_moves_caret() {
    let model = create_model("hello\nworld");
    let mouse = MouseEvent {
        kind: MouseEventKind::Down(MouseButton::Left),
        column: 5,
        row: 2,
        modifiers: KeyModifiers::NONE,
    };
    // Gutter is "1 " (two columns); row 2 is the second editor line.
    assert_eq!(App::handle_mouse(mouse, &model), Some(Message::MoveTo(1, 3)));
}

#[test]
fn test_mouse_wheel_over_preview_scrolls_preview() {
    let model = create_model("");
    let mouse = MouseEvent {
        kind: MouseEventKind::ScrollDown,
        column: 60,
        row: 5,
        modifiers: KeyModifiers::NONE,
    };
    assert_eq!(
        App::handle_mouse(mouse, &model),
        Some(Message::PreviewScrollDown(3))
    );
}
