use std::path::PathBuf;
use std::time::Instant;

use crate::app::Model;
use crate::app::model::{SaveStatus, ToastLevel, WELCOME_CONTENT};
use crate::editor::{CursorPosition, EditOp, Motion};
use crate::export::ExportFormat;

/// All possible events and actions in the application.
///
/// These represent user input, system events, and internal actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    // Editing
    /// Insert a character at the caret
    InsertChar(char),
    /// Insert text at the caret (paste, tab)
    InsertText(String),
    /// Split the line at the caret (Enter)
    Newline,
    /// Delete selection or char before the caret (Backspace)
    DeleteBack,
    /// Delete selection or char at the caret (Delete)
    DeleteForward,
    /// Insert a toolbar token, wrapping the selection when it is predefined
    InsertMarkup(String),
    Undo,
    Redo,

    // Caret and selection
    MoveCursor(Motion),
    /// Move the caret while growing the selection (Shift+motion)
    ExtendSelection(Motion),
    /// Move the caret to a line and column (mouse click)
    MoveTo(usize, usize),
    SelectAll,
    /// Move the caret up by n lines
    PageUp(usize),
    /// Move the caret down by n lines
    PageDown(usize),

    // Preview
    PreviewScrollUp(usize),
    PreviewScrollDown(usize),

    // Clipboard
    /// Copy the editor selection
    CopySelection,
    /// Copy the code block under the caret or at the top of the preview
    CopyCodeBlock,

    // Files
    Export(ExportFormat),
    /// Open the import path prompt
    OpenImport,
    /// Replace the prompt text
    PromptInput(String),
    PromptSubmit,
    PromptCancel,
    /// Clear the saved draft (press twice)
    ClearSaved,

    // Lifecycle
    /// Content has been stable for the quiet period
    Settled(String),
    ToggleHelp,
    HideHelp,
    HelpScrollUp,
    HelpScrollDown,
    /// Terminal resized
    Resize(u16, u16),
    /// Quit the application (press twice with an unsettled change)
    Quit,
}

/// Update the model with the current time.
pub fn update(model: Model, msg: Message) -> Model {
    update_at(model, msg, Instant::now())
}

/// Pure function that updates the model based on a message.
///
/// This is the core of TEA - all state transitions happen here. File and
/// storage work is parked on the model for the side-effect pass.
pub fn update_at(mut model: Model, msg: Message, now: Instant) -> Model {
    let passive = matches!(msg, Message::Settled(_) | Message::Resize(..));
    // Reset confirmation flags on any action other than the confirmed one.
    if !passive && msg != Message::Quit {
        model.quit_confirmed = false;
    }
    if !passive && msg != Message::ClearSaved {
        model.clear_confirmed = false;
    }

    match msg {
        Message::InsertChar(ch) => edit(&mut model, EditOp::InsertChar(ch), now),
        Message::InsertText(text) => edit(&mut model, EditOp::InsertStr(text), now),
        Message::Newline => edit(&mut model, EditOp::Newline, now),
        Message::DeleteBack => edit(&mut model, EditOp::DeleteBack, now),
        Message::DeleteForward => edit(&mut model, EditOp::DeleteForward, now),
        Message::InsertMarkup(literal) => {
            model.controller.insert_markup(&literal, now);
            model.note_content_changed();
        }
        Message::Undo => {
            if model.controller.undo(now) {
                model.note_content_changed();
            }
        }
        Message::Redo => {
            if model.controller.redo(now) {
                model.note_content_changed();
            }
        }

        Message::MoveCursor(motion) => model.controller.move_cursor(motion, false),
        Message::ExtendSelection(motion) => model.controller.move_cursor(motion, true),
        Message::MoveTo(line, col) => model.controller.move_to(line, col),
        Message::SelectAll => {
            let len = model.controller.buffer().len_chars();
            model.controller.set_selection(CursorPosition::new(0, len));
        }
        Message::PageUp(n) => {
            for _ in 0..n {
                model.controller.move_cursor(Motion::Up, false);
            }
        }
        Message::PageDown(n) => {
            for _ in 0..n {
                model.controller.move_cursor(Motion::Down, false);
            }
        }

        Message::PreviewScrollUp(n) => model.scroll_preview_up(n),
        Message::PreviewScrollDown(n) => model.scroll_preview_down(n),

        // Clipboard writes happen in the side-effect pass.
        Message::CopySelection | Message::CopyCodeBlock => {}

        Message::Export(ExportFormat::Pdf) => {
            model.pdf_export_pending = true;
            model.show_toast(ToastLevel::Info, "Exporting PDF...");
        }
        Message::Export(_) => {}
        Message::OpenImport => model.prompt = Some(String::new()),
        Message::PromptInput(text) => {
            if model.prompt.is_some() {
                model.prompt = Some(text);
            }
        }
        Message::PromptSubmit => {
            model.pending_import = model
                .prompt
                .take()
                .map(|input| input.trim().to_string())
                .filter(|input| !input.is_empty())
                .map(PathBuf::from);
        }
        Message::PromptCancel => model.prompt = None,
        Message::ClearSaved => {
            if model.clear_confirmed {
                model.clear_confirmed = false;
                model.controller.replace_content(WELCOME_CONTENT, now);
                model.save_status = SaveStatus::Saved { at: None };
                model.pending_storage_clear = true;
            } else {
                model.clear_confirmed = true;
                model.show_toast(
                    ToastLevel::Warning,
                    "Clear saved content? Press Ctrl+L again to confirm",
                );
            }
        }

        Message::Settled(content) => model.apply_settled(content),
        Message::ToggleHelp => {
            model.help_visible = !model.help_visible;
            model.help_scroll_offset = 0;
        }
        Message::HideHelp => model.help_visible = false,
        Message::HelpScrollUp => {
            model.help_scroll_offset = model.help_scroll_offset.saturating_sub(1);
        }
        Message::HelpScrollDown => {
            model.help_scroll_offset = model.help_scroll_offset.saturating_add(1);
        }
        Message::Resize(width, height) => model.resize(width, height),
        Message::Quit => {
            if model.controller.has_unsettled_change() && !model.quit_confirmed {
                model.quit_confirmed = true;
                model.show_toast(
                    ToastLevel::Warning,
                    "Unsaved changes. Press Ctrl+Q again to quit",
                );
            } else {
                model.should_quit = true;
            }
        }
    }

    model
}

fn edit(model: &mut Model, op: EditOp, now: Instant) {
    model.controller.apply_edit(op, now);
    model.note_content_changed();
}
