use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::layout::Rect;

use crate::app::{App, Message, Model};
use crate::editor::{MarkupToken, Motion};
use crate::export::ExportFormat;

/// Rows moved by one mouse wheel notch.
const WHEEL_STEP: usize = 3;

impl App {
    pub(super) fn handle_event(event: &Event, model: &Model) -> Option<Message> {
        match event {
            Event::Key(key) => Self::handle_key(*key, model),
            Event::Mouse(mouse) => Self::handle_mouse(*mouse, model),
            Event::Paste(text) => {
                if model.prompt.is_some() {
                    let mut next = model.prompt.clone().unwrap_or_default();
                    next.push_str(text.trim_end_matches(['\r', '\n']));
                    Some(Message::PromptInput(next))
                } else {
                    Some(Message::InsertText(text.replace("\r\n", "\n")))
                }
            }
            Event::Resize(w, h) => Some(Message::Resize(*w, *h)),
            _ => None,
        }
    }

    pub(super) fn handle_key(key: KeyEvent, model: &Model) -> Option<Message> {
        if key.kind == KeyEventKind::Release {
            return None;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);

        if model.help_visible {
            return match key.code {
                KeyCode::Char('j') | KeyCode::Down => Some(Message::HelpScrollDown),
                KeyCode::Char('k') | KeyCode::Up => Some(Message::HelpScrollUp),
                _ => Some(Message::HideHelp),
            };
        }

        if let Some(input) = model.prompt.as_ref() {
            return match key.code {
                KeyCode::Esc => Some(Message::PromptCancel),
                KeyCode::Enter => Some(Message::PromptSubmit),
                KeyCode::Backspace => {
                    let mut next = input.clone();
                    next.pop();
                    Some(Message::PromptInput(next))
                }
                KeyCode::Char(c) if !ctrl && !alt => {
                    let mut next = input.clone();
                    next.push(c);
                    Some(Message::PromptInput(next))
                }
                _ => None,
            };
        }

        // Undo and redo are consumed here so no other binding sees them.
        if ctrl {
            match key.code {
                KeyCode::Char('z') if shift => return Some(Message::Redo),
                KeyCode::Char('Z') => return Some(Message::Redo),
                KeyCode::Char('z') => return Some(Message::Undo),
                KeyCode::Char('y' | 'Y') => return Some(Message::Redo),
                _ => {}
            }
        }

        match key.code {
            // Application
            KeyCode::Char('q') if ctrl => Some(Message::Quit),
            KeyCode::F(1) => Some(Message::ToggleHelp),

            // Files
            KeyCode::Char('s') if ctrl => Some(Message::Export(ExportFormat::Markdown)),
            KeyCode::Char('e') if ctrl => Some(Message::Export(ExportFormat::Html)),
            KeyCode::Char('p') if ctrl => Some(Message::Export(ExportFormat::Pdf)),
            KeyCode::Char('o') if ctrl => Some(Message::OpenImport),
            KeyCode::Char('l') if ctrl => Some(Message::ClearSaved),

            // Clipboard and selection
            KeyCode::Char('c') if ctrl => Some(Message::CopySelection),
            KeyCode::Char('c') if alt => Some(Message::CopyCodeBlock),
            KeyCode::Char('a') if ctrl => Some(Message::SelectAll),

            // Toolbar
            KeyCode::Char(c @ '1'..='6') if alt => {
                c.to_digit(10)
                    .and_then(|digit| MarkupToken::ALL.get(digit as usize - 1))
                    .map(|token| Message::InsertMarkup(token.literal().to_string()))
            }

            // Preview
            KeyCode::Up if alt => Some(Message::PreviewScrollUp(1)),
            KeyCode::Down if alt => Some(Message::PreviewScrollDown(1)),

            // Caret
            KeyCode::Left if ctrl => Some(motion(Motion::WordLeft, shift)),
            KeyCode::Right if ctrl => Some(motion(Motion::WordRight, shift)),
            KeyCode::Home if ctrl => Some(motion(Motion::BufferStart, shift)),
            KeyCode::End if ctrl => Some(motion(Motion::BufferEnd, shift)),
            KeyCode::Left => Some(motion(Motion::Left, shift)),
            KeyCode::Right => Some(motion(Motion::Right, shift)),
            KeyCode::Up => Some(motion(Motion::Up, shift)),
            KeyCode::Down => Some(motion(Motion::Down, shift)),
            KeyCode::Home => Some(motion(Motion::LineStart, shift)),
            KeyCode::End => Some(motion(Motion::LineEnd, shift)),
            KeyCode::PageUp => Some(Message::PageUp(editor_page(model))),
            KeyCode::PageDown => Some(Message::PageDown(editor_page(model))),

            // Editing
            KeyCode::Enter => Some(Message::Newline),
            KeyCode::Backspace => Some(Message::DeleteBack),
            KeyCode::Delete => Some(Message::DeleteForward),
            KeyCode::Tab => Some(Message::InsertText("    ".to_string())),
            KeyCode::Char(c) if !ctrl && !alt => Some(Message::InsertChar(c)),

            _ => None,
        }
    }

    pub(super) fn handle_mouse(mouse: MouseEvent, model: &Model) -> Option<Message> {
        if model.help_visible || model.prompt.is_some() {
            return None;
        }
        let (width, height) = model.terminal_size();
        let layout = crate::ui::layout(Rect::new(0, 0, width, height), model);
        let in_editor = point_in_rect(mouse.column, mouse.row, layout.editor);
        let in_preview = point_in_rect(mouse.column, mouse.row, layout.preview);

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) if in_editor => {
                let gutter = crate::ui::editor_gutter_width(model);
                let line = model.editor_scroll_offset + usize::from(mouse.row - layout.editor.y);
                let col = model.editor_col_offset
                    + usize::from(mouse.column.saturating_sub(layout.editor.x + gutter));
                Some(Message::MoveTo(line, col))
            }
            MouseEventKind::ScrollDown if in_preview => {
                Some(Message::PreviewScrollDown(WHEEL_STEP))
            }
            MouseEventKind::ScrollUp if in_preview => Some(Message::PreviewScrollUp(WHEEL_STEP)),
            MouseEventKind::ScrollDown if in_editor => Some(Message::PageDown(WHEEL_STEP)),
            MouseEventKind::ScrollUp if in_editor => Some(Message::PageUp(WHEEL_STEP)),
            _ => None,
        }
    }
}

const fn motion(motion: Motion, extend: bool) -> Message {
    if extend {
        Message::ExtendSelection(motion)
    } else {
        Message::MoveCursor(motion)
    }
}

fn editor_page(model: &Model) -> usize {
    let (width, height) = model.terminal_size();
    let layout = crate::ui::layout(Rect::new(0, 0, width, height), model);
    usize::from(layout.editor.height.saturating_sub(1)).max(1)
}

const fn point_in_rect(col: u16, row: u16, rect: Rect) -> bool {
    col >= rect.x && col < rect.x + rect.width && row >= rect.y && row < rect.y + rect.height
}
