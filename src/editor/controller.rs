//! Editor controller: owns the buffer and coordinates history, debouncing,
//! and markup insertion.

use std::time::{Duration, Instant};

use crate::debounce::Debouncer;

use super::buffer::{EditorBuffer, Motion};
use super::history::{CursorPosition, EditorState, HistoryStore};
use super::markup::markup_replacement;

/// Quiet period before a change is rendered and autosaved.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(500);

/// Typing operations applied at the caret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOp {
    InsertChar(char),
    InsertStr(String),
    Newline,
    DeleteBack,
    DeleteForward,
}

/// Owns the visible text and everything that reacts to it changing.
///
/// Every content change is recorded in the history immediately and queued
/// on the debouncer; the event loop drains settled content to refresh the
/// preview and autosave.
#[derive(Debug)]
pub struct EditorController {
    buffer: EditorBuffer,
    history: HistoryStore,
    debouncer: Debouncer<String>,
    /// Selection to apply once the content it belongs to has been drawn.
    pending_selection: Option<CursorPosition>,
}

impl EditorController {
    pub fn new(initial_content: &str, quiet: Duration) -> Self {
        Self {
            buffer: EditorBuffer::from_text(initial_content),
            history: HistoryStore::new(initial_content),
            debouncer: Debouncer::new(quiet),
            pending_selection: None,
        }
    }

    pub const fn buffer(&self) -> &EditorBuffer {
        &self.buffer
    }

    pub fn content(&self) -> String {
        self.buffer.text()
    }

    pub fn selection(&self) -> CursorPosition {
        self.buffer.selection()
    }

    pub const fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub const fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Whether a change is still waiting for its quiet period.
    pub const fn has_unsettled_change(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Replace the buffer with `new_content` as typed by the user.
    pub fn on_text_changed(&mut self, new_content: &str, cursor: CursorPosition, now: Instant) {
        self.buffer.set_text(new_content);
        self.buffer.set_selection(cursor);
        self.record_change(now);
    }

    /// Apply a typing operation; records a history point if the text changed.
    pub fn apply_edit(&mut self, op: EditOp, now: Instant) {
        let changed = match op {
            EditOp::InsertChar(ch) => {
                self.buffer.insert_char(ch);
                true
            }
            EditOp::InsertStr(s) => {
                self.buffer.insert_str(&s);
                !s.is_empty()
            }
            EditOp::Newline => {
                self.buffer.split_line();
                true
            }
            EditOp::DeleteBack => self.buffer.delete_back(),
            EditOp::DeleteForward => self.buffer.delete_forward(),
        };
        if changed {
            self.pending_selection = None;
            self.record_change(now);
        }
    }

    /// Move the caret; `extend` grows the selection instead.
    pub fn move_cursor(&mut self, motion: Motion, extend: bool) {
        self.pending_selection = None;
        self.buffer.move_caret(motion, extend);
    }

    pub fn move_to(&mut self, line: usize, col: usize) {
        self.pending_selection = None;
        self.buffer.move_to(line, col);
    }

    pub fn set_selection(&mut self, selection: CursorPosition) {
        self.pending_selection = None;
        self.buffer.set_selection(selection);
    }

    /// Insert a toolbar token at the selection.
    ///
    /// A predefined token wraps a non-empty selection; otherwise `literal`
    /// is inserted as is. The caret ends after the inserted text.
    pub fn insert_markup(&mut self, literal: &str, now: Instant) {
        let selection = self.buffer.selection();
        let selected = self.buffer.selected_text();
        let replacement = markup_replacement(literal, &selected);
        if replacement.is_empty() && selection.is_empty() {
            return;
        }
        self.buffer
            .replace_range(selection.start, selection.end, &replacement);
        self.pending_selection = None;
        self.record_change(now);
    }

    /// Step back in history. Returns `true` if the buffer changed.
    pub fn undo(&mut self, now: Instant) -> bool {
        let Some(state) = self.history.undo().cloned() else {
            return false;
        };
        self.apply_history_state(state, now);
        true
    }

    /// Step forward in history. Returns `true` if the buffer changed.
    pub fn redo(&mut self, now: Instant) -> bool {
        let Some(state) = self.history.redo().cloned() else {
            return false;
        };
        self.apply_history_state(state, now);
        true
    }

    /// Replace the whole text, e.g. after an import.
    pub fn replace_content(&mut self, content: &str, now: Instant) {
        self.buffer.set_text(content);
        self.buffer.move_caret(Motion::BufferEnd, false);
        self.pending_selection = None;
        self.history.save_state(content, None);
        self.debouncer.push(content.to_string(), now);
    }

    pub const fn pending_selection(&self) -> Option<CursorPosition> {
        self.pending_selection
    }

    /// Second phase of applying a history state: restore its selection now
    /// that the content has been drawn.
    pub fn on_render_committed(&mut self) -> bool {
        let Some(selection) = self.pending_selection.take() else {
            return false;
        };
        self.buffer.set_selection(selection);
        true
    }

    /// The latest content once it has been stable for the quiet period.
    pub fn poll_settled(&mut self, now: Instant) -> Option<String> {
        self.debouncer.take_ready(now)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    pub const fn quiet_period(&self) -> Duration {
        self.debouncer.quiet()
    }

    fn record_change(&mut self, now: Instant) {
        record(&mut self.history, &mut self.debouncer, &self.buffer, now);
    }

    /// Write a history state back into the buffer through the ordinary
    /// change path, with history saves suppressed so the write is not
    /// logged as a new edit. Its selection is staged for after the draw.
    fn apply_history_state(&mut self, state: EditorState, now: Instant) {
        let mut history = self.history.suppress_saves();
        self.buffer.set_text(&state.content);
        record(&mut history, &mut self.debouncer, &self.buffer, now);
        drop(history);
        self.pending_selection = state.cursor;
    }
}

fn record(
    history: &mut HistoryStore,
    debouncer: &mut Debouncer<String>,
    buffer: &EditorBuffer,
    now: Instant,
) {
    let content = buffer.text();
    history.save_state(&content, Some(buffer.selection()));
    debouncer.push(content, now);
}
