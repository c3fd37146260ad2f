use ropey::Rope;

use super::history::CursorPosition;

/// Line/column view of the caret, both zero-based and counted in chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub line: usize,
    pub col: usize,
}

impl Cursor {
    pub const fn at(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

/// Caret motions understood by the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Left,
    Right,
    Up,
    Down,
    LineStart,
    LineEnd,
    WordLeft,
    WordRight,
    BufferStart,
    BufferEnd,
}

/// A text buffer backed by a rope data structure.
///
/// Positions are character offsets into the whole text. The selection runs
/// from an optional anchor to the caret; without an anchor it is empty.
pub struct EditorBuffer {
    rope: Rope,
    caret: usize,
    anchor: Option<usize>,
    /// Remembered column for vertical movement (sticky column).
    col_memory: usize,
}

impl EditorBuffer {
    /// Create a new buffer from a string, caret at the start.
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            caret: 0,
            anchor: None,
            col_memory: 0,
        }
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Get the content of a line (without trailing newline).
    pub fn line_at(&self, line_idx: usize) -> Option<String> {
        if line_idx >= self.rope.len_lines() {
            return None;
        }
        let s = self.rope.line(line_idx).to_string();
        Some(s.trim_end_matches('\n').trim_end_matches('\r').to_string())
    }

    /// Length of a line in chars (without trailing newline).
    pub fn line_len(&self, line_idx: usize) -> usize {
        self.line_at(line_idx).map_or(0, |s| s.chars().count())
    }

    /// Char offset of the first char of `line_idx`, clamped to the text.
    pub fn line_start(&self, line_idx: usize) -> usize {
        if line_idx >= self.rope.len_lines() {
            return self.len_chars();
        }
        self.rope.line_to_char(line_idx)
    }

    /// Caret offset in chars.
    pub const fn caret(&self) -> usize {
        self.caret
    }

    pub fn cursor(&self) -> Cursor {
        let (line, col) = self.line_col(self.caret);
        Cursor::at(line, col)
    }

    pub fn selection(&self) -> CursorPosition {
        CursorPosition::new(self.anchor.unwrap_or(self.caret), self.caret)
    }

    pub fn has_selection(&self) -> bool {
        !self.selection().is_empty()
    }

    pub fn selected_text(&self) -> String {
        let sel = self.selection();
        self.rope.slice(sel.start..sel.end).to_string()
    }

    /// Select `pos`, clamped to the text. The caret lands on `pos.end`.
    pub fn set_selection(&mut self, pos: CursorPosition) {
        let pos = pos.clamp(self.len_chars());
        self.anchor = (!pos.is_empty()).then_some(pos.start);
        self.set_caret(pos.end);
    }

    /// Insert a character at the caret, replacing any selection.
    pub fn insert_char(&mut self, ch: char) {
        self.delete_selection();
        self.rope.insert_char(self.caret, ch);
        self.set_caret(self.caret + 1);
    }

    /// Insert a string at the caret, replacing any selection.
    pub fn insert_str(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        self.delete_selection();
        self.rope.insert(self.caret, s);
        self.set_caret(self.caret + s.chars().count());
    }

    /// Split the current line at the caret (Enter key).
    pub fn split_line(&mut self) {
        self.insert_char('\n');
    }

    /// Delete the selection or the character before the caret (Backspace).
    ///
    /// Returns `true` if anything was deleted.
    pub fn delete_back(&mut self) -> bool {
        if self.delete_selection() {
            return true;
        }
        if self.caret == 0 {
            return false;
        }
        self.rope.remove(self.caret - 1..self.caret);
        self.set_caret(self.caret - 1);
        true
    }

    /// Delete the selection or the character at the caret (Delete key).
    ///
    /// Returns `true` if anything was deleted.
    pub fn delete_forward(&mut self) -> bool {
        if self.delete_selection() {
            return true;
        }
        if self.caret >= self.len_chars() {
            return false;
        }
        self.rope.remove(self.caret..=self.caret);
        true
    }

    /// Replace the chars in `start..end` with `text` and put the caret after it.
    pub fn replace_range(&mut self, start: usize, end: usize, text: &str) {
        let range = CursorPosition::new(start, end).clamp(self.len_chars());
        self.rope.remove(range.start..range.end);
        self.rope.insert(range.start, text);
        self.anchor = None;
        self.set_caret(range.start + text.chars().count());
    }

    /// Replace the whole text. The caret is kept where it still fits.
    pub fn set_text(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
        self.anchor = None;
        self.set_caret(self.caret.min(self.len_chars()));
    }

    /// Move the caret, optionally extending the selection.
    pub fn move_caret(&mut self, motion: Motion, extend: bool) {
        if extend {
            if self.anchor.is_none() {
                self.anchor = Some(self.caret);
            }
        } else if self.has_selection() && matches!(motion, Motion::Left | Motion::Right) {
            // Collapsing a selection lands on its edge without moving further.
            let sel = self.selection();
            self.anchor = None;
            let edge = if motion == Motion::Left { sel.start } else { sel.end };
            self.set_caret(edge);
            return;
        } else {
            self.anchor = None;
        }

        match motion {
            Motion::Left => self.move_left(),
            Motion::Right => self.move_right(),
            Motion::Up => self.move_vertical(false),
            Motion::Down => self.move_vertical(true),
            Motion::LineStart => {
                let line = self.cursor().line;
                self.set_caret(self.rope.line_to_char(line));
            }
            Motion::LineEnd => {
                let line = self.cursor().line;
                self.set_caret(self.rope.line_to_char(line) + self.line_len(line));
            }
            Motion::WordLeft => self.move_word_left(),
            Motion::WordRight => self.move_word_right(),
            Motion::BufferStart => self.set_caret(0),
            Motion::BufferEnd => self.set_caret(self.len_chars()),
        }

        if self.anchor == Some(self.caret) {
            self.anchor = None;
        }
    }

    /// Move the caret to a line and column, clamped to the text.
    pub fn move_to(&mut self, line: usize, col: usize) {
        let line = line.min(self.line_count().saturating_sub(1));
        let col = col.min(self.line_len(line));
        self.anchor = None;
        self.set_caret(self.rope.line_to_char(line) + col);
    }

    // --- Private helpers ---

    fn line_col(&self, char_idx: usize) -> (usize, usize) {
        let idx = char_idx.min(self.len_chars());
        let line = self.rope.char_to_line(idx);
        (line, idx - self.rope.line_to_char(line))
    }

    fn set_caret(&mut self, char_idx: usize) {
        self.caret = char_idx.min(self.len_chars());
        self.col_memory = self.line_col(self.caret).1;
    }

    fn delete_selection(&mut self) -> bool {
        let sel = self.selection();
        self.anchor = None;
        if sel.is_empty() {
            return false;
        }
        self.rope.remove(sel.start..sel.end);
        self.set_caret(sel.start);
        true
    }

    fn move_left(&mut self) {
        if self.caret > 0 {
            self.set_caret(self.caret - 1);
        }
    }

    fn move_right(&mut self) {
        let (line, col) = self.line_col(self.caret);
        if col < self.line_len(line) {
            self.set_caret(self.caret + 1);
        } else if line + 1 < self.line_count() {
            self.set_caret(self.rope.line_to_char(line + 1));
        }
    }

    fn move_vertical(&mut self, down: bool) {
        let (line, _) = self.line_col(self.caret);
        let target = if down {
            if line + 1 >= self.line_count() {
                return;
            }
            line + 1
        } else {
            if line == 0 {
                return;
            }
            line - 1
        };
        let memory = self.col_memory;
        let col = memory.min(self.line_len(target));
        self.caret = self.rope.line_to_char(target) + col;
        self.col_memory = memory;
    }

    fn move_word_left(&mut self) {
        let (line, col) = self.line_col(self.caret);
        if col == 0 {
            if line > 0 {
                self.set_caret(self.rope.line_to_char(line - 1) + self.line_len(line - 1));
            }
            return;
        }
        let chars: Vec<char> = self.line_at(line).unwrap_or_default().chars().collect();
        let mut i = col.min(chars.len());
        while i > 0 && !is_word_char(chars[i - 1]) {
            i -= 1;
        }
        while i > 0 && is_word_char(chars[i - 1]) {
            i -= 1;
        }
        self.set_caret(self.rope.line_to_char(line) + i);
    }

    fn move_word_right(&mut self) {
        let (line, col) = self.line_col(self.caret);
        let len = self.line_len(line);
        if col >= len {
            if line + 1 < self.line_count() {
                self.set_caret(self.rope.line_to_char(line + 1));
            }
            return;
        }
        let chars: Vec<char> = self.line_at(line).unwrap_or_default().chars().collect();
        let mut i = col;
        while i < chars.len() && is_word_char(chars[i]) {
            i += 1;
        }
        while i < chars.len() && !is_word_char(chars[i]) {
            i += 1;
        }
        self.set_caret(self.rope.line_to_char(line) + i);
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

impl std::fmt::Debug for EditorBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorBuffer")
            .field(
                "rope",
                &format_args!("Rope({} lines)", self.rope.len_lines()),
            )
            .field("caret", &self.caret)
            .field("anchor", &self.anchor)
            .finish()
    }
}
