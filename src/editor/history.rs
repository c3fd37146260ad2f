//! Linear undo/redo log of editor states.

use std::ops::{Deref, DerefMut};
use std::time::Instant;

/// Selected character range in the editor text.
///
/// Offsets count `char`s, not bytes. `start <= end` always holds; an empty
/// range is a plain caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorPosition {
    pub start: usize,
    pub end: usize,
}

impl CursorPosition {
    /// Build a range from two offsets in either order.
    pub const fn new(a: usize, b: usize) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    pub const fn caret(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Clamp both ends to `len` characters.
    pub fn clamp(self, len: usize) -> Self {
        Self::new(self.start.min(len), self.end.min(len))
    }
}

/// One recorded point in the history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorState {
    pub content: String,
    pub cursor: Option<CursorPosition>,
    pub timestamp: Instant,
}

impl EditorState {
    fn new(content: impl Into<String>, cursor: Option<CursorPosition>) -> Self {
        Self {
            content: content.into(),
            cursor,
            timestamp: Instant::now(),
        }
    }
}

/// Append-with-truncation history.
///
/// The log is never empty and `index` always points at a valid entry.
/// Saving after an undo discards every state that could have been redone.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    log: Vec<EditorState>,
    index: usize,
    suppressed: bool,
}

impl HistoryStore {
    /// Create a history seeded with `initial_content`.
    pub fn new(initial_content: impl Into<String>) -> Self {
        Self {
            log: vec![EditorState::new(initial_content, None)],
            index: 0,
            suppressed: false,
        }
    }

    /// Record `content` as the newest state.
    ///
    /// Drops the redo future beyond the current index. Saving the content
    /// the current state already holds leaves the log untouched, as does
    /// any save made while saves are suppressed.
    pub fn save_state(&mut self, content: &str, cursor: Option<CursorPosition>) {
        if self.suppressed {
            tracing::trace!("history save suppressed");
            return;
        }
        if self.log[self.index].content == content {
            return;
        }
        self.log.truncate(self.index + 1);
        self.log.push(EditorState::new(content, cursor));
        self.index = self.log.len() - 1;
        tracing::debug!(len = self.log.len(), "history state saved");
    }

    /// Step back one state.
    pub fn undo(&mut self) -> Option<&EditorState> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        Some(&self.log[self.index])
    }

    /// Step forward one state.
    pub fn redo(&mut self) -> Option<&EditorState> {
        if self.index + 1 >= self.log.len() {
            return None;
        }
        self.index += 1;
        Some(&self.log[self.index])
    }

    pub fn current_state(&self) -> &EditorState {
        &self.log[self.index]
    }

    pub const fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.log.len()
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    /// Always false; the log keeps at least its seed state.
    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    pub const fn index(&self) -> usize {
        self.index
    }

    pub fn states(&self) -> &[EditorState] {
        &self.log
    }

    pub const fn is_suppressed(&self) -> bool {
        self.suppressed
    }

    /// Suppress saves until the returned guard is dropped.
    ///
    /// Used while a history-derived state is written back into the editor so
    /// the echo of that write cannot append a duplicate mid-navigation.
    pub fn suppress_saves(&mut self) -> SuppressedSaves<'_> {
        self.suppressed = true;
        SuppressedSaves { store: self }
    }
}

/// Scoped save suppression. Clears the flag on drop, unwinding included.
#[derive(Debug)]
pub struct SuppressedSaves<'a> {
    store: &'a mut HistoryStore,
}

impl Deref for SuppressedSaves<'_> {
    type Target = HistoryStore;

    fn deref(&self) -> &Self::Target {
        self.store
    }
}

impl DerefMut for SuppressedSaves<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.store
    }
}

impl Drop for SuppressedSaves<'_> {
    fn drop(&mut self) {
        self.store.suppressed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(store: &HistoryStore) -> Vec<&str> {
        store.states().iter().map(|s| s.content.as_str()).collect()
    }

    #[test]
    fn test_new_store_holds_seed_only() {
        let store = HistoryStore::new("seed");
        assert_eq!(store.len(), 1);
        assert_eq!(store.index(), 0);
        assert_eq!(store.current_state().content, "seed");
        assert!(!store.can_undo());
        assert!(!store.can_redo());
    }

    #[test]
    fn test_distinct_saves_enable_undo_back_to_seed() {
        let mut store = HistoryStore::new("");
        let inputs = ["a", "ab", "abc", "abcd"];
        for (i, text) in inputs.iter().enumerate() {
            store.save_state(text, None);
            assert!(store.can_undo(), "can_undo after save {}", i + 1);
        }

        let mut undos = 0;
        while store.undo().is_some() {
            undos += 1;
        }
        assert_eq!(undos, inputs.len());
        assert_eq!(store.current_state().content, "");
    }

    #[test]
    fn test_undo_then_redo_round_trips() {
        let mut store = HistoryStore::new("");
        store.save_state("C1", None);
        store.save_state("C2", None);
        let len = store.len();

        assert_eq!(store.undo().map(|s| s.content.clone()), Some("C1".into()));
        assert_eq!(store.redo().map(|s| s.content.clone()), Some("C2".into()));
        assert_eq!(store.len(), len);
    }

    #[test]
    fn test_consecutive_duplicate_is_not_recorded() {
        let mut store = HistoryStore::new("");
        store.save_state("X", None);
        let len = store.len();
        store.save_state("X", Some(CursorPosition::caret(1)));
        assert_eq!(store.len(), len);
        assert_eq!(store.index(), len - 1);
    }

    #[test]
    fn test_only_adjacent_duplicates_are_suppressed() {
        let mut store = HistoryStore::new("");
        store.save_state("X", None);
        store.save_state("Y", None);
        store.save_state("X", None);
        assert_eq!(contents(&store), vec!["", "X", "Y", "X"]);
    }

    #[test]
    fn test_save_after_undo_discards_redo_future() {
        let mut store = HistoryStore::new("seed");
        store.save_state("A", None);
        store.save_state("B", None);
        store.save_state("C", None);
        store.undo();
        store.save_state("D", None);

        assert_eq!(contents(&store), vec!["seed", "A", "B", "D"]);
        assert!(!store.can_redo());
        assert_eq!(store.index(), 3);
    }

    #[test]
    fn test_saving_current_content_after_undo_keeps_redo() {
        let mut store = HistoryStore::new("seed");
        store.save_state("A", None);
        store.save_state("B", None);
        store.undo();
        store.save_state("A", None);

        assert_eq!(contents(&store), vec!["seed", "A", "B"]);
        assert!(store.can_redo());
    }

    #[test]
    fn test_undo_at_oldest_and_redo_at_newest_return_none() {
        let mut store = HistoryStore::new("seed");
        assert!(store.undo().is_none());
        store.save_state("A", None);
        assert!(store.redo().is_none());
        assert_eq!(store.index(), 1);
    }

    #[test]
    fn test_state_keeps_cursor() {
        let mut store = HistoryStore::new("");
        store.save_state("hello", Some(CursorPosition::new(5, 2)));
        assert_eq!(
            store.current_state().cursor,
            Some(CursorPosition { start: 2, end: 5 })
        );
    }

    #[test]
    fn test_suppressed_saves_are_dropped() {
        let mut store = HistoryStore::new("seed");
        store.save_state("A", None);
        {
            let mut guard = store.suppress_saves();
            assert!(guard.is_suppressed());
            guard.undo();
            guard.save_state("seed-echo", None);
        }
        assert!(!store.is_suppressed());
        assert_eq!(contents(&store), vec!["seed", "A"]);
        assert_eq!(store.index(), 0);
    }

    #[test]
    fn test_suppression_cleared_when_apply_panics() {
        let mut store = HistoryStore::new("seed");
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = store.suppress_saves();
            panic!("apply failed");
        }));
        assert!(result.is_err());
        assert!(!store.is_suppressed());

        store.save_state("after", None);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_cursor_position_normalizes_and_clamps() {
        let pos = CursorPosition::new(9, 3);
        assert_eq!(pos, CursorPosition { start: 3, end: 9 });
        assert_eq!(pos.clamp(5), CursorPosition { start: 3, end: 5 });
        assert!(CursorPosition::caret(4).is_empty());
    }
}
