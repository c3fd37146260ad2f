//! Editor core for in-place markdown editing.
//!
//! A rope-backed text buffer with caret and selection, a linear undo/redo
//! history, the toolbar markup tokens, and the controller that ties them to
//! the debounced render/autosave cycle.

mod buffer;
mod controller;
mod history;
mod markup;

pub use buffer::{Cursor, EditorBuffer, Motion};
pub use controller::{DEFAULT_QUIET_PERIOD, EditOp, EditorController};
pub use history::{CursorPosition, EditorState, HistoryStore, SuppressedSaves};
pub use markup::{MarkupToken, markup_replacement};
