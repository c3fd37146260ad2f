// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. editor::EditorBuffer)
    clippy::module_name_repetitions
)]

//! # Markdraft
//!
//! A terminal markdown editor with a live preview.
//!
//! Markdraft pairs a plain-text editor with a rendered preview and adds:
//! - Undo/redo history that restores the selection of each state
//! - Debounced preview refresh and autosave of the draft
//! - Toolbar markup insertion that wraps the selection
//! - Export to Markdown, sanitized standalone HTML, and paginated PDF
//!
//! ## Architecture
//!
//! Markdraft uses The Elm Architecture (TEA) pattern:
//! - **Model**: Application state
//! - **Message**: Events and actions
//! - **Update**: Pure state transitions
//! - **View**: Render to terminal
//!
//! ## Modules
//!
//! - [`app`]: Main application loop, state and input mapping
//! - [`editor`]: Text buffer, history, markup tokens and the controller
//! - [`preview`]: Terminal layout of the rendered markdown
//! - [`render`]: Markdown to sanitized HTML
//! - [`highlight`]: Syntax highlighting
//! - [`export`]: File export and import
//! - [`storage`]: Autosave persistence
//! - [`debounce`]: Quiet-period scheduling
//! - [`ui`]: Terminal UI components

pub mod app;
pub mod config;
pub mod debounce;
pub mod editor;
pub mod error;
pub mod export;
pub mod highlight;
pub mod preview;
pub mod render;
pub mod storage;
pub mod ui;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::app::{App, Message, Model};
    pub use crate::editor::{EditorController, HistoryStore};
    pub use crate::preview::Preview;
    pub use crate::storage::{FileStore, KeyValueStore, MemoryStore};
}
