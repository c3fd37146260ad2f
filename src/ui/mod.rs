//! Terminal UI components.
//!
//! - [`render`]: draws the toolbar, editor, preview and footer bars
//! - [`layout`]: pane geometry shared by drawing and mouse hit tests
//! - [`style`]: preview colors

pub mod style;

mod overlays;
mod render;
mod status;

pub use overlays::centered_popup_rect;
pub use render::{
    AppLayout, editor_gutter_width, layout, line_number_width, preview_content_width, render,
    split_main_columns,
};
pub use status::save_status_label;

/// Blank columns between the preview border and its text.
pub const DOCUMENT_LEFT_PADDING: u16 = 1;
pub const EDITOR_WIDTH_PERCENT: u16 = 50;
pub const PREVIEW_WIDTH_PERCENT: u16 = 50;

#[cfg(test)]
mod tests;
