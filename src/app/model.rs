use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::editor::{DEFAULT_QUIET_PERIOD, EditorController};
use crate::highlight::HighlightBackground;
use crate::preview::{Preview, PreviewStyle};
use crate::render::RenderOptions;

/// Content put in place after the saved draft is cleared.
pub const WELCOME_CONTENT: &str = "# Welcome to Markdown Editor\nStart typing...";

const TOAST_DURATION: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
struct Toast {
    level: ToastLevel,
    message: String,
    expires_at: Instant,
}

/// Autosave indicator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    /// Nothing waiting to be written; `at` is the last successful write
    Saved { at: Option<Instant> },
    /// A change is waiting for its quiet period
    Saving,
    /// The last autosave failed
    Failed,
}

/// The complete application state.
///
/// All state lives here - no global or scattered state. File and storage
/// work requested by an update is parked in the `pending_*` fields until
/// the side-effect pass performs it.
pub struct Model {
    /// Editor text, history and debounced content
    pub controller: EditorController,
    /// Rendered preview of the settled content
    pub preview: Preview,
    /// Content the session started with; never autosaved as is
    initial_content: String,
    pub save_status: SaveStatus,
    toast: Option<Toast>,
    /// Import path being typed, when the prompt is open
    pub prompt: Option<String>,
    pub help_visible: bool,
    pub help_scroll_offset: usize,
    /// Set after a first quit attempt with an unsettled change
    pub quit_confirmed: bool,
    /// Set after a first Ctrl+L; a second one clears the saved draft
    pub clear_confirmed: bool,
    /// First visible editor line
    pub editor_scroll_offset: usize,
    /// First visible editor column
    pub editor_col_offset: usize,
    /// First visible preview row
    pub preview_scroll_offset: usize,
    /// Options for HTML export
    pub render_options: RenderOptions,
    /// Directory exports are written into
    pub export_dir: PathBuf,
    /// Global config path shown in help
    pub config_global_path: Option<PathBuf>,
    /// Local override path shown in help
    pub config_local_path: Option<PathBuf>,
    /// Content to autosave
    pub(super) pending_autosave: Option<String>,
    /// File to import
    pub(super) pending_import: Option<PathBuf>,
    /// PDF export waits for one draw so "Exporting..." is visible
    pub pdf_export_pending: bool,
    pub(super) pending_storage_clear: bool,
    pub should_quit: bool,
    width: u16,
    height: u16,
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("save_status", &self.save_status)
            .field("help_visible", &self.help_visible)
            .field("prompt", &self.prompt)
            .field("pdf_export_pending", &self.pdf_export_pending)
            .finish_non_exhaustive()
    }
}

impl Model {
    /// Create a model seeded with `initial_content`.
    pub fn new(
        initial_content: &str,
        terminal_size: (u16, u16),
        quiet: Duration,
        background: HighlightBackground,
    ) -> Self {
        let (width, height) = terminal_size;
        Self {
            controller: EditorController::new(initial_content, quiet),
            preview: Preview::new(
                initial_content,
                crate::ui::preview_content_width(width),
                PreviewStyle::new(background),
            ),
            initial_content: initial_content.to_string(),
            save_status: SaveStatus::Saved { at: None },
            toast: None,
            prompt: None,
            help_visible: false,
            help_scroll_offset: 0,
            quit_confirmed: false,
            clear_confirmed: false,
            editor_scroll_offset: 0,
            editor_col_offset: 0,
            preview_scroll_offset: 0,
            render_options: RenderOptions::default(),
            export_dir: PathBuf::from("."),
            config_global_path: None,
            config_local_path: None,
            pending_autosave: None,
            pending_import: None,
            pdf_export_pending: false,
            pending_storage_clear: false,
            should_quit: false,
            width,
            height,
        }
    }

    pub fn initial_content(&self) -> &str {
        &self.initial_content
    }

    pub const fn terminal_size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    pub(super) fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.preview
            .resize(crate::ui::preview_content_width(width));
        self.clamp_preview_scroll();
    }

    /// Flag the autosave indicator after a content change.
    pub(super) fn note_content_changed(&mut self) {
        if self.controller.has_unsettled_change() {
            self.save_status = SaveStatus::Saving;
        }
    }

    /// Take in content that has been stable for the quiet period.
    pub(super) fn apply_settled(&mut self, content: String) {
        self.preview.set_source(&content);
        self.clamp_preview_scroll();
        if content == self.initial_content {
            let at = match self.save_status {
                SaveStatus::Saved { at } => at,
                SaveStatus::Saving | SaveStatus::Failed => None,
            };
            self.save_status = SaveStatus::Saved { at };
        } else {
            self.pending_autosave = Some(content);
        }
    }

    pub(super) fn scroll_preview_up(&mut self, n: usize) {
        self.preview_scroll_offset = self.preview_scroll_offset.saturating_sub(n);
    }

    pub(super) fn scroll_preview_down(&mut self, n: usize) {
        self.preview_scroll_offset = self.preview_scroll_offset.saturating_add(n);
        self.clamp_preview_scroll();
    }

    fn clamp_preview_scroll(&mut self) {
        let max = self.preview.line_count().saturating_sub(1);
        self.preview_scroll_offset = self.preview_scroll_offset.min(max);
    }

    /// Selected editor text, if any.
    pub fn selection_to_copy(&self) -> Option<String> {
        let buffer = self.controller.buffer();
        buffer.has_selection().then(|| buffer.selected_text())
    }

    /// Code of the block under the caret, else the first block at or
    /// below the top of the preview.
    pub fn code_block_to_copy(&self) -> Option<String> {
        let caret_line = self.controller.buffer().cursor().line;
        self.preview
            .code_block_at_source_line(caret_line)
            .or_else(|| self.preview.code_block_from_row(self.preview_scroll_offset))
            .map(|block| block.code.clone())
    }

    pub(super) fn show_toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.toast = Some(Toast {
            level,
            message: message.into(),
            expires_at: Instant::now() + TOAST_DURATION,
        });
    }

    pub(super) fn expire_toast(&mut self, now: Instant) -> bool {
        if self
            .toast
            .as_ref()
            .is_some_and(|toast| toast.expires_at <= now)
        {
            self.toast = None;
            return true;
        }
        false
    }

    pub fn active_toast(&self) -> Option<(&str, ToastLevel)> {
        self.toast
            .as_ref()
            .map(|toast| (toast.message.as_str(), toast.level))
    }

    pub(super) fn toast_deadline(&self) -> Option<Instant> {
        self.toast.as_ref().map(|toast| toast.expires_at)
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new("", (80, 24), DEFAULT_QUIET_PERIOD, HighlightBackground::Dark)
    }
}
