//! Application state and main event loop.
//!
//! This module implements The Elm Architecture (TEA):
//! - [`Model`]: The complete application state
//! - [`Message`]: All possible events and actions
//! - [`update`]: Pure function for state transitions
//! - [`App::run`]: Main event loop with rendering

mod effects;
mod event_loop;
mod input;
mod model;
mod update;

pub use model::{Model, SaveStatus, ToastLevel, WELCOME_CONTENT};
pub use update::{Message, update, update_at};

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::editor::DEFAULT_QUIET_PERIOD;
use crate::export::{Rasterizer, SvgRasterizer, import_from_file};
use crate::highlight::HighlightBackground;
use crate::storage::{AUTOSAVE_KEY, KeyValueStore, Persistence};

/// Main application struct that owns the storage and runs the event loop.
pub struct App {
    file_path: Option<PathBuf>,
    restore: bool,
    quiet: Duration,
    background: HighlightBackground,
    export_dir: PathBuf,
    persistence: Persistence<Box<dyn KeyValueStore>>,
    rasterizer: Box<dyn Rasterizer>,
    config_global_path: Option<PathBuf>,
    config_local_path: Option<PathBuf>,
}

impl App {
    /// Create a new application autosaving into `store`.
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self {
            file_path: None,
            restore: true,
            quiet: DEFAULT_QUIET_PERIOD,
            background: HighlightBackground::Dark,
            export_dir: PathBuf::from("."),
            persistence: Persistence::new(store),
            rasterizer: Box::new(SvgRasterizer::default()),
            config_global_path: None,
            config_local_path: None,
        }
    }

    /// Open `path` instead of the saved draft.
    pub fn with_file(mut self, path: Option<PathBuf>) -> Self {
        self.file_path = path;
        self
    }

    /// Whether to start from the autosaved draft.
    pub const fn with_restore(mut self, restore: bool) -> Self {
        self.restore = restore;
        self
    }

    /// Quiet period before preview refresh and autosave.
    pub const fn with_quiet_period(mut self, quiet: Duration) -> Self {
        self.quiet = quiet;
        self
    }

    pub const fn with_background(mut self, background: HighlightBackground) -> Self {
        self.background = background;
        self
    }

    pub fn with_export_dir(mut self, dir: PathBuf) -> Self {
        self.export_dir = dir;
        self
    }

    pub fn with_rasterizer(mut self, rasterizer: Box<dyn Rasterizer>) -> Self {
        self.rasterizer = rasterizer;
        self
    }

    /// Set config paths to show in help.
    pub fn with_config_paths(
        mut self,
        global_path: Option<PathBuf>,
        local_path: Option<PathBuf>,
    ) -> Self {
        self.config_global_path = global_path;
        self.config_local_path = local_path;
        self
    }

    /// Content the editor starts with: the file argument, else the saved
    /// draft, else nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file argument cannot be read as text.
    pub fn initial_content(&self) -> Result<String> {
        if let Some(path) = &self.file_path {
            return import_from_file(path)
                .with_context(|| format!("Failed to open {}", path.display()));
        }
        if self.restore
            && let Some(saved) = self.persistence.load(AUTOSAVE_KEY)
        {
            tracing::debug!(chars = saved.chars().count(), "restored autosaved draft");
            return Ok(saved);
        }
        Ok(String::new())
    }

    /// Build the starting model for a terminal of `size`.
    ///
    /// # Errors
    ///
    /// Returns an error if the starting content cannot be loaded.
    pub fn initial_model(&self, size: (u16, u16)) -> Result<Model> {
        let content = self.initial_content()?;
        let mut model = Model::new(&content, size, self.quiet, self.background);
        model.export_dir.clone_from(&self.export_dir);
        model
            .config_global_path
            .clone_from(&self.config_global_path);
        model.config_local_path.clone_from(&self.config_local_path);
        Ok(model)
    }
}

#[cfg(test)]
mod tests;
