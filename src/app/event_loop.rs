use std::io::stdout;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use ratatui::DefaultTerminal;

use crate::app::{App, Message, Model, SaveStatus, update_at};

/// Longest wait between frames, so "Saved Ns ago" keeps counting.
const IDLE_POLL: Duration = Duration::from_secs(1);

/// Keyboard, mouse and paste capture for the lifetime of the editor.
///
/// Enhanced key reporting lets Ctrl+Shift+Z arrive as its own chord. The
/// terminal modes are released when the guard drops, on every exit path.
pub(super) struct KeyboardCapture {
    enhanced: bool,
}

impl KeyboardCapture {
    pub(super) fn acquire() -> Result<Self> {
        let enhanced = crossterm::terminal::supports_keyboard_enhancement().unwrap_or(false);
        if enhanced {
            execute!(
                stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
            )?;
        }
        execute!(stdout(), EnableMouseCapture, EnableBracketedPaste)?;
        tracing::debug!(enhanced, "keyboard capture acquired");
        Ok(Self { enhanced })
    }
}

impl Drop for KeyboardCapture {
    fn drop(&mut self) {
        let _ = execute!(stdout(), DisableBracketedPaste, DisableMouseCapture);
        if self.enhanced {
            let _ = execute!(stdout(), PopKeyboardEnhancementFlags);
        }
    }
}

impl App {
    /// Run the main event loop.
    ///
    /// # Errors
    ///
    /// Returns an error if the starting content cannot be loaded, or if
    /// terminal initialization or the event loop hits an I/O failure.
    pub fn run(&mut self) -> Result<()> {
        let mut terminal = ratatui::try_init()
            .context("Failed to initialize terminal - markdraft requires an interactive terminal")?;
        let result = self.run_in(&mut terminal);
        ratatui::restore();
        result
    }

    fn run_in(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let size = terminal.size()?;
        let mut model = self.initial_model((size.width, size.height))?;
        let _capture = KeyboardCapture::acquire()?;
        self.event_loop(terminal, &mut model)
    }

    /// Apply one message: state transition, then its side effects.
    pub(super) fn dispatch(&mut self, model: &mut Model, msg: Message, now: Instant) {
        tracing::trace!(?msg, "dispatch");
        let side_msg = msg.clone();
        *model = update_at(std::mem::take(model), msg, now);
        self.handle_message_side_effects(model, &side_msg);
    }

    fn event_loop(&mut self, terminal: &mut DefaultTerminal, model: &mut Model) -> Result<()> {
        let mut needs_render = true;

        loop {
            let now = Instant::now();
            if model.expire_toast(now) {
                needs_render = true;
            }
            if let Some(content) = model.controller.poll_settled(now) {
                self.dispatch(model, Message::Settled(content), now);
                needs_render = true;
            }

            if needs_render {
                terminal.draw(|frame| crate::ui::render(model, frame))?;
                needs_render = false;
                // Second phase of undo/redo: the content is on screen, now
                // restore its selection.
                if model.controller.on_render_committed() {
                    needs_render = true;
                }
                if model.pdf_export_pending {
                    self.run_pending_pdf_export(model);
                    needs_render = true;
                }
            }

            if model.should_quit {
                break;
            }

            let timeout = if needs_render {
                Duration::ZERO
            } else {
                poll_timeout(model, Instant::now())
            };
            if !event::poll(timeout)? {
                // Idle tick: refresh the save indicator's age.
                needs_render |= matches!(model.save_status, SaveStatus::Saved { at: Some(_) });
                continue;
            }

            if let Some(msg) = Self::handle_event(&event::read()?, model) {
                self.dispatch(model, msg, Instant::now());
            }
            needs_render = true;

            // Coalesce key repeat bursts into a single render.
            while event::poll(Duration::ZERO)? {
                if let Some(msg) = Self::handle_event(&event::read()?, model) {
                    self.dispatch(model, msg, Instant::now());
                }
            }
        }
        Ok(())
    }
}

/// Time until the next debounce deadline or toast expiry, capped at
/// [`IDLE_POLL`].
fn poll_timeout(model: &Model, now: Instant) -> Duration {
    [model.controller.next_deadline(), model.toast_deadline()]
        .into_iter()
        .flatten()
        .map(|deadline| deadline.saturating_duration_since(now))
        .fold(IDLE_POLL, Duration::min)
}
