//! Trailing-edge debouncing for rapidly changing values.
//!
//! The event loop feeds every change in and polls for a settled value. Time
//! is passed in by the caller so behavior is deterministic under test.

use std::time::{Duration, Instant};

/// Holds the latest value until it has been stable for `quiet`.
///
/// Only the most recent value survives a pending window; a new push
/// replaces it and restarts the quiet period.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    quiet: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub const fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
        }
    }

    pub const fn quiet(&self) -> Duration {
        self.quiet
    }

    /// Queue `value`, cancelling whatever was pending.
    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now));
    }

    /// Take the pending value once the quiet period has elapsed.
    pub fn take_ready(&mut self, now: Instant) -> Option<T> {
        let (_, queued_at) = self.pending.as_ref()?;
        if now.saturating_duration_since(*queued_at) < self.quiet {
            return None;
        }
        self.pending.take().map(|(value, _)| value)
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending value will settle, if anything is pending.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending
            .as_ref()
            .map(|(_, queued_at)| *queued_at + self.quiet)
    }
}
