use std::time::Instant;

use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::app::{Model, SaveStatus, ToastLevel};

/// Text of the autosave indicator at `now`.
pub fn save_status_label(status: SaveStatus, now: Instant) -> String {
    match status {
        SaveStatus::Saving => "Saving...".to_string(),
        SaveStatus::Saved { at: Some(at) } => {
            format!("Saved {}s ago", now.saturating_duration_since(at).as_secs())
        }
        SaveStatus::Saved { at: None } => "Saved".to_string(),
        SaveStatus::Failed => "Not saved".to_string(),
    }
}

pub fn render_status_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let cursor = model.controller.buffer().cursor();
    let history = format!(
        "{}{}",
        if model.controller.can_undo() { " [undo]" } else { "" },
        if model.controller.can_redo() { " [redo]" } else { "" },
    );
    let status = format!(
        " {}  Ln {}, Col {}{history}  F1:help",
        save_status_label(model.save_status, Instant::now()),
        cursor.line + 1,
        cursor.col + 1,
    );
    let bg = match model.save_status {
        SaveStatus::Failed => Color::Red,
        SaveStatus::Saving | SaveStatus::Saved { .. } => Color::DarkGray,
    };
    let status_bar = Paragraph::new(status).style(Style::default().bg(bg).fg(Color::White));
    frame.render_widget(status_bar, area);
}

pub fn render_prompt_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let input = model.prompt.as_deref().unwrap_or_default();
    let text = format!("Import file: {input}\u{2588}  Enter: open  Esc: cancel");
    let bar = Paragraph::new(text).style(Style::default().bg(Color::Blue).fg(Color::White));
    frame.render_widget(bar, area);
}

pub fn render_toast_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let Some((message, level)) = model.active_toast() else {
        return;
    };
    let (prefix, style) = match level {
        ToastLevel::Info => (
            "[info]",
            Style::default().bg(Color::DarkGray).fg(Color::White),
        ),
        ToastLevel::Warning => (
            "[warn]",
            Style::default().bg(Color::Yellow).fg(Color::Black),
        ),
        ToastLevel::Error => ("[error]", Style::default().bg(Color::Red).fg(Color::White)),
    };
    let toast = Paragraph::new(format!("{prefix} {message}")).style(style);
    frame.render_widget(toast, area);
}
