use std::io::{Write, stdout};
use std::time::Instant;

use base64::Engine;

use crate::app::{App, Message, Model, SaveStatus, ToastLevel};
use crate::export::{ExportFormat, export_as_html, export_as_markdown, export_as_pdf, import_from_file};
use crate::storage::AUTOSAVE_KEY;

impl App {
    pub(super) fn handle_message_side_effects(&mut self, model: &mut Model, msg: &Message) {
        match msg {
            Message::Settled(_) => self.autosave(model),
            Message::Export(ExportFormat::Markdown) => {
                let path = ExportFormat::Markdown.path_in(&model.export_dir);
                let result = export_as_markdown(&model.controller.content(), &path);
                report_export(model, ExportFormat::Markdown, &path, result);
            }
            Message::Export(ExportFormat::Html) => {
                let path = ExportFormat::Html.path_in(&model.export_dir);
                let result =
                    export_as_html(&model.controller.content(), &model.render_options, &path);
                report_export(model, ExportFormat::Html, &path, result);
            }
            Message::PromptSubmit => Self::import(model),
            Message::ClearSaved if model.pending_storage_clear => {
                model.pending_storage_clear = false;
                match self.persistence.clear(AUTOSAVE_KEY) {
                    Ok(()) => model.show_toast(ToastLevel::Info, "Saved content cleared"),
                    Err(err) => {
                        model.show_toast(ToastLevel::Warning, format!("Clear failed: {err}"));
                    }
                }
            }
            Message::CopySelection => match model.selection_to_copy() {
                Some(text) => copy_with_toast(model, &text, "selection"),
                None => model.show_toast(ToastLevel::Info, "Nothing selected"),
            },
            Message::CopyCodeBlock => match model.code_block_to_copy() {
                Some(code) => copy_with_toast(model, &code, "code block"),
                None => model.show_toast(ToastLevel::Info, "No code block to copy"),
            },
            _ => {}
        }
    }

    /// Run the PDF export parked by `Message::Export(Pdf)`.
    pub(super) fn run_pending_pdf_export(&self, model: &mut Model) {
        if !model.pdf_export_pending {
            return;
        }
        model.pdf_export_pending = false;
        let path = ExportFormat::Pdf.path_in(&model.export_dir);
        let result = export_as_pdf(&mut model.preview, self.rasterizer.as_ref(), &path);
        report_export(model, ExportFormat::Pdf, &path, result);
    }

    fn autosave(&mut self, model: &mut Model) {
        let Some(content) = model.pending_autosave.take() else {
            return;
        };
        match self.persistence.save(AUTOSAVE_KEY, &content) {
            Ok(()) => {
                model.save_status = SaveStatus::Saved {
                    at: Some(Instant::now()),
                };
            }
            Err(err) => {
                model.save_status = SaveStatus::Failed;
                model.show_toast(ToastLevel::Warning, format!("Autosave failed: {err}"));
            }
        }
    }

    fn import(model: &mut Model) {
        let Some(path) = model.pending_import.take() else {
            return;
        };
        match import_from_file(&path) {
            Ok(content) => {
                model.controller.replace_content(&content, Instant::now());
                model.note_content_changed();
                model.show_toast(ToastLevel::Info, format!("Imported {}", path.display()));
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "import failed");
                model.show_toast(ToastLevel::Error, format!("Import failed: {err}"));
            }
        }
    }
}

fn report_export<E: std::fmt::Display>(
    model: &mut Model,
    format: ExportFormat,
    path: &std::path::Path,
    result: Result<(), E>,
) {
    match result {
        Ok(()) => model.show_toast(
            ToastLevel::Info,
            format!("Exported {} to {}", format.label(), path.display()),
        ),
        Err(err) => model.show_toast(
            ToastLevel::Error,
            format!("{} export failed: {err}", format.label()),
        ),
    }
}

fn copy_with_toast(model: &mut Model, text: &str, what: &str) {
    match copy_to_clipboard(text) {
        Ok(()) => model.show_toast(ToastLevel::Info, format!("Copied {what}")),
        Err(err) => model.show_toast(ToastLevel::Error, format!("Copy failed: {err}")),
    }
}

fn copy_to_clipboard(text: &str) -> std::io::Result<()> {
    #[cfg(target_os = "macos")]
    {
        if copy_to_pbcopy(text).is_ok() {
            return Ok(());
        }
    }
    copy_to_clipboard_osc52(text)
}

#[cfg(target_os = "macos")]
fn copy_to_pbcopy(text: &str) -> std::io::Result<()> {
    use std::process::{Command, Stdio};

    let mut child = Command::new("pbcopy").stdin(Stdio::piped()).spawn()?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(text.as_bytes())?;
    }
    let status = child.wait()?;
    if status.success() {
        Ok(())
    } else {
        Err(std::io::Error::other("pbcopy failed"))
    }
}

fn copy_to_clipboard_osc52(text: &str) -> std::io::Result<()> {
    let osc = osc52_sequence(text);
    let mut out = stdout();
    out.write_all(osc.as_bytes())?;
    out.flush()
}

fn osc52_sequence(text: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(text.as_bytes());
    format!("\x1b]52;c;{encoded}\x07")
}
