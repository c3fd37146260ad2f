//! Markdraft - A terminal markdown editor with live preview.
//!
//! # Usage
//!
//! ```bash
//! markdraft
//! markdraft notes.md
//! markdraft --theme light --export-dir out/
//! ```

use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};

use markdraft::app::App;
use markdraft::config::{
    ConfigFlags, StorageKind, ThemeMode, clear_config_flags, global_config_path,
    load_config_flags, local_override_path, parse_flag_tokens, save_config_flags,
};
use markdraft::editor::DEFAULT_QUIET_PERIOD;
use markdraft::highlight::HighlightBackground;
use markdraft::storage::{FileStore, KeyValueStore, MemoryStore};

/// A terminal markdown editor with live preview and export
#[derive(Parser, Debug)]
#[command(name = "markdraft", version, about, long_about = None)]
struct Cli {
    /// Markdown or text file to open instead of the saved draft
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Color scheme of the preview and highlighting
    #[arg(long, value_enum)]
    theme: Option<ThemeMode>,

    /// Quiet period before the preview refreshes and the draft is saved
    #[arg(long, value_name = "MS")]
    debounce_ms: Option<u64>,

    /// Start empty instead of restoring the saved draft
    #[arg(long)]
    no_restore: bool,

    /// Directory exports are written into
    #[arg(long, value_name = "DIR")]
    export_dir: Option<PathBuf>,

    /// Where the draft is autosaved
    #[arg(long, value_enum)]
    storage: Option<StorageKind>,

    /// Write log events to a file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

// Query the terminal background using OSC 11.
// We talk to /dev/tty so the terminal responds even when stdout is piped.
// Elsewhere the query is skipped: a reader left blocked on the console
// would swallow crossterm's keyboard events.
#[cfg(not(unix))]
fn query_terminal_background() -> std::io::Result<Option<(u8, u8, u8)>> {
    Ok(None)
}

#[cfg(unix)]
fn query_terminal_background() -> std::io::Result<Option<(u8, u8, u8)>> {
    use std::io::{Read, Write};
    use std::sync::mpsc;

    let (tx, rx) = mpsc::channel();

    let mut io = std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open("/dev/tty")?;
    let reader = io.try_clone()?;

    // OSC 11 query: ESC ] 11 ; ? BEL
    io.write_all(b"\x1b]11;?\x07")?;
    io.flush()?;

    std::thread::spawn(move || {
        let mut reader = reader;
        let mut buf = [0u8; 256];
        let mut collected: Vec<u8> = Vec::new();
        loop {
            match reader.read(&mut buf) {
                Ok(0) => continue,
                Ok(n) => {
                    collected.extend_from_slice(&buf[..n]);
                    if collected.contains(&b'\x07') || collected.windows(2).any(|w| w == b"\x1b\\")
                    {
                        let _ = tx.send(collected);
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });

    let collected = rx
        .recv_timeout(Duration::from_millis(75))
        .unwrap_or_default();
    let text = String::from_utf8_lossy(&collected);
    Ok(parse_osc11_reply(&text))
}

fn theme_from_rgb(r: u8, g: u8, b: u8) -> HighlightBackground {
    let luma = 0.0722f32.mul_add(
        f32::from(b),
        0.2126f32.mul_add(f32::from(r), 0.7152 * f32::from(g)),
    );
    if luma >= 140.0 {
        HighlightBackground::Light
    } else {
        HighlightBackground::Dark
    }
}

/// Ask the terminal for its background, falling back to `COLORFGBG`.
fn detect_theme() -> HighlightBackground {
    let _raw = enable_raw_mode();
    let result = query_terminal_background();
    let _ = disable_raw_mode();
    result
        .ok()
        .flatten()
        .map_or_else(HighlightBackground::detect, |(r, g, b)| {
            theme_from_rgb(r, g, b)
        })
}

fn parse_osc11_reply(reply: &str) -> Option<(u8, u8, u8)> {
    // Expect: ESC ] 11 ; rgb:RRRR/GGGG/BBBB BEL or ST
    let start = reply.find("rgb:")?;
    let data = &reply[start + 4..];
    let mut parts = data.split(['/', '\x07', '\x1b']);
    let r = parts.next()?;
    let g = parts.next()?;
    let b = parts.next()?;
    Some((
        parse_osc_component(r)?,
        parse_osc_component(g)?,
        parse_osc_component(b)?,
    ))
}

fn parse_osc_component(s: &str) -> Option<u8> {
    let hex = s.trim();
    if hex.len() >= 4 {
        let v = u16::from_str_radix(&hex[..4], 16).ok()?;
        u8::try_from(v >> 8).ok()
    } else if hex.len() == 2 {
        u8::from_str_radix(hex, 16).ok()
    } else {
        None
    }
}

fn init_logging(log_file: Option<&PathBuf>) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::WARN.into());
    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        None => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    Ok(())
}

fn main() -> Result<()> {
    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    init_logging(effective.log_file.as_ref())?;

    let background = match effective.theme.unwrap_or(ThemeMode::Auto) {
        ThemeMode::Auto => detect_theme(),
        ThemeMode::Light => HighlightBackground::Light,
        ThemeMode::Dark => HighlightBackground::Dark,
    };

    let store: Box<dyn KeyValueStore> = match effective.storage.unwrap_or(StorageKind::File) {
        StorageKind::File => Box::new(FileStore::new(FileStore::default_path())),
        StorageKind::Memory => Box::new(MemoryStore::new()),
    };
    let quiet = effective
        .debounce_ms
        .map_or(DEFAULT_QUIET_PERIOD, Duration::from_millis);

    let mut app = App::new(store)
        .with_file(cli.file)
        .with_restore(!effective.no_restore)
        .with_quiet_period(quiet)
        .with_background(background)
        .with_export_dir(effective.export_dir.unwrap_or_else(|| PathBuf::from(".")))
        .with_config_paths(
            Some(global_path),
            local_path.exists().then_some(local_path),
        );

    app.run().context("Application error")
}
