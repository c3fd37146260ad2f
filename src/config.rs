use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeMode {
    Auto,
    Light,
    Dark,
}

/// Where autosaved content lives.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    File,
    Memory,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub no_restore: bool,
    pub theme: Option<ThemeMode>,
    pub debounce_ms: Option<u64>,
    pub export_dir: Option<PathBuf>,
    pub storage: Option<StorageKind>,
    pub log_file: Option<PathBuf>,
}

impl ConfigFlags {
    pub fn union(&self, other: &Self) -> Self {
        Self {
            no_restore: self.no_restore || other.no_restore,
            theme: other.theme.or(self.theme),
            debounce_ms: other.debounce_ms.or(self.debounce_ms),
            export_dir: other.export_dir.clone().or_else(|| self.export_dir.clone()),
            storage: other.storage.or(self.storage),
            log_file: other.log_file.clone().or_else(|| self.log_file.clone()),
        }
    }
}

/// Per-platform application directory, `<base>/markdraft`.
fn app_dir(xdg_var: &str, xdg_fallback: &[&str]) -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        let _ = (xdg_var, xdg_fallback);
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return Some(PathBuf::from(appdata).join("markdraft"));
        }
    }

    #[cfg(target_os = "macos")]
    {
        let _ = (xdg_var, xdg_fallback);
        if let Some(home) = std::env::var_os("HOME") {
            return Some(
                PathBuf::from(home)
                    .join("Library")
                    .join("Application Support")
                    .join("markdraft"),
            );
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os(xdg_var) {
            return Some(PathBuf::from(xdg).join("markdraft"));
        }
        if let Some(home) = std::env::var_os("HOME") {
            let mut dir = PathBuf::from(home);
            dir.extend(xdg_fallback);
            return Some(dir.join("markdraft"));
        }
    }

    None
}

pub fn global_config_path() -> PathBuf {
    app_dir("XDG_CONFIG_HOME", &[".config"])
        .map_or_else(local_override_path, |dir| dir.join("config"))
}

/// Directory for autosaved content.
pub fn data_dir() -> PathBuf {
    app_dir("XDG_DATA_HOME", &[".local", "share"])
        .unwrap_or_else(|| PathBuf::from(".markdraft"))
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".markdraftrc")
}

pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = Vec::new();
    lines.push("# markdraft defaults (saved with --save)".to_string());
    if flags.no_restore {
        lines.push("--no-restore".to_string());
    }
    if let Some(theme) = flags.theme {
        let theme_str = match theme {
            ThemeMode::Auto => "auto",
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        };
        lines.push(format!("--theme {theme_str}"));
    }
    if let Some(ms) = flags.debounce_ms {
        lines.push(format!("--debounce-ms {ms}"));
    }
    if let Some(dir) = &flags.export_dir {
        lines.push(format!("--export-dir {}", dir.display()));
    }
    if let Some(storage) = flags.storage {
        let storage_str = match storage {
            StorageKind::File => "file",
            StorageKind::Memory => "memory",
        };
        lines.push(format!("--storage {storage_str}"));
    }
    if let Some(path) = &flags.log_file {
        lines.push(format!("--log-file {}", path.display()));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Pick the known flags out of `tokens`; anything else is ignored.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        let (name, inline) = match token.split_once('=') {
            Some((name, value)) if name.starts_with("--") => (name, Some(value)),
            _ => (token, None),
        };
        let takes_value = matches!(
            name,
            "--theme" | "--debounce-ms" | "--export-dir" | "--storage" | "--log-file"
        );
        let value = if takes_value && inline.is_none() {
            let next = tokens.get(i + 1).map(String::as_str);
            if next.is_some() {
                i += 1;
            }
            next
        } else {
            inline
        };

        match (name, value) {
            ("--no-restore", _) => flags.no_restore = true,
            ("--theme", Some(v)) => flags.theme = parse_theme(v),
            ("--debounce-ms", Some(v)) => flags.debounce_ms = v.parse().ok(),
            ("--export-dir", Some(v)) => flags.export_dir = Some(PathBuf::from(v)),
            ("--storage", Some(v)) => flags.storage = parse_storage(v),
            ("--log-file", Some(v)) => flags.log_file = Some(PathBuf::from(v)),
            _ => {}
        }
        i += 1;
    }
    flags
}

fn parse_theme(s: &str) -> Option<ThemeMode> {
    match s {
        "auto" => Some(ThemeMode::Auto),
        "light" => Some(ThemeMode::Light),
        "dark" => Some(ThemeMode::Dark),
        _ => None,
    }
}

fn parse_storage(s: &str) -> Option<StorageKind> {
    match s {
        "file" => Some(StorageKind::File),
        "memory" => Some(StorageKind::Memory),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_flag_tokens_extracts_known_flags() {
        let args = vec![
            "markdraft".to_string(),
            "--no-restore".to_string(),
            "--theme".to_string(),
            "dark".to_string(),
            "--debounce-ms=250".to_string(),
            "--export-dir".to_string(),
            "out".to_string(),
            "--storage".to_string(),
            "memory".to_string(),
            "notes.md".to_string(),
        ];
        let flags = parse_flag_tokens(&args);
        assert!(flags.no_restore);
        assert_eq!(flags.theme, Some(ThemeMode::Dark));
        assert_eq!(flags.debounce_ms, Some(250));
        assert_eq!(flags.export_dir, Some(PathBuf::from("out")));
        assert_eq!(flags.storage, Some(StorageKind::Memory));
        assert_eq!(flags.log_file, None);
    }

    #[test]
    fn test_parse_flag_tokens_ignores_bad_values() {
        let args = vec![
            "--debounce-ms".to_string(),
            "soon".to_string(),
            "--theme=neon".to_string(),
        ];
        let flags = parse_flag_tokens(&args);
        assert_eq!(flags.debounce_ms, None);
        assert_eq!(flags.theme, None);
    }

    #[test]
    fn test_trailing_value_flag_without_value() {
        let flags = parse_flag_tokens(&["--log-file".to_string()]);
        assert_eq!(flags.log_file, None);
    }

    #[test]
    fn test_config_union_merges_cli_over_file_for_options() {
        let file = ConfigFlags {
            no_restore: true,
            theme: Some(ThemeMode::Light),
            debounce_ms: Some(800),
            ..ConfigFlags::default()
        };
        let cli = ConfigFlags {
            theme: Some(ThemeMode::Dark),
            storage: Some(StorageKind::Memory),
            ..ConfigFlags::default()
        };
        let merged = file.union(&cli);
        assert!(merged.no_restore);
        assert_eq!(merged.theme, Some(ThemeMode::Dark));
        assert_eq!(merged.debounce_ms, Some(800));
        assert_eq!(merged.storage, Some(StorageKind::Memory));
    }

    #[test]
    fn test_save_load_and_clear_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".markdraftrc");
        let flags = ConfigFlags {
            no_restore: true,
            theme: Some(ThemeMode::Dark),
            debounce_ms: Some(300),
            export_dir: Some(PathBuf::from("exports")),
            storage: Some(StorageKind::File),
            log_file: Some(PathBuf::from("markdraft.log")),
        };

        save_config_flags(&path, &flags).unwrap();
        let loaded = load_config_flags(&path).unwrap();
        assert_eq!(loaded, flags);

        clear_config_flags(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_data_dir_is_app_scoped() {
        assert!(data_dir().ends_with("markdraft") || data_dir().ends_with(".markdraft"));
    }
}
