use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config.default.toml");

/// User overlay location, relative to `$HOME`.
const USER_CONFIG: &str = ".config/shline/config.toml";

// ── Final (merged) config types ──

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub repl: ReplConfig,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    /// Optional log file; `~` is expanded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            file: None,
        }
    }
}

fn default_level() -> String {
    "warn".into()
}

impl LoggingConfig {
    /// The configured level; unknown names fall back to `warn`.
    pub fn level_filter(&self) -> LevelFilter {
        self.level.parse().unwrap_or(LevelFilter::Warn)
    }

    /// The log file with `~` expanded.
    pub fn file_path(&self) -> Option<PathBuf> {
        let file = self.file.as_deref().filter(|f| !f.is_empty())?;
        Some(PathBuf::from(shellexpand::tilde(file).into_owned()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Indented human-readable dump.
    #[default]
    Tree,
    /// One JSON object per input line.
    Json,
    /// Commands re-rendered as shell text.
    Shell,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default)]
    pub show_offsets: bool,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ReplConfig {
    #[serde(default = "default_prompt")]
    pub prompt: String,
    #[serde(default = "default_continuation_prompt")]
    pub continuation_prompt: String,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            prompt: default_prompt(),
            continuation_prompt: default_continuation_prompt(),
        }
    }
}

fn default_prompt() -> String {
    "$ ".into()
}

fn default_continuation_prompt() -> String {
    "> ".into()
}

// ── Overlay types (user config that merges with defaults) ──

#[derive(Debug, Deserialize, Default)]
struct ConfigOverlay {
    #[serde(default)]
    logging: LoggingOverlay,
    #[serde(default)]
    output: OutputOverlay,
    #[serde(default)]
    repl: ReplOverlay,
}

#[derive(Debug, Deserialize, Default)]
struct LoggingOverlay {
    level: Option<String>,
    file: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct OutputOverlay {
    format: Option<OutputFormat>,
    show_offsets: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
struct ReplOverlay {
    prompt: Option<String>,
    continuation_prompt: Option<String>,
}

impl Config {
    /// Load the default embedded configuration.
    pub fn default_config() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("embedded default config must parse")
    }

    /// Load configuration with resolution order:
    /// 1. Start with embedded defaults
    /// 2. Merge the overlay at `path`, or ~/.config/shline/config.toml when
    ///    no path is given (if it exists)
    ///
    /// Keys present in the overlay override the defaults; everything else is kept.
    pub fn load(path: Option<&Path>) -> Self {
        let mut config = Self::default_config();
        let overlay = match path {
            Some(path) => Self::load_overlay(path),
            None => Self::user_config_path().and_then(|p| Self::load_overlay(&p)),
        };
        if let Some(overlay) = overlay {
            config.apply_overlay(overlay);
        }
        config
    }

    fn user_config_path() -> Option<PathBuf> {
        let home = std::env::var_os("HOME")?;
        Some(Path::new(&home).join(USER_CONFIG))
    }

    /// Read and parse an overlay file. Missing files are silently skipped;
    /// malformed ones are reported on stderr and ignored.
    fn load_overlay(path: &Path) -> Option<ConfigOverlay> {
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&content) {
            Ok(overlay) => Some(overlay),
            Err(e) => {
                eprintln!("shline: config parse error in {}: {e}", path.display());
                None
            }
        }
    }

    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        let l = overlay.logging;
        if let Some(v) = l.level {
            self.logging.level = v;
        }
        if let Some(v) = l.file {
            self.logging.file = Some(v);
        }

        let o = overlay.output;
        if let Some(v) = o.format {
            self.output.format = v;
        }
        if let Some(v) = o.show_offsets {
            self.output.show_offsets = v;
        }

        let r = overlay.repl;
        if let Some(v) = r.prompt {
            self.repl.prompt = v;
        }
        if let Some(v) = r.continuation_prompt {
            self.repl.continuation_prompt = v;
        }
    }

    /// The merged configuration as TOML (for `--dump-config`).
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Apply an overlay from a TOML string. Used for testing.
    #[cfg(test)]
    fn apply_overlay_str(&mut self, toml_str: &str) {
        let overlay: ConfigOverlay = toml::from_str(toml_str).unwrap();
        self.apply_overlay(overlay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_parses() {
        let config = Config::default_config();
        assert_eq!(config.logging.level_filter(), LevelFilter::Warn);
        assert!(config.logging.file.is_none());
        assert_eq!(config.output.format, OutputFormat::Tree);
        assert!(!config.output.show_offsets);
        assert_eq!(config.repl.prompt, "$ ");
        assert_eq!(config.repl.continuation_prompt, "> ");
    }

    #[test]
    fn overlay_overrides_scalars() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [logging]
            level = "debug"

            [output]
            format = "json"
            show_offsets = true
        "#,
        );
        assert_eq!(config.logging.level_filter(), LevelFilter::Debug);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(config.output.show_offsets);
    }

    #[test]
    fn overlay_omitted_sections_unchanged() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [repl]
            prompt = "sh> "
        "#,
        );
        assert_eq!(config.repl.prompt, "sh> ");
        assert_eq!(config.repl.continuation_prompt, "> ");
        assert_eq!(config.output.format, OutputFormat::Tree);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn empty_overlay_changes_nothing() {
        let mut config = Config::default_config();
        config.apply_overlay_str("");
        assert_eq!(config.output.format, OutputFormat::Tree);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn unknown_level_falls_back_to_warn() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [logging]
            level = "chatty"
        "#,
        );
        assert_eq!(config.logging.level_filter(), LevelFilter::Warn);
    }

    #[test]
    fn log_file_tilde_is_expanded() {
        let logging = LoggingConfig {
            level: "info".into(),
            file: Some("/var/log/shline.log".into()),
        };
        assert_eq!(logging.file_path(), Some(PathBuf::from("/var/log/shline.log")));

        let logging = LoggingConfig {
            level: "info".into(),
            file: Some("~/shline.log".into()),
        };
        assert!(logging.file_path().unwrap().ends_with("shline.log"));
    }

    #[test]
    fn empty_log_file_means_none() {
        let logging = LoggingConfig {
            level: "info".into(),
            file: Some(String::new()),
        };
        assert_eq!(logging.file_path(), None);
    }

    #[test]
    fn missing_overlay_file_uses_defaults() {
        let config = Config::load(Some(Path::new("/nonexistent/shline/config.toml")));
        assert_eq!(config.output.format, OutputFormat::Tree);
    }

    #[test]
    fn dump_round_trips() {
        let config = Config::default_config();
        let text = config.to_toml().unwrap();
        let reparsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(reparsed.repl.prompt, config.repl.prompt);
        assert_eq!(reparsed.output.format, config.output.format);
    }
}
