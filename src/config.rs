use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::{LevelFilter, debug};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unknown log level '{0}'")]
    InvalidLogLevel(String),

    #[error("failed to open log file {path}: {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown theme color '{0}'")]
    UnknownColorKey(String),

    #[error("invalid color '{value}' for theme key '{key}'")]
    InvalidColor { key: String, value: String },
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Segments file opened when none is given on the command line.
    pub data: Option<PathBuf>,
    pub log: LogConfig,
    pub theme: ThemeConfig,
    pub editor: EditorConfig,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// Logging is disabled without a file; the terminal belongs to the UI.
    pub file: Option<PathBuf>,
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: None,
            level: "info".to_string(),
        }
    }
}

/// Theme color overrides keyed by theme field name.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct ThemeConfig {
    pub colors: BTreeMap<String, String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    pub show_sidebar: bool,
    /// Columns kept free on both sides of a segment body.
    pub wrap_padding: u16,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            show_sidebar: true,
            wrap_padding: 2,
        }
    }
}

impl Config {
    /// Reads `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }
}

impl LogConfig {
    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        LevelFilter::from_str(&self.level)
            .map_err(|_| ConfigError::InvalidLogLevel(self.level.clone()))
    }

    /// Builds the file logger, or `None` when no file is configured.
    pub fn dispatch(&self) -> Result<Option<fern::Dispatch>, ConfigError> {
        let Some(path) = &self.file else {
            return Ok(None);
        };
        let level = self.level_filter()?;
        let file = fern::log_file(path).map_err(|source| ConfigError::LogFile {
            path: path.clone(),
            source,
        })?;
        let dispatch = fern::Dispatch::new()
            .format(|out, message, record| {
                out.finish(format_args!(
                    "[{}] {}: {}",
                    record.level(),
                    record.target(),
                    message
                ))
            })
            .level(level)
            .chain(file);
        Ok(Some(dispatch))
    }
}
