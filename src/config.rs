//! Front-end configuration.
//!
//! Configuration is loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML config file (if specified via PUSHDOWN_CONFIG or --config)
//! 3. Environment variables
//! 4. Command-line flags (applied by `main`)

use pushdown_render::CharsetKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Front-end configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Trace rendering.
    pub render: RenderConfig,
    /// Machine selection.
    pub machine: MachineConfig,
    /// Interactive mode.
    pub repl: ReplConfig,
}

impl Config {
    /// Loads configuration from `path` (or PUSHDOWN_CONFIG), then applies
    /// environment variable overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let env_path = std::env::var_os("PUSHDOWN_CONFIG").map(PathBuf::from);
        let mut config = match path.map(Path::to_path_buf).or(env_path) {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply_env_overrides(&mut self) {
        self.render.apply_env_overrides();
        self.machine.apply_env_overrides();
        self.repl.apply_env_overrides();
    }
}

/// How traces are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TraceFormat {
    /// Framed table.
    #[default]
    Table,
    /// One JSON object per line.
    Json,
    /// Verdict only.
    #[serde(rename = "none")]
    #[value(name = "none")]
    Quiet,
}

/// Trace rendering configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Box-drawing character set for tables.
    pub charset: CharsetKind,
    /// Trace output format.
    pub format: TraceFormat,
}

impl RenderConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(charset) = std::env::var("PUSHDOWN_CHARSET") {
            match charset.to_lowercase().as_str() {
                "utf8" | "utf-8" => self.charset = CharsetKind::Utf8,
                "ascii" => self.charset = CharsetKind::Ascii,
                other => tracing::warn!("ignoring unknown PUSHDOWN_CHARSET '{}'", other),
            }
        }

        if let Ok(format) = std::env::var("PUSHDOWN_FORMAT") {
            match format.to_lowercase().as_str() {
                "table" => self.format = TraceFormat::Table,
                "json" => self.format = TraceFormat::Json,
                "none" => self.format = TraceFormat::Quiet,
                other => tracing::warn!("ignoring unknown PUSHDOWN_FORMAT '{}'", other),
            }
        }
    }
}

/// Machine selection configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Definition file (JSON or YAML). The built-in aⁿbⁿ$ machine is used
    /// when unset.
    pub path: Option<PathBuf>,
}

impl MachineConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("PUSHDOWN_MACHINE") {
            if !path.is_empty() {
                self.path = Some(PathBuf::from(path));
            }
        }
    }
}

/// Interactive mode configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplConfig {
    /// History file; defaults to ~/.pushdown_history.
    pub history_file: Option<PathBuf>,
}

impl ReplConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("PUSHDOWN_HISTORY") {
            if !path.is_empty() {
                self.history_file = Some(PathBuf::from(path));
            }
        }
    }

    /// Returns the configured history file or the default in the home
    /// directory.
    pub fn history_path(&self) -> PathBuf {
        self.history_file.clone().unwrap_or_else(|| {
            home::home_dir()
                .map(|h| h.join(".pushdown_history"))
                .unwrap_or_else(|| PathBuf::from(".pushdown_history"))
        })
    }
}

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.render.charset, CharsetKind::Utf8);
        assert_eq!(config.render.format, TraceFormat::Table);
        assert!(config.machine.path.is_none());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "render:\n  charset: ascii\n  format: json\nmachine:\n  path: m.yaml").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.render.charset, CharsetKind::Ascii);
        assert_eq!(config.render.format, TraceFormat::Json);
        assert_eq!(config.machine.path, Some(PathBuf::from("m.yaml")));
        assert!(config.repl.history_file.is_none());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "render:\n  format: none").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.render.charset, CharsetKind::Utf8);
        assert_eq!(config.render.format, TraceFormat::Quiet);
    }

    #[test]
    fn test_missing_file() {
        let result = Config::from_file("/nonexistent/pushdown.yaml");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_invalid_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "render:\n  charset: [").unwrap();

        let result = Config::from_file(file.path());
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_yaml_roundtrip() {
        let mut config = Config::default();
        config.render.charset = CharsetKind::Ascii;
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, config);
    }
}
