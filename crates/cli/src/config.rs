//! `callscope.toml` config loading.

use std::path::{Path, PathBuf};

use callscope_core::views::DEFAULT_LIMIT;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG: &str = "callscope.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Directory holding `<id>.<source>.json` run files.
    #[serde(default = "default_runs_dir")]
    pub runs_dir: PathBuf,

    /// Source category used when none is given on the command line.
    #[serde(default = "default_source")]
    pub source: String,

    /// Default sort column key (`wt`, `excl_cpu`, `fn`, ...).
    #[serde(default)]
    pub sort: Option<String>,

    /// Default row limit: 0 = all, negative = last rows.
    #[serde(default = "default_limit")]
    pub limit: i64,

    #[serde(default)]
    pub format: OutputFormat,
}

fn default_runs_dir() -> PathBuf {
    PathBuf::from("runs")
}

fn default_source() -> String {
    "callscope".to_string()
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

impl Default for Config {
    fn default() -> Self {
        Self {
            runs_dir: default_runs_dir(),
            source: default_source(),
            sort: None,
            limit: default_limit(),
            format: OutputFormat::default(),
        }
    }
}

impl Config {
    pub fn load_optional(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(s) => match toml::from_str::<Config>(&s) {
                Ok(cfg) => cfg,
                Err(err) => {
                    tracing::warn!("failed to parse config {}: {err}", path.display());
                    Self::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(err) => {
                tracing::warn!("failed to read config {}: {err}", path.display());
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_optional(&dir.path().join(DEFAULT_CONFIG));
        assert_eq!(config, Config::default());
        assert_eq!(config.limit, 100);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG);
        std::fs::write(&path, "source = \"checkout\"\nlimit = 0\nformat = \"json\"\n").unwrap();

        let config = Config::load_optional(&path);
        assert_eq!(config.source, "checkout");
        assert_eq!(config.limit, 0);
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.runs_dir, PathBuf::from("runs"));
        assert_eq!(config.sort, None);
    }

    #[test]
    fn malformed_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG);
        std::fs::write(&path, "limit = \"lots\"").unwrap();
        assert_eq!(Config::load_optional(&path), Config::default());
    }
}
