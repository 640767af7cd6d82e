//! Runs stored as `<id>.<source>.json` files in one directory.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::UNIX_EPOCH;

use callscope_core::model::{Run, RunData};
use callscope_core::{Error, Result, RunSource};
use callscope_protocol::RunListing;

const EXTENSION: &str = "json";

#[derive(Debug, Clone)]
pub struct DirStore {
    dir: PathBuf,
}

impl DirStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn file_name(id: &str, category: &str) -> Result<String> {
        for (what, part) in [("run id", id), ("source", category)] {
            if part.is_empty() || part.contains(['/', '\\']) || part.starts_with('.') {
                return Err(Error::InvalidArgument(format!("invalid {what} `{part}`")));
            }
        }
        Ok(format!("{id}.{category}.{EXTENSION}"))
    }

    pub fn path_of(&self, id: &str, category: &str) -> Result<PathBuf> {
        Ok(self.dir.join(Self::file_name(id, category)?))
    }

    /// Write a run's edge map, replacing any run stored under the same id.
    pub fn save_run(&self, id: &str, category: &str, data: &RunData) -> Result<PathBuf> {
        let path = self.path_of(id, category)?;
        let json = serde_json::to_string(data)
            .map_err(|err| Error::unavailable("failed to encode run", err))?;
        std::fs::create_dir_all(&self.dir).map_err(|err| {
            Error::unavailable(format!("failed to create {}", self.dir.display()), err)
        })?;
        std::fs::write(&path, json)
            .map_err(|err| Error::unavailable(format!("failed to write {}", path.display()), err))?;
        tracing::debug!(id, category, path = %path.display(), "saved run");
        Ok(path)
    }
}

impl RunSource for DirStore {
    fn get_run(&self, id: &str, category: &str) -> Result<Run> {
        let path = self.path_of(id, category)?;
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(Error::RunNotFound {
                    id: id.to_string(),
                    category: category.to_string(),
                });
            }
            Err(err) => {
                return Err(Error::unavailable(
                    format!("failed to read {}", path.display()),
                    err,
                ));
            }
        };

        let data: RunData = serde_json::from_str(&text).map_err(|err| {
            if err.is_data() {
                Error::InvalidArgument(format!("{}: {err}", path.display()))
            } else {
                Error::unavailable(format!("failed to parse {}", path.display()), err)
            }
        })?;
        tracing::debug!(id, category, edges = data.len(), "loaded run");
        Ok(Run::new(id, format!("Run {id} (source={category})"), data))
    }

    /// Newest first.
    fn list_runs(&self, category: &str) -> Result<Vec<RunListing>> {
        let suffix = format!(".{category}.{EXTENSION}");
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::warn!(dir = %self.dir.display(), "runs directory does not exist");
                return Ok(Vec::new());
            }
            Err(err) => {
                return Err(Error::unavailable(
                    format!("failed to list {}", self.dir.display()),
                    err,
                ));
            }
        };

        let mut runs = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| {
                Error::unavailable(format!("failed to list {}", self.dir.display()), err)
            })?;
            let name = entry.file_name();
            let Some(id) = name.to_str().and_then(|n| n.strip_suffix(&suffix)) else {
                continue;
            };
            if id.is_empty() {
                continue;
            }
            let Ok(meta) = entry.metadata() else {
                continue;
            };
            let modified = meta
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_secs());
            runs.push(RunListing {
                id: id.to_string(),
                source: category.to_string(),
                size_bytes: meta.len(),
                modified,
            });
        }

        runs.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.id.cmp(&b.id)));
        tracing::debug!(category, runs = runs.len(), "listed runs");
        Ok(runs)
    }
}
