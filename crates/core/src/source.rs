use std::collections::HashMap;

use callscope_protocol::RunListing;

use crate::error::{Error, Result};
use crate::model::Run;

/// Where runs come from. Implementations own all I/O; report assembly only
/// ever sees runs that were fully retrieved.
pub trait RunSource {
    /// Fetch one run. Unknown ids fail with [`Error::RunNotFound`].
    fn get_run(&self, id: &str, category: &str) -> Result<Run>;

    /// Runs available for `category`. Sources that cannot enumerate return
    /// an empty list.
    fn list_runs(&self, _category: &str) -> Result<Vec<RunListing>> {
        Ok(Vec::new())
    }
}

/// Runs held in memory, keyed by `(category, id)`.
#[derive(Debug, Clone, Default)]
pub struct MemoryRunSource {
    runs: HashMap<(String, String), Run>,
}

impl MemoryRunSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, category: impl Into<String>, run: Run) {
        self.runs.insert((category.into(), run.id.clone()), run);
    }
}

impl RunSource for MemoryRunSource {
    fn get_run(&self, id: &str, category: &str) -> Result<Run> {
        self.runs
            .get(&(category.to_string(), id.to_string()))
            .cloned()
            .ok_or_else(|| Error::RunNotFound {
                id: id.to_string(),
                category: category.to_string(),
            })
    }

    fn list_runs(&self, category: &str) -> Result<Vec<RunListing>> {
        let mut listings: Vec<RunListing> = self
            .runs
            .iter()
            .filter(|((cat, _), _)| cat == category)
            .map(|((cat, id), _)| RunListing {
                id: id.clone(),
                source: cat.clone(),
                size_bytes: 0,
                modified: None,
            })
            .collect();
        listings.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(listings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RunData;

    #[test]
    fn lookup_is_per_category() {
        let mut source = MemoryRunSource::new();
        source.insert("web", Run::new("r1", "home page", RunData::default()));

        assert!(source.get_run("r1", "web").is_ok());
        assert!(matches!(
            source.get_run("r1", "cli"),
            Err(Error::RunNotFound { .. })
        ));
        assert_eq!(source.list_runs("web").map(|l| l.len()).ok(), Some(1));
        assert_eq!(source.list_runs("cli").map(|l| l.len()).ok(), Some(0));
    }
}
