use std::collections::{BTreeMap, HashMap};

use callscope_protocol::{CALLS_KEY, MetricSet, RunInfo};
use serde::{Deserialize, Serialize};

use super::edge::{Counters, EdgeKey, EdgeKeyError};
use crate::catalog;

/// One edge's counters as stored: metric key → value.
pub type RawRecord = BTreeMap<String, f64>;

/// Stored form of a run: textual edge key → record.
pub type RawRun = BTreeMap<String, RawRecord>;

/// Edge-keyed call data of one run.
///
/// The metric set is resolved once when the run is built and applies to
/// every edge. Edges are held in a map; nothing depends on its iteration
/// order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawRun", into = "RawRun")]
pub struct RunData {
    metrics: MetricSet,
    edges: HashMap<EdgeKey, Counters>,
}

impl RunData {
    pub fn new(metrics: MetricSet) -> Self {
        Self {
            metrics,
            edges: HashMap::new(),
        }
    }

    pub fn metrics(&self) -> MetricSet {
        self.metrics
    }

    /// Accumulate `counters` into the edge, creating it if needed.
    pub fn add(&mut self, key: EdgeKey, counters: Counters) {
        *self.edges.entry(key).or_default() += counters;
    }

    #[must_use]
    pub fn with_edge(mut self, key: EdgeKey, counters: Counters) -> Self {
        self.add(key, counters);
        self
    }

    pub fn get(&self, key: &EdgeKey) -> Option<&Counters> {
        self.edges.get(key)
    }

    pub fn edges(&self) -> impl Iterator<Item = (&EdgeKey, &Counters)> {
        self.edges.iter()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Keep only the edges matching `keep`.
    #[must_use]
    pub fn filtered(&self, mut keep: impl FnMut(&EdgeKey) -> bool) -> Self {
        Self {
            metrics: self.metrics,
            edges: self
                .edges
                .iter()
                .filter(|(key, _)| keep(key))
                .map(|(key, counters)| (key.clone(), *counters))
                .collect(),
        }
    }

    /// Build from the stored representation, resolving the metric set from
    /// a representative record. Present metrics missing from an individual
    /// record read as zero.
    pub fn from_raw(raw: &RawRun) -> Result<Self, EdgeKeyError> {
        let metrics = catalog::representative_record(raw)
            .map(catalog::resolve_present_metrics)
            .unwrap_or_default();
        tracing::debug!(
            edges = raw.len(),
            calls = metrics.has_calls(),
            metrics = ?metrics.iter().map(|m| m.key()).collect::<Vec<_>>(),
            "resolved run metrics"
        );

        let mut data = Self::new(metrics);
        let mut ragged = 0usize;
        for (key, record) in raw {
            let edge: EdgeKey = key.parse()?;
            let mut counters = Counters::default();
            if metrics.has_calls() {
                counters.calls = record.get(CALLS_KEY).copied().unwrap_or_default();
            }
            for metric in metrics.iter() {
                let value = record.get(metric.key()).copied();
                if value.is_none() {
                    ragged += 1;
                }
                counters.values[metric] = value.unwrap_or_default();
            }
            data.add(edge, counters);
        }
        if ragged > 0 {
            tracing::warn!(ragged, "records missing present metrics; read as zero");
        }
        Ok(data)
    }

    /// Stored representation: only present metrics are written.
    pub fn to_raw(&self) -> RawRun {
        self.edges
            .iter()
            .map(|(key, counters)| {
                let mut record = RawRecord::new();
                if self.metrics.has_calls() {
                    record.insert(CALLS_KEY.to_string(), counters.calls);
                }
                for metric in self.metrics.iter() {
                    record.insert(metric.key().to_string(), counters.values[metric]);
                }
                (key.to_string(), record)
            })
            .collect()
    }
}

impl TryFrom<RawRun> for RunData {
    type Error = EdgeKeyError;

    fn try_from(raw: RawRun) -> Result<Self, Self::Error> {
        Self::from_raw(&raw)
    }
}

impl From<RunData> for RawRun {
    fn from(data: RunData) -> Self {
        data.to_raw()
    }
}

/// A run as retrieved from a run source.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub id: String,
    pub description: String,
    pub data: RunData,
}

impl Run {
    pub fn new(id: impl Into<String>, description: impl Into<String>, data: RunData) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            data,
        }
    }

    pub fn info(&self) -> RunInfo {
        RunInfo {
            id: self.id.clone(),
            description: self.description.clone(),
        }
    }
}
