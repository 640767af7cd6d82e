use std::str::FromStr;

use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::format::ValueFormat;
use crate::metric::{CALLS_KEY, Metric, MetricSet};

/// Textual key of the function-name column.
pub const NAME_KEY: &str = "fn";
const EXCLUSIVE_PREFIX: &str = "excl_";

/// A sortable report column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Name,
    Calls,
    Inclusive(Metric),
    Exclusive(Metric),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown sort column `{0}`")]
pub struct ColumnParseError(pub String);

impl Column {
    /// Key used in query strings and config files (`fn`, `ct`, `wt`, `excl_wt`).
    pub fn key(self) -> String {
        match self {
            Column::Name => NAME_KEY.to_string(),
            Column::Calls => CALLS_KEY.to_string(),
            Column::Inclusive(m) => m.key().to_string(),
            Column::Exclusive(m) => format!("{EXCLUSIVE_PREFIX}{}", m.key()),
        }
    }

    pub fn metric(self) -> Option<Metric> {
        match self {
            Column::Inclusive(m) | Column::Exclusive(m) => Some(m),
            Column::Name | Column::Calls => None,
        }
    }

    /// The inclusive counterpart of an exclusive column; other columns unchanged.
    #[must_use]
    pub fn to_inclusive(self) -> Column {
        match self {
            Column::Exclusive(m) => Column::Inclusive(m),
            other => other,
        }
    }

    pub fn value_format(self) -> Option<ValueFormat> {
        match self {
            Column::Name => None,
            Column::Calls => Some(ValueFormat::Count),
            Column::Inclusive(_) | Column::Exclusive(_) => Some(ValueFormat::Number),
        }
    }

    /// Header text for the value column.
    pub fn description(self, diff: bool) -> String {
        let suffix = if diff { " Diff" } else { "" };
        match self {
            Column::Name => "Function Name".to_string(),
            Column::Calls => format!("Calls{suffix}"),
            Column::Inclusive(m) => metric_description("Incl.", m, diff),
            Column::Exclusive(m) => metric_description("Excl.", m, diff),
        }
    }

    /// Header text for the percentage column that follows a value column.
    pub fn percent_description(self, diff: bool) -> Option<String> {
        let suffix = if diff { " Diff%" } else { "%" };
        match self {
            Column::Name => None,
            Column::Calls => Some(format!("Calls{suffix}")),
            Column::Inclusive(m) => Some(format!("I{}{suffix}", m.label())),
            Column::Exclusive(m) => Some(format!("E{}{suffix}", m.label())),
        }
    }
}

fn metric_description(prefix: &str, metric: Metric, diff: bool) -> String {
    let name = match (metric, diff) {
        (Metric::WallTime, false) => "Wall Time",
        (Metric::WallTime, true) => "Wall",
        (Metric::UserTime, _) => "User",
        (Metric::SystemTime, _) => "Sys",
        (Metric::CpuTime, _) => "CPU",
        (Metric::Memory, _) => "MemUse",
        (Metric::PeakMemory, _) => "PeakMemUse",
        (Metric::Samples, _) => "Samples",
    };
    let diff_word = if diff { " Diff" } else { "" };
    match metric {
        Metric::Samples => format!("{prefix} {name}{diff_word}"),
        Metric::Memory | Metric::PeakMemory => format!("{prefix} {name}{diff_word} (bytes)"),
        _ => format!("{prefix} {name}{diff_word} (microsec)"),
    }
}

/// Columns of a flat report, in display order. Call counts are left out
/// when the run has none.
pub fn flat_columns(metrics: &MetricSet) -> Vec<Column> {
    let mut columns = vec![Column::Name];
    if metrics.has_calls() {
        columns.push(Column::Calls);
    }
    for m in metrics.iter() {
        columns.push(Column::Inclusive(m));
        columns.push(Column::Exclusive(m));
    }
    columns
}

/// Columns of a parent/child table. Edges only carry inclusive cost.
pub fn parent_child_columns(metrics: &MetricSet) -> Vec<Column> {
    let mut columns = vec![Column::Name];
    if metrics.has_calls() {
        columns.push(Column::Calls);
    }
    columns.extend(metrics.iter().map(Column::Inclusive));
    columns
}

impl FromStr for Column {
    type Err = ColumnParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == NAME_KEY {
            return Ok(Column::Name);
        }
        if s == CALLS_KEY {
            return Ok(Column::Calls);
        }
        if let Some(rest) = s.strip_prefix(EXCLUSIVE_PREFIX) {
            return Metric::from_key(rest)
                .map(Column::Exclusive)
                .ok_or_else(|| ColumnParseError(s.to_string()));
        }
        Metric::from_key(s)
            .map(Column::Inclusive)
            .ok_or_else(|| ColumnParseError(s.to_string()))
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.key())
    }
}

impl Serialize for Column {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.key())
    }
}
