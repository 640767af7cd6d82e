//! Report payloads handed to renderers.
//!
//! Everything here is plain data: sorted rows, totals, percentages and
//! pagination state. Renderers decide how to turn them into text or markup.

use std::ops::Index;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::column::Column;
use crate::metric::{Metric, MetricSet, MetricValues};
use crate::symbol::Symbol;

/// A ratio, or `None` when the denominator was zero ("not applicable").
pub type Percent = Option<f64>;

/// `numerator / |denominator|`, keeping the numerator's sign so that
/// regressions stay positive and improvements negative.
pub fn percent(numerator: f64, denominator: f64) -> Percent {
    if denominator == 0.0 {
        None
    } else {
        Some(numerator / denominator.abs())
    }
}

/// Per-call average, `None` when there were no calls.
pub fn per_call(value: f64, calls: f64) -> Option<f64> {
    (calls > 0.0).then(|| value / calls)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Single,
    Diff,
}

/// Aggregated statistics of one function.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct FunctionStats {
    pub calls: f64,
    pub inclusive: MetricValues,
    pub exclusive: MetricValues,
}

impl FunctionStats {
    /// Value of a numeric column. `None` for the name column.
    pub fn value(&self, column: Column) -> Option<f64> {
        match column {
            Column::Name => None,
            Column::Calls => Some(self.calls),
            Column::Inclusive(m) => Some(self.inclusive[m]),
            Column::Exclusive(m) => Some(self.exclusive[m]),
        }
    }
}

/// One function in a flat view. In diff mode every value is a delta.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatRow {
    pub name: Symbol,
    #[serde(flatten)]
    pub stats: FunctionStats,
}

/// A flat row whose values are `run2 - run1`.
pub type DiffRow = FlatRow;

/// Run-wide sums over root invocations.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Totals {
    pub calls: f64,
    pub values: MetricValues,
}

impl Totals {
    /// Denominator for a column's percentage. Inclusive and exclusive
    /// columns of a metric share the same total.
    pub fn value(&self, column: Column) -> Option<f64> {
        match column {
            Column::Name => None,
            Column::Calls => Some(self.calls),
            Column::Inclusive(m) | Column::Exclusive(m) => Some(self.values[m]),
        }
    }

    #[must_use]
    pub fn delta(&self, base: &Totals) -> Totals {
        Totals {
            calls: self.calls - base.calls,
            values: self.values - base.values,
        }
    }
}

/// One percentage per metric the numerator carries.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MetricPercents {
    percents: [Percent; Metric::COUNT],
    carried: MetricSet,
}

impl MetricPercents {
    pub fn of(values: &MetricValues, base: &MetricValues) -> Self {
        let mut percents = [None; Metric::COUNT];
        let mut carried = MetricSet::empty();
        for (metric, value) in values.iter() {
            percents[metric.index()] = percent(value, base[metric]);
            carried = carried.with(metric);
        }
        Self { percents, carried }
    }
}

impl Index<Metric> for MetricPercents {
    type Output = Percent;

    fn index(&self, metric: Metric) -> &Percent {
        &self.percents[metric.index()]
    }
}

impl Serialize for MetricPercents {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.carried.len()))?;
        for metric in self.carried.iter() {
            map.serialize_entry(metric.key(), &self.percents[metric.index()])?;
        }
        map.end()
    }
}

/// A flat row annotated with its share of the run totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedRow {
    #[serde(flatten)]
    pub row: FlatRow,
    pub calls_percent: Percent,
    pub inclusive_percent: MetricPercents,
    pub exclusive_percent: MetricPercents,
}

impl RankedRow {
    pub fn against(row: FlatRow, totals: &Totals) -> Self {
        Self {
            calls_percent: percent(row.stats.calls, totals.calls),
            inclusive_percent: MetricPercents::of(&row.stats.inclusive, &totals.values),
            exclusive_percent: MetricPercents::of(&row.stats.exclusive, &totals.values),
            row,
        }
    }

    pub fn percent(&self, column: Column) -> Percent {
        match column {
            Column::Name => None,
            Column::Calls => self.calls_percent,
            Column::Inclusive(m) => self.inclusive_percent[m],
            Column::Exclusive(m) => self.exclusive_percent[m],
        }
    }
}

/// A caller or callee of the drill-down symbol, keyed by the other end of
/// the edge. Values are the edge's inclusive cost.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelativeRow {
    pub name: Symbol,
    pub calls: f64,
    pub values: MetricValues,
    pub calls_percent: Percent,
    pub percent: MetricPercents,
}

impl RelativeRow {
    pub fn value(&self, column: Column) -> Option<f64> {
        match column {
            Column::Name => None,
            Column::Calls => Some(self.calls),
            Column::Inclusive(m) | Column::Exclusive(m) => Some(self.values[m]),
        }
    }
}

/// Which slice of the sorted sequence a report shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Page {
    /// Rows before truncation.
    pub total: usize,
    /// Requested limit: 0 = all, positive = head, negative = tail.
    pub limit: i64,
    /// Rows actually returned.
    pub shown: usize,
}

impl Page {
    pub fn is_truncated(&self) -> bool {
        self.shown < self.total
    }
}

/// The same quantity in two runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Comparison {
    pub run1: Option<f64>,
    pub run2: Option<f64>,
    pub delta: Option<f64>,
    /// `delta / |run1|`.
    pub delta_percent: Percent,
}

impl Comparison {
    pub fn new(run1: f64, run2: f64) -> Self {
        Self::maybe(Some(run1), Some(run2))
    }

    /// Either side may be not applicable (per-call averages without calls);
    /// the delta is then not applicable too.
    pub fn maybe(run1: Option<f64>, run2: Option<f64>) -> Self {
        let delta = match (run1, run2) {
            (Some(a), Some(b)) => Some(b - a),
            _ => None,
        };
        let delta_percent = match (delta, run1) {
            (Some(d), Some(base)) => percent(d, base),
            _ => None,
        };
        Self {
            run1,
            run2,
            delta,
            delta_percent,
        }
    }
}

/// Per-metric comparison lines of a diff summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricComparison {
    pub metric: Metric,
    pub inclusive: Comparison,
    /// Only filled for a single symbol.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_call: Option<Comparison>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive: Option<Comparison>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calls: Option<Comparison>,
    pub metrics: Vec<MetricComparison>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunInfo {
    pub id: String,
    pub description: String,
}

/// Sorted flat view of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatReport {
    pub run: RunInfo,
    pub metrics: MetricSet,
    pub sort: Column,
    pub totals: Totals,
    pub rows: Vec<RankedRow>,
    pub page: Page,
}

/// Sorted per-function deltas between two runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffReport {
    pub run1: RunInfo,
    pub run2: RunInfo,
    pub metrics: MetricSet,
    pub sort: Column,
    pub totals1: Totals,
    pub totals2: Totals,
    /// `totals2 - totals1`; denominator of the row percentages.
    pub delta_totals: Totals,
    pub summary: DiffSummary,
    pub rows: Vec<RankedRow>,
    pub page: Page,
}

/// Parent/child view of one function.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolReport {
    pub mode: Mode,
    pub runs: Vec<RunInfo>,
    pub metrics: MetricSet,
    pub sort: Column,
    pub symbol: Symbol,
    /// Denominator of `current`'s percentages (delta totals in diff mode).
    pub totals: Totals,
    pub current: RankedRow,
    /// Exclusive cost as a share of the function's own inclusive cost.
    pub exclusive_of_inclusive: MetricPercents,
    /// Diff mode only: the symbol's values in each run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<DiffSummary>,
    pub parents: Vec<RelativeRow>,
    pub children: Vec<RelativeRow>,
    /// Sum of call counts over child edges.
    pub child_calls: f64,
}

/// One stored run, as listed by a run source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunListing {
    pub id: String,
    pub source: String,
    pub size_bytes: u64,
    /// Seconds since the Unix epoch.
    pub modified: Option<u64>,
}

/// Everything the orchestrator can hand to a renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Report {
    Flat(FlatReport),
    Diff(DiffReport),
    Symbol(SymbolReport),
    /// The drill-down symbol does not occur in the run. Informational.
    SymbolNotFound { symbol: Symbol, runs: Vec<RunInfo> },
    RunList { source: String, runs: Vec<RunListing> },
}
