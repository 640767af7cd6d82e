use std::collections::HashMap;

use callscope_protocol::{FlatRow, FunctionStats, MetricSet, Symbol, Totals};

use crate::model::RunData;

/// Per-function statistics of one run plus its root totals.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlatTable {
    pub metrics: MetricSet,
    pub rows: HashMap<Symbol, FunctionStats>,
    pub totals: Totals,
}

impl FlatTable {
    pub fn get(&self, name: &str) -> Option<&FunctionStats> {
        self.rows.get(name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All rows ordered by name, ready for a stable sort on another column.
    pub fn into_rows(self) -> Vec<FlatRow> {
        let mut rows: Vec<FlatRow> = self
            .rows
            .into_iter()
            .map(|(name, stats)| FlatRow { name, stats })
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        rows
    }
}

/// Collapse edges into one row per callee.
///
/// Inclusive values sum every incoming edge. Exclusive values start from the
/// inclusive ones and subtract the inclusive cost of each outgoing edge.
/// Totals sum root edges only, so cost is never counted twice down the tree.
pub fn compute_flat_info(run: &RunData) -> FlatTable {
    let mut rows: HashMap<Symbol, FunctionStats> = HashMap::new();
    let mut totals = Totals::default();

    for (edge, counters) in run.edges() {
        let stats = rows.entry(edge.callee.clone()).or_default();
        stats.calls += counters.calls;
        stats.inclusive += counters.values;

        if edge.is_root() {
            totals.calls += counters.calls;
            totals.values += counters.values;
        }
    }

    for stats in rows.values_mut() {
        stats.exclusive = stats.inclusive;
    }

    for (edge, counters) in run.edges() {
        // Callers that never appear as a callee have no row (trimmed runs).
        if let Some(stats) = edge.caller.as_ref().and_then(|c| rows.get_mut(c)) {
            stats.exclusive -= counters.values;
        }
    }

    tracing::debug!(functions = rows.len(), "computed flat info");
    FlatTable {
        metrics: run.metrics(),
        rows,
        totals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Counters, EdgeKey};
    use callscope_protocol::Metric;

    fn wt(calls: f64, wall: f64) -> Counters {
        let mut c = Counters {
            calls,
            ..Counters::default()
        };
        c.values[Metric::WallTime] = wall;
        c
    }

    fn sample_run() -> RunData {
        RunData::new(MetricSet::empty().with_calls().with(Metric::WallTime))
            .with_edge(EdgeKey::root("a"), wt(10.0, 1000.0))
            .with_edge(EdgeKey::root("b"), wt(5.0, 2000.0))
            .with_edge(EdgeKey::call("a", "b"), wt(1.0, 200.0))
    }

    #[test]
    fn two_roots_and_one_call() {
        let table = compute_flat_info(&sample_run());
        assert_eq!(table.totals.calls, 15.0);
        assert_eq!(table.totals.values[Metric::WallTime], 3000.0);

        let b = table.get("b").copied().unwrap();
        assert_eq!(b.calls, 6.0);
        assert_eq!(b.inclusive[Metric::WallTime], 2200.0);
        assert_eq!(b.exclusive[Metric::WallTime], 2200.0);

        let a = table.get("a").copied().unwrap();
        assert_eq!(a.inclusive[Metric::WallTime], 1000.0);
        assert_eq!(a.exclusive[Metric::WallTime], 800.0);
    }

    #[test]
    fn rows_come_out_name_ordered() {
        let names: Vec<_> = compute_flat_info(&sample_run())
            .into_rows()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn callers_without_incoming_edges_get_no_row() {
        let run = RunData::new(MetricSet::empty().with(Metric::WallTime))
            .with_edge(EdgeKey::call("orphan", "leaf"), wt(0.0, 5.0));
        let table = compute_flat_info(&run);
        assert_eq!(table.len(), 1);
        assert!(table.get("orphan").is_none());
        assert_eq!(table.totals.values[Metric::WallTime], 0.0);
    }
}
