use crate::model::RunData;

/// Edge-by-edge delta `run2 - run1`.
///
/// Edges present in only one run are kept, with the missing side read as
/// zero. Negative values mean run2 is cheaper. The result carries run2's
/// metric set.
pub fn compute_diff(run1: &RunData, run2: &RunData) -> RunData {
    let metrics = run2.metrics();
    let mut delta = RunData::new(metrics);
    for (edge, counters) in run2.edges() {
        delta.add(edge.clone(), *counters);
    }
    for (edge, counters) in run1.edges() {
        let mut removed = -*counters;
        removed.values = removed.values.restricted(&metrics);
        delta.add(edge.clone(), removed);
    }
    tracing::debug!(
        run1_edges = run1.len(),
        run2_edges = run2.len(),
        delta_edges = delta.len(),
        "computed run diff"
    );
    delta
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::compute_flat_info;
    use crate::model::{Counters, EdgeKey};
    use callscope_protocol::{Metric, MetricSet};

    fn wt(calls: f64, wall: f64) -> Counters {
        let mut c = Counters {
            calls,
            ..Counters::default()
        };
        c.values[Metric::WallTime] = wall;
        c
    }

    fn metrics() -> MetricSet {
        MetricSet::empty().with_calls().with(Metric::WallTime)
    }

    #[test]
    fn improvement_is_negative() {
        let run1 = RunData::new(metrics()).with_edge(EdgeKey::root("f"), wt(1.0, 100.0));
        let run2 = RunData::new(metrics()).with_edge(EdgeKey::root("f"), wt(1.0, 60.0));
        let delta = compute_flat_info(&compute_diff(&run1, &run2));
        let f = delta.get("f").copied().unwrap();
        assert_eq!(f.inclusive[Metric::WallTime], -40.0);
        assert_eq!(f.calls, 0.0);
    }

    #[test]
    fn one_sided_functions_are_kept() {
        let run1 = RunData::new(metrics())
            .with_edge(EdgeKey::root("main"), wt(1.0, 50.0))
            .with_edge(EdgeKey::call("main", "gone"), wt(2.0, 30.0));
        let run2 = RunData::new(metrics())
            .with_edge(EdgeKey::root("main"), wt(1.0, 50.0))
            .with_edge(EdgeKey::call("main", "added"), wt(4.0, 10.0));

        let delta = compute_flat_info(&compute_diff(&run1, &run2));
        let gone = delta.get("gone").copied().unwrap();
        assert_eq!(gone.calls, -2.0);
        assert_eq!(gone.inclusive[Metric::WallTime], -30.0);
        let added = delta.get("added").copied().unwrap();
        assert_eq!(added.calls, 4.0);
        let main = delta.get("main").copied().unwrap();
        assert_eq!(main.inclusive[Metric::WallTime], 0.0);
        assert_eq!(main.exclusive[Metric::WallTime], 20.0);
    }
}
