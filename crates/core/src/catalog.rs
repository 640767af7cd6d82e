//! Which metrics a run actually carries.
//!
//! Collectors emit different subsets depending on their flags (wall time
//! only, CPU, memory, sampling mode). The subset is decided once per run
//! from one representative record.

use callscope_protocol::{CALLS_KEY, Metric, MetricSet};

use crate::model::{RawRecord, RawRun, parse_edge_key};

/// Intersection of the known metrics with the keys present in `record`.
pub fn resolve_present_metrics(record: &RawRecord) -> MetricSet {
    let base = if record.contains_key(CALLS_KEY) {
        MetricSet::empty().with_calls()
    } else {
        MetricSet::empty()
    };
    Metric::ALL
        .into_iter()
        .filter(|m| record.contains_key(m.key()))
        .fold(base, MetricSet::with)
}

/// The record the metric set is resolved from: the first root edge in key
/// order, or the first edge when the run has no root.
pub fn representative_record(raw: &RawRun) -> Option<&RawRecord> {
    raw.iter()
        .find(|(key, _)| matches!(parse_edge_key(key), Ok((None, _))))
        .or_else(|| raw.iter().next())
        .map(|(_, record)| record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(keys: &[&str]) -> RawRecord {
        keys.iter().map(|k| (k.to_string(), 1.0)).collect()
    }

    #[test]
    fn intersects_with_known_metrics() {
        let set = resolve_present_metrics(&record(&["ct", "wt", "cpu", "mu", "pmu", "extra"]));
        assert!(set.has_calls());
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            [
                Metric::WallTime,
                Metric::CpuTime,
                Metric::Memory,
                Metric::PeakMemory
            ]
        );
    }

    #[test]
    fn sampling_runs_have_no_wall_time() {
        let set = resolve_present_metrics(&record(&["samples"]));
        assert!(!set.has_calls());
        assert!(!set.contains(Metric::WallTime));
        assert!(set.contains(Metric::Samples));
    }

    #[test]
    fn prefers_root_record() {
        let mut raw = RawRun::new();
        raw.insert("a==>b".into(), record(&["wt"]));
        raw.insert("main()".into(), record(&["wt", "ct", "mu"]));
        let picked = representative_record(&raw).map(resolve_present_metrics);
        assert_eq!(picked.map(|s| s.len()), Some(2));

        let mut rootless = RawRun::new();
        rootless.insert("x==>y".into(), record(&["samples"]));
        assert!(representative_record(&rootless).is_some());
        assert!(representative_record(&RawRun::new()).is_none());
    }
}
