use crate::error::{Error, Result};
use crate::model::{Run, RunData};
use crate::source::RunSource;

/// Parse a comma separated list of positive integer weights (`"1,2,1"`).
pub fn parse_weights(text: &str) -> Result<Vec<u32>> {
    text.split(',')
        .map(str::trim)
        .map(|w| {
            w.parse::<u32>()
                .map_err(|_| Error::InvalidArgument(format!("weight `{w}` is not an integer")))
        })
        .collect()
}

/// Weighted mean of several runs' edge data.
///
/// Every counter, call counts included, is `Σ wᵢ·vᵢ / Σ wᵢ`, so combining N
/// copies of the same run yields that run again rather than N times its cost.
/// All runs must share one metric set.
pub fn aggregate_run_data(runs: &[(&RunData, u32)]) -> Result<RunData> {
    let Some((first, _)) = runs.first() else {
        return Err(Error::InvalidArgument("no runs to aggregate".into()));
    };
    let metrics = first.metrics();

    let mut total_weight = 0u64;
    let mut sum = RunData::new(metrics);
    for (index, (data, weight)) in runs.iter().enumerate() {
        if *weight == 0 {
            return Err(Error::InvalidArgument(format!(
                "weight of run #{} must be positive",
                index + 1
            )));
        }
        if data.metrics() != metrics {
            return Err(Error::InvalidArgument(format!(
                "run #{} records different metrics than run #1",
                index + 1
            )));
        }
        total_weight += u64::from(*weight);
        let factor = f64::from(*weight);
        for (edge, counters) in data.edges() {
            sum.add(edge.clone(), counters.scaled(factor));
        }
    }

    let total = total_weight as f64;
    let mut mean = RunData::new(metrics);
    for (edge, counters) in sum.edges() {
        let mut avg = *counters;
        avg.calls /= total;
        for metric in metrics.iter() {
            avg.values[metric] /= total;
        }
        mean.add(edge.clone(), avg);
    }
    Ok(mean)
}

/// Fetch `run_ids` from `source` and combine them with `weights`
/// (equal weights when `None`).
pub fn aggregate_runs(
    source: &dyn RunSource,
    run_ids: &[String],
    weights: Option<&[u32]>,
    category: &str,
) -> Result<Run> {
    if run_ids.is_empty() {
        return Err(Error::InvalidArgument("no run ids given".into()));
    }
    let weights: Vec<u32> = match weights {
        Some(w) if w.len() != run_ids.len() => {
            return Err(Error::InvalidArgument(format!(
                "{} weights given for {} runs",
                w.len(),
                run_ids.len()
            )));
        }
        Some(w) => w.to_vec(),
        None => vec![1; run_ids.len()],
    };

    let runs = run_ids
        .iter()
        .map(|id| source.get_run(id, category))
        .collect::<Result<Vec<Run>>>()?;
    let pairs: Vec<(&RunData, u32)> = runs
        .iter()
        .map(|r| &r.data)
        .zip(weights.iter().copied())
        .collect();
    let data = aggregate_run_data(&pairs)?;

    let parts: Vec<String> = run_ids
        .iter()
        .zip(&weights)
        .map(|(id, w)| format!("{id} (weight {w})"))
        .collect();
    let description = format!(
        "Aggregated report for {} runs: {}",
        run_ids.len(),
        parts.join(", ")
    );
    tracing::info!(runs = run_ids.len(), edges = data.len(), "aggregated runs");

    Ok(Run::new(run_ids.join(","), description, data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Counters, EdgeKey};
    use crate::source::MemoryRunSource;
    use callscope_protocol::{Metric, MetricSet};

    fn wt(calls: f64, wall: f64) -> Counters {
        let mut c = Counters {
            calls,
            ..Counters::default()
        };
        c.values[Metric::WallTime] = wall;
        c
    }

    fn run(wall: f64) -> RunData {
        RunData::new(MetricSet::empty().with_calls().with(Metric::WallTime))
            .with_edge(EdgeKey::root("main()"), wt(1.0, wall))
    }

    #[test]
    fn equal_weights_do_not_inflate() {
        let a = run(100.0);
        let mean = aggregate_run_data(&[(&a, 1), (&a, 1), (&a, 1)]).unwrap();
        let root = mean.get(&EdgeKey::root("main()")).copied().unwrap();
        assert_eq!(root.values[Metric::WallTime], 100.0);
        assert_eq!(root.calls, 1.0);
    }

    #[test]
    fn weighted_mean() {
        let a = run(100.0);
        let b = run(400.0);
        let mean = aggregate_run_data(&[(&a, 2), (&b, 1)]).unwrap();
        let root = mean.get(&EdgeKey::root("main()")).copied().unwrap();
        assert_eq!(root.values[Metric::WallTime], 200.0);
    }

    #[test]
    fn rejects_mismatched_metrics_and_zero_weight() {
        let a = run(1.0);
        let other = RunData::new(MetricSet::empty().with(Metric::Samples));
        assert!(matches!(
            aggregate_run_data(&[(&a, 1), (&other, 1)]),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            aggregate_run_data(&[(&a, 0)]),
            Err(Error::InvalidArgument(_))
        ));
        assert!(aggregate_run_data(&[]).is_err());
    }

    #[test]
    fn weights_must_match_run_count() {
        let mut source = MemoryRunSource::new();
        source.insert("web", Run::new("r1", "first", run(10.0)));
        source.insert("web", Run::new("r2", "second", run(30.0)));
        let ids = vec!["r1".to_string(), "r2".to_string()];

        let err = aggregate_runs(&source, &ids, Some(&[1][..]), "web");
        assert!(matches!(err, Err(Error::InvalidArgument(_))));

        let combined = aggregate_runs(&source, &ids, None, "web").unwrap();
        assert_eq!(combined.id, "r1,r2");
        assert_eq!(
            combined.description,
            "Aggregated report for 2 runs: r1 (weight 1), r2 (weight 1)"
        );
        let root = combined
            .data
            .get(&EdgeKey::root("main()"))
            .copied()
            .unwrap();
        assert_eq!(root.values[Metric::WallTime], 20.0);
    }

    #[test]
    fn unknown_run_propagates_not_found() {
        let source = MemoryRunSource::new();
        let err = aggregate_runs(&source, &["nope".to_string()], None, "web");
        assert!(matches!(err, Err(Error::RunNotFound { .. })));
    }

    #[test]
    fn parses_weight_lists() {
        assert_eq!(parse_weights("1, 2,3").unwrap(), [1, 2, 3]);
        assert!(parse_weights("1,x").is_err());
        assert!(parse_weights("-1").is_err());
    }
}
