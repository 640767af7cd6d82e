use callscope_protocol::{
    Comparison, DiffReport, DiffSummary, MetricComparison, MetricSet, RankedRow, Totals,
};

use crate::aggregate::{compute_diff, compute_flat_info};
use crate::model::Run;
use crate::views::context::ReportContext;
use crate::views::sort::{paginate, sort_rows};

/// Run-level comparison: call count and every present metric.
pub fn summarize_totals(metrics: &MetricSet, totals1: &Totals, totals2: &Totals) -> DiffSummary {
    DiffSummary {
        calls: metrics
            .has_calls()
            .then(|| Comparison::new(totals1.calls, totals2.calls)),
        metrics: metrics
            .iter()
            .map(|metric| MetricComparison {
                metric,
                inclusive: Comparison::new(totals1.values[metric], totals2.values[metric]),
                per_call: None,
                exclusive: None,
            })
            .collect(),
    }
}

/// Per-function deltas `run2 - run1`, ranked by magnitude.
///
/// Row percentages are relative to the delta totals, so a function's share
/// says how much of the overall change it accounts for.
pub fn build_diff_report(run1: &Run, run2: &Run, ctx: &ReportContext) -> DiffReport {
    let totals1 = compute_flat_info(&run1.data).totals;
    let totals2 = compute_flat_info(&run2.data).totals;
    let delta_totals = totals2.delta(&totals1);

    let delta = compute_flat_info(&compute_diff(&run1.data, &run2.data));
    let metrics = delta.metrics;

    let mut rows = delta.into_rows();
    sort_rows(&mut rows, ctx.sort, ctx.mode);
    let (rows, page) = paginate(rows, ctx.limit);

    tracing::debug!(
        run1 = %run1.id,
        run2 = %run2.id,
        functions = page.total,
        shown = page.shown,
        "built diff report"
    );

    DiffReport {
        run1: run1.info(),
        run2: run2.info(),
        metrics,
        sort: ctx.sort,
        summary: summarize_totals(&metrics, &totals1, &totals2),
        totals1,
        totals2,
        delta_totals,
        rows: rows
            .into_iter()
            .map(|row| RankedRow::against(row, &delta_totals))
            .collect(),
        page,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Counters, EdgeKey, RunData};
    use callscope_protocol::{Column, Metric};

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
    fn faster_function_shows_negative_delta() {
        let run1 = Run::new(
            "before",
            "",
            RunData::new(metrics()).with_edge(EdgeKey::root("f"), wt(1.0, 100.0)),
        );
        let run2 = Run::new(
            "after",
            "",
            RunData::new(metrics()).with_edge(EdgeKey::root("f"), wt(1.0, 60.0)),
        );

        let report = build_diff_report(&run1, &run2, &ReportContext::diff(metrics()));
        let f = &report.rows[0];
        assert_eq!(f.row.stats.inclusive[Metric::WallTime], -40.0);

        let wall = &report.summary.metrics[0];
        assert_eq!(wall.metric, Metric::WallTime);
        assert_eq!(wall.inclusive.delta, Some(-40.0));
        assert_eq!(wall.inclusive.delta_percent, Some(-0.4));

        let calls = report.summary.calls.unwrap();
        assert_eq!(calls.delta, Some(0.0));
        assert_eq!(report.delta_totals.values[Metric::WallTime], -40.0);
        assert_eq!(f.percent(Column::Inclusive(Metric::WallTime)), Some(-1.0));
        assert_eq!(f.percent(Column::Calls), None);
    }

    #[test]
    fn largest_change_first() {
        let run1 = Run::new(
            "1",
            "",
            RunData::new(metrics())
                .with_edge(EdgeKey::root("main"), wt(1.0, 1000.0))
                .with_edge(EdgeKey::call("main", "up"), wt(1.0, 100.0))
                .with_edge(EdgeKey::call("main", "down"), wt(1.0, 200.0)),
        );
        let run2 = Run::new(
            "2",
            "",
            RunData::new(metrics())
                .with_edge(EdgeKey::root("main"), wt(1.0, 1000.0))
                .with_edge(EdgeKey::call("main", "up"), wt(1.0, 150.0))
                .with_edge(EdgeKey::call("main", "down"), wt(1.0, 120.0)),
        );

        let report = build_diff_report(&run1, &run2, &ReportContext::diff(metrics()));
        let names: Vec<_> = report.rows.iter().map(|r| r.row.name.as_str()).collect();
        assert_eq!(names, ["down", "up", "main"]);
    }
}
