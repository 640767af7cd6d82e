use callscope_protocol::column::{flat_columns, parent_child_columns};
use callscope_protocol::{Column, Metric, MetricSet, Mode};

/// Default number of rows in a flat report.
pub const DEFAULT_LIMIT: i64 = 100;

/// Default sort column: inclusive wall time.
pub const DEFAULT_SORT: Column = Column::Inclusive(Metric::WallTime);

/// Everything a report build needs to know besides the run data itself.
///
/// Built once per request and passed by reference into every view; views
/// never consult ambient state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportContext {
    pub mode: Mode,
    pub metrics: MetricSet,
    pub sort: Column,
    /// 0 = all rows, positive = first N, negative = last N.
    pub limit: i64,
}

impl ReportContext {
    /// Resolve the effective sort column for a run with `metrics`.
    ///
    /// * no request → inclusive wall time, or samples for sampling runs;
    /// * a column the run cannot provide falls back to that default;
    /// * symbol reports only sort on inclusive values.
    pub fn resolve(
        mode: Mode,
        metrics: MetricSet,
        requested: Option<Column>,
        limit: i64,
        symbol_report: bool,
    ) -> Self {
        let mut sort = requested.unwrap_or(DEFAULT_SORT);
        if symbol_report {
            sort = sort.to_inclusive();
        }
        if !Self::available(&metrics, sort) {
            let fallback = Self::default_sort(&metrics);
            if requested.is_some() {
                tracing::warn!(
                    requested = %sort,
                    fallback = %fallback,
                    "sort column not present in run"
                );
            }
            sort = fallback;
        }
        Self {
            mode,
            metrics,
            sort,
            limit,
        }
    }

    pub fn single(metrics: MetricSet) -> Self {
        Self::resolve(Mode::Single, metrics, None, DEFAULT_LIMIT, false)
    }

    pub fn diff(metrics: MetricSet) -> Self {
        Self::resolve(Mode::Diff, metrics, None, DEFAULT_LIMIT, false)
    }

    #[must_use]
    pub fn with_sort(self, sort: Column) -> Self {
        Self { sort, ..self }
    }

    #[must_use]
    pub fn with_limit(self, limit: i64) -> Self {
        Self { limit, ..self }
    }

    pub fn is_diff(&self) -> bool {
        self.mode == Mode::Diff
    }

    pub fn flat_columns(&self) -> Vec<Column> {
        flat_columns(&self.metrics)
    }

    pub fn parent_child_columns(&self) -> Vec<Column> {
        parent_child_columns(&self.metrics)
    }

    fn available(metrics: &MetricSet, column: Column) -> bool {
        match column {
            Column::Name => true,
            Column::Calls => metrics.has_calls(),
            Column::Inclusive(m) | Column::Exclusive(m) => metrics.contains(m),
        }
    }

    fn default_sort(metrics: &MetricSet) -> Column {
        [Metric::WallTime, Metric::Samples]
            .into_iter()
            .find(|m| metrics.contains(*m))
            .or_else(|| metrics.iter().next())
            .map(Column::Inclusive)
            .unwrap_or(if metrics.has_calls() {
                Column::Calls
            } else {
                Column::Name
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wall_and_memory() -> MetricSet {
        MetricSet::empty()
            .with_calls()
            .with(Metric::WallTime)
            .with(Metric::Memory)
    }

    #[test]
    fn defaults_to_wall_time() {
        let ctx = ReportContext::single(wall_and_memory());
        assert_eq!(ctx.sort, Column::Inclusive(Metric::WallTime));
        assert_eq!(ctx.limit, DEFAULT_LIMIT);
        assert!(!ctx.is_diff());
    }

    #[test]
    fn sampling_runs_sort_by_samples() {
        let ctx = ReportContext::single(MetricSet::empty().with(Metric::Samples));
        assert_eq!(ctx.sort, Column::Inclusive(Metric::Samples));
    }

    #[test]
    fn unavailable_columns_fall_back() {
        let ctx = ReportContext::resolve(
            Mode::Diff,
            wall_and_memory(),
            Some(Column::Exclusive(Metric::CpuTime)),
            0,
            false,
        );
        assert_eq!(ctx.sort, DEFAULT_SORT);

        let no_calls = MetricSet::empty().with(Metric::Memory);
        let ctx = ReportContext::resolve(Mode::Single, no_calls, Some(Column::Calls), 0, false);
        assert_eq!(ctx.sort, Column::Inclusive(Metric::Memory));

        let nothing = ReportContext::single(MetricSet::empty());
        assert_eq!(nothing.sort, Column::Name);
    }

    #[test]
    fn symbol_reports_sort_inclusive() {
        let ctx = ReportContext::resolve(
            Mode::Single,
            wall_and_memory(),
            Some(Column::Exclusive(Metric::Memory)),
            0,
            true,
        );
        assert_eq!(ctx.sort, Column::Inclusive(Metric::Memory));
    }
}
