use callscope_protocol::{FlatReport, RankedRow};

use crate::aggregate::compute_flat_info;
use crate::model::Run;
use crate::views::context::ReportContext;
use crate::views::sort::{paginate, sort_rows};

/// Sorted, truncated flat view of one run with each row's share of the run
/// totals.
pub fn build_flat_report(run: &Run, ctx: &ReportContext) -> FlatReport {
    let table = compute_flat_info(&run.data);
    let metrics = table.metrics;
    let totals = table.totals;

    let mut rows = table.into_rows();
    sort_rows(&mut rows, ctx.sort, ctx.mode);
    let (rows, page) = paginate(rows, ctx.limit);

    tracing::debug!(
        run = %run.id,
        functions = page.total,
        shown = page.shown,
        sort = %ctx.sort,
        "built flat report"
    );

    FlatReport {
        run: run.info(),
        metrics,
        sort: ctx.sort,
        totals,
        rows: rows
            .into_iter()
            .map(|row| RankedRow::against(row, &totals))
            .collect(),
        page,
    }
}
