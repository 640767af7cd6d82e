use callscope_protocol::{
    Comparison, DiffSummary, FlatRow, FunctionStats, MetricComparison, MetricPercents, MetricSet,
    Mode, RankedRow, RelativeRow, Symbol, SymbolReport, Totals, per_call, percent,
};

use crate::aggregate::{compute_diff, compute_flat_info, trim_run};
use crate::error::{Error, Result};
use crate::model::{Run, RunData};
use crate::views::context::ReportContext;
use crate::views::sort::sort_rows;

struct Relatives {
    parents: Vec<RelativeRow>,
    children: Vec<RelativeRow>,
    child_calls: f64,
}

/// Direct callers and callees of `symbol` in `data`.
///
/// Parent percentages are relative to the symbol's own call count and
/// inclusive cost. Child call percentages are relative to the total calls
/// the symbol makes; child metric percentages again to its inclusive cost.
fn relatives(
    data: &RunData,
    symbol: &str,
    current: &FunctionStats,
    ctx: &ReportContext,
) -> Relatives {
    let mut parents = Vec::new();
    let mut child_edges = Vec::new();

    for (edge, counters) in data.edges() {
        if edge.callee == symbol {
            if let Some(caller) = &edge.caller {
                parents.push(RelativeRow {
                    name: caller.clone(),
                    calls: counters.calls,
                    values: counters.values,
                    calls_percent: percent(counters.calls, current.calls),
                    percent: MetricPercents::of(&counters.values, &current.inclusive),
                });
            }
        }
        if edge.caller.as_ref().is_some_and(|c| c == symbol) {
            child_edges.push((edge.callee.clone(), *counters));
        }
    }

    let child_calls: f64 = child_edges.iter().map(|(_, c)| c.calls).sum();
    let mut children: Vec<RelativeRow> = child_edges
        .into_iter()
        .map(|(name, counters)| RelativeRow {
            name,
            calls: counters.calls,
            values: counters.values,
            calls_percent: percent(counters.calls, child_calls),
            percent: MetricPercents::of(&counters.values, &current.inclusive),
        })
        .collect();

    sort_rows(&mut parents, ctx.sort, ctx.mode);
    sort_rows(&mut children, ctx.sort, ctx.mode);

    Relatives {
        parents,
        children,
        child_calls,
    }
}

fn current_row(
    symbol: Symbol,
    stats: FunctionStats,
    totals: &Totals,
) -> (RankedRow, MetricPercents) {
    let exclusive_of_inclusive = MetricPercents::of(&stats.exclusive, &stats.inclusive);
    let row = RankedRow::against(FlatRow { name: symbol, stats }, totals);
    (row, exclusive_of_inclusive)
}

/// Parent/child view of one function in a single run.
///
/// Fails with [`Error::SymbolNotFound`] when no edge calls `symbol`.
pub fn build_symbol_report(run: &Run, symbol: &str, ctx: &ReportContext) -> Result<SymbolReport> {
    let trimmed = trim_run(&run.data, &[symbol]);
    let table = compute_flat_info(&trimmed);
    let Some(stats) = table.get(symbol).copied() else {
        return Err(Error::SymbolNotFound(Symbol::from(symbol)));
    };

    let relatives = relatives(&trimmed, symbol, &stats, ctx);
    let (current, exclusive_of_inclusive) =
        current_row(Symbol::from(symbol), stats, &table.totals);

    tracing::debug!(
        run = %run.id,
        symbol,
        parents = relatives.parents.len(),
        children = relatives.children.len(),
        "built symbol report"
    );

    Ok(SymbolReport {
        mode: Mode::Single,
        runs: vec![run.info()],
        metrics: table.metrics,
        sort: ctx.sort,
        symbol: Symbol::from(symbol),
        totals: table.totals,
        current,
        exclusive_of_inclusive,
        summary: None,
        parents: relatives.parents,
        children: relatives.children,
        child_calls: relatives.child_calls,
    })
}

/// The symbol's own numbers in both runs, including per-call averages.
pub fn summarize_symbol(
    metrics: &MetricSet,
    info1: &FunctionStats,
    info2: &FunctionStats,
) -> DiffSummary {
    DiffSummary {
        calls: metrics
            .has_calls()
            .then(|| Comparison::new(info1.calls, info2.calls)),
        metrics: metrics
            .iter()
            .map(|metric| MetricComparison {
                metric,
                inclusive: Comparison::new(info1.inclusive[metric], info2.inclusive[metric]),
                per_call: Some(Comparison::maybe(
                    per_call(info1.inclusive[metric], info1.calls),
                    per_call(info2.inclusive[metric], info2.calls),
                )),
                exclusive: Some(Comparison::new(
                    info1.exclusive[metric],
                    info2.exclusive[metric],
                )),
            })
            .collect(),
    }
}

/// Parent/child view of how one function changed between two runs.
///
/// The function may be missing from one of the runs; its values there count
/// as zero. It must occur in at least one.
pub fn build_diff_symbol_report(
    run1: &Run,
    run2: &Run,
    symbol: &str,
    ctx: &ReportContext,
) -> Result<SymbolReport> {
    let trimmed1 = trim_run(&run1.data, &[symbol]);
    let trimmed2 = trim_run(&run2.data, &[symbol]);
    let delta_data = compute_diff(&trimmed1, &trimmed2);

    let delta = compute_flat_info(&delta_data);
    let Some(stats) = delta.get(symbol).copied() else {
        return Err(Error::SymbolNotFound(Symbol::from(symbol)));
    };

    let flat1 = compute_flat_info(&trimmed1);
    let flat2 = compute_flat_info(&trimmed2);
    let info1 = flat1.get(symbol).copied().unwrap_or_default();
    let info2 = flat2.get(symbol).copied().unwrap_or_default();
    let delta_totals = flat2.totals.delta(&flat1.totals);

    let relatives = relatives(&delta_data, symbol, &stats, ctx);
    let (current, exclusive_of_inclusive) =
        current_row(Symbol::from(symbol), stats, &delta_totals);

    tracing::debug!(
        run1 = %run1.id,
        run2 = %run2.id,
        symbol,
        parents = relatives.parents.len(),
        children = relatives.children.len(),
        "built diff symbol report"
    );

    Ok(SymbolReport {
        mode: Mode::Diff,
        runs: vec![run1.info(), run2.info()],
        metrics: delta.metrics,
        sort: ctx.sort,
        symbol: Symbol::from(symbol),
        totals: delta_totals,
        current,
        exclusive_of_inclusive,
        summary: Some(summarize_symbol(&delta.metrics, &info1, &info2)),
        parents: relatives.parents,
        children: relatives.children,
        child_calls: relatives.child_calls,
    })
}
