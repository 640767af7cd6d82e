//! Report assembly.
//!
//! Every builder here is a pure function of already retrieved runs and a
//! [`ReportContext`]. [`generate`] is the single entry point that fetches
//! runs from a [`RunSource`] and dispatches to the right builder.

pub mod context;
pub mod diff;
pub mod flat;
pub mod sort;
pub mod symbol;

pub use context::{DEFAULT_LIMIT, DEFAULT_SORT, ReportContext};
pub use diff::{build_diff_report, summarize_totals};
pub use flat::build_flat_report;
pub use sort::{SortRow, paginate, sort_rows};
pub use symbol::{build_diff_symbol_report, build_symbol_report, summarize_symbol};

use callscope_protocol::{Column, Mode, Report, RunInfo, Symbol, SymbolReport};

use crate::aggregate::aggregate_runs;
use crate::error::{Error, Result};
use crate::model::Run;
use crate::source::RunSource;

/// Which runs a request is about.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RunSelection {
    /// No run requested: list what the source has.
    #[default]
    None,
    /// One run, or the weighted mean of several.
    Single {
        ids: Vec<String>,
        weights: Option<Vec<u32>>,
    },
    Diff { run1: String, run2: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportRequest {
    /// Source category the run ids belong to.
    pub source: String,
    pub runs: RunSelection,
    pub symbol: Option<String>,
    pub sort: Option<Column>,
    pub limit: i64,
}

impl ReportRequest {
    pub fn new(source: impl Into<String>, runs: RunSelection) -> Self {
        Self {
            source: source.into(),
            runs,
            symbol: None,
            sort: None,
            limit: DEFAULT_LIMIT,
        }
    }

    #[must_use]
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    #[must_use]
    pub fn with_sort(mut self, sort: Column) -> Self {
        self.sort = Some(sort);
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }
}

fn fetch_single(
    source: &dyn RunSource,
    ids: &[String],
    weights: Option<&[u32]>,
    category: &str,
) -> Result<Run> {
    match (ids, weights) {
        ([], _) => Err(Error::InvalidArgument("no run ids given".into())),
        ([id], None) => source.get_run(id, category),
        _ => aggregate_runs(source, ids, weights, category),
    }
}

/// A missing drill-down symbol becomes an informational report.
fn symbol_outcome(
    result: Result<SymbolReport>,
    symbol: &str,
    runs: Vec<RunInfo>,
) -> Result<Report> {
    match result {
        Ok(report) => Ok(Report::Symbol(report)),
        Err(Error::SymbolNotFound(_)) => {
            tracing::info!(symbol, "symbol not found in run");
            Ok(Report::SymbolNotFound {
                symbol: Symbol::from(symbol),
                runs,
            })
        }
        Err(err) => Err(err),
    }
}

/// Fetch the requested runs and assemble the report.
///
/// Retrieval errors surface unchanged before any assembly starts.
pub fn generate(source: &dyn RunSource, request: &ReportRequest) -> Result<Report> {
    let symbol_report = request.symbol.is_some();
    match &request.runs {
        RunSelection::None => Ok(Report::RunList {
            source: request.source.clone(),
            runs: source.list_runs(&request.source)?,
        }),
        RunSelection::Single { ids, weights } => {
            let run = fetch_single(source, ids, weights.as_deref(), &request.source)?;
            let ctx = ReportContext::resolve(
                Mode::Single,
                run.data.metrics(),
                request.sort,
                request.limit,
                symbol_report,
            );
            match &request.symbol {
                Some(symbol) => symbol_outcome(
                    build_symbol_report(&run, symbol, &ctx),
                    symbol,
                    vec![run.info()],
                ),
                None => Ok(Report::Flat(build_flat_report(&run, &ctx))),
            }
        }
        RunSelection::Diff { run1, run2 } => {
            let run1 = source.get_run(run1, &request.source)?;
            let run2 = source.get_run(run2, &request.source)?;
            let ctx = ReportContext::resolve(
                Mode::Diff,
                run2.data.metrics(),
                request.sort,
                request.limit,
                symbol_report,
            );
            match &request.symbol {
                Some(symbol) => symbol_outcome(
                    build_diff_symbol_report(&run1, &run2, symbol, &ctx),
                    symbol,
                    vec![run1.info(), run2.info()],
                ),
                None => Ok(Report::Diff(build_diff_report(&run1, &run2, &ctx))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Counters, EdgeKey, RunData};
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

    fn source() -> MemoryRunSource {
        let metrics = MetricSet::empty().with_calls().with(Metric::WallTime);
        let mut source = MemoryRunSource::new();
        for (id, wall) in [("r1", 100.0), ("r2", 60.0)] {
            let data = RunData::new(metrics)
                .with_edge(EdgeKey::root("main()"), wt(1.0, wall))
                .with_edge(EdgeKey::call("main()", "work"), wt(2.0, wall / 2.0));
            source.insert("web", Run::new(id, "", data));
        }
        source
    }

    fn single(id: &str) -> RunSelection {
        RunSelection::Single {
            ids: vec![id.to_string()],
            weights: None,
        }
    }

    #[test]
    fn flat_for_one_run() {
        let report = generate(&source(), &ReportRequest::new("web", single("r1"))).unwrap();
        let Report::Flat(flat) = report else {
            unreachable!("expected a flat report");
        };
        assert_eq!(flat.run.id, "r1");
        assert_eq!(flat.rows.len(), 2);
    }

    #[test]
    fn weighted_mean_of_two_runs() {
        let request = ReportRequest::new(
            "web",
            RunSelection::Single {
                ids: vec!["r1".into(), "r2".into()],
                weights: Some(vec![1, 3]),
            },
        );
        let Report::Flat(flat) = generate(&source(), &request).unwrap() else {
            unreachable!("expected a flat report");
        };
        assert_eq!(flat.totals.values[Metric::WallTime], 70.0);
    }

    #[test]
    fn missing_symbol_is_informational() {
        let request = ReportRequest::new("web", single("r1")).with_symbol("nope");
        let report = generate(&source(), &request).unwrap();
        assert!(matches!(report, Report::SymbolNotFound { symbol, .. } if symbol == "nope"));
    }

    #[test]
    fn diff_symbol() {
        let request = ReportRequest::new(
            "web",
            RunSelection::Diff {
                run1: "r1".into(),
                run2: "r2".into(),
            },
        )
        .with_symbol("work")
        .with_sort(Column::Exclusive(Metric::WallTime));
        let Report::Symbol(report) = generate(&source(), &request).unwrap() else {
            unreachable!("expected a symbol report");
        };
        assert_eq!(report.sort, Column::Inclusive(Metric::WallTime));
        assert_eq!(report.current.row.stats.inclusive[Metric::WallTime], -20.0);
        assert_eq!(report.parents.len(), 1);
    }

    #[test]
    fn unknown_run_is_an_error() {
        let err = generate(&source(), &ReportRequest::new("web", single("r9"))).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::NotFound);
    }

    #[test]
    fn listing_without_runs() {
        let Report::RunList { runs, .. } =
            generate(&source(), &ReportRequest::new("web", RunSelection::None)).unwrap()
        else {
            unreachable!("expected a run listing");
        };
        assert_eq!(runs.len(), 2);
    }
}
