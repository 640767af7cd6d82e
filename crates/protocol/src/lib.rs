pub mod column;
pub mod format;
pub mod metric;
pub mod report;
pub mod symbol;

pub use column::{Column, ColumnParseError};
pub use format::ValueFormat;
pub use metric::{CALLS_KEY, Metric, MetricSet, MetricValues};
pub use report::{
    Comparison, DiffReport, DiffRow, DiffSummary, FlatReport, FlatRow, FunctionStats,
    MetricComparison, MetricPercents, Mode, Page, Percent, RankedRow, RelativeRow, Report,
    RunInfo, RunListing, SymbolReport, Totals, per_call, percent,
};
pub use symbol::Symbol;
