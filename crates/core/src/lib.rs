//! Run model, aggregation primitives and report assembly for callscope.
//!
//! A run is a map from call edges (`caller==>callee`) to their cost. The
//! [`aggregate`] module turns runs into per-function tables, diffs and
//! weighted means; [`views`] sorts, truncates and annotates them into the
//! report payloads defined by `callscope-protocol`.

pub mod aggregate;
pub mod catalog;
pub mod error;
pub mod model;
pub mod source;
pub mod views;

pub use aggregate::{
    FlatTable, aggregate_run_data, aggregate_runs, compute_diff, compute_flat_info, parse_weights,
    trim_run,
};
pub use error::{Error, ErrorKind, Result};
pub use model::{Counters, EdgeKey, RawRun, Run, RunData, format_edge_key, parse_edge_key};
pub use source::{MemoryRunSource, RunSource};
pub use views::{ReportContext, ReportRequest, RunSelection, generate};
