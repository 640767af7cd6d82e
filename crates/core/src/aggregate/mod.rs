//! Aggregation primitives the report views build on: flattening, diffing,
//! weighted multi-run means, and trimming.

pub mod diff;
pub mod flat;
pub mod multi;
pub mod trim;

pub use diff::compute_diff;
pub use flat::{FlatTable, compute_flat_info};
pub use multi::{aggregate_run_data, aggregate_runs, parse_weights};
pub use trim::trim_run;
