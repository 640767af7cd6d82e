pub mod edge;
pub mod run;

pub use edge::{Counters, EdgeKey, EdgeKeyError, SEPARATOR, format_edge_key, parse_edge_key};
pub use run::{RawRecord, RawRun, Run, RunData};
