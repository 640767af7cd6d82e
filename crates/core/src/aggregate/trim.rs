use crate::model::RunData;

/// Reduce a run to the edges that touch one of `keep`, plus every root edge.
///
/// Root edges stay so that run totals are unchanged. The kept symbols'
/// incoming and outgoing edges are all retained, so their flat rows and
/// their parent/child breakdowns come out identical to the untrimmed run.
pub fn trim_run(run: &RunData, keep: &[&str]) -> RunData {
    let trimmed = run.filtered(|edge| edge.is_root() || keep.iter().any(|s| edge.touches(s)));
    tracing::debug!(
        before = run.len(),
        after = trimmed.len(),
        ?keep,
        "trimmed run"
    );
    trimmed
}
