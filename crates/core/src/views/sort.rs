use std::cmp::Ordering;

use callscope_protocol::{Column, FlatRow, Mode, Page, RankedRow, RelativeRow, Symbol};

/// A row that can be ordered by report column.
pub trait SortRow {
    fn name(&self) -> &Symbol;
    fn sort_value(&self, column: Column) -> Option<f64>;
}

impl SortRow for FlatRow {
    fn name(&self) -> &Symbol {
        &self.name
    }

    fn sort_value(&self, column: Column) -> Option<f64> {
        self.stats.value(column)
    }
}

impl SortRow for RankedRow {
    fn name(&self) -> &Symbol {
        &self.row.name
    }

    fn sort_value(&self, column: Column) -> Option<f64> {
        self.row.stats.value(column)
    }
}

impl SortRow for RelativeRow {
    fn name(&self) -> &Symbol {
        &self.name
    }

    fn sort_value(&self, column: Column) -> Option<f64> {
        self.value(column)
    }
}

/// Report ordering.
///
/// The name column sorts case-insensitively ascending. Every other column
/// sorts descending so the most expensive functions come first; in diff
/// mode by absolute delta, so large regressions and large improvements both
/// rank high.
pub fn compare<T: SortRow>(a: &T, b: &T, sort: Column, mode: Mode) -> Ordering {
    if sort == Column::Name {
        return a.name().cmp_ignore_case(b.name());
    }
    let key = |row: &T| {
        let v = row.sort_value(sort).unwrap_or_default();
        if mode == Mode::Diff { v.abs() } else { v }
    };
    key(b).total_cmp(&key(a))
}

/// Sort in place. Rows are ordered by exact name first so that ties under
/// the requested column never depend on map iteration order.
pub fn sort_rows<T: SortRow>(rows: &mut [T], sort: Column, mode: Mode) {
    rows.sort_by(|a, b| a.name().cmp(b.name()));
    rows.sort_by(|a, b| compare(a, b, sort, mode));
}

/// Apply the row limit to an already sorted sequence.
///
/// `0` keeps everything, a positive limit keeps the head, a negative limit
/// keeps the last `|limit|` rows in their sorted relative order (the
/// cheapest rows under a descending sort).
pub fn paginate<T>(mut rows: Vec<T>, limit: i64) -> (Vec<T>, Page) {
    let total = rows.len();
    let n = usize::try_from(limit.unsigned_abs())
        .unwrap_or(usize::MAX)
        .min(total);
    match limit.cmp(&0) {
        Ordering::Equal => {}
        Ordering::Greater => rows.truncate(n),
        Ordering::Less => {
            rows.drain(..total - n);
        }
    }
    let page = Page {
        total,
        limit,
        shown: rows.len(),
    };
    (rows, page)
}
