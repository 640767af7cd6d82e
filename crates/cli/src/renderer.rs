//! Plain-text and JSON rendering of reports.

use std::fmt::{self, Write as _};
use std::io::Write as _;
use std::path::Path;

use anyhow::Result;
use callscope_protocol::column::{flat_columns, parent_child_columns};
use callscope_protocol::{
    Column, Comparison, DiffReport, DiffSummary, FlatReport, MetricSet, Page, Percent, RankedRow,
    RelativeRow, Report, RunInfo, RunListing, SymbolReport, Totals, ValueFormat,
};
use serde::Serialize;

pub struct CliOutput {
    json: bool,
}

impl CliOutput {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    pub fn print_report(&self, report: &Report) -> Result<()> {
        let text = if self.json {
            serde_json::to_string_pretty(report)?
        } else {
            render_report(report)?
        };
        write_stdout(&text)
    }

    pub fn print_stored(&self, id: &str, path: &Path) -> Result<()> {
        #[derive(Serialize)]
        struct Stored<'a> {
            id: &'a str,
            path: &'a Path,
        }

        let text = if self.json {
            serde_json::to_string(&Stored { id, path })?
        } else {
            format!("stored run {id} at {}", path.display())
        };
        write_stdout(&text)
    }
}

fn write_stdout(text: &str) -> Result<()> {
    let mut out = std::io::stdout().lock();
    writeln!(out, "{}", text.trim_end())?;
    Ok(())
}

/// Left-aligned first column, right-aligned numbers.
struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    /// A row holding only a label in the first column.
    fn push_label(&mut self, label: impl Into<String>) {
        let mut row = vec![String::new(); self.headers.len()];
        row[0] = label.into();
        self.rows.push(row);
    }

    fn write(&self, out: &mut String) -> fmt::Result {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let write_row = |out: &mut String, cells: &[String]| -> fmt::Result {
            let mut line = String::new();
            for (i, (cell, &width)) in cells.iter().zip(&widths).enumerate() {
                if i == 0 {
                    write!(line, "{cell:<width$}")?;
                } else {
                    write!(line, "  {cell:>width$}")?;
                }
            }
            writeln!(out, "{}", line.trim_end())
        };

        write_row(out, &self.headers)?;
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        write_row(out, &rule)?;
        for row in &self.rows {
            write_row(out, row)?;
        }
        Ok(())
    }
}

fn format_value(column: Column, value: Option<f64>) -> String {
    column
        .value_format()
        .unwrap_or(ValueFormat::Number)
        .format_opt(value)
}

fn format_percent(percent: Percent) -> String {
    ValueFormat::Percent.format_opt(percent)
}

/// Value column followed by its percentage column, for every column but the
/// name.
fn headers(columns: &[Column], diff: bool) -> Vec<String> {
    let mut out = Vec::with_capacity(columns.len() * 2);
    for column in columns {
        out.push(column.description(diff));
        if let Some(p) = column.percent_description(diff) {
            out.push(p);
        }
    }
    out
}

fn cells(
    columns: &[Column],
    name: &str,
    mut cell: impl FnMut(Column) -> Option<(Option<f64>, Percent)>,
) -> Vec<String> {
    let mut out = Vec::with_capacity(columns.len() * 2);
    for &column in columns {
        if column == Column::Name {
            out.push(name.to_string());
            continue;
        }
        match cell(column) {
            Some((value, percent)) => {
                out.push(format_value(column, value));
                out.push(format_percent(percent));
            }
            None => out.extend([String::new(), String::new()]),
        }
    }
    out
}

fn ranked_cells(columns: &[Column], row: &RankedRow) -> Vec<String> {
    cells(columns, &row.row.name, |c| {
        Some((row.row.stats.value(c), row.percent(c)))
    })
}

fn relative_cells(columns: &[Column], row: &RelativeRow) -> Vec<String> {
    cells(columns, &row.name, |c| {
        let percent = match c {
            Column::Calls => row.calls_percent,
            Column::Inclusive(m) | Column::Exclusive(m) => row.percent[m],
            Column::Name => None,
        };
        Some((row.value(c), percent))
    })
}

fn page_label(page: &Page, sort: Column, diff: bool) -> String {
    let sorted = sort.description(diff);
    if !page.is_truncated() {
        return format!("Showing all {} functions, sorted by {sorted}", page.total);
    }
    let which = if page.limit < 0 { "last" } else { "top" };
    format!(
        "Displaying {which} {} of {} functions, sorted by {sorted}",
        page.shown, page.total
    )
}

fn write_totals(out: &mut String, metrics: &MetricSet, totals: &Totals) -> fmt::Result {
    writeln!(out, "Overall Summary")?;
    for metric in metrics.iter() {
        writeln!(
            out,
            "  Total {}: {} {}",
            Column::Inclusive(metric).description(false),
            ValueFormat::Number.format(totals.values[metric]),
            metric.unit()
        )?;
    }
    if metrics.has_calls() {
        writeln!(
            out,
            "  Number of Function Calls: {}",
            ValueFormat::Count.format(totals.calls)
        )?;
    }
    Ok(())
}

fn comparison_row(label: String, format: ValueFormat, c: &Comparison) -> Vec<String> {
    vec![
        label,
        format.format_opt(c.run1),
        format.format_opt(c.run2),
        format.format_opt(c.delta),
        format_percent(c.delta_percent),
    ]
}

fn summary_table(runs: &[RunInfo], summary: &DiffSummary) -> Table {
    let run_header = |i: usize| runs.get(i).map(|r| r.id.clone()).unwrap_or_default();
    let mut table = Table::new(vec![
        String::new(),
        run_header(0),
        run_header(1),
        "Diff".to_string(),
        "Diff%".to_string(),
    ]);
    if let Some(calls) = &summary.calls {
        table.push(comparison_row(
            "Number of Function Calls".into(),
            ValueFormat::Count,
            calls,
        ));
    }
    for line in &summary.metrics {
        let inclusive = Column::Inclusive(line.metric);
        table.push(comparison_row(
            inclusive.description(false),
            ValueFormat::Number,
            &line.inclusive,
        ));
        if let Some(per_call) = &line.per_call {
            table.push(comparison_row(
                format!("{} per call", inclusive.description(false)),
                ValueFormat::Number,
                per_call,
            ));
        }
        if let Some(exclusive) = &line.exclusive {
            table.push(comparison_row(
                Column::Exclusive(line.metric).description(false),
                ValueFormat::Number,
                exclusive,
            ));
        }
    }
    table
}

fn write_flat(out: &mut String, report: &FlatReport) -> fmt::Result {
    writeln!(out, "Run {}: {}", report.run.id, report.run.description)?;
    writeln!(out)?;
    write_totals(out, &report.metrics, &report.totals)?;
    writeln!(out)?;
    writeln!(out, "{}", page_label(&report.page, report.sort, false))?;

    let columns = flat_columns(&report.metrics);
    let mut table = Table::new(headers(&columns, false));
    for row in &report.rows {
        table.push(ranked_cells(&columns, row));
    }
    table.write(out)
}

fn write_diff(out: &mut String, report: &DiffReport) -> fmt::Result {
    writeln!(
        out,
        "Comparing run {} ({}) with run {} ({})",
        report.run1.id, report.run1.description, report.run2.id, report.run2.description
    )?;
    writeln!(out)?;
    writeln!(out, "Overall Diff Summary")?;
    summary_table(&[report.run1.clone(), report.run2.clone()], &report.summary).write(out)?;
    writeln!(out)?;
    writeln!(out, "{}", page_label(&report.page, report.sort, true))?;

    let columns = flat_columns(&report.metrics);
    let mut table = Table::new(headers(&columns, true));
    for row in &report.rows {
        table.push(ranked_cells(&columns, row));
    }
    table.write(out)
}

fn write_symbol(out: &mut String, report: &SymbolReport) -> fmt::Result {
    let diff = report.summary.is_some();
    let ids: Vec<&str> = report.runs.iter().map(|r| r.id.as_str()).collect();
    writeln!(out, "Function {} (run {})", report.symbol, ids.join(" vs "))?;
    writeln!(out)?;

    if let Some(summary) = &report.summary {
        writeln!(out, "Summary")?;
        summary_table(&report.runs, summary).write(out)?;
        writeln!(out)?;
    }

    let columns = parent_child_columns(&report.metrics);
    writeln!(
        out,
        "Parent/Child report, sorted by {}",
        report.sort.description(diff)
    )?;
    let mut table = Table::new(headers(&columns, diff));

    table.push_label("Current Function");
    table.push(ranked_cells(&columns, &report.current));

    table.push_label("Exclusive Metrics for Current Function");
    table.push(cells(&columns, &report.symbol, |c| match c {
        Column::Inclusive(m) | Column::Exclusive(m) => Some((
            Some(report.current.row.stats.exclusive[m]),
            report.exclusive_of_inclusive[m],
        )),
        Column::Calls | Column::Name => None,
    }));

    let plural = |n: usize| if n == 1 { "" } else { "s" };
    let parents = report.parents.len();
    table.push_label(format!("Parent function{} ({parents})", plural(parents)));
    for row in &report.parents {
        table.push(relative_cells(&columns, row));
    }
    let children = report.children.len();
    table.push_label(format!("Child function{} ({children})", plural(children)));
    for row in &report.children {
        table.push(relative_cells(&columns, row));
    }
    table.write(out)
}

fn format_modified(secs: Option<u64>) -> String {
    let format = time::macros::format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    secs.and_then(|s| i64::try_from(s).ok())
        .and_then(|s| time::OffsetDateTime::from_unix_timestamp(s).ok())
        .and_then(|t| t.format(format).ok())
        .unwrap_or_else(|| "-".to_string())
}

fn write_run_list(out: &mut String, source: &str, runs: &[RunListing]) -> fmt::Result {
    if runs.is_empty() {
        return writeln!(out, "No runs stored for source `{source}`");
    }
    writeln!(out, "Existing runs for source `{source}`:")?;
    let mut table = Table::new(vec![
        "Run".to_string(),
        "Modified (UTC)".to_string(),
        "Size (bytes)".to_string(),
    ]);
    for run in runs {
        table.push(vec![
            run.id.clone(),
            format_modified(run.modified),
            ValueFormat::Number.format(run.size_bytes as f64),
        ]);
    }
    table.write(out)
}

pub fn render_report(report: &Report) -> Result<String, fmt::Error> {
    let mut out = String::new();
    match report {
        Report::Flat(flat) => write_flat(&mut out, flat)?,
        Report::Diff(diff) => write_diff(&mut out, diff)?,
        Report::Symbol(symbol) => write_symbol(&mut out, symbol)?,
        Report::SymbolNotFound { symbol, runs } => {
            let ids: Vec<&str> = runs.iter().map(|r| r.id.as_str()).collect();
            writeln!(out, "Function {symbol} not found in run {}", ids.join(" or "))?;
        }
        Report::RunList { source, runs } => write_run_list(&mut out, source, runs)?,
    }
    Ok(out)
}
