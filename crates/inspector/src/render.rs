//! Table and JSON rendering of inspection results

use std::collections::BTreeMap;

use colored::Colorize;
use inspector_core::{
    ColumnSpec, HostFailure, ResultAggregate, Row, visible_names, visible_values,
};

const SERVER_HEADER: &str = "Server";
const GAP: &str = "  ";

/// Render the aggregate as an aligned table
///
/// Rows follow `hosts`; hosts without a row are skipped. Multi-line values
/// span several physical lines within their row.
#[must_use]
pub fn render_table(
    hosts: &[String],
    columns: &[ColumnSpec],
    aggregate: &ResultAggregate,
    color: bool,
) -> String {
    let mut header = vec![SERVER_HEADER];
    header.extend(visible_names(columns));

    let rows: Vec<Vec<Vec<&str>>> = aggregate
        .rows_in_order(hosts)
        .map(|(host, row)| {
            let mut cells = vec![vec![host]];
            cells.extend(visible_values(row).into_iter().map(|v| v.lines().collect()));
            cells
        })
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            let widest = cell.iter().map(|l| l.chars().count()).max().unwrap_or(0);
            *width = (*width).max(widest);
        }
    }

    let mut out = String::new();

    let header_cells: Vec<String> = header.iter().map(ToString::to_string).collect();
    push_line(&mut out, &header_cells, &widths, |_, cell| {
        if color {
            cell.green().underline().to_string()
        } else {
            cell
        }
    });

    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_line(&mut out, &rule, &widths, |_, cell| cell);

    for row in &rows {
        let height = row.iter().map(Vec::len).max().unwrap_or(1).max(1);
        for line in 0..height {
            let cells: Vec<String> = row
                .iter()
                .map(|cell| cell.get(line).copied().unwrap_or_default().to_string())
                .collect();
            push_line(&mut out, &cells, &widths, |i, cell| {
                if color && i == 0 {
                    cell.yellow().to_string()
                } else {
                    cell
                }
            });
        }
    }

    out
}

/// Pad every cell but the last and apply `style` after padding
fn push_line(
    out: &mut String,
    cells: &[String],
    widths: &[usize],
    style: impl Fn(usize, String) -> String,
) {
    let last = cells.len().saturating_sub(1);
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(i, (cell, width))| {
            let padded = if i == last {
                cell.clone()
            } else {
                format!("{cell:<width$}")
            };
            style(i, padded)
        })
        .collect();

    out.push_str(line.join(GAP).trim_end());
    out.push('\n');
}

/// One `Error for <host>: <error>` line per host without a row
#[must_use]
pub fn render_failures(failures: &[HostFailure]) -> String {
    failures.iter().map(|failure| format!("{failure}\n")).collect()
}

/// Render the aggregate as pretty JSON keyed by host, hidden columns included
///
/// # Errors
/// Returns error if serialization fails
pub fn render_json(aggregate: &ResultAggregate) -> serde_json::Result<String> {
    let sorted: BTreeMap<&str, &Row> = aggregate
        .hosts()
        .filter_map(|host| aggregate.get(host).map(|row| (host, row)))
        .collect();
    serde_json::to_string_pretty(&sorted)
}
