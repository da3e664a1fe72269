//! Tabular rendering of a customer's rows as HTML or aligned plain text.
//!
//! The header set is taken from the first row only; cells missing from later
//! rows render empty. Currency-like columns are right-aligned and shown as
//! `$#,##0.00` when their value parses.

use std::fmt::Write as _;

use quick_xml::escape::escape;

use dunning_shared::RowMap;

use crate::invoice::{format_currency, has_hint, parse_amount};

/// Column-name fragments that mark a currency column for display.
pub const CURRENCY_HINTS: &[&str] = &["amount", "balance", "total", "price", "due"];

const EMPTY_TABLE_HTML: &str = "<p>No invoice data available.</p>";

pub fn is_currency_column(column: &str) -> bool {
    has_hint(column, CURRENCY_HINTS)
}

/// Header set for a row list: the first row's columns, in order.
pub fn header_set(rows: &[RowMap]) -> Vec<&str> {
    rows.first()
        .map(|row| row.keys().collect())
        .unwrap_or_default()
}

/// Display text of one cell under `column`.
pub fn display_value(row: &RowMap, column: &str) -> String {
    let Some(cell) = row.get(column) else {
        return String::new();
    };
    if is_currency_column(column) {
        if let Some(amount) = parse_amount(cell) {
            return format_currency(amount);
        }
    }
    cell.to_string()
}

/// Every row's display values under the first row's header set.
fn display_grid(rows: &[RowMap], headers: &[&str]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| headers.iter().map(|h| display_value(row, h)).collect())
        .collect()
}

/// HTML `<table>` with inline styles for mail clients.
pub fn html_table(rows: &[RowMap]) -> String {
    let headers = header_set(rows);
    if headers.is_empty() {
        return EMPTY_TABLE_HTML.to_string();
    }

    let mut html = String::from(
        "<table border='1' style='border-collapse: collapse; width: 100%; \
         font-family: Arial, sans-serif; font-size: 12px;'>\n\
         <tr style='background-color: #f2f2f2;'>",
    );
    for header in &headers {
        let _ = write!(
            html,
            "<th style='padding: 8px; text-align: left;'>{}</th>",
            escape(*header)
        );
    }
    html.push_str("</tr>\n");

    for values in display_grid(rows, &headers) {
        html.push_str("<tr>");
        for (header, value) in headers.iter().zip(&values) {
            let style = if is_currency_column(header) {
                "padding: 6px; text-align: right;"
            } else {
                "padding: 6px;"
            };
            let _ = write!(html, "<td style='{style}'>{}</td>", escape(value.as_str()));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</table>");
    html
}

/// Plain-text table with `" | "` separators and padded columns.
pub fn plain_table(rows: &[RowMap]) -> String {
    let headers = header_set(rows);
    if headers.is_empty() {
        return String::new();
    }
    let grid = display_grid(rows, &headers);

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            grid.iter()
                .map(|values| values[i].chars().count())
                .chain(std::iter::once(h.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |cells: Vec<String>| -> String {
        cells
            .iter()
            .zip(&headers)
            .zip(&widths)
            .map(|((cell, header), &width)| {
                if is_currency_column(header) {
                    format!("{cell:>width$}")
                } else {
                    format!("{cell:<width$}")
                }
            })
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut text = line(headers.iter().map(|h| h.to_string()).collect());
    text.push('\n');
    let rule_width = widths.iter().sum::<usize>() + 3 * (widths.len() - 1);
    text.push_str(&"-".repeat(rule_width));
    text.push('\n');
    for values in grid {
        text.push_str(&line(values));
        text.push('\n');
    }
    text
}
