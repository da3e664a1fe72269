//! Derived per-customer fields: invoice ids, amounts, and currency text.

use std::sync::LazyLock;

use regex::Regex;

use dunning_shared::{CellValue, RowMap};

/// Column-name fragments that mark an invoice-id column.
pub const INVOICE_HINTS: &[&str] = &["invoice", "inv", "#"];

/// Column-name fragments that mark the amount owed on a row.
pub const AMOUNT_HINTS: &[&str] = &["balance", "amount", "total", "due"];

/// Currency symbols, thousands separators, and whitespace.
static AMOUNT_NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{Sc},\s]").expect("valid regex"));

/// Whether `column` contains any of `hints`, case-insensitively.
pub fn has_hint(column: &str, hints: &[&str]) -> bool {
    let lower = column.to_lowercase();
    hints.iter().any(|h| lower.contains(h))
}

/// Parse a cell as a money amount.
///
/// Text has currency symbols and commas stripped first. Empty, NaN, and
/// unparsable cells yield `None`.
pub fn parse_amount(cell: &CellValue) -> Option<f64> {
    match cell {
        CellValue::Number(n) if n.is_finite() => Some(*n),
        CellValue::Text(s) => {
            let cleaned = AMOUNT_NOISE.replace_all(s, "");
            if cleaned.is_empty() {
                return None;
            }
            cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
        }
        _ => None,
    }
}

/// Format as `$#,##0.00`; negatives get a leading minus (`-$5.00`).
pub fn format_currency(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}${grouped}.{:02}", cents % 100)
}

/// Sum of each row's first amount-like column.
///
/// Only the first column (in header order) whose name matches
/// [`AMOUNT_HINTS`] is considered per row. If that cell does not parse, the
/// row contributes nothing; later matching columns are not consulted.
pub fn total_amount(rows: &[RowMap]) -> f64 {
    rows.iter()
        .filter_map(|row| {
            row.iter()
                .find(|(column, _)| has_hint(column, AMOUNT_HINTS))
                .and_then(|(_, cell)| parse_amount(cell))
        })
        .sum()
}

/// Invoice id of each row, in row order. Rows without one are skipped.
pub fn invoice_ids(rows: &[RowMap]) -> Vec<String> {
    rows.iter().filter_map(invoice_id).collect()
}

/// The first hinted column's value, or else the first value with a digit.
fn invoice_id(row: &RowMap) -> Option<String> {
    let hinted = row
        .iter()
        .find(|(column, _)| has_hint(column, INVOICE_HINTS))
        .map(|(_, cell)| cell.to_string())
        .filter(|v| !v.trim().is_empty());

    let id = hinted.or_else(|| {
        row.iter()
            .map(|(_, cell)| cell.to_string())
            .find(|v| v.chars().any(char::is_numeric))
    })?;

    let id = id.trim();
    (!id.is_empty()).then(|| id.to_string())
}

/// Join ids for prose: none → "your invoices", one as-is, otherwise
/// "a, b and c".
pub fn join_ids(ids: &[String]) -> String {
    match ids {
        [] => "your invoices".to_string(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {last}", init.join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[(&str, CellValue)]) -> RowMap {
        cells.iter().cloned().collect()
    }

    #[test]
    fn join_covers_zero_one_two_three() {
        let ids = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(join_ids(&[]), "your invoices");
        assert_eq!(join_ids(&ids(&["A-1"])), "A-1");
        assert_eq!(join_ids(&ids(&["A-1", "A-2"])), "A-1 and A-2");
        assert_eq!(join_ids(&ids(&["A-1", "A-2", "A-3"])), "A-1, A-2 and A-3");
    }

    #[test]
    fn only_the_first_amount_column_counts() {
        let rows = vec![row(&[
            ("Customer", CellValue::from("Acme")),
            ("Amount", CellValue::Number(10.0)),
            ("Total", CellValue::Number(20.0)),
        ])];
        assert_eq!(total_amount(&rows), 10.0);
    }

    #[test]
    fn unparsable_first_match_contributes_nothing() {
        let rows = vec![
            row(&[
                ("Due Date", CellValue::from("2024-03-01")),
                ("Amount", CellValue::Number(50.0)),
            ]),
            row(&[
                ("Due Date", CellValue::Empty),
                ("Amount", CellValue::Number(25.0)),
            ]),
        ];
        assert_eq!(total_amount(&rows), 0.0);
    }

    #[test]
    fn currency_text_parses_and_sums() {
        let rows = vec![
            row(&[("Balance", CellValue::from("$1,234.56"))]),
            row(&[("Balance", CellValue::from("100"))]),
        ];
        assert!((total_amount(&rows) - 1334.56).abs() < 1e-9);
        assert_eq!(parse_amount(&CellValue::from("n/a")), None);
        assert_eq!(parse_amount(&CellValue::Number(f64::NAN)), None);
        assert_eq!(parse_amount(&CellValue::from("€ 12")), Some(12.0));
    }

    #[test]
    fn currency_formatting() {
        assert_eq!(format_currency(1234.56), "$1,234.56");
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(1_000_000.0), "$1,000,000.00");
        assert_eq!(format_currency(999.999), "$1,000.00");
        assert_eq!(format_currency(-5.0), "-$5.00");
    }

    #[test]
    fn invoice_ids_prefer_hinted_column() {
        let rows = vec![
            row(&[
                ("Date", CellValue::from("2024-01-02")),
                ("Inv #", CellValue::Number(1001.0)),
            ]),
            row(&[
                ("Date", CellValue::from("2024-01-09")),
                ("Inv #", CellValue::from(" INV-7 ")),
            ]),
        ];
        assert_eq!(invoice_ids(&rows), vec!["1001", "INV-7"]);
    }

    #[test]
    fn invoice_ids_fall_back_to_first_digit_value() {
        let rows = vec![
            row(&[
                ("Customer", CellValue::from("Acme")),
                ("Reference", CellValue::from("R-55")),
                ("Invoice", CellValue::Empty),
            ]),
            row(&[("Customer", CellValue::from("Acme"))]),
        ];
        assert_eq!(invoice_ids(&rows), vec!["R-55"]);
    }
}
