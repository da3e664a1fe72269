//! Customer aggregation: group data rows by the chosen customer column.

use tracing::{info, instrument, warn};

use dunning_shared::{CellValue, CustomerRecords, RawTable, RowMap};

/// Textual NaN left behind by spreadsheet exports.
const NAN_SENTINEL: &str = "nan";

/// Normalize headers in place and warn once per colliding name.
///
/// On a collision the later column's value wins in every row map.
pub fn normalize_table(table: &mut RawTable) {
    table.normalize_headers();
    for column in table.duplicate_columns() {
        warn!(column, "duplicate column after normalization; later column wins");
    }
}

/// The trimmed customer key of a cell, if it names a customer.
pub fn customer_key(raw: &str) -> Option<&str> {
    let key = raw.trim();
    (!key.is_empty() && key != NAN_SENTINEL).then_some(key)
}

/// Group `table`'s rows under `customer_column`.
///
/// Expects headers to be normalized already (see [`normalize_table`]) so the
/// column name matches what the selector offered. Customers keep first-seen
/// order and rows keep source order.
#[instrument(skip(table), fields(rows = table.len()))]
pub fn aggregate(table: &RawTable, customer_column: &str) -> CustomerRecords {
    let mut records = CustomerRecords::new();
    for row in 0..table.len() {
        let raw = table
            .cell(row, customer_column)
            .map(|c| c.to_string())
            .unwrap_or_default();
        let Some(key) = customer_key(&raw) else {
            continue;
        };
        records.append(key, coerce_missing(table.row_map(row)));
    }
    info!(
        customers = records.len(),
        rows = records.row_count(),
        "rows grouped by customer"
    );
    records
}

/// NaN cells become [`CellValue::Empty`].
fn coerce_missing(row: RowMap) -> RowMap {
    row.iter()
        .map(|(column, cell)| {
            let cell = if cell.is_empty() { CellValue::Empty } else { cell.clone() };
            (column, cell)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(columns: &[&str], rows: Vec<Vec<CellValue>>) -> RawTable {
        RawTable::new(columns.iter().map(|s| s.to_string()).collect(), rows)
    }

    #[test]
    fn groups_in_first_seen_order() {
        let t = table(
            &["Customer", "Invoice"],
            vec![
                vec!["Beta".into(), "B-1".into()],
                vec!["Alpha".into(), "A-1".into()],
                vec![" Beta ".into(), "B-2".into()],
            ],
        );
        let records = aggregate(&t, "Customer");
        assert_eq!(records.customers().collect::<Vec<_>>(), vec!["Beta", "Alpha"]);
        let beta = records.get("Beta").expect("beta");
        assert_eq!(beta.len(), 2);
        assert_eq!(beta[0].get("Invoice"), Some(&CellValue::from("B-1")));
        assert_eq!(beta[1].get("Invoice"), Some(&CellValue::from("B-2")));
    }

    #[test]
    fn blank_and_nan_customers_are_dropped() {
        let t = table(
            &["Customer", "Amount"],
            vec![
                vec![CellValue::Empty, 1.0.into()],
                vec!["   ".into(), 2.0.into()],
                vec!["nan".into(), 3.0.into()],
                vec![CellValue::Number(f64::NAN), 4.0.into()],
                vec!["Acme".into(), 5.0.into()],
            ],
        );
        let records = aggregate(&t, "Customer");
        assert_eq!(records.len(), 1);
        assert_eq!(records.row_count(), 1);
    }

    #[test]
    fn keys_are_case_sensitive() {
        let t = table(
            &["Customer"],
            vec![vec!["acme".into()], vec!["Acme".into()]],
        );
        assert_eq!(aggregate(&t, "Customer").len(), 2);
    }

    #[test]
    fn missing_cells_become_empty() {
        let t = table(
            &["Customer", "Notes"],
            vec![vec!["Acme".into(), CellValue::Number(f64::NAN)], vec!["Acme".into()]],
        );
        let records = aggregate(&t, "Customer");
        let rows = records.get("Acme").expect("acme");
        assert!(rows.iter().all(|r| r.get("Notes") == Some(&CellValue::Empty)));
    }

    #[test]
    fn normalization_then_grouping() {
        let mut t = table(
            &[" customer name ", "TOTAL", "total"],
            vec![vec!["Acme".into(), 1.0.into(), 2.0.into()]],
        );
        normalize_table(&mut t);
        assert_eq!(t.columns(), ["Customer Name", "Total", "Total"]);
        let records = aggregate(&t, "Customer Name");
        let row = &records.get("Acme").expect("acme")[0];
        assert_eq!(row.get("Total"), Some(&CellValue::Number(2.0)));
        assert_eq!(row.len(), 2);
    }

    #[test]
    fn unknown_column_yields_nothing() {
        let t = table(&["Customer"], vec![vec!["Acme".into()]]);
        assert!(aggregate(&t, "Client").is_empty());
    }
}
