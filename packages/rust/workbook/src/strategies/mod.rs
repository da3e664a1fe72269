//! Reader strategy traits and built-in strategies.
//!
//! Strategies are tried in priority order by [`SheetResolver`] and
//! [`TableReader`]; the first one producing a usable result wins. Failures
//! are assumed deterministic (format mismatch), so a failed strategy is
//! never retried.
//!
//! [`SheetResolver`]: crate::SheetResolver
//! [`TableReader`]: crate::TableReader

mod container;
mod desktop;
mod engines;
mod workbook_xml;

use std::path::Path;

use calamine::Data;

use dunning_shared::{CellValue, RawTable, Result};

pub use container::{Access, DirectContainerRead, OPEN_MODES, ValueMode};
pub use desktop::DesktopAutomation;
pub use engines::{AutoDetectEngine, XlsEngine, XlsbEngine, XlsxEngine};
pub use workbook_xml::{WorkbookXmlParse, parse_sheet_names};

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Common identity of every reader strategy.
pub trait Strategy: Send + Sync {
    /// Human-readable strategy name for tracing and reporting.
    fn name(&self) -> &str;

    /// Whether this strategy should be attempted for `path` at all
    /// (extension gates, platform gates).
    fn applies_to(&self, _path: &Path) -> bool {
        true
    }
}

/// A way of listing the sheet names of a workbook.
pub trait SheetNameStrategy: Strategy {
    fn sheet_names(&self, path: &Path) -> Result<Vec<String>>;
}

/// A way of loading one sheet into a [`RawTable`].
pub trait TableStrategy: Strategy {
    fn read_table(&self, path: &Path, sheet: &str) -> Result<RawTable>;
}

// ---------------------------------------------------------------------------
// Shared decoding helpers
// ---------------------------------------------------------------------------

/// Decode a calamine cell into the uniform [`CellValue`].
pub(crate) fn decode_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) => CellValue::text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Text(if *b { "True" } else { "False" }.into()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ts) => CellValue::Text(ts.to_string()),
            None => CellValue::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::text(s.clone()),
        #[allow(unreachable_patterns)]
        _ => CellValue::Empty,
    }
}

/// Header labels for a header row; blank cells become `Column_N` (1-based).
pub(crate) fn header_labels(header: &[CellValue]) -> Vec<String> {
    header
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let label = cell.to_string();
            if label.trim().is_empty() {
                format!("Column_{}", i + 1)
            } else {
                label
            }
        })
        .collect()
}

/// Build a table from decoded rows: first row is the header.
///
/// With `skip_blank_rows`, rows where every cell is empty are dropped.
pub(crate) fn table_from_rows(rows: Vec<Vec<CellValue>>, skip_blank_rows: bool) -> RawTable {
    let mut rows = rows.into_iter();
    let Some(header) = rows.next() else {
        return RawTable::empty();
    };
    let columns = header_labels(&header);
    let data = rows
        .filter(|row| !skip_blank_rows || row.iter().any(|c| !c.is_empty()))
        .collect();
    RawTable::new(columns, data)
}

/// File extension, lowercased.
pub(crate) fn extension(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}
