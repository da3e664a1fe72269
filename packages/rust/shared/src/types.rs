//! Core domain types: cells, raw sheet tables, and per-customer records.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

// ---------------------------------------------------------------------------
// CellValue
// ---------------------------------------------------------------------------

/// A single spreadsheet cell after engine-specific decoding.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// Blank, missing, error, or NaN cell.
    #[default]
    Empty,
    /// Textual content, kept verbatim.
    Text(String),
    /// Numeric content.
    Number(f64),
}

impl CellValue {
    /// Whether the cell carries no value (blank or NaN).
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Number(n) => n.is_nan(),
            Self::Text(_) => false,
        }
    }

    /// Build a cell from raw text, mapping the empty string to [`CellValue::Empty`].
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.is_empty() { Self::Empty } else { Self::Text(s) }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Text(s) => f.write_str(s),
            Self::Number(n) if n.is_nan() => Ok(()),
            // Whole numbers (invoice ids stored as floats) print without ".0".
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

// ---------------------------------------------------------------------------
// RowMap
// ---------------------------------------------------------------------------

/// An ordered column-name → cell mapping for one source row.
///
/// Inserting an existing key replaces the value in place, so the key keeps its
/// first position while the later value wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowMap(Vec<(String, CellValue)>);

impl RowMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value. Returns `true` if the key already existed.
    pub fn insert(&mut self, key: impl Into<String>, value: CellValue) -> bool {
        let key = key.into();
        if let Some(slot) = self.0.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
            true
        } else {
            self.0.push((key, value));
            false
        }
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, CellValue)> for RowMap {
    fn from_iter<I: IntoIterator<Item = (K, CellValue)>>(iter: I) -> Self {
        let mut row = RowMap::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

// ---------------------------------------------------------------------------
// RawTable
// ---------------------------------------------------------------------------

/// One sheet loaded into memory: a header row plus positional data rows.
///
/// Duplicate headers are preserved; collisions only matter once rows are
/// viewed as [`RowMap`]s.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl RawTable {
    /// Build a table, padding or truncating each row to the header width.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, CellValue::Empty);
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// A table with no columns and no rows.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// Number of data rows (the header is not counted).
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Trim and title-case every header in place.
    pub fn normalize_headers(&mut self) {
        for col in &mut self.columns {
            *col = normalize_header(col);
        }
    }

    /// Headers that occur more than once, in first-seen order.
    pub fn duplicate_columns(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut dups = Vec::new();
        for col in &self.columns {
            if !seen.insert(col.as_str()) && !dups.contains(col) {
                dups.push(col.clone());
            }
        }
        dups
    }

    /// Cell of `row` under `column`. With duplicate headers the last one wins,
    /// matching the [`RowMap`] view.
    pub fn cell(&self, row: usize, column: &str) -> Option<&CellValue> {
        let idx = self.columns.iter().rposition(|c| c == column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// View one row as an ordered column → value map.
    pub fn row_map(&self, row: usize) -> RowMap {
        let mut map = RowMap::new();
        if let Some(cells) = self.rows.get(row) {
            for (col, cell) in self.columns.iter().zip(cells) {
                map.insert(col.clone(), cell.clone());
            }
        }
        map
    }
}

/// Trim a header and title-case it the way spreadsheet users expect:
/// a letter following another letter is lowercased, any other letter is
/// uppercased ("amount due" → "Amount Due", "INV#" → "Inv#").
pub fn normalize_header(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut prev_cased = false;
    for c in raw.trim().chars() {
        if c.is_alphabetic() {
            if prev_cased {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_cased = true;
        } else {
            out.push(c);
            prev_cased = false;
        }
    }
    out
}

// ---------------------------------------------------------------------------
// CustomerRecords
// ---------------------------------------------------------------------------

/// Rows grouped by customer key, in first-seen customer order.
///
/// Every stored row list is non-empty: a customer only exists once a row has
/// been appended for it.
#[derive(Debug, Clone, Default)]
pub struct CustomerRecords {
    entries: Vec<(String, Vec<RowMap>)>,
    index: HashMap<String, usize>,
}

impl CustomerRecords {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row under `customer`, creating the group on first sight.
    pub fn append(&mut self, customer: impl Into<String>, row: RowMap) {
        let customer = customer.into();
        match self.index.get(&customer) {
            Some(&i) => self.entries[i].1.push(row),
            None => {
                self.index.insert(customer.clone(), self.entries.len());
                self.entries.push((customer, vec![row]));
            }
        }
    }

    pub fn get(&self, customer: &str) -> Option<&[RowMap]> {
        self.index
            .get(customer)
            .map(|&i| self.entries[i].1.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[RowMap])> {
        self.entries
            .iter()
            .map(|(k, rows)| (k.as_str(), rows.as_slice()))
    }

    pub fn customers(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Number of customers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total rows across all customers.
    pub fn row_count(&self) -> usize {
        self.entries.iter().map(|(_, rows)| rows.len()).sum()
    }
}

// ---------------------------------------------------------------------------
// Notice
// ---------------------------------------------------------------------------

/// A rendered overdue notice for one customer, as handed to a delivery sink.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub customer: String,
    /// Raw address text from the address book, if any.
    pub address: Option<String>,
    pub subject: String,
    pub html: String,
    pub plain: String,
    pub total: f64,
    /// Invoice ids joined for prose ("A-1, A-2 and A-3").
    pub invoice_list: String,
    /// Number of invoice ids found across the rows.
    pub invoice_count: usize,
    pub rows: Vec<RowMap>,
}
