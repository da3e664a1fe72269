//! Tabular-engine strategies backed by `calamine`.
//!
//! The auto-detecting engine goes first; the explicit engines cover files
//! whose extension lies about their format (a legacy `.xls` saved as `.xlsx`
//! and the reverse).

use std::fmt::Display;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use calamine::{Reader, Xls, Xlsb, Xlsx, open_workbook, open_workbook_auto};

use dunning_shared::{DunningError, RawTable, Result};

use super::{SheetNameStrategy, Strategy, TableStrategy, decode_cell, extension, table_from_rows};

/// Generic auto-detect by extension and content.
pub struct AutoDetectEngine;

/// Explicit legacy binary (`.xls`, BIFF) engine.
pub struct XlsEngine;

/// Explicit XML-zip (`.xlsx`/`.xlsm`) engine.
pub struct XlsxEngine;

/// Binary workbook (`.xlsb`) engine; only for `.xlsb` files.
pub struct XlsbEngine;

impl Strategy for AutoDetectEngine {
    fn name(&self) -> &str {
        "auto-detect"
    }
}

impl SheetNameStrategy for AutoDetectEngine {
    fn sheet_names(&self, path: &Path) -> Result<Vec<String>> {
        let workbook = open_workbook_auto(path).map_err(|e| DunningError::strategy(self.name(), e))?;
        Ok(workbook.sheet_names())
    }
}

impl TableStrategy for AutoDetectEngine {
    fn read_table(&self, path: &Path, sheet: &str) -> Result<RawTable> {
        let mut workbook =
            open_workbook_auto(path).map_err(|e| DunningError::strategy(self.name(), e))?;
        let range = workbook
            .worksheet_range(sheet)
            .map_err(|e| DunningError::strategy(self.name(), e))?;
        Ok(range_to_table(&range))
    }
}

impl Strategy for XlsEngine {
    fn name(&self) -> &str {
        "xls"
    }
}

impl SheetNameStrategy for XlsEngine {
    fn sheet_names(&self, path: &Path) -> Result<Vec<String>> {
        list_with::<Xls<_>>(self.name(), path)
    }
}

impl TableStrategy for XlsEngine {
    fn read_table(&self, path: &Path, sheet: &str) -> Result<RawTable> {
        read_with::<Xls<_>>(self.name(), path, sheet)
    }
}

impl Strategy for XlsxEngine {
    fn name(&self) -> &str {
        "xlsx"
    }
}

impl SheetNameStrategy for XlsxEngine {
    fn sheet_names(&self, path: &Path) -> Result<Vec<String>> {
        list_with::<Xlsx<_>>(self.name(), path)
    }
}

impl TableStrategy for XlsxEngine {
    fn read_table(&self, path: &Path, sheet: &str) -> Result<RawTable> {
        read_with::<Xlsx<_>>(self.name(), path, sheet)
    }
}

impl Strategy for XlsbEngine {
    fn name(&self) -> &str {
        "xlsb"
    }

    fn applies_to(&self, path: &Path) -> bool {
        cfg!(feature = "xlsb") && extension(path) == "xlsb"
    }
}

impl SheetNameStrategy for XlsbEngine {
    fn sheet_names(&self, path: &Path) -> Result<Vec<String>> {
        list_with::<Xlsb<_>>(self.name(), path)
    }
}

impl TableStrategy for XlsbEngine {
    fn read_table(&self, path: &Path, sheet: &str) -> Result<RawTable> {
        read_with::<Xlsb<_>>(self.name(), path, sheet)
    }
}

fn list_with<R>(name: &str, path: &Path) -> Result<Vec<String>>
where
    R: Reader<BufReader<File>>,
    R::Error: Display,
{
    let workbook: R = open_workbook(path).map_err(|e| DunningError::strategy(name, e))?;
    Ok(workbook.sheet_names())
}

fn read_with<R>(name: &str, path: &Path, sheet: &str) -> Result<RawTable>
where
    R: Reader<BufReader<File>>,
    R::Error: Display,
{
    let mut workbook: R = open_workbook(path).map_err(|e| DunningError::strategy(name, e))?;
    let range = workbook
        .worksheet_range(sheet)
        .map_err(|e| DunningError::strategy(name, e))?;
    Ok(range_to_table(&range))
}

fn range_to_table(range: &calamine::Range<calamine::Data>) -> RawTable {
    let rows = range
        .rows()
        .map(|row| row.iter().map(decode_cell).collect())
        .collect();
    table_from_rows(rows, true)
}
