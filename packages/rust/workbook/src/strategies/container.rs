//! Direct structural read of the XML-zip container.
//!
//! Bypasses extension sniffing and opens the file as `.xlsx`, trying several
//! open modes: streamed from disk or fully loaded into memory, and cached cell
//! values or formula text. Raw rows are kept as-is (blank rows included).

use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;

use calamine::{Reader, Xlsx};
use tracing::debug;

use dunning_shared::{CellValue, DunningError, RawTable, Result};

use super::{SheetNameStrategy, Strategy, TableStrategy, decode_cell, table_from_rows};

/// How the container bytes reach the zip reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Buffered reads straight from the file.
    Streamed,
    /// The whole file read into memory first.
    Loaded,
}

/// Which cell content to take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueMode {
    /// Values cached by the authoring application.
    Cached,
    /// Formula text (`=SUM(...)`) where a cell has one, cached value otherwise.
    Formulas,
}

/// Open-mode combinations, in the order they are tried.
pub const OPEN_MODES: [(Access, ValueMode); 3] = [
    (Access::Streamed, ValueMode::Cached),
    (Access::Loaded, ValueMode::Cached),
    (Access::Streamed, ValueMode::Formulas),
];

/// Opens the container directly with each of [`OPEN_MODES`].
pub struct DirectContainerRead;

impl DirectContainerRead {
    /// Raw rows of `sheet` under one open mode; `None` if the sheet is absent.
    pub fn raw_rows(
        &self,
        path: &Path,
        sheet: &str,
        access: Access,
        values: ValueMode,
    ) -> Result<Option<Vec<Vec<CellValue>>>> {
        match access {
            Access::Streamed => {
                let file = File::open(path).map_err(|e| DunningError::io(path, e))?;
                let mut workbook = self.open(BufReader::new(file))?;
                self.rows_from(&mut workbook, sheet, values)
            }
            Access::Loaded => {
                let bytes = std::fs::read(path).map_err(|e| DunningError::io(path, e))?;
                let mut workbook = self.open(Cursor::new(bytes))?;
                self.rows_from(&mut workbook, sheet, values)
            }
        }
    }

    fn list(&self, path: &Path, access: Access) -> Result<Vec<String>> {
        match access {
            Access::Streamed => {
                let file = File::open(path).map_err(|e| DunningError::io(path, e))?;
                Ok(self.open(BufReader::new(file))?.sheet_names())
            }
            Access::Loaded => {
                let bytes = std::fs::read(path).map_err(|e| DunningError::io(path, e))?;
                Ok(self.open(Cursor::new(bytes))?.sheet_names())
            }
        }
    }

    fn open<RS: Read + Seek>(&self, reader: RS) -> Result<Xlsx<RS>> {
        Xlsx::new(reader).map_err(|e| DunningError::strategy(self.name(), e))
    }

    fn rows_from<RS: Read + Seek>(
        &self,
        workbook: &mut Xlsx<RS>,
        sheet: &str,
        values: ValueMode,
    ) -> Result<Option<Vec<Vec<CellValue>>>> {
        if !workbook.sheet_names().iter().any(|s| s == sheet) {
            return Ok(None);
        }

        let range = workbook
            .worksheet_range(sheet)
            .map_err(|e| DunningError::strategy(self.name(), e))?;

        let formulas = match values {
            ValueMode::Cached => None,
            ValueMode::Formulas => Some(
                workbook
                    .worksheet_formula(sheet)
                    .map_err(|e| DunningError::strategy(self.name(), e))?,
            ),
        };

        let (start_row, start_col) = range.start().unwrap_or((0, 0));
        let rows = range
            .rows()
            .enumerate()
            .map(|(r, row)| {
                row.iter()
                    .enumerate()
                    .map(|(c, cell)| {
                        let at = (start_row + r as u32, start_col + c as u32);
                        match formulas.as_ref().and_then(|f| f.get_value(at)) {
                            Some(formula) if !formula.is_empty() => {
                                CellValue::Text(format!("={formula}"))
                            }
                            _ => decode_cell(cell),
                        }
                    })
                    .collect()
            })
            .collect();
        Ok(Some(rows))
    }
}

impl Strategy for DirectContainerRead {
    fn name(&self) -> &str {
        "direct-container"
    }
}

impl SheetNameStrategy for DirectContainerRead {
    fn sheet_names(&self, path: &Path) -> Result<Vec<String>> {
        // Value modes do not affect the sheet list; only access modes matter.
        let mut last_err = None;
        for access in [Access::Streamed, Access::Loaded] {
            match self.list(path, access) {
                Ok(names) if !names.is_empty() => return Ok(names),
                Ok(_) => debug!(?access, "container lists no sheets"),
                Err(e) => {
                    debug!(?access, error = %e, "container open failed");
                    last_err = Some(e);
                }
            }
        }
        match last_err {
            Some(e) => Err(e),
            None => Ok(Vec::new()),
        }
    }
}

impl TableStrategy for DirectContainerRead {
    fn read_table(&self, path: &Path, sheet: &str) -> Result<RawTable> {
        let mut last_err = None;
        for (access, values) in OPEN_MODES {
            match self.raw_rows(path, sheet, access, values) {
                Ok(Some(rows)) => return Ok(table_from_rows(rows, false)),
                Ok(None) => debug!(?access, ?values, sheet, "sheet not in container"),
                Err(e) => {
                    debug!(?access, ?values, error = %e, "direct read failed");
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| {
            DunningError::strategy(self.name(), format!("sheet '{sheet}' not found"))
        }))
    }
}
