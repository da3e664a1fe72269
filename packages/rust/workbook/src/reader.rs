//! Table-reading cascade: engines first, direct container read as fallback.

use std::path::Path;

use tracing::{debug, info, instrument, warn};

use dunning_shared::{DunningError, RawTable, Result};

use crate::strategies::{
    AutoDetectEngine, DirectContainerRead, TableStrategy, XlsEngine, XlsbEngine, XlsxEngine,
};

/// A loaded sheet plus the strategy that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedTable {
    pub table: RawTable,
    pub strategy: String,
}

/// Loads one sheet into a [`RawTable`].
pub struct TableReader {
    engines: Vec<Box<dyn TableStrategy>>,
    fallback: Box<dyn TableStrategy>,
}

impl TableReader {
    /// Built-in engines with the direct container read as fallback.
    pub fn new() -> Self {
        Self::with_strategies(
            vec![
                Box::new(AutoDetectEngine),
                Box::new(XlsEngine),
                Box::new(XlsxEngine),
                Box::new(XlsbEngine),
            ],
            Box::new(DirectContainerRead),
        )
    }

    pub fn with_strategies(
        engines: Vec<Box<dyn TableStrategy>>,
        fallback: Box<dyn TableStrategy>,
    ) -> Self {
        Self { engines, fallback }
    }

    /// Read `sheet` from `path`.
    ///
    /// An engine result counts only if it has rows or at least one column.
    /// The fallback's result is taken as-is, even when empty.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn read(&self, path: &Path, sheet: &str) -> Result<LoadedTable> {
        for engine in &self.engines {
            if !engine.applies_to(path) {
                continue;
            }
            match engine.read_table(path, sheet) {
                Ok(table) if !table.is_empty() || !table.columns().is_empty() => {
                    info!(strategy = engine.name(), rows = table.len(), "sheet loaded");
                    return Ok(LoadedTable {
                        table,
                        strategy: engine.name().to_string(),
                    });
                }
                Ok(_) => debug!(strategy = engine.name(), "engine returned an empty table"),
                Err(e) => warn!(strategy = engine.name(), error = %e, "engine failed"),
            }
        }

        match self.fallback.read_table(path, sheet) {
            Ok(table) => {
                info!(strategy = self.fallback.name(), rows = table.len(), "sheet loaded by fallback");
                Ok(LoadedTable {
                    table,
                    strategy: self.fallback.name().to_string(),
                })
            }
            Err(e) => Err(DunningError::UnreadableSheet {
                sheet: sheet.to_string(),
                message: e.to_string(),
            }),
        }
    }
}

impl Default for TableReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::Strategy;
    use dunning_shared::CellValue;

    struct Canned(&'static str, Option<RawTable>);
    impl Strategy for Canned {
        fn name(&self) -> &str {
            self.0
        }
    }
    impl TableStrategy for Canned {
        fn read_table(&self, _path: &Path, _sheet: &str) -> Result<RawTable> {
            self.1
                .clone()
                .ok_or_else(|| DunningError::strategy(self.0, "cannot read"))
        }
    }

    fn one_row() -> RawTable {
        RawTable::new(vec!["Customer".into()], vec![vec![CellValue::from("Acme")]])
    }

    #[test]
    fn empty_engine_result_is_skipped() {
        let reader = TableReader::with_strategies(
            vec![
                Box::new(Canned("blank", Some(RawTable::empty()))),
                Box::new(Canned("good", Some(one_row()))),
            ],
            Box::new(Canned("fallback", None)),
        );
        let loaded = reader.read(Path::new("x.xlsx"), "Data").expect("read");
        assert_eq!(loaded.strategy, "good");
        assert_eq!(loaded.table.len(), 1);
    }

    #[test]
    fn fallback_accepts_empty_table() {
        let reader = TableReader::with_strategies(
            vec![Box::new(Canned("broken", None))],
            Box::new(Canned("fallback", Some(RawTable::empty()))),
        );
        let loaded = reader.read(Path::new("x.xlsx"), "Data").expect("read");
        assert_eq!(loaded.strategy, "fallback");
        assert!(loaded.table.is_empty());
    }

    #[test]
    fn failed_fallback_names_the_sheet() {
        let reader = TableReader::with_strategies(
            vec![Box::new(Canned("broken", None))],
            Box::new(Canned("fallback", None)),
        );
        match reader.read(Path::new("x.xlsx"), "Data").unwrap_err() {
            DunningError::UnreadableSheet { sheet, .. } => assert_eq!(sheet, "Data"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn reads_real_workbook_with_blank_header() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("book.xlsx");
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("Data").expect("name");
        sheet.write_string(0, 0, "Customer").expect("write");
        sheet.write_string(0, 2, "Amount").expect("write");
        sheet.write_string(1, 0, "Acme").expect("write");
        sheet.write_number(1, 2, 125.5).expect("write");
        workbook.save(&path).expect("save");

        let loaded = TableReader::new().read(&path, "Data").expect("read");
        assert_eq!(loaded.strategy, "auto-detect");
        assert_eq!(loaded.table.columns(), ["Customer", "Column_2", "Amount"]);
        assert_eq!(loaded.table.cell(0, "Amount"), Some(&CellValue::Number(125.5)));
    }

    #[test]
    fn date_cells_read_as_timestamp_text() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("dates.xlsx");
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("Data").expect("name");
        sheet.write_string(0, 0, "Due Date").expect("write");
        let date = rust_xlsxwriter::ExcelDateTime::from_ymd(2024, 1, 15).expect("date");
        let format = rust_xlsxwriter::Format::new().set_num_format("yyyy-mm-dd");
        sheet
            .write_datetime_with_format(1, 0, &date, &format)
            .expect("write");
        workbook.save(&path).expect("save");

        let loaded = TableReader::new().read(&path, "Data").expect("read");
        assert_eq!(
            loaded.table.cell(0, "Due Date"),
            Some(&CellValue::from("2024-01-15 00:00:00"))
        );
    }

    #[test]
    fn direct_container_reads_formula_text() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("formulas.xlsx");
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("Data").expect("name");
        sheet.write_string(0, 0, "Total").expect("write");
        sheet.write_formula(1, 0, "=1+2").expect("write");
        workbook.save(&path).expect("save");

        let rows = DirectContainerRead
            .raw_rows(&path, "Data", crate::Access::Streamed, crate::ValueMode::Formulas)
            .expect("read")
            .expect("sheet present");
        assert_eq!(rows[1][0], CellValue::from("=1+2"));

        let missing = DirectContainerRead
            .raw_rows(&path, "Nope", crate::Access::Loaded, crate::ValueMode::Cached)
            .expect("read");
        assert!(missing.is_none());
    }
}
