//! Last-resort sheet listing: unzip the container and read `xl/workbook.xml`.
//!
//! Works even when the worksheet parts are damaged, since only the workbook
//! part's `<sheet name="...">` elements are needed.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::NsReader;
use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use zip::ZipArchive;

use dunning_shared::{DunningError, Result};

use super::{SheetNameStrategy, Strategy};

/// SpreadsheetML main namespace.
const SPREADSHEET_NS: &[u8] = b"http://schemas.openxmlformats.org/spreadsheetml/2006/main";

/// Workbook part inside the container.
const WORKBOOK_PART: &str = "xl/workbook.xml";

/// Manual unzip + XML parse of the workbook part.
pub struct WorkbookXmlParse;

impl Strategy for WorkbookXmlParse {
    fn name(&self) -> &str {
        "workbook-xml"
    }
}

impl SheetNameStrategy for WorkbookXmlParse {
    fn sheet_names(&self, path: &Path) -> Result<Vec<String>> {
        let file = File::open(path).map_err(|e| DunningError::io(path, e))?;
        let mut archive = ZipArchive::new(file).map_err(|e| DunningError::strategy(self.name(), e))?;
        let part = archive
            .by_name(WORKBOOK_PART)
            .map_err(|e| DunningError::strategy(self.name(), format!("{WORKBOOK_PART}: {e}")))?;
        parse_sheet_names(BufReader::new(part))
    }
}

/// Collect the `name` attribute of every namespaced `<sheet>` element.
pub fn parse_sheet_names<R: BufRead>(source: R) -> Result<Vec<String>> {
    let mut reader = NsReader::from_reader(source);
    reader.config_mut().trim_text(true);

    let mut names = Vec::new();
    let mut buf = Vec::new();
    loop {
        let event = reader
            .read_resolved_event_into(&mut buf)
            .map_err(|e| DunningError::strategy("workbook-xml", e))?;
        match event {
            (ResolveResult::Bound(Namespace(ns)), Event::Start(e) | Event::Empty(e))
                if ns == SPREADSHEET_NS && e.local_name().as_ref() == b"sheet" =>
            {
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"name" {
                        let value = attr
                            .unescape_value()
                            .map_err(|e| DunningError::strategy("workbook-xml", e))?;
                        if !value.is_empty() {
                            names.push(value.into_owned());
                        }
                    }
                }
            }
            (_, Event::Eof) => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_namespaced_sheet_elements() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"
          xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <sheets>
    <sheet name="Data" sheetId="1" r:id="rId1"/>
    <sheet name="Emails &amp; Contacts" sheetId="2" r:id="rId2"/>
  </sheets>
</workbook>"#;
        let names = parse_sheet_names(xml.as_bytes()).expect("parse");
        assert_eq!(names, vec!["Data", "Emails & Contacts"]);
    }

    #[test]
    fn ignores_sheet_elements_outside_the_namespace() {
        let xml = r#"<workbook><sheets><sheet name="Ghost"/></sheets></workbook>"#;
        let names = parse_sheet_names(xml.as_bytes()).expect("parse");
        assert!(names.is_empty());
    }

    #[test]
    fn non_zip_file_is_a_strategy_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("plain.xlsx");
        std::fs::write(&path, b"not a zip archive").expect("write");
        let err = WorkbookXmlParse.sheet_names(&path).unwrap_err();
        assert!(matches!(err, DunningError::Strategy { .. }));
    }
}
