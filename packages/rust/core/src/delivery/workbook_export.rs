//! Spreadsheet export: one workbook with `Summary`, `Emails`, and a sheet per
//! customer, written next to the source workbook.
//!
//! Notices are collected by [`Sink::deliver`] and the file is written once in
//! [`Sink::finish`].

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError};
use tracing::{info, instrument, warn};

use dunning_render::{header_set, invoice_ids, is_currency_column, parse_amount};
use dunning_shared::{CellValue, DunningError, Notice, Recipients, Result};

use super::{DeliverySummary, Sink};
use crate::prompt::ChoiceSource;

/// Excel's sheet-name length limit.
const MAX_SHEET_NAME: usize = 31;
/// Excel's per-cell text limit.
const MAX_CELL_CHARS: usize = 32_767;
/// Excel reserves this sheet name for change tracking.
const RESERVED_SHEET_NAME: &str = "History";

const SUMMARY_HEADERS: [&str; 6] = [
    "Customer",
    "Email",
    "Subject",
    "Total",
    "Invoice List",
    "Invoice Count",
];
const EMAILS_HEADERS: [&str; 5] = ["Customer", "To", "Cc", "Subject", "HTML Body"];

/// `<dir>/<stem><suffix>.xlsx` beside `source`.
pub fn export_path(source: &Path, suffix: &str) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "workbook".to_string());
    let dir = source
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    dir.join(format!("{stem}{suffix}.xlsx"))
}

/// A valid, unique sheet name for `name`.
///
/// `: \ / ? * [ ]` become spaces, the result is cut to 31 characters with
/// edge apostrophes stripped, blank names become `Sheet`, and the reserved
/// `History` gets a suffix. Duplicates (case-insensitive, as Excel compares)
/// get `_1`, `_2`, ... suffixes within the limit. The chosen name is recorded
/// in `existing`.
pub fn safe_sheet_name(name: &str, existing: &mut HashSet<String>) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            ':' | '\\' | '/' | '?' | '*' | '[' | ']' => ' ',
            c => c,
        })
        .collect();
    let cut = clip_sheet_name(&cleaned, MAX_SHEET_NAME);
    let base = if cut.trim().is_empty() {
        "Sheet".to_string()
    } else {
        cut
    };

    let mut candidate = base.clone();
    let mut i = 1;
    while candidate.eq_ignore_ascii_case(RESERVED_SHEET_NAME)
        || existing.contains(&candidate.to_lowercase())
    {
        let suffix = format!("_{i}");
        let keep = MAX_SHEET_NAME - suffix.len();
        candidate = format!("{}{suffix}", clip_sheet_name(&base, keep));
        i += 1;
    }
    existing.insert(candidate.to_lowercase());
    candidate
}

/// First `max` characters of `name`, without leading or trailing apostrophes.
fn clip_sheet_name(name: &str, max: usize) -> String {
    let cut: String = name.trim_matches('\'').chars().take(max).collect();
    cut.trim_matches('\'').to_string()
}

/// Cell text within Excel's limit; longer text is cut and logged.
fn cell_text<'s>(text: &'s str, what: &str) -> &'s str {
    match text.char_indices().nth(MAX_CELL_CHARS) {
        Some((end, _)) => {
            warn!(
                field = what,
                chars = text.chars().count(),
                limit = MAX_CELL_CHARS,
                "cell text truncated for export"
            );
            &text[..end]
        }
        None => text,
    }
}

struct Formats {
    header: Format,
    text: Format,
    currency: Format,
    right: Format,
}

impl Formats {
    fn new() -> Self {
        Self {
            header: Format::new()
                .set_bold()
                .set_background_color(Color::RGB(0xF2F2F2))
                .set_border(FormatBorder::Thin),
            text: Format::new().set_border(FormatBorder::Thin),
            currency: Format::new()
                .set_num_format("$#,##0.00")
                .set_border(FormatBorder::Thin)
                .set_align(FormatAlign::Right),
            right: Format::new()
                .set_align(FormatAlign::Right)
                .set_border(FormatBorder::Thin),
        }
    }
}

/// Collects notices and writes the export workbook on finish.
pub struct WorkbookExportSink {
    target: PathBuf,
    cc: Recipients,
    collected: Vec<(Notice, String)>,
}

impl WorkbookExportSink {
    pub fn new(target: PathBuf, cc: Recipients) -> Self {
        Self {
            target,
            cc,
            collected: Vec::new(),
        }
    }

    #[instrument(skip(self), fields(target = %self.target.display(), customers = self.collected.len()))]
    fn write(&self) -> Result<()> {
        if self.target.exists() {
            if let Err(e) = std::fs::remove_file(&self.target) {
                warn!(error = %e, "could not remove previous export");
            }
        }
        self.build().map_err(|e| DunningError::Export(e.to_string()))?;
        info!("export written");
        Ok(())
    }

    fn build(&self) -> std::result::Result<(), XlsxError> {
        let formats = Formats::new();
        let mut names = HashSet::new();
        let mut workbook = Workbook::new();

        let mut summary = Worksheet::new();
        summary.set_name(safe_sheet_name("Summary", &mut names))?;
        let mut emails = Worksheet::new();
        emails.set_name(safe_sheet_name("Emails", &mut names))?;
        write_headers(&mut summary, &SUMMARY_HEADERS, &formats.header)?;
        write_headers(&mut emails, &EMAILS_HEADERS, &formats.header)?;

        let cc = self.cc.for_desktop();
        let mut customer_sheets = Vec::with_capacity(self.collected.len());

        for (i, (notice, address)) in self.collected.iter().enumerate() {
            let row = (i + 1) as u32;

            let customer = cell_text(&notice.customer, "customer");
            let address = cell_text(address, "email");
            let subject = cell_text(&notice.subject, "subject");

            summary.write_string_with_format(row, 0, customer, &formats.text)?;
            summary.write_string_with_format(row, 1, address, &formats.text)?;
            summary.write_string_with_format(row, 2, subject, &formats.text)?;
            summary.write_number_with_format(row, 3, notice.total, &formats.currency)?;
            summary.write_string_with_format(
                row,
                4,
                cell_text(&invoice_list_plain(notice), "invoice list"),
                &formats.text,
            )?;
            summary.write_number_with_format(
                row,
                5,
                notice.invoice_count as f64,
                &formats.right,
            )?;

            emails.write_string_with_format(row, 0, customer, &formats.text)?;
            emails.write_string_with_format(row, 1, address, &formats.text)?;
            emails.write_string_with_format(row, 2, cell_text(&cc, "cc"), &formats.text)?;
            emails.write_string_with_format(row, 3, subject, &formats.text)?;
            emails.write_string(row, 4, cell_text(&notice.html, "html body"))?;

            let mut sheet = Worksheet::new();
            sheet.set_name(safe_sheet_name(&notice.customer, &mut names))?;
            write_customer_rows(&mut sheet, notice, &formats)?;
            customer_sheets.push(sheet);
        }

        for col in 0..SUMMARY_HEADERS.len() as u16 {
            summary.set_column_width(col, if col < 3 { 20 } else { 18 })?;
        }

        workbook.push_worksheet(summary);
        workbook.push_worksheet(emails);
        for sheet in customer_sheets {
            workbook.push_worksheet(sheet);
        }
        workbook.save(&self.target)
    }
}

/// Invoice ids as a plain comma list for the summary sheet.
fn invoice_list_plain(notice: &Notice) -> String {
    invoice_ids(&notice.rows).join(", ")
}

fn write_headers(
    sheet: &mut Worksheet,
    headers: &[&str],
    format: &Format,
) -> std::result::Result<(), XlsxError> {
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, format)?;
    }
    Ok(())
}

/// The customer's rows under the first row's header set, autosized.
fn write_customer_rows(
    sheet: &mut Worksheet,
    notice: &Notice,
    formats: &Formats,
) -> std::result::Result<(), XlsxError> {
    let headers = header_set(&notice.rows);
    write_headers(sheet, &headers, &formats.header)?;

    for (r, row) in notice.rows.iter().enumerate() {
        let r = (r + 1) as u32;
        for (c, header) in headers.iter().enumerate() {
            let c = c as u16;
            let cell = row.get(header).cloned().unwrap_or_default();
            if cell.is_empty() {
                sheet.write_blank(r, c, &formats.text)?;
            } else if is_currency_column(header) {
                match parse_amount(&cell) {
                    Some(amount) => sheet.write_number_with_format(r, c, amount, &formats.currency)?,
                    None => sheet.write_string_with_format(
                        r,
                        c,
                        cell_text(&cell.to_string(), header),
                        &formats.right,
                    )?,
                };
            } else {
                match &cell {
                    CellValue::Number(n) if n.is_finite() => {
                        sheet.write_number_with_format(r, c, *n, &formats.text)?
                    }
                    other => sheet.write_string_with_format(
                        r,
                        c,
                        cell_text(&other.to_string(), header),
                        &formats.text,
                    )?,
                };
            }
        }
    }

    for (c, header) in headers.iter().enumerate() {
        let longest = notice
            .rows
            .iter()
            .map(|row| row.get(header).map(|v| v.to_string().chars().count()).unwrap_or(0))
            .chain(std::iter::once(header.chars().count()))
            .max()
            .unwrap_or(0);
        sheet.set_column_width(c as u16, column_width(longest))?;
    }
    Ok(())
}

/// `min(max(10, longest + 2), 60)`.
fn column_width(longest: usize) -> f64 {
    (longest + 2).clamp(10, 60) as f64
}

impl Sink for WorkbookExportSink {
    fn name(&self) -> &str {
        "workbook-export"
    }

    fn requires_address(&self) -> bool {
        false
    }

    fn deliver(
        &mut self,
        notice: &Notice,
        address: &str,
        _source: &mut dyn ChoiceSource,
    ) -> Result<()> {
        self.collected.push((notice.clone(), address.to_string()));
        Ok(())
    }

    fn finish(&mut self, source: &mut dyn ChoiceSource, _summary: &DeliverySummary) -> Result<()> {
        self.write()?;
        source.show(&format!("Exported email workbook: {}", self.target.display()));
        Ok(())
    }
}
