//! End-to-end preparation: workbook path → sheets → customers → notices.
//!
//! Delivery is left to the caller so the output mode can be chosen after the
//! user has seen what was found.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{info, instrument, warn};

use dunning_render::Renderer;
use dunning_shared::{AppConfig, CustomerRecords, DunningError, Notice, RawTable, Result};
use dunning_storage::PreferenceStore;
use dunning_workbook::{
    LocatedWorkbook, ResolvedSheets, SheetResolver, TableReader, expand_home, locate,
};

use crate::addresses::{AddressBook, build_address_book};
use crate::aggregator::{aggregate, normalize_table};
use crate::prompt::ChoiceSource;
use crate::selector::{MAIN_CUSTOMER, choose_sheet, select_column};

/// Customers listed in the post-aggregation preview.
const PREVIEW_CUSTOMERS: usize = 5;

/// Everything gathered before delivery.
///
/// Holds the located workbook, so any temp copy lives as long as the run.
#[derive(Debug)]
pub struct PreparedRun {
    pub workbook: LocatedWorkbook,
    pub sheets: ResolvedSheets,
    pub data_sheet: String,
    pub emails_sheet: Option<String>,
    pub records: CustomerRecords,
    pub addresses: AddressBook,
    /// One notice per customer, in first-seen order.
    pub notices: Vec<Notice>,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called before each customer is delivered.
    fn customer(&self, name: &str, current: usize, total: usize);
    /// Called when the run completes.
    fn done(&self);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn customer(&self, _name: &str, _current: usize, _total: usize) {}
    fn done(&self) {}
}

/// Run everything up to (not including) delivery.
///
/// 1. Locate the workbook (temp copy for cloud/stub files)
/// 2. Resolve sheet names
/// 3. Pick the data and emails sheets
/// 4. Read both sheets
/// 5. Pick the customer column and group rows
/// 6. Build the address book
/// 7. Render one notice per customer
#[instrument(skip_all, fields(path = %path.display()))]
pub fn prepare(
    path: &Path,
    config: &AppConfig,
    source: &mut dyn ChoiceSource,
    prefs: &mut PreferenceStore,
    progress: &dyn ProgressReporter,
) -> Result<PreparedRun> {
    let start = Instant::now();

    // --- Phase 1: Locate ---
    progress.phase("Locating workbook");
    let workbook = locate(path)?;
    if workbook.local_copy {
        source.show("Created a local copy of the workbook for reading.");
    }

    // --- Phase 2: Sheets ---
    progress.phase("Reading sheet names");
    let sheets = SheetResolver::new().resolve(&workbook.path)?;
    source.show(&format!("Available sheets: {}", sheets.names.join(", ")));

    let data_sheet = choose_sheet(
        source,
        &sheets.names,
        "invoice data",
        &config.input.data_sheet_candidates,
        false,
    )?
    .ok_or_else(|| DunningError::validation("no data sheet selected"))?;
    let emails_sheet = choose_sheet(
        source,
        &sheets.names,
        "email addresses",
        &config.input.emails_sheet_candidates,
        true,
    )?;
    info!(data = %data_sheet, emails = ?emails_sheet, "sheets selected");

    // --- Phase 3: Read ---
    progress.phase("Reading sheets");
    let reader = TableReader::new();
    let loaded = reader.read(&workbook.path, &data_sheet)?;
    info!(sheet = %data_sheet, strategy = %loaded.strategy, rows = loaded.table.len(), "data sheet loaded");
    let mut data = loaded.table;

    let emails = match &emails_sheet {
        Some(sheet) => match reader.read(&workbook.path, sheet) {
            Ok(loaded) => loaded.table,
            Err(e) => {
                warn!(sheet = %sheet, error = %e, "emails sheet unreadable, continuing without it");
                source.show(&format!("Could not read emails sheet '{sheet}': {e}"));
                RawTable::empty()
            }
        },
        None => RawTable::empty(),
    };

    if data.is_empty() {
        return Err(DunningError::validation("no data found in data sheet"));
    }
    source.show(&format!("Loaded {} rows from '{data_sheet}'", data.len()));

    // --- Phase 4: Aggregate ---
    progress.phase("Grouping customers");
    normalize_table(&mut data);
    source.show(&format!("Columns found: {}", data.columns().join(", ")));
    let customer_column = select_column(source, prefs, data.columns(), &MAIN_CUSTOMER)?
        .ok_or_else(|| DunningError::validation("no customer column selected"))?;
    let records = aggregate(&data, &customer_column);
    if records.is_empty() {
        return Err(DunningError::validation("no customer data found"));
    }
    preview(source, &records);

    // --- Phase 5: Addresses ---
    progress.phase("Reading email addresses");
    let addresses = build_address_book(source, prefs, emails)?;

    // --- Phase 6: Render ---
    progress.phase("Rendering notices");
    let renderer = Renderer::new(config);
    let notices: Vec<Notice> = records
        .iter()
        .map(|(customer, rows)| renderer.render(customer, rows, addresses.get(customer)))
        .collect();

    info!(
        customers = records.len(),
        rows = records.row_count(),
        addresses = addresses.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "run prepared"
    );

    Ok(PreparedRun {
        workbook,
        sheets,
        data_sheet,
        emails_sheet,
        records,
        addresses,
        notices,
    })
}

/// Ask for the workbook path, falling back to `default` when it exists.
///
/// A blank answer takes the default; a typed path that does not exist also
/// falls back to it. Without a usable default, a missing path is
/// [`DunningError::NotFound`].
pub fn ask_workbook_path(
    source: &mut dyn ChoiceSource,
    default: Option<&Path>,
) -> Result<PathBuf> {
    let default = default.map(expand_home).filter(|p| p.exists());
    let prompt = match &default {
        Some(d) => format!(
            "Enter the path to your workbook (press Enter to use default: {}): ",
            d.display()
        ),
        None => "Enter the path to your workbook: ".to_string(),
    };

    let answer = source.ask(&prompt)?;
    let answer = answer.trim();
    if answer.is_empty() {
        return match default {
            Some(d) => {
                source.show(&format!("Using default workbook: {}", d.display()));
                Ok(d)
            }
            None => Err(DunningError::NotFound {
                path: PathBuf::new(),
            }),
        };
    }

    let typed = expand_home(Path::new(answer));
    if typed.exists() {
        return Ok(typed);
    }
    match default {
        Some(d) => {
            warn!(typed = %typed.display(), "path not found, using default");
            source.show(&format!(
                "Provided path not found. Using default: {}",
                d.display()
            ));
            Ok(d)
        }
        None => Err(DunningError::NotFound { path: typed }),
    }
}

fn preview(source: &mut dyn ChoiceSource, records: &CustomerRecords) {
    source.show(&format!("Found {} customers", records.len()));
    for (customer, rows) in records.iter().take(PREVIEW_CUSTOMERS) {
        source.show(&format!("  - {customer}: {} rows", rows.len()));
    }
    if records.len() > PREVIEW_CUSTOMERS {
        source.show(&format!(
            "  ... and {} more",
            records.len() - PREVIEW_CUSTOMERS
        ));
    }
}
