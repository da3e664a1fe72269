//! Workbook access for dunning.
//!
//! This crate provides:
//! - [`locator`]: path expansion, existence checks, and local temp copies
//! - [`SheetResolver`]: lists sheet names through a cascade of strategies
//! - [`TableReader`]: loads one sheet into a [`RawTable`](dunning_shared::RawTable)
//! - [`strategies`]: the individual reader strategies

pub mod locator;
pub mod reader;
pub mod resolver;
pub mod strategies;

pub use locator::{LocatedWorkbook, expand_home, is_cloud_path, locate, locate_in};
pub use reader::{LoadedTable, TableReader};
pub use resolver::{ResolvedSheets, SheetResolver};
pub use strategies::{
    Access, AutoDetectEngine, DesktopAutomation, DirectContainerRead, OPEN_MODES,
    SheetNameStrategy, Strategy, TableStrategy, ValueMode, WorkbookXmlParse, XlsEngine,
    XlsbEngine, XlsxEngine, parse_sheet_names,
};
