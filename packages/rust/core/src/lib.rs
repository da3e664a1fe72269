//! Core orchestration and domain logic for dunning.
//!
//! This crate ties together workbook ingestion, column selection, customer
//! aggregation, notice rendering, and delivery into the interactive run
//! ([`pipeline::prepare`] followed by [`delivery::deliver_all`]).

pub mod addresses;
pub mod aggregator;
pub mod delivery;
pub mod pipeline;
pub mod prompt;
pub mod selector;

pub use addresses::{AddressBook, InvalidAddress, build_address_book};
pub use aggregator::{aggregate, customer_key, normalize_table};
pub use delivery::{
    DeliverySummary, OutputMode, Sink, build_sink, choose_output_mode, deliver_all,
};
pub use pipeline::{PreparedRun, ProgressReporter, SilentProgress, ask_workbook_path, prepare};
pub use prompt::{ChoiceSource, ScriptedChoices, choose_index, parse_selection};
pub use selector::{ColumnRole, auto_select_sheet, choose_sheet, select_column};
