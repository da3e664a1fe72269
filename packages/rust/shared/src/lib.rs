//! Shared types, error model, and configuration for dunning.
//!
//! This crate is the foundation depended on by all other dunning crates.
//! It provides:
//! - [`DunningError`], the unified error type
//! - Domain types ([`CellValue`], [`RawTable`], [`RowMap`], [`CustomerRecords`], [`Notice`])
//! - Recipient parsing ([`Recipients`])
//! - Configuration ([`AppConfig`], config loading)

pub mod address;
pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use address::Recipients;
pub use config::{
    AppConfig, InputConfig, MailConfig, OrganizationConfig, OutputConfig, PaymentConfig,
    config_dir, config_file_path, init_config, load_config, load_config_from,
};
pub use error::{DunningError, Result, workbook_hints};
pub use types::{CellValue, CustomerRecords, Notice, RawTable, RowMap, normalize_header};
