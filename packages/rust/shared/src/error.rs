//! Error types for dunning.
//!
//! Library crates use [`DunningError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all dunning operations.
#[derive(Debug, thiserror::Error)]
pub enum DunningError {
    /// The workbook path does not exist.
    #[error("file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// The workbook exists but is zero bytes long.
    #[error("file is empty (0 bytes): {}", path.display())]
    EmptyFile { path: PathBuf },

    /// Every sheet-listing strategy was exhausted.
    #[error("could not read sheet names from {} with any method.\nPossible causes:\n{}", path.display(), format_hints(hints))]
    UnreadableWorkbook { path: PathBuf, hints: Vec<String> },

    /// Every table-reading strategy was exhausted for one sheet.
    #[error("could not read sheet '{sheet}': {message}")]
    UnreadableSheet { sheet: String, message: String },

    /// A numeric menu answer that was not a number or out of range.
    #[error("invalid selection: {input}")]
    InvalidSelection { input: String },

    /// No address is known for a customer and none was supplied.
    #[error("no address for customer '{customer}'")]
    MissingAddress { customer: String },

    /// Delivering one customer's notice failed.
    #[error("delivery to '{customer}' failed: {message}")]
    DeliveryFailure { customer: String, message: String },

    /// A single reader strategy attempt failed.
    #[error("{strategy}: {message}")]
    Strategy { strategy: String, message: String },

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Spreadsheet export error.
    #[error("export error: {0}")]
    Export(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (no rows, no customers, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// The interactive input reached end-of-input while a choice was pending.
    #[error("input closed while waiting for: {prompt}")]
    InputClosed { prompt: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DunningError>;

impl DunningError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a strategy-attempt error.
    pub fn strategy(strategy: impl Into<String>, msg: impl ToString) -> Self {
        Self::Strategy {
            strategy: strategy.into(),
            message: msg.to_string(),
        }
    }

    /// Create a per-customer delivery failure.
    pub fn delivery(customer: impl Into<String>, msg: impl ToString) -> Self {
        Self::DeliveryFailure {
            customer: customer.into(),
            message: msg.to_string(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Diagnostic hints attached to [`DunningError::UnreadableWorkbook`].
pub fn workbook_hints() -> Vec<String> {
    vec![
        "the file is password protected".into(),
        "the file is corrupted".into(),
        "the file is in an unsupported format".into(),
        "the file is open in another program".into(),
    ]
}

fn format_hints(hints: &[String]) -> String {
    hints
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{}. {h}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}
