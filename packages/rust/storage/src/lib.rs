//! Persistent preference store.
//!
//! The [`PreferenceStore`] is a small JSON object of role name → string value
//! (chosen columns, default sender). It lives beside the executable and is
//! rewritten on every change; there is a single writer per process.
//!
//! **Lookup order on open:**
//! - the primary file beside the executable
//! - the legacy file in the current working directory (copied to the primary
//!   location on first use)
//! - empty

mod migrations;

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use dunning_shared::{DunningError, Result};

/// File name of the preference file, in both locations.
pub const PREFS_FILE: &str = ".dunning_prefs.json";

/// Well-known preference keys.
pub mod keys {
    /// Customer column of the data sheet.
    pub const MAIN_CUSTOMER_COLUMN: &str = "main_customer_column";
    /// Customer column of the emails sheet.
    pub const EMAILS_CUSTOMER_COLUMN: &str = "emails_customer_column";
    /// Address column of the emails sheet.
    pub const EMAILS_EMAIL_COLUMN: &str = "emails_email_column";
    /// Sender used for drafts and SMTP.
    pub const DEFAULT_FROM_EMAIL: &str = "default_from_email";
}

/// Key → value preference cache persisted as JSON.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
    values: Map<String, Value>,
}

impl PreferenceStore {
    /// Open the store at its default location beside the executable,
    /// migrating from the working directory if needed.
    pub fn open() -> Self {
        let primary = default_path();
        let legacy = std::env::current_dir()
            .map(|dir| dir.join(PREFS_FILE))
            .ok();
        Self::open_at(primary, legacy.as_deref())
    }

    /// Open the store at `primary`, with an optional legacy location.
    ///
    /// Never fails: unreadable files are treated as empty.
    pub fn open_at(primary: impl Into<PathBuf>, legacy: Option<&Path>) -> Self {
        let path = primary.into();
        let values = migrations::read_object(&path)
            .or_else(|| legacy.and_then(|l| migrations::migrate_legacy(&path, l)))
            .unwrap_or_default();
        debug!(path = %path.display(), entries = values.len(), "preferences loaded");
        Self { path, values }
    }

    /// Location of the primary file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// String value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    /// Store `value` under `key` and persist immediately.
    ///
    /// A write failure is logged; the in-memory value is kept for this run.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.values
            .insert(key.to_string(), Value::String(value.into()));
        if let Err(e) = self.save() {
            warn!(key, error = %e, "could not persist preference");
        }
    }

    /// Write the whole store to disk.
    pub fn save(&self) -> Result<()> {
        migrations::write_object(&self.path, &self.values)
            .map_err(|e| DunningError::io(&self.path, e))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// `PREFS_FILE` beside the running executable, or in the working directory
/// when the executable path is unknown.
fn default_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(PREFS_FILE)
}
