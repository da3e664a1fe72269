//! One-time migration of the preference file from its legacy location.
//!
//! Earlier builds wrote the preference file into the current working
//! directory. When the primary file beside the executable is missing, the
//! legacy file is read and copied into place so later runs find it there.

use std::path::Path;

use serde_json::{Map, Value};
use tracing::{info, warn};

/// Read a preference object from `path`.
///
/// Returns `None` when the file is absent, unreadable, or not a JSON object.
pub(crate) fn read_object(path: &Path) -> Option<Map<String, Value>> {
    let text = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => {
            warn!(path = %path.display(), "preference file is not a JSON object, ignoring");
            None
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "preference file is not valid JSON, ignoring");
            None
        }
    }
}

/// Load preferences from `legacy` and copy them to `primary`.
///
/// The copy is best-effort: a write failure is logged and the loaded values
/// are still returned.
pub(crate) fn migrate_legacy(primary: &Path, legacy: &Path) -> Option<Map<String, Value>> {
    if same_file(primary, legacy) || !legacy.exists() {
        return None;
    }
    let values = read_object(legacy)?;

    match write_object(primary, &values) {
        Ok(()) => info!(
            from = %legacy.display(),
            to = %primary.display(),
            "migrated legacy preferences"
        ),
        Err(e) => warn!(error = %e, "could not copy legacy preferences"),
    }
    Some(values)
}

/// Write `values` as pretty JSON, creating the parent directory.
pub(crate) fn write_object(path: &Path, values: &Map<String, Value>) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(values).map_err(std::io::Error::other)?;
    std::fs::write(path, json)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
