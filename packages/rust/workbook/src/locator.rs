//! Workbook locator: turn a user-supplied path into a stable local file.
//!
//! Files inside cloud-synced folders may be placeholders that only
//! materialize on first full read, and tiny files are often stubs. Both are
//! copied to the temp directory before any engine touches them. The copy is
//! removed when the [`LocatedWorkbook`] is dropped.

use std::fs::File;
use std::path::{Path, PathBuf};

use tempfile::TempPath;

use tracing::{debug, info, instrument, warn};

use dunning_shared::{DunningError, Result};

/// Case-insensitive path fragments that mark cloud-synced storage.
const CLOUD_MARKERS: &[&str] = &["onedrive", "cloudstorage", "icloud", "dropbox", "google drive"];

/// Files smaller than this are copied locally before reading.
const SMALL_FILE_BYTES: u64 = 1024;

/// Prefix for temp copies.
const TEMP_PREFIX: &str = "dunning_";

/// A workbook path that is safe to hand to the reader strategies.
#[derive(Debug)]
pub struct LocatedWorkbook {
    /// Path to read from (the temp copy when one was made).
    pub path: PathBuf,
    /// The path as resolved from user input.
    pub original: PathBuf,
    /// Whether `path` is a temp copy.
    pub local_copy: bool,
    /// Size of the original file in bytes.
    pub size: u64,
    /// Deletes the temp copy on drop.
    _copy: Option<TempPath>,
}

/// Locate a workbook, copying it to the system temp directory when needed.
pub fn locate(raw: &Path) -> Result<LocatedWorkbook> {
    locate_in(raw, &std::env::temp_dir())
}

/// Locate a workbook, using `temp_dir` for local copies.
#[instrument(skip(temp_dir), fields(path = %raw.display()))]
pub fn locate_in(raw: &Path, temp_dir: &Path) -> Result<LocatedWorkbook> {
    let expanded = expand_home(raw);
    if !expanded.exists() {
        return Err(DunningError::NotFound { path: expanded });
    }
    let original = std::fs::canonicalize(&expanded).unwrap_or(expanded);

    let size = std::fs::metadata(&original)
        .map_err(|e| DunningError::io(&original, e))?
        .len();
    if size == 0 {
        return Err(DunningError::EmptyFile { path: original });
    }

    let cloud = is_cloud_path(&original);
    debug!(size, cloud, "workbook located");

    if cloud || size < SMALL_FILE_BYTES {
        match copy_to_temp(&original, temp_dir) {
            Ok(copy) => {
                info!(copy = %copy.display(), "created local copy");
                return Ok(LocatedWorkbook {
                    path: copy.to_path_buf(),
                    original,
                    local_copy: true,
                    size,
                    _copy: Some(copy),
                });
            }
            Err(e) => warn!(error = %e, "could not create local copy, reading original"),
        }
    }

    Ok(LocatedWorkbook {
        path: original.clone(),
        original,
        local_copy: false,
        size,
        _copy: None,
    })
}

/// Whether the path looks like it lives in a cloud-synced folder.
pub fn is_cloud_path(path: &Path) -> bool {
    let lowered = path.to_string_lossy().to_lowercase();
    CLOUD_MARKERS.iter().any(|m| lowered.contains(m))
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}

/// Copy `src` to a uniquely named file in `temp_dir` that keeps the original
/// file name as its suffix, so extension-based engines still recognize it.
fn copy_to_temp(src: &Path, temp_dir: &Path) -> Result<TempPath> {
    let name = src
        .file_name()
        .ok_or_else(|| DunningError::validation("workbook path has no file name"))?;
    let mut target = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(&format!("_{}", name.to_string_lossy()))
        .tempfile_in(temp_dir)
        .map_err(|e| DunningError::io(temp_dir, e))?;
    let mut reader = File::open(src).map_err(|e| DunningError::io(src, e))?;
    std::io::copy(&mut reader, target.as_file_mut())
        .map_err(|e| DunningError::io(target.path(), e))?;
    Ok(target.into_temp_path())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = locate_in(&dir.path().join("nope.xlsx"), dir.path()).unwrap_err();
        assert!(matches!(err, DunningError::NotFound { .. }));
    }

    #[test]
    fn zero_byte_file_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("empty.xlsx");
        std::fs::write(&path, b"").expect("write");
        let err = locate_in(&path, dir.path()).unwrap_err();
        assert!(matches!(err, DunningError::EmptyFile { .. }));
    }

    #[test]
    fn small_file_is_copied() {
        let src_dir = tempfile::tempdir().expect("tempdir");
        let tmp_dir = tempfile::tempdir().expect("tempdir");
        let path = src_dir.path().join("tiny.xlsx");
        std::fs::write(&path, b"stub").expect("write");

        let located = locate_in(&path, tmp_dir.path()).expect("locate");
        assert!(located.local_copy);
        assert_eq!(located.path.parent(), Some(tmp_dir.path()));
        let copy_name = located.path.file_name().expect("name").to_string_lossy().into_owned();
        assert!(copy_name.starts_with("dunning_"));
        assert!(copy_name.ends_with("_tiny.xlsx"));
        assert_eq!(std::fs::read(&located.path).expect("read copy"), b"stub");
        assert_eq!(located.size, 4);
    }

    #[test]
    fn copy_is_removed_on_drop() {
        let src_dir = tempfile::tempdir().expect("tempdir");
        let tmp_dir = tempfile::tempdir().expect("tempdir");
        let path = src_dir.path().join("tiny.xlsx");
        std::fs::write(&path, b"stub").expect("write");

        let located = locate_in(&path, tmp_dir.path()).expect("locate");
        let copy = located.path.clone();
        assert!(copy.exists());
        drop(located);
        assert!(!copy.exists());
        assert!(path.exists());
    }

    #[test]
    fn concurrent_copies_do_not_collide() {
        let src_dir = tempfile::tempdir().expect("tempdir");
        let tmp_dir = tempfile::tempdir().expect("tempdir");
        let path = src_dir.path().join("tiny.xlsx");
        std::fs::write(&path, b"stub").expect("write");

        let first = locate_in(&path, tmp_dir.path()).expect("first");
        let second = locate_in(&path, tmp_dir.path()).expect("second");
        assert_ne!(first.path, second.path);
        drop(first);
        assert!(second.path.exists());
    }

    #[test]
    fn large_file_in_cloud_folder_is_copied() {
        let src_dir = tempfile::tempdir().expect("tempdir");
        let tmp_dir = tempfile::tempdir().expect("tempdir");
        let synced = src_dir.path().join("Dropbox");
        std::fs::create_dir_all(&synced).expect("mkdir");
        let path = synced.join("ledger.xlsx");
        std::fs::write(&path, vec![b'x'; 4096]).expect("write");

        let located = locate_in(&path, tmp_dir.path()).expect("locate");
        assert!(located.local_copy);
        assert_ne!(located.path, located.original);
        assert_eq!(located.path.parent(), Some(tmp_dir.path()));
        assert_eq!(std::fs::read(&located.path).expect("read copy").len(), 4096);
    }

    #[test]
    fn large_local_file_is_used_in_place() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("big.xlsx");
        std::fs::write(&path, vec![b'x'; 4096]).expect("write");

        let located = locate_in(&path, dir.path()).expect("locate");
        assert!(!located.local_copy);
        assert_eq!(located.path, located.original);
    }

    #[test]
    fn copy_failure_falls_back_to_original() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tiny.xlsx");
        std::fs::write(&path, b"stub").expect("write");

        let located = locate_in(&path, &dir.path().join("missing-temp")).expect("locate");
        assert!(!located.local_copy);
        assert_eq!(located.path, located.original);
    }

    #[test]
    fn cloud_markers_match_case_insensitively() {
        assert!(is_cloud_path(Path::new("/Users/me/OneDrive - Corp/ledger.xlsx")));
        assert!(is_cloud_path(Path::new("/Users/me/Library/CloudStorage/x.xlsx")));
        assert!(is_cloud_path(Path::new("G:/Google Drive/x.xlsx")));
        assert!(!is_cloud_path(Path::new("/data/ledger.xlsx")));
    }
}
