//! Filesystem helpers shared by the manifest, renderer, and orchestrator.
//!
//! Grounded on the teacher's `src/utils/fs.rs`: `atomic_write` always
//! writes to a sibling temp file, `fsync`s it, then renames it into place
//! so a crash mid-write never leaves a half-written output; `ensure_dir`
//! is a thin `create_dir_all` wrapper used everywhere a parent directory
//! might not exist yet.

use crate::core::StrukturError;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Create `path` and all missing ancestors.
pub fn ensure_dir(path: &Path) -> Result<(), StrukturError> {
    fs::create_dir_all(path)?;
    Ok(())
}

/// Write `content` to `path` atomically: create the parent directory,
/// write to a `.tmp` sibling, `fsync`, then rename over the final path.
///
/// The temp file carries a process-unique suffix (the target file name
/// plus `.tmp`) so a build interrupted mid-write never corrupts a
/// previous build's output at the same path - only the final rename
/// commits the write, matching spec.md §5's cancellation model.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<(), StrukturError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let tmp_path = path.with_extension(match path.extension() {
        Some(ext) => format!("{}.tmp", ext.to_string_lossy()),
        None => "tmp".to_string(),
    });

    let mut file = File::create(&tmp_path)?;
    file.write_all(content)?;
    file.sync_all()?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Write `value` to `path` atomically as pretty-printed, newline-terminated
/// JSON - every JSON file this crate writes ends in `\n`, the way a text
/// editor or `git diff` expects.
pub fn atomic_write_json(path: &Path, value: &serde_json::Value) -> Result<(), StrukturError> {
    let mut content = serde_json::to_string_pretty(value)?;
    content.push('\n');
    atomic_write(path, content.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn atomic_write_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/deep/output.txt");
        atomic_write(&path, b"hello").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello");
    }

    #[test]
    fn atomic_write_leaves_no_temp_file_behind() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("output.json");
        atomic_write(&path, b"{}").unwrap();
        let tmp = dir.path().join("output.tmp");
        assert!(!tmp.exists());
    }

    #[test]
    fn atomic_write_overwrites_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("output.txt");
        atomic_write(&path, b"first").unwrap();
        atomic_write(&path, b"second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    }

    #[test]
    fn atomic_write_json_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("canonical.json");
        let value = serde_json::json!({"a": 1});
        atomic_write_json(&path, &value).unwrap();
        let read_back: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(read_back, value);
    }
}
