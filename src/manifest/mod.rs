//! Build manifest and deterministic build directory (spec.md §4.14).
//!
//! The build directory name is content-addressed: a SHA-256 hash of the
//! sorted, normalized `(classDirs, aspectDirs, instanceDirs, templateDirs)`
//! tuple, truncated to 8 hex characters, gives `build-<hash8>/` under the
//! configured `build_dir` root. Grounded on the teacher's
//! `src/lockfile/checksum.rs::compute_checksum` (`sha2::Sha256`,
//! `"sha256:<hex>"` format) for the hashing shape, generalized from "hash
//! one file's bytes" to "hash a sorted path tuple".

use crate::core::StrukturError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

const MANIFEST_FILE_NAME: &str = "build_manifest.json";

/// The four configured directory lists that determine a build's identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuildInputs {
    /// Configured class directories, in their original (unsorted) order.
    pub class_dirs: Vec<PathBuf>,
    /// Configured aspect directories.
    pub aspect_dirs: Vec<PathBuf>,
    /// Configured instance directories.
    pub instance_dirs: Vec<PathBuf>,
    /// Configured template directories.
    pub template_dirs: Vec<PathBuf>,
}

/// The persisted `build_manifest.json` written at the end of a successful
/// build, and read back at the start of the next one to detect a
/// differently-sourced build reusing the same explicit build directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildManifest {
    /// Manifest schema version, bumped if the shape below changes.
    pub version: u32,
    /// The content-addressed hash (8 hex characters) of `inputs`.
    pub hash: String,
    /// RFC 3339 timestamp of when the build completed.
    pub timestamp: String,
    /// The directory tuple this hash was computed from.
    pub inputs: BuildInputs,
}

const MANIFEST_VERSION: u32 = 1;

/// Compute the 8-hex-character content-address for `inputs`.
///
/// Each directory list is sorted and lexically normalized (via
/// `Path::components`, no filesystem access) before hashing, so directory
/// order in configuration and trailing-slash/`.`-component differences
/// never change the hash - only the actual set of directories does.
#[must_use]
pub fn compute_hash(inputs: &BuildInputs) -> String {
    let mut hasher = Sha256::new();
    for dirs in [&inputs.class_dirs, &inputs.aspect_dirs, &inputs.instance_dirs, &inputs.template_dirs] {
        let mut normalized: Vec<String> = dirs.iter().map(|p| normalize_for_hash(p)).collect();
        normalized.sort();
        for path in &normalized {
            hasher.update(path.as_bytes());
            hasher.update([0u8]);
        }
        hasher.update([0xff]);
    }
    let digest = hasher.finalize();
    hex::encode(&digest[..4])
}

fn normalize_for_hash(path: &Path) -> String {
    use std::path::Component;
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized.to_string_lossy().into_owned()
}

/// Resolve the actual output directory for a build: `<build_dir>/build-<hash8>/`
/// when `deterministic` is set, otherwise `build_dir` itself.
#[must_use]
pub fn resolve_build_dir(build_dir: &Path, inputs: &BuildInputs, deterministic: bool) -> (PathBuf, String) {
    let hash = compute_hash(inputs);
    if deterministic {
        (build_dir.join(format!("build-{hash}")), hash)
    } else {
        (build_dir.to_path_buf(), hash)
    }
}

/// Check `<resolved_dir>/build_manifest.json` against `hash`, returning an
/// error only when `fail_on_collisions` is set and a manifest exists
/// recording a different hash for the same directory.
///
/// A missing manifest, or one recording the same hash, is not a collision.
pub fn check_collision(resolved_dir: &Path, hash: &str, fail_on_collisions: bool) -> Result<Option<String>, StrukturError> {
    let manifest_path = resolved_dir.join(MANIFEST_FILE_NAME);
    if !manifest_path.exists() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(&manifest_path)?;
    let existing: BuildManifest = match serde_json::from_str(&text) {
        Ok(manifest) => manifest,
        Err(_) => return Ok(None),
    };
    if existing.hash == hash {
        return Ok(None);
    }
    let message = format!(
        "build directory '{}' previously recorded hash '{}', now computing '{}' - inputs changed without a new directory",
        resolved_dir.display(),
        existing.hash,
        hash
    );
    if fail_on_collisions {
        Err(StrukturError::Other { message })
    } else {
        Ok(Some(message))
    }
}

/// Write the final `build_manifest.json` for a completed build.
///
/// `timestamp` is passed in rather than computed here, since this crate's
/// pipeline never calls `chrono::Utc::now()` from deep inside a module -
/// callers stamp the orchestrator's own "build started" time once and
/// thread it through.
pub fn write_manifest(resolved_dir: &Path, hash: &str, timestamp: &str, inputs: BuildInputs) -> Result<(), StrukturError> {
    let manifest = BuildManifest { version: MANIFEST_VERSION, hash: hash.to_string(), timestamp: timestamp.to_string(), inputs };
    let path = resolved_dir.join(MANIFEST_FILE_NAME);
    crate::utils::atomic_write_json(&path, &serde_json::to_value(&manifest)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(class_dirs: &[&str]) -> BuildInputs {
        BuildInputs { class_dirs: class_dirs.iter().map(PathBuf::from).collect(), ..Default::default() }
    }

    #[test]
    fn hash_is_stable_across_directory_order() {
        let a = inputs(&["classes", "vendor/classes"]);
        let b = inputs(&["vendor/classes", "classes"]);
        assert_eq!(compute_hash(&a), compute_hash(&b));
    }

    #[test]
    fn hash_changes_with_different_inputs() {
        let a = inputs(&["classes"]);
        let b = inputs(&["classes", "more-classes"]);
        assert_ne!(compute_hash(&a), compute_hash(&b));
    }

    #[test]
    fn hash_ignores_current_dir_components() {
        let a = inputs(&["./classes"]);
        let b = inputs(&["classes"]);
        assert_eq!(compute_hash(&a), compute_hash(&b));
    }

    #[test]
    fn resolve_build_dir_appends_hash_when_deterministic() {
        let inputs = inputs(&["classes"]);
        let (dir, hash) = resolve_build_dir(Path::new("/out"), &inputs, true);
        assert_eq!(dir, PathBuf::from(format!("/out/build-{hash}")));
        assert_eq!(hash.len(), 8);
    }

    #[test]
    fn resolve_build_dir_uses_bare_dir_when_not_deterministic() {
        let inputs = inputs(&["classes"]);
        let (dir, _hash) = resolve_build_dir(Path::new("/out"), &inputs, false);
        assert_eq!(dir, PathBuf::from("/out"));
    }

    #[test]
    fn check_collision_none_when_manifest_absent() {
        let dir = tempfile::tempdir().unwrap();
        let result = check_collision(dir.path(), "abcd1234", true).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn check_collision_detects_hash_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        write_manifest(dir.path(), "11112222", "2026-01-01T00:00:00Z", BuildInputs::default()).unwrap();
        let err = check_collision(dir.path(), "99998888", true).unwrap_err();
        assert!(matches!(err, StrukturError::Other { .. }));
    }

    #[test]
    fn check_collision_warns_without_failing_when_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_manifest(dir.path(), "11112222", "2026-01-01T00:00:00Z", BuildInputs::default()).unwrap();
        let result = check_collision(dir.path(), "99998888", false).unwrap();
        assert!(result.is_some());
    }

    #[test]
    fn check_collision_allows_matching_hash() {
        let dir = tempfile::tempdir().unwrap();
        write_manifest(dir.path(), "abcd1234", "2026-01-01T00:00:00Z", BuildInputs::default()).unwrap();
        let result = check_collision(dir.path(), "abcd1234", true).unwrap();
        assert!(result.is_none());
    }
}
