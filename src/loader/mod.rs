//! Discovery and parsing of class, aspect, and instance definition files.
//!
//! Four components live here, matching spec.md §4.3-§4.6: [`class_loader`]
//! and [`aspect_loader`] discover `*.class.json` files with identical
//! shapes (one requires `$class`/`$schema`, the other additionally
//! requires `$aspect == $class`); [`instance_loader`] recursively walks
//! instance directories; [`instance_merger`] groups loaded instance
//! fragments by `$id` and combines them.
//!
//! All four walk directories in alphabetical order for deterministic
//! loading (spec.md §5), grounded on the teacher's directory-scanning
//! pattern in `src/manifest/mod.rs` and `walkdir` usage in
//! `src/lockfile/checksum.rs`.

pub mod aspect_loader;
pub mod class_loader;
pub mod instance_loader;
pub mod instance_merger;

/// Directory names excluded from the instance walk (spec.md §6): these are
/// reserved for mix-in fragments and multi-file instance "stacks" that are
/// assembled by other tooling, not loaded as top-level instances.
pub const RESERVED_INSTANCE_DIRS: [&str; 2] = ["mixins", "stacks"];

/// List the `*.class.json` files directly and recursively under `dir`, in
/// alphabetical path order.
///
/// Shared by the class and aspect loaders, which differ only in which
/// fields they require once a file is parsed.
pub(crate) fn discover_json_files(
    dir: &std::path::Path,
    suffix: &str,
) -> Result<Vec<std::path::PathBuf>, crate::core::StrukturError> {
    let mut paths = Vec::new();
    for entry in walkdir::WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| crate::core::StrukturError::Other {
            message: format!("failed to read directory entry under {}: {e}", dir.display()),
        })?;
        if entry.file_type().is_file() && entry.file_name().to_string_lossy().ends_with(suffix) {
            paths.push(entry.path().to_path_buf());
        }
    }
    paths.sort();
    Ok(paths)
}
