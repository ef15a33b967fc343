//! Build configuration: parsing and validating `struktur.toml`.
//!
//! The logical build configuration of spec.md §6 -
//! `{classDirs[], aspectDirs[], instanceDirs[], templateDirs[], buildDir,
//! engine, strictTemplates, deterministic, failOnCollisions, renderTasks[]}`
//! - is materialized here as a TOML file, parsed the way the teacher parses
//! `ccpm.toml` in `src/manifest/mod.rs`. Each directory entry may be a bare
//! string (an implicitly *explicit* directory) or a table with an
//! `explicit` flag, using the same `#[serde(untagged)]` simple-vs-detailed
//! trick the teacher uses for `ResourceDependency`.

use crate::core::StrukturError;
use crate::model::RenderTask;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which template engine a build uses.
///
/// The spec names two concrete engines the adapter interface must cover;
/// `tera` stands in for the "Nunjucks-like" engine (it is already the
/// teacher's Jinja-family dependency) and `handlebars` is the real
/// Handlebars crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Engine {
    /// Jinja/Nunjucks-family engine, backed by the `tera` crate.
    Tera,
    /// Handlebars engine, backed by the `handlebars` crate.
    Handlebars,
}

impl Default for Engine {
    fn default() -> Self {
        Self::Tera
    }
}

/// One configured directory: a path, and whether it was explicitly named
/// by the user.
///
/// An explicit directory that doesn't exist on disk is fatal
/// (`StrukturError::ExplicitDirectoryMissing`); a default directory that
/// doesn't exist is silently skipped, per spec.md §4.3.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DirEntry {
    /// A bare path string; `explicit` is implied `true`.
    Simple(PathBuf),
    /// A table form with an explicit `explicit` flag.
    Detailed {
        /// The directory path.
        path: PathBuf,
        /// Whether a missing directory should be fatal.
        #[serde(default = "default_true")]
        explicit: bool,
    },
}

const fn default_true() -> bool {
    true
}

impl DirEntry {
    /// The directory's path, regardless of which form it was declared in.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Simple(path) => path,
            Self::Detailed { path, .. } => path,
        }
    }

    /// Whether a missing directory for this entry is a fatal error.
    #[must_use]
    pub fn is_explicit(&self) -> bool {
        match self {
            Self::Simple(_) => true,
            Self::Detailed { explicit, .. } => *explicit,
        }
    }
}

/// The parsed, validated build configuration (`struktur.toml`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BuildConfig {
    /// Directories to scan for `*.class.json` files.
    #[serde(default)]
    pub class_dirs: Vec<DirEntry>,

    /// Directories to scan for aspect definitions.
    #[serde(default)]
    pub aspect_dirs: Vec<DirEntry>,

    /// Directories to recursively scan for instance JSON files.
    #[serde(default)]
    pub instance_dirs: Vec<DirEntry>,

    /// Directories to scan (and load partials from) for templates.
    #[serde(default)]
    pub template_dirs: Vec<DirEntry>,

    /// The build root. Actual output lands at
    /// `<build_dir>/build-<hash8>/` per spec.md §4.14.
    pub build_dir: PathBuf,

    /// Which template adapter to drive.
    #[serde(default)]
    pub engine: Engine,

    /// Require every referenced template to compile during pre-flight,
    /// even ones not directly named by a render task (reserved for a
    /// future strict-mode sweep; currently pre-flight already validates
    /// every task's template regardless of this flag).
    #[serde(default)]
    pub strict_templates: bool,

    /// Whether the build directory name is content-addressed
    /// (`build-<hash8>/`) or written directly to `build_dir`.
    #[serde(default = "default_true")]
    pub deterministic: bool,

    /// Promote a build-manifest hash collision against a prior,
    /// differently-sourced build to a fatal error.
    #[serde(default)]
    pub fail_on_collisions: bool,

    /// Promote schema constraint conflicts (spec.md §4.8) from diagnostics
    /// to build-failing errors.
    #[serde(default)]
    pub fail_on_constraint_conflicts: bool,

    /// Render tasks contributed by the build configuration itself, run
    /// before any instance-contributed tasks (config-first order, per
    /// spec.md §4.13).
    #[serde(default)]
    pub render_tasks: Vec<RenderTask>,
}

impl BuildConfig {
    /// Parse a `struktur.toml` file from `path`.
    pub fn load(path: &Path) -> Result<Self, StrukturError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&text)?;
        Ok(config)
    }

    /// Validate that every explicit directory exists on disk.
    ///
    /// Default (non-explicit) directories are allowed to be missing; the
    /// loader that later walks them treats a missing default directory as
    /// an empty one.
    pub fn validate_directories(&self) -> Result<(), StrukturError> {
        for (purpose, dirs) in [
            ("classes", &self.class_dirs),
            ("aspects", &self.aspect_dirs),
            ("instances", &self.instance_dirs),
            ("templates", &self.template_dirs),
        ] {
            for entry in dirs {
                if entry.is_explicit() && !entry.path().exists() {
                    return Err(StrukturError::ExplicitDirectoryMissing {
                        purpose: purpose.to_string(),
                        path: entry.path().display().to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Directories that actually exist on disk, in configured order, for
    /// a given directory list. Used by the loaders so a missing default
    /// directory is silently skipped rather than walked.
    #[must_use]
    pub fn existing_dirs(dirs: &[DirEntry]) -> Vec<PathBuf> {
        dirs.iter().map(DirEntry::path).filter(|p| p.exists()).map(Path::to_path_buf).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dir_entry_simple_form_is_explicit() {
        let toml = r#"
            build_dir = "build"
            class_dirs = ["classes"]
        "#;
        let config: BuildConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.class_dirs.len(), 1);
        assert!(config.class_dirs[0].is_explicit());
        assert_eq!(config.class_dirs[0].path(), Path::new("classes"));
    }

    #[test]
    fn dir_entry_detailed_form_can_be_non_explicit() {
        let toml = r#"
            build_dir = "build"
            class_dirs = [{ path = "classes" }, { path = "vendor/classes", explicit = false }]
        "#;
        let config: BuildConfig = toml::from_str(toml).unwrap();
        assert!(config.class_dirs[0].is_explicit());
        assert!(!config.class_dirs[1].is_explicit());
    }

    #[test]
    fn defaults_are_sane() {
        let toml = r#"build_dir = "build""#;
        let config: BuildConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.engine, Engine::Tera);
        assert!(config.deterministic);
        assert!(!config.fail_on_collisions);
        assert!(config.class_dirs.is_empty());
    }

    #[test]
    fn validate_directories_fails_on_missing_explicit_dir() {
        let mut config: BuildConfig = toml::from_str(r#"build_dir = "build""#).unwrap();
        config.class_dirs.push(DirEntry::Simple(PathBuf::from("/no/such/directory/struktur-test")));
        let err = config.validate_directories().unwrap_err();
        assert!(matches!(err, StrukturError::ExplicitDirectoryMissing { .. }));
    }

    #[test]
    fn validate_directories_allows_missing_non_explicit_dir() {
        let mut config: BuildConfig = toml::from_str(r#"build_dir = "build""#).unwrap();
        config.class_dirs.push(DirEntry::Detailed {
            path: PathBuf::from("/no/such/directory/struktur-test"),
            explicit: false,
        });
        config.validate_directories().unwrap();
    }
}
