//! A complete temporary build project: classes, aspects, instances, and
//! templates directories plus a written `struktur.toml`, for integration
//! tests that drive [`crate::orchestrator`] end to end.

use crate::config::BuildConfig;
use anyhow::Result;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// A temporary directory laid out the way a real struktur project is:
/// `classes/`, `aspects/`, `instances/`, `templates/`, and `build/`, with
/// a `struktur.toml` tying them together.
pub struct TestEnvironment {
    pub temp_dir: TempDir,
    pub classes_dir: PathBuf,
    pub aspects_dir: PathBuf,
    pub instances_dir: PathBuf,
    pub templates_dir: PathBuf,
    pub build_dir: PathBuf,
    pub config_path: PathBuf,
}

impl TestEnvironment {
    /// Create the directory layout and a `struktur.toml` naming it, using
    /// the Tera engine and non-deterministic (directly-to-`build_dir`)
    /// output so tests don't need to guess the content hash.
    pub fn new() -> Result<Self> {
        super::init_test_logging();

        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();
        let classes_dir = root.join("classes");
        let aspects_dir = root.join("aspects");
        let instances_dir = root.join("instances");
        let templates_dir = root.join("templates");
        let build_dir = root.join("build");

        for dir in [&classes_dir, &aspects_dir, &instances_dir, &templates_dir] {
            fs::create_dir_all(dir)?;
        }

        let config_path = root.join("struktur.toml");
        fs::write(
            &config_path,
            format!(
                r#"
class_dirs = ["{classes}"]
aspect_dirs = ["{aspects}"]
instance_dirs = ["{instances}"]
template_dirs = ["{templates}"]
build_dir = "{build}"
engine = "tera"
deterministic = false
"#,
                classes = classes_dir.display(),
                aspects = aspects_dir.display(),
                instances = instances_dir.display(),
                templates = templates_dir.display(),
                build = build_dir.display(),
            ),
        )?;

        Ok(Self { temp_dir, classes_dir, aspects_dir, instances_dir, templates_dir, build_dir, config_path })
    }

    /// Parse the `struktur.toml` this environment wrote.
    pub fn load_config(&self) -> Result<BuildConfig> {
        Ok(BuildConfig::load(&self.config_path)?)
    }

    /// Whether `relative` exists under the build directory.
    #[must_use]
    pub fn build_file_exists(&self, relative: &str) -> bool {
        self.build_dir.join(relative).exists()
    }
}
