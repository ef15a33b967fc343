//! Instance loader (spec.md §4.5, component 5).
//!
//! Recursively walks the configured instance directories, alphabetically,
//! skipping the reserved `mixins/`/`stacks/` subtrees and any
//! `*.class.json`/`*.schema.json` file. Each remaining `*.json` file is
//! parsed as a single instance record; records missing `$class` are not
//! failed immediately but collected so the orchestrator can report every
//! offending file together.

use crate::core::StrukturError;
use crate::model::{Instance, RenderTask, required_string};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

const CLASS_SUFFIX: &str = ".class.json";
const SCHEMA_SUFFIX: &str = ".schema.json";
const LEGACY_KEYS: [&str; 4] = ["id", "class", "render", "aspects"];

/// Outcome of loading every instance file under a set of directories.
#[derive(Debug, Default)]
pub struct InstanceLoadReport {
    /// Successfully parsed instance records, one per file.
    pub instances: Vec<Instance>,
    /// Paths of records with no `$class`, kept around for one combined error.
    pub classless: Vec<String>,
}

impl InstanceLoadReport {
    /// Consume the report, failing with [`StrukturError::ClasslessInstances`]
    /// if any record had no `$class`.
    pub fn into_instances(self) -> Result<Vec<Instance>, StrukturError> {
        if self.classless.is_empty() {
            Ok(self.instances)
        } else {
            Err(StrukturError::ClasslessInstances {
                count: self.classless.len(),
                files: self.classless.join(", "),
            })
        }
    }
}

/// Load every instance record under `dirs`.
pub fn load_instances(dirs: &[PathBuf]) -> Result<InstanceLoadReport, StrukturError> {
    let mut report = InstanceLoadReport::default();

    for dir in dirs {
        if !dir.exists() {
            continue;
        }
        for path in discover_instance_files(dir)? {
            match load_one(&path)? {
                Some(instance) => report.instances.push(instance),
                None => report.classless.push(path.display().to_string()),
            }
        }
    }

    Ok(report)
}

/// Walk `dir` recursively in alphabetical order, excluding
/// [`super::RESERVED_INSTANCE_DIRS`] and any class/schema definition file.
fn discover_instance_files(dir: &Path) -> Result<Vec<PathBuf>, StrukturError> {
    let mut paths = Vec::new();
    let walker = walkdir::WalkDir::new(dir).sort_by_file_name().into_iter().filter_entry(|entry| {
        if entry.file_type().is_dir() {
            let name = entry.file_name().to_string_lossy();
            !super::RESERVED_INSTANCE_DIRS.contains(&name.as_ref())
        } else {
            true
        }
    });

    for entry in walker {
        let entry = entry.map_err(|e| StrukturError::Other {
            message: format!("failed to read directory entry under {}: {e}", dir.display()),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if !name.ends_with(".json") || name.ends_with(CLASS_SUFFIX) || name.ends_with(SCHEMA_SUFFIX) {
            continue;
        }
        paths.push(entry.path().to_path_buf());
    }
    paths.sort();
    Ok(paths)
}

/// Parse and structurally validate one instance file.
///
/// Returns `Ok(None)` for a record with no `$class` rather than failing
/// immediately, matching spec.md's "classless records are collected" rule.
fn load_one(path: &Path) -> Result<Option<Instance>, StrukturError> {
    let text = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&text).map_err(|e| StrukturError::InvalidJson {
        file: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let Value::Object(mut obj) = value else {
        return Err(StrukturError::ArrayInstanceFile { file: path.display().to_string() });
    };

    for key in LEGACY_KEYS {
        if obj.contains_key(key) {
            return Err(StrukturError::LegacyShape { file: path.display().to_string() });
        }
    }

    let id = required_string(&obj, "$id")
        .ok_or_else(|| StrukturError::MissingId { file: path.display().to_string() })?;

    let Some(class) = required_string(&obj, "$class") else {
        return Ok(None);
    };

    let aspects = match obj.remove("$aspects") {
        Some(Value::Object(map)) => map,
        Some(_) | None => Map::new(),
    };

    let render = match obj.remove("$render") {
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| parse_render_task(&item, path))
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) | None => Vec::new(),
    };

    obj.remove("$id");
    obj.remove("$class");

    let mut instance = Instance::new(id, class, obj, path.to_path_buf());
    instance.aspects = aspects;
    instance.render = render;
    Ok(Some(instance))
}

fn parse_render_task(value: &Value, path: &Path) -> Result<RenderTask, StrukturError> {
    serde_json::from_value(value.clone()).map_err(|e| StrukturError::InvalidRenderTask {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_instance(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_a_simple_instance() {
        let dir = tempdir().unwrap();
        write_instance(
            dir.path(),
            "web1.json",
            r#"{"$id": "web-1", "$class": "server", "cpu": 4}"#,
        );
        let report = load_instances(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(report.instances.len(), 1);
        assert!(report.classless.is_empty());
        assert_eq!(report.instances[0].id, "web-1");
        assert_eq!(report.instances[0].extra.get("cpu"), Some(&Value::from(4)));
    }

    #[test]
    fn skips_class_and_schema_definition_files() {
        let dir = tempdir().unwrap();
        write_instance(dir.path(), "server.class.json", r#"{"$class": "server", "$schema": {}}"#);
        write_instance(dir.path(), "server.schema.json", r#"{"type": "object"}"#);
        let report = load_instances(&[dir.path().to_path_buf()]).unwrap();
        assert!(report.instances.is_empty());
    }

    #[test]
    fn excludes_reserved_subdirectories() {
        let dir = tempdir().unwrap();
        write_instance(dir.path(), "mixins/fragment.json", r#"{"$id": "x", "$class": "server"}"#);
        let report = load_instances(&[dir.path().to_path_buf()]).unwrap();
        assert!(report.instances.is_empty());
    }

    #[test]
    fn rejects_legacy_keys() {
        let dir = tempdir().unwrap();
        write_instance(dir.path(), "legacy.json", r#"{"id": "x", "class": "server"}"#);
        let err = load_instances(&[dir.path().to_path_buf()]).unwrap_err();
        assert!(matches!(err, StrukturError::LegacyShape { .. }));
    }

    #[test]
    fn rejects_missing_id() {
        let dir = tempdir().unwrap();
        write_instance(dir.path(), "noid.json", r#"{"$class": "server"}"#);
        let err = load_instances(&[dir.path().to_path_buf()]).unwrap_err();
        assert!(matches!(err, StrukturError::MissingId { .. }));
    }

    #[test]
    fn collects_classless_records_instead_of_failing() {
        let dir = tempdir().unwrap();
        write_instance(dir.path(), "orphan.json", r#"{"$id": "orphan-1"}"#);
        let report = load_instances(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(report.classless.len(), 1);
        let err = report.into_instances().unwrap_err();
        assert!(matches!(err, StrukturError::ClasslessInstances { .. }));
    }

    #[test]
    fn rejects_array_of_instances() {
        let dir = tempdir().unwrap();
        write_instance(dir.path(), "many.json", r#"[{"$id": "a"}, {"$id": "b"}]"#);
        let err = load_instances(&[dir.path().to_path_buf()]).unwrap_err();
        assert!(matches!(err, StrukturError::ArrayInstanceFile { .. }));
    }

    #[test]
    fn rejects_malformed_render_task() {
        let dir = tempdir().unwrap();
        write_instance(
            dir.path(),
            "bad_render.json",
            r#"{"$id": "x", "$class": "server", "$render": [{"template": "index.html"}]}"#,
        );
        let err = load_instances(&[dir.path().to_path_buf()]).unwrap_err();
        assert!(matches!(err, StrukturError::InvalidRenderTask { .. }));
    }

    #[test]
    fn accepts_well_formed_render_task() {
        let dir = tempdir().unwrap();
        write_instance(
            dir.path(),
            "ok_render.json",
            r#"{"$id": "x", "$class": "server", "$render": [{"template": "index.html", "output": "index.html"}]}"#,
        );
        let report = load_instances(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(report.instances[0].render.len(), 1);
    }
}
