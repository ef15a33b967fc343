//! Class loader (spec.md §4.3, component 3).
//!
//! Discovers `*.class.json` files, parses and structurally validates them,
//! meta-validates `$schema` against draft-07, and registers each into a
//! name -> [`ClassDef`] table. Duplicate `$class` names are rejected.

use crate::core::StrukturError;
use crate::model::{ClassDef, required_string};
use crate::schema::SchemaCache;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

const SUFFIX: &str = ".class.json";

/// Load every `*.class.json` file under `dirs`, in the order the
/// directories were configured and alphabetically within each directory.
///
/// `schema_cache` caches each class's compiled `$schema` by class name, so
/// the validator doesn't recompile it per instance (spec.md §4.9
/// "registration caching").
pub fn load_classes(
    dirs: &[std::path::PathBuf],
    schema_cache: &mut SchemaCache,
) -> Result<BTreeMap<String, ClassDef>, StrukturError> {
    let mut registry: BTreeMap<String, ClassDef> = BTreeMap::new();

    for dir in dirs {
        for path in super::discover_json_files(dir, SUFFIX)? {
            let class = load_one(&path)?;
            schema_cache.get_or_compile(&class.class, &class.schema, &path.display().to_string())?;

            if let Some(existing) = registry.get(&class.class) {
                return Err(StrukturError::DuplicateName {
                    kind: "class".to_string(),
                    name: class.class.clone(),
                    first: existing.source_file.display().to_string(),
                    second: path.display().to_string(),
                });
            }
            registry.insert(class.class.clone(), class);
        }
    }

    Ok(registry)
}

fn load_one(path: &Path) -> Result<ClassDef, StrukturError> {
    let text = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&text).map_err(|e| StrukturError::InvalidJson {
        file: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let Value::Object(obj) = value else {
        return Err(StrukturError::ArrayInstanceFile { file: path.display().to_string() });
    };

    if obj.contains_key("$aspects") {
        return Err(StrukturError::LegacyShape { file: path.display().to_string() });
    }

    let class_name = required_string(&obj, "$class").ok_or_else(|| StrukturError::MissingRequiredField {
        kind: "class".to_string(),
        name: path.display().to_string(),
        file: path.display().to_string(),
        field: "$class".to_string(),
    })?;

    let schema = obj.get("$schema").cloned().ok_or_else(|| StrukturError::MissingRequiredField {
        kind: "class".to_string(),
        name: class_name.clone(),
        file: path.display().to_string(),
        field: "$schema".to_string(),
    })?;

    let parent = match obj.get("$parent") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Array(_)) => {
            return Err(StrukturError::MultiParentRejected { class: class_name.clone() });
        }
        Some(_) => {
            return Err(StrukturError::MultiParentRejected { class: class_name.clone() });
        }
    };

    let fields = obj.get("$fields").cloned().unwrap_or_else(|| Value::Object(serde_json::Map::new()));

    let uses_aspects = match obj.get("$uses_aspects") {
        Some(Value::Array(items)) => items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect(),
        _ => Vec::new(),
    };

    let aspect_defaults = match obj.get("$aspect_defaults") {
        Some(Value::Object(map)) => map.clone(),
        _ => serde_json::Map::new(),
    };

    Ok(ClassDef {
        class: class_name,
        parent,
        schema,
        fields,
        uses_aspects,
        aspect_defaults,
        source_file: path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_class(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(format!("{name}.class.json"));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_a_simple_class() {
        let dir = tempdir().unwrap();
        write_class(
            dir.path(),
            "server",
            r#"{"$class": "server", "$schema": {"type": "object"}, "$fields": {"cpu": 1}}"#,
        );
        let mut cache = SchemaCache::new();
        let registry = load_classes(&[dir.path().to_path_buf()], &mut cache).unwrap();
        assert!(registry.contains_key("server"));
        assert_eq!(registry["server"].fields, serde_json::json!({"cpu": 1}));
    }

    #[test]
    fn rejects_missing_class_field() {
        let dir = tempdir().unwrap();
        write_class(dir.path(), "broken", r#"{"$schema": {"type": "object"}}"#);
        let mut cache = SchemaCache::new();
        let err = load_classes(&[dir.path().to_path_buf()], &mut cache).unwrap_err();
        assert!(matches!(err, StrukturError::MissingRequiredField { .. }));
    }

    #[test]
    fn rejects_array_parent() {
        let dir = tempdir().unwrap();
        write_class(
            dir.path(),
            "multi",
            r#"{"$class": "multi", "$parent": ["a", "b"], "$schema": {"type": "object"}}"#,
        );
        let mut cache = SchemaCache::new();
        let err = load_classes(&[dir.path().to_path_buf()], &mut cache).unwrap_err();
        assert!(matches!(err, StrukturError::MultiParentRejected { .. }));
    }

    #[test]
    fn rejects_legacy_aspects_array() {
        let dir = tempdir().unwrap();
        write_class(
            dir.path(),
            "legacy",
            r#"{"$class": "legacy", "$schema": {"type": "object"}, "$aspects": ["network"]}"#,
        );
        let mut cache = SchemaCache::new();
        let err = load_classes(&[dir.path().to_path_buf()], &mut cache).unwrap_err();
        assert!(matches!(err, StrukturError::LegacyShape { .. }));
    }

    #[test]
    fn rejects_duplicate_class_name() {
        let dir = tempdir().unwrap();
        write_class(dir.path(), "a_server", r#"{"$class": "server", "$schema": {"type": "object"}}"#);
        write_class(dir.path(), "b_server", r#"{"$class": "server", "$schema": {"type": "object"}}"#);
        let mut cache = SchemaCache::new();
        let err = load_classes(&[dir.path().to_path_buf()], &mut cache).unwrap_err();
        assert!(matches!(err, StrukturError::DuplicateName { .. }));
    }

    #[test]
    fn rejects_unmetavalidatable_schema() {
        let dir = tempdir().unwrap();
        write_class(dir.path(), "bad_schema", r#"{"$class": "bad", "$schema": {"type": "not-a-real-type"}}"#);
        let mut cache = SchemaCache::new();
        let err = load_classes(&[dir.path().to_path_buf()], &mut cache).unwrap_err();
        assert!(matches!(err, StrukturError::InvalidSchemaMetaValidation { .. }));
    }
}
