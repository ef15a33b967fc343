//! Aspect loader (spec.md §4.4, component 4).
//!
//! Discovers `*.class.json` files under the configured aspect directories.
//! Aspects share the class file's `$`-prefixed shape but additionally
//! require `$aspect` to equal `$class`, and never declare `$parent` or
//! `$uses_aspects` - aspects do not themselves inherit or compose.

use crate::core::StrukturError;
use crate::model::{AspectDef, required_string};
use crate::schema::SchemaCache;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

const SUFFIX: &str = ".class.json";

/// Load every aspect definition file under `dirs`.
pub fn load_aspects(
    dirs: &[std::path::PathBuf],
    schema_cache: &mut SchemaCache,
) -> Result<BTreeMap<String, AspectDef>, StrukturError> {
    let mut registry: BTreeMap<String, AspectDef> = BTreeMap::new();

    for dir in dirs {
        for path in super::discover_json_files(dir, SUFFIX)? {
            let aspect = load_one(&path)?;
            schema_cache.get_or_compile(&aspect.aspect, &aspect.schema, &path.display().to_string())?;

            if let Some(existing) = registry.get(&aspect.aspect) {
                return Err(StrukturError::DuplicateName {
                    kind: "aspect".to_string(),
                    name: aspect.aspect.clone(),
                    first: existing.source_file.display().to_string(),
                    second: path.display().to_string(),
                });
            }
            registry.insert(aspect.aspect.clone(), aspect);
        }
    }

    Ok(registry)
}

fn load_one(path: &Path) -> Result<AspectDef, StrukturError> {
    let text = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&text).map_err(|e| StrukturError::InvalidJson {
        file: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let Value::Object(obj) = value else {
        return Err(StrukturError::ArrayInstanceFile { file: path.display().to_string() });
    };

    let aspect_name = required_string(&obj, "$aspect").ok_or_else(|| StrukturError::MissingRequiredField {
        kind: "aspect".to_string(),
        name: path.display().to_string(),
        file: path.display().to_string(),
        field: "$aspect".to_string(),
    })?;

    let class_name = required_string(&obj, "$class").ok_or_else(|| StrukturError::MissingRequiredField {
        kind: "aspect".to_string(),
        name: aspect_name.clone(),
        file: path.display().to_string(),
        field: "$class".to_string(),
    })?;

    if class_name != aspect_name {
        return Err(StrukturError::LegacyShape { file: path.display().to_string() });
    }

    let schema = obj.get("$schema").cloned().ok_or_else(|| StrukturError::MissingRequiredField {
        kind: "aspect".to_string(),
        name: aspect_name.clone(),
        file: path.display().to_string(),
        field: "$schema".to_string(),
    })?;

    let defaults = match obj.get("$defaults") {
        Some(v @ Value::Object(_)) => v.clone(),
        _ => Value::Object(serde_json::Map::new()),
    };

    Ok(AspectDef { aspect: aspect_name, schema, defaults, source_file: path.to_path_buf() })
}
