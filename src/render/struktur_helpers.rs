//! Struktur-specific template helpers (spec.md §6, "Struktur-specific" list).
//!
//! Bound to a [`CanonicalModel`] rather than pure data, so they live apart
//! from [`crate::render::helpers`]. Each concrete adapter wires these into
//! its own helper-registration shape.

use crate::model::CanonicalModel;
use serde_json::Value;

/// `schema_required(className)`: the `required` array, if any, from the
/// leaf layer of the class's resolved schema chain.
#[must_use]
pub fn schema_required(canonical: &CanonicalModel, class_name: &str) -> Vec<String> {
    canonical
        .classes_by_id
        .get(class_name)
        .and_then(|c| c.get("$schemas"))
        .and_then(Value::as_array)
        .and_then(|schemas| schemas.last())
        .and_then(|schema| schema.get("required"))
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default()
}

/// `schema_has(className, propertyName)`: whether any layer of the class's
/// schema chain declares `propertyName` under `properties`.
#[must_use]
pub fn schema_has(canonical: &CanonicalModel, class_name: &str, property_name: &str) -> bool {
    schema_props(canonical, class_name).contains_key(property_name)
}

/// `schema_props(className)`: the union of `properties` across every layer
/// of the class's schema chain, leaf layers overriding earlier ones.
#[must_use]
pub fn schema_props(canonical: &CanonicalModel, class_name: &str) -> serde_json::Map<String, Value> {
    let mut props = serde_json::Map::new();
    if let Some(schemas) =
        canonical.classes_by_id.get(class_name).and_then(|c| c.get("$schemas")).and_then(Value::as_array)
    {
        for schema in schemas {
            if let Some(layer_props) = schema.get("properties").and_then(Value::as_object) {
                for (key, value) in layer_props {
                    props.insert(key.clone(), value.clone());
                }
            }
        }
    }
    props
}

/// `schema_prop_source(className, propertyName)`: which lineage member
/// first declared `propertyName`, root-first.
#[must_use]
pub fn schema_prop_source(canonical: &CanonicalModel, class_name: &str, property_name: &str) -> Option<String> {
    let resolved = canonical.classes_by_id.get(class_name)?;
    let lineage = resolved.get("$lineage")?.as_array()?;
    let schemas = resolved.get("$schemas")?.as_array()?;
    for (name, schema) in lineage.iter().zip(schemas.iter()) {
        if schema.get("properties").and_then(Value::as_object).is_some_and(|p| p.contains_key(property_name)) {
            return name.as_str().map(str::to_string);
        }
    }
    None
}

/// `schema_required_by_source(className, propertyName)`: which lineage
/// member first listed `propertyName` in its own `required` array.
#[must_use]
pub fn schema_required_by_source(canonical: &CanonicalModel, class_name: &str, property_name: &str) -> Option<String> {
    let resolved = canonical.classes_by_id.get(class_name)?;
    let lineage = resolved.get("$lineage")?.as_array()?;
    let schemas = resolved.get("$schemas")?.as_array()?;
    for (name, schema) in lineage.iter().zip(schemas.iter()) {
        let required = schema.get("required").and_then(Value::as_array);
        if required.is_some_and(|r| r.iter().any(|v| v.as_str() == Some(property_name))) {
            return name.as_str().map(str::to_string);
        }
    }
    None
}

/// `inherits(className, ancestorName)`: whether `ancestorName` appears in
/// `className`'s lineage.
#[must_use]
pub fn inherits(canonical: &CanonicalModel, class_name: &str, ancestor_name: &str) -> bool {
    canonical
        .classes_by_id
        .get(class_name)
        .and_then(|c| c.get("$lineage"))
        .and_then(Value::as_array)
        .is_some_and(|lineage| lineage.iter().any(|v| v.as_str() == Some(ancestor_name)))
}

/// `filter_inherits(instances, ancestorName)`: instances whose class
/// lineage includes `ancestorName`.
#[must_use]
pub fn filter_inherits<'a>(
    canonical: &CanonicalModel,
    instances: &'a [serde_json::Map<String, Value>],
    ancestor_name: &str,
) -> Vec<&'a serde_json::Map<String, Value>> {
    instances
        .iter()
        .filter(|instance| {
            instance
                .get("$class")
                .and_then(Value::as_str)
                .is_some_and(|class_name| inherits(canonical, class_name, ancestor_name))
        })
        .collect()
}

/// `class_lineage(className)`: the class's resolved lineage, root-first.
#[must_use]
pub fn class_lineage(canonical: &CanonicalModel, class_name: &str) -> Vec<String> {
    canonical
        .classes_by_id
        .get(class_name)
        .and_then(|c| c.get("$lineage"))
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default()
}

/// Dispatch one of the struktur-specific helpers above by name, mirroring
/// [`crate::render::helpers::call`]'s shape so each adapter tries the
/// generic table first and this one second. `filter_inherits` reads its
/// instance list from `canonical.instances` itself rather than taking one
/// as an argument, since every template call site means "the build's own
/// instances".
#[must_use]
pub fn call(canonical: &CanonicalModel, name: &str, args: &[Value]) -> Option<Value> {
    let str_arg = |i: usize| args.get(i).and_then(Value::as_str).unwrap_or("").to_string();

    Some(match name {
        "schema_required" => Value::Array(schema_required(canonical, &str_arg(0)).into_iter().map(Value::String).collect()),
        "schema_has" => Value::Bool(schema_has(canonical, &str_arg(0), &str_arg(1))),
        "schema_props" => Value::Object(schema_props(canonical, &str_arg(0))),
        "schema_prop_source" => schema_prop_source(canonical, &str_arg(0), &str_arg(1)).map_or(Value::Null, Value::String),
        "schema_required_by_source" => {
            schema_required_by_source(canonical, &str_arg(0), &str_arg(1)).map_or(Value::Null, Value::String)
        }
        "inherits" => Value::Bool(inherits(canonical, &str_arg(0), &str_arg(1))),
        "filter_inherits" => Value::Array(
            filter_inherits(canonical, &canonical.instances, &str_arg(0)).into_iter().map(|m| Value::Object(m.clone())).collect(),
        ),
        "class_lineage" => Value::Array(class_lineage(canonical, &str_arg(0)).into_iter().map(Value::String).collect()),
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ValidationSummary;
    use serde_json::json;

    fn model() -> CanonicalModel {
        let mut classes_by_id = serde_json::Map::new();
        classes_by_id.insert(
            "server".to_string(),
            json!({
                "$lineage": ["base", "server"],
                "$schemas": [
                    {"type": "object", "properties": {"cpu": {"type": "integer"}}, "required": ["cpu"]},
                    {"type": "object", "properties": {"mem": {"type": "integer"}}, "required": ["mem"]},
                ],
            }),
        );
        CanonicalModel {
            instances: vec![],
            instances_by_id: serde_json::Map::new(),
            classes_by_id,
            aspects_by_id: serde_json::Map::new(),
            metadata: json!({}),
            validation: ValidationSummary::default(),
        }
    }

    /// Builds a class registry through the real resolver/canonical-builder
    /// pipeline rather than a hand-rolled fixture, so a future rename of
    /// `ResolvedClass`'s `$`-prefixed fields is caught here instead of only
    /// surfacing as silently-empty helper output at render time.
    fn model_via_real_pipeline() -> CanonicalModel {
        use crate::canonical::build_canonical_model;
        use crate::model::ClassDef;
        use crate::schema::SchemaCache;
        use crate::validator::LintConfig;
        use std::collections::BTreeMap;
        use std::path::PathBuf;

        let mut classes = BTreeMap::new();
        classes.insert(
            "base".to_string(),
            ClassDef {
                class: "base".to_string(),
                parent: None,
                schema: json!({"type": "object", "properties": {"cpu": {"type": "integer"}}, "required": ["cpu"]}),
                fields: json!({}),
                uses_aspects: vec![],
                aspect_defaults: serde_json::Map::new(),
                source_file: PathBuf::from("base.class.json"),
            },
        );
        classes.insert(
            "server".to_string(),
            ClassDef {
                class: "server".to_string(),
                parent: Some("base".to_string()),
                schema: json!({"type": "object", "properties": {"mem": {"type": "integer"}}, "required": ["mem"]}),
                fields: json!({}),
                uses_aspects: vec![],
                aspect_defaults: serde_json::Map::new(),
                source_file: PathBuf::from("server.class.json"),
            },
        );
        let aspects = BTreeMap::new();
        let mut cache = SchemaCache::new();
        build_canonical_model(&[], &classes, &aspects, &mut cache, &LintConfig::default()).unwrap()
    }

    #[test]
    fn schema_props_unions_across_lineage() {
        let model = model();
        let props = schema_props(&model, "server");
        assert!(props.contains_key("cpu"));
        assert!(props.contains_key("mem"));
    }

    #[test]
    fn schema_prop_source_finds_the_declaring_layer() {
        let model = model();
        assert_eq!(schema_prop_source(&model, "server", "cpu"), Some("base".to_string()));
        assert_eq!(schema_prop_source(&model, "server", "mem"), Some("server".to_string()));
    }

    #[test]
    fn inherits_checks_lineage_membership() {
        let model = model();
        assert!(inherits(&model, "server", "base"));
        assert!(!inherits(&model, "server", "workstation"));
    }

    #[test]
    fn class_lineage_returns_root_first_order() {
        let model = model();
        assert_eq!(class_lineage(&model, "server"), vec!["base".to_string(), "server".to_string()]);
    }

    #[test]
    fn helpers_read_the_real_canonical_model_keys() {
        let model = model_via_real_pipeline();
        assert_eq!(class_lineage(&model, "server"), vec!["base".to_string(), "server".to_string()]);
        assert!(inherits(&model, "server", "base"));
        assert!(schema_has(&model, "server", "cpu"));
        assert!(schema_has(&model, "server", "mem"));
        assert_eq!(schema_prop_source(&model, "server", "cpu"), Some("base".to_string()));
        assert_eq!(schema_required_by_source(&model, "server", "mem"), Some("server".to_string()));
    }
}
