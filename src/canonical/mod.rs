//! Canonical builder (spec.md §4.10, component 10).
//!
//! Produces the canonical model: every merged instance run through the
//! three-layer aspect-defaults merge, indexed by id, alongside a resolved
//! class index, a decorated aspect index, build metadata, and the
//! validation summary. Grounded on spec.md §8 scenario 1 (the worked
//! three-layer aspect merge example) for the exact layer order.

use crate::core::StrukturError;
use crate::merge::class_merge;
use crate::model::{AspectDef, CanonicalModel, ClassDef, Instance, ValidationSummary};
use crate::resolver::ClassResolver;
use crate::schema::SchemaCache;
use crate::validator::{self, Level, LintConfig};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Assemble the canonical model from loaded-and-merged instances and
/// registered classes/aspects.
///
/// Fails immediately if any instance names a class the registry never
/// loaded (spec.md invariant 2) - resolution of unrelated classes (even
/// ones no instance uses) is still attempted, so a broken lineage anywhere
/// in the registry surfaces even when nothing currently references it.
pub fn build_canonical_model(
    instances: &[Instance],
    classes: &BTreeMap<String, ClassDef>,
    aspects: &BTreeMap<String, AspectDef>,
    schema_cache: &mut SchemaCache,
    lint: &LintConfig,
) -> Result<CanonicalModel, StrukturError> {
    let resolver = ClassResolver::new(classes);

    for class_name in classes.keys() {
        resolver.resolve(class_name)?;
    }

    let mut emitted = Vec::with_capacity(instances.len());
    let mut instances_by_id = Map::new();
    let mut validation = ValidationSummary::default();

    for instance in instances {
        if !classes.contains_key(&instance.class) {
            return Err(StrukturError::UnresolvedClass { instance: instance.id.clone(), class: instance.class.clone() });
        }
        let resolved = resolver.resolve(&instance.class)?;

        let issues = validator::validate_instance(instance, &resolved, aspects, schema_cache, lint);
        validation.total += 1;
        if issues.iter().any(|i| i.level == Level::Error) {
            validation.invalid += 1;
        } else {
            validation.valid += 1;
        }
        validation.errors.extend(issues);

        let record = build_instance_record(instance, &resolved, aspects);
        instances_by_id.insert(instance.id.clone(), Value::Object(record.clone()));
        emitted.push(record);
    }

    let mut classes_by_id = Map::new();
    for class_name in classes.keys() {
        let resolved = resolver.resolve(class_name)?;
        classes_by_id.insert(class_name.clone(), serde_json::to_value(resolved.as_ref()).unwrap_or(Value::Null));
    }

    let mut aspects_by_id = Map::new();
    for (name, aspect) in aspects {
        aspects_by_id.insert(name.clone(), aspect_entry(aspect));
    }

    let metadata = serde_json::json!({
        "generator": "struktur",
        "generator_version": env!("CARGO_PKG_VERSION"),
        "instance_count": instances.len(),
        "class_count": classes.len(),
        "aspect_count": aspects.len(),
    });

    Ok(CanonicalModel { instances: emitted, instances_by_id, classes_by_id, aspects_by_id, metadata, validation })
}

/// Apply the three-layer aspect merge and assemble one instance's canonical
/// record (spec.md §4.10 steps 1-5).
fn build_instance_record(
    instance: &Instance,
    resolved: &crate::model::ResolvedClass,
    aspects: &BTreeMap<String, AspectDef>,
) -> Map<String, Value> {
    let base_data = class_merge(&resolved.fields, &Value::Object(instance.extra.clone()));

    let mut aspect_names: Vec<String> = Vec::new();
    for name in resolved.uses_aspects.iter().chain(resolved.aspect_defaults.keys()).chain(instance.aspects.keys()) {
        if !aspect_names.contains(name) {
            aspect_names.push(name.clone());
        }
    }

    let mut merged_aspects = Map::new();
    for name in &aspect_names {
        let layer1 = aspects.get(name).map(|a| a.defaults.clone()).unwrap_or_else(|| Value::Object(Map::new()));
        let layer2 = resolved.aspect_defaults.get(name).cloned().unwrap_or_else(|| Value::Object(Map::new()));
        let layer3 = instance.aspects.get(name).cloned().unwrap_or_else(|| Value::Object(Map::new()));
        let merged = class_merge(&class_merge(&layer1, &layer2), &layer3);
        merged_aspects.insert(name.clone(), merged);
    }

    let mut record = match base_data {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    record.insert("$id".to_string(), Value::String(instance.id.clone()));
    record.insert("$class".to_string(), Value::String(instance.class.clone()));
    record.insert("$uses_aspects".to_string(), Value::Array(aspect_names.into_iter().map(Value::String).collect()));
    record.insert("$aspects".to_string(), Value::Object(merged_aspects));
    record.insert(
        "$render".to_string(),
        Value::Array(instance.render.iter().map(|t| serde_json::to_value(t).unwrap_or(Value::Null)).collect()),
    );
    record
}

/// Decorate one aspect for `$aspects_by_id`: name, a human-readable pretty
/// name, its schema's own `description` (if any), and its defaults.
fn aspect_entry(aspect: &AspectDef) -> Value {
    let description = aspect.schema.get("description").and_then(Value::as_str).unwrap_or("").to_string();
    serde_json::json!({
        "name": aspect.aspect,
        "pretty_name": pretty_name(&aspect.aspect),
        "description": description,
        "schema": aspect.schema,
        "defaults": aspect.defaults,
    })
}

/// Title-case a kebab/snake-case identifier for display: `web-server` ->
/// `Web Server`.
fn pretty_name(name: &str) -> String {
    name.split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RenderTask;
    use serde_json::json;
    use std::path::PathBuf;

    fn test_class(name: &str, parent: Option<&str>, fields: Value, uses_aspects: &[&str], aspect_defaults: Map<String, Value>) -> ClassDef {
        ClassDef {
            class: name.to_string(),
            parent: parent.map(str::to_string),
            schema: json!({"type": "object"}),
            fields,
            uses_aspects: uses_aspects.iter().map(|s| s.to_string()).collect(),
            aspect_defaults,
            source_file: PathBuf::from(format!("{name}.class.json")),
        }
    }

    fn test_aspect(name: &str, defaults: Value) -> AspectDef {
        AspectDef { aspect: name.to_string(), schema: json!({"type": "object"}), defaults, source_file: PathBuf::from(format!("{name}.class.json")) }
    }

    #[test]
    fn applies_three_layer_aspect_merge() {
        let mut classes = BTreeMap::new();
        let mut aspect_defaults = Map::new();
        aspect_defaults.insert("network".to_string(), json!({"port": 80}));
        classes.insert(
            "server".to_string(),
            test_class("server", None, json!({"cpu": 2}), &["network"], aspect_defaults),
        );

        let mut aspects = BTreeMap::new();
        aspects.insert("network".to_string(), test_aspect("network", json!({"port": 8080, "protocol": "tcp"})));

        let mut inst = Instance::new("web-1".to_string(), "server".to_string(), json!({"description": "d"}).as_object().unwrap().clone(), PathBuf::from("web-1.json"));
        inst.aspects.insert("network".to_string(), json!({"port": 443}));

        let mut cache = SchemaCache::new();
        let model = build_canonical_model(&[inst], &classes, &aspects, &mut cache, &LintConfig::default()).unwrap();

        let record = &model.instances[0];
        let net = record.get("$aspects").unwrap().get("network").unwrap();
        assert_eq!(net.get("port"), Some(&json!(443)));
        assert_eq!(net.get("protocol"), Some(&json!("tcp")));
        assert_eq!(record.get("cpu"), Some(&json!(2)));
    }

    #[test]
    fn materializes_aspect_even_without_instance_data() {
        let mut classes = BTreeMap::new();
        let mut aspect_defaults = Map::new();
        aspect_defaults.insert("network".to_string(), json!({"port": 80}));
        classes.insert("server".to_string(), test_class("server", None, json!({}), &["network"], aspect_defaults));
        let aspects: BTreeMap<String, AspectDef> = BTreeMap::new();

        let inst = Instance::new("web-1".to_string(), "server".to_string(), json!({"description": "d"}).as_object().unwrap().clone(), PathBuf::from("web-1.json"));
        let mut cache = SchemaCache::new();
        let model = build_canonical_model(&[inst], &classes, &aspects, &mut cache, &LintConfig::default()).unwrap();

        let record = &model.instances[0];
        let net = record.get("$aspects").unwrap().get("network").unwrap();
        assert_eq!(net.get("port"), Some(&json!(80)));
    }

    #[test]
    fn carries_instance_render_tasks_into_the_emitted_record() {
        let mut classes = BTreeMap::new();
        classes.insert("page".to_string(), test_class("page", None, json!({}), &[], Map::new()));

        let mut inst =
            Instance::new("home".to_string(), "page".to_string(), Map::new(), PathBuf::from("home.json"));
        inst.render.push(RenderTask { template: "page.txt".to_string(), output: "pages/home.txt".to_string() });

        let mut cache = SchemaCache::new();
        let model =
            build_canonical_model(&[inst], &classes, &BTreeMap::new(), &mut cache, &LintConfig::default()).unwrap();

        let render = model.instances[0].get("$render").and_then(Value::as_array).unwrap();
        assert_eq!(render.len(), 1);
        assert_eq!(render[0].get("template"), Some(&json!("page.txt")));
        assert_eq!(render[0].get("output"), Some(&json!("pages/home.txt")));
    }

    #[test]
    fn fails_on_unresolved_class() {
        let classes: BTreeMap<String, ClassDef> = BTreeMap::new();
        let aspects: BTreeMap<String, AspectDef> = BTreeMap::new();
        let inst = Instance::new("web-1".to_string(), "missing".to_string(), Map::new(), PathBuf::from("web-1.json"));
        let mut cache = SchemaCache::new();
        let err = build_canonical_model(&[inst], &classes, &aspects, &mut cache, &LintConfig::default()).unwrap_err();
        assert!(matches!(err, StrukturError::UnresolvedClass { .. }));
    }

    #[test]
    fn pretty_name_title_cases_kebab_identifiers() {
        assert_eq!(pretty_name("web-server"), "Web Server");
        assert_eq!(pretty_name("load_balancer"), "Load Balancer");
    }
}
