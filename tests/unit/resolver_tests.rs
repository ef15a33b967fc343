use serde_json::{json, Map};
use std::collections::BTreeMap;
use std::path::PathBuf;
use struktur_cli::core::StrukturError;
use struktur_cli::model::ClassDef;
use struktur_cli::resolver::ClassResolver;

fn class(name: &str, parent: Option<&str>, uses_aspects: &[&str]) -> ClassDef {
    ClassDef {
        class: name.to_string(),
        parent: parent.map(str::to_string),
        schema: json!({ "type": "object", "properties": {} }),
        fields: json!({}),
        uses_aspects: uses_aspects.iter().map(|s| s.to_string()).collect(),
        aspect_defaults: Map::new(),
        source_file: PathBuf::from(format!("{name}.class.json")),
    }
}

fn registry(classes: Vec<ClassDef>) -> BTreeMap<String, ClassDef> {
    classes.into_iter().map(|c| (c.class.clone(), c)).collect()
}

#[test]
fn resolve_builds_root_to_leaf_lineage() {
    let registry = registry(vec![
        class("base", None, &["logging"]),
        class("service", Some("base"), &["metrics"]),
        class("web-service", Some("service"), &[]),
    ]);
    let resolver = ClassResolver::new(&registry);
    let resolved = resolver.resolve("web-service").unwrap();
    assert_eq!(resolved.lineage, vec!["base", "service", "web-service"]);
    assert_eq!(resolved.schemas.len(), 3);
    let mut uses = resolved.uses_aspects.clone();
    uses.sort();
    assert_eq!(uses, vec!["logging", "metrics"]);
}

#[test]
fn resolve_fails_on_unknown_parent() {
    let registry = registry(vec![class("web-service", Some("missing-base"), &[])]);
    let resolver = ClassResolver::new(&registry);
    let err = resolver.resolve("web-service").unwrap_err();
    assert!(matches!(err, StrukturError::UnknownParent { .. }));
}

#[test]
fn resolve_detects_circular_inheritance() {
    let registry = registry(vec![class("a", Some("b"), &[]), class("b", Some("a"), &[])]);
    let resolver = ClassResolver::new(&registry);
    let err = resolver.resolve("a").unwrap_err();
    assert!(matches!(err, StrukturError::CircularInheritance { .. }));
}

#[test]
fn resolve_caches_results() {
    let registry = registry(vec![class("base", None, &[]), class("service", Some("base"), &[])]);
    let resolver = ClassResolver::new(&registry);
    let first = resolver.resolve("service").unwrap();
    let second = resolver.resolve("service").unwrap();
    assert!(std::rc::Rc::ptr_eq(&first, &second));
}
