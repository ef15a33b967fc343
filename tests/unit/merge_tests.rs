use serde_json::json;
use struktur_cli::merge::{class_merge, instance_merge};

#[test]
fn class_merge_recurses_into_nested_objects() {
    let base = json!({ "a": { "x": 1, "y": 2 }, "b": "base" });
    let child = json!({ "a": { "y": 20, "z": 3 } });
    let merged = class_merge(&base, &child);
    assert_eq!(merged, json!({ "a": { "x": 1, "y": 20, "z": 3 }, "b": "base" }));
}

#[test]
fn class_merge_replaces_arrays_wholesale() {
    let base = json!({ "tags": ["a", "b"] });
    let child = json!({ "tags": ["c"] });
    let merged = class_merge(&base, &child);
    assert_eq!(merged, json!({ "tags": ["c"] }));
}

#[test]
fn class_merge_child_scalar_wins() {
    let base = json!({ "count": 1 });
    let child = json!({ "count": 2 });
    assert_eq!(class_merge(&base, &child), json!({ "count": 2 }));
}

#[test]
fn instance_merge_combines_two_fragments() {
    let a = json!({ "$id": "web", "$class": "service", "name": "web" });
    let b = json!({ "$id": "web", "$class": "service", "port": 8080 });
    let merged = instance_merge(&a, &b).unwrap();
    assert_eq!(merged["name"], "web");
    assert_eq!(merged["port"], 8080);
}

#[test]
fn instance_merge_rejects_type_conflicts() {
    let a = json!({ "port": 8080 });
    let b = json!({ "port": "8080" });
    let err = instance_merge(&a, &b).unwrap_err();
    assert!(err.to_string().contains("type conflict"));
}

#[test]
fn instance_merge_concatenates_and_dedupes_primitive_arrays() {
    let a = json!({ "tags": ["a", "b"] });
    let b = json!({ "tags": ["b", "c"] });
    let merged = instance_merge(&a, &b).unwrap();
    assert_eq!(merged["tags"], json!(["a", "b", "c"]));
}
