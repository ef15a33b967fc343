//! Deep-merge semantics.
//!
//! Two variants, chosen by call site and never confused: [`class_merge`]
//! (used when accumulating a class's own `$fields`/`$aspect_defaults`
//! across its lineage, and when layering the three aspect-default sources
//! in the canonical builder) and [`instance_merge`] (used only by the
//! instance merger, to combine multiple fragments that share an `$id`).
//!
//! Grounded on the general "each source contributes a JSON fragment,
//! combine deterministically" shape of the teacher's
//! `src/manifest/manifest_mutations.rs` and `src/hooks/merge.rs`.

use crate::core::StrukturError;
use serde_json::Value;

/// Merge `child` over `base`, child winning.
///
/// - Objects merge recursively, key by key.
/// - Arrays are *replaced* wholesale by the child's array (no
///   concatenation).
/// - Scalars: the child's value wins.
/// - A type mismatch between `base` and `child` at some path is tolerated;
///   the child simply wins, the way a `ClassDef` always wins over its
///   ancestors.
#[must_use]
pub fn class_merge(base: &Value, child: &Value) -> Value {
    match (base, child) {
        (Value::Object(base_map), Value::Object(child_map)) => {
            let mut merged = base_map.clone();
            for (key, child_value) in child_map {
                let merged_value = match merged.get(key) {
                    Some(base_value) => class_merge(base_value, child_value),
                    None => child_value.clone(),
                };
                merged.insert(key.clone(), merged_value);
            }
            Value::Object(merged)
        }
        // Arrays, scalars, and any base/child type mismatch: child wins outright.
        _ => child.clone(),
    }
}

/// Merge `b` into `a` using instance-merge semantics.
///
/// - Objects merge recursively.
/// - Arrays are concatenated, then de-duplicated: primitive elements by
///   structural equality, object elements are kept as-is (never
///   deduplicated, since two structurally-equal-looking objects may differ
///   in fields a caller cares about).
/// - Scalars: the later source (`b`) wins.
/// - A type mismatch between `a` and `b` at the same path (other than one
///   side being absent) fails with [`StrukturError::TypeConflict`],
///   carrying the JSON-pointer path and both JSON type names.
pub fn instance_merge(a: &Value, b: &Value) -> Result<Value, StrukturError> {
    instance_merge_at("", a, b)
}

fn instance_merge_at(path: &str, a: &Value, b: &Value) -> Result<Value, StrukturError> {
    match (a, b) {
        (Value::Object(a_map), Value::Object(b_map)) => {
            let mut merged = a_map.clone();
            for (key, b_value) in b_map {
                let child_path = format!("{path}/{key}");
                let merged_value = match merged.get(key) {
                    Some(a_value) => instance_merge_at(&child_path, a_value, b_value)?,
                    None => b_value.clone(),
                };
                merged.insert(key.clone(), merged_value);
            }
            Ok(Value::Object(merged))
        }
        (Value::Array(a_items), Value::Array(b_items)) => {
            let mut merged = a_items.clone();
            for item in b_items {
                let is_duplicate = match item {
                    Value::Object(_) => false,
                    other => merged.iter().any(|existing| existing == other),
                };
                if !is_duplicate {
                    merged.push(item.clone());
                }
            }
            Ok(Value::Array(merged))
        }
        (Value::Null, other) => Ok(other.clone()),
        (other, Value::Null) => Ok(other.clone()),
        (a_scalar, b_scalar) if json_type_name(a_scalar) == json_type_name(b_scalar) => {
            Ok(b_scalar.clone())
        }
        (a_scalar, b_scalar) => Err(StrukturError::TypeConflict {
            path: if path.is_empty() { "/".to_string() } else { path.to_string() },
            left_type: json_type_name(a_scalar).to_string(),
            right_type: json_type_name(b_scalar).to_string(),
        }),
    }
}

/// The JSON type name used in `TypeConflict` diagnostics.
fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
