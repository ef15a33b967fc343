//! Schema constraint checker (spec.md §4.8, component 8).
//!
//! Walks every schema fragment in a resolved class's lineage (`$schemas`,
//! unmerged - each lineage member keeps its own fragment) and, for every
//! property path that appears in more than one fragment, checks whether
//! the combined constraints are jointly satisfiable. Diagnostic by default
//! (spec.md §9 Open Question c); the orchestrator promotes conflicts to a
//! hard failure only when `fail_on_constraint_conflicts` is set.

use serde_json::Value;
use std::collections::HashMap;

/// The kind of impossible constraint detected at one property path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintConflictKind {
    /// A numeric range with no satisfiable value (e.g. `minimum > maximum`).
    Range,
    /// Two `enum`/`const` sets from distinct sources share no value.
    Enum,
    /// Two sources declare disjoint `type` sets for the same property.
    Type,
    /// `minLength` exceeds `maxLength`.
    StringLength,
    /// `minItems` exceeds `maxItems`.
    ArrayLength,
}

/// One impossible constraint found across a class's lineage.
#[derive(Debug, Clone)]
pub struct ConstraintConflict {
    /// Which rule was violated.
    pub kind: ConstraintConflictKind,
    /// JSON-pointer-style path of the offending property, relative to the
    /// instance root (e.g. `/network/port`).
    pub path: String,
    /// Human-readable explanation naming the conflicting sources.
    pub detail: String,
}

/// Per-property accumulated constraints, gathered per lineage member
/// (`source` is the class name the fragment came from) so a conflict can
/// name both sides.
#[derive(Default)]
struct PropertyConstraints {
    minimum: Vec<(String, f64)>,
    maximum: Vec<(String, f64)>,
    min_length: Vec<(String, u64)>,
    max_length: Vec<(String, u64)>,
    min_items: Vec<(String, u64)>,
    max_items: Vec<(String, u64)>,
    enums: Vec<(String, Vec<Value>)>,
    types: Vec<(String, Vec<String>)>,
}

/// Check the lineage schemas of a resolved class for impossible merged
/// constraints.
///
/// `lineage` pairs each schema fragment with the class name it came from,
/// in lineage order (root first); `check_constraints` doesn't care about
/// that order beyond attributing conflicts to the right source names.
#[must_use]
pub fn check_constraints(lineage: &[(String, Value)]) -> Vec<ConstraintConflict> {
    let mut by_path: HashMap<String, PropertyConstraints> = HashMap::new();
    for (source, schema) in lineage {
        collect(schema, "", source, &mut by_path);
    }

    let mut conflicts = Vec::new();
    for (path, constraints) in &by_path {
        conflicts.extend(check_property(path, constraints));
    }
    conflicts.sort_by(|a, b| a.path.cmp(&b.path));
    conflicts
}

/// Recursively collect constraint hunks from a schema fragment's
/// `properties` object, building a dotted JSON-pointer-style path.
fn collect(schema: &Value, path: &str, source: &str, out: &mut HashMap<String, PropertyConstraints>) {
    let Some(obj) = schema.as_object() else { return };

    if path.is_empty() {
        // At the schema root, the "properties" we care about are one level
        // in; fall through into them below without recording a constraint
        // bucket for the empty path itself.
    } else {
        let entry = out.entry(path.to_string()).or_default();
        record(obj, source, entry);
    }

    if let Some(Value::Object(properties)) = obj.get("properties") {
        for (key, prop_schema) in properties {
            let child_path = format!("{path}/{key}");
            collect(prop_schema, &child_path, source, out);
        }
    }
}

fn record(obj: &serde_json::Map<String, Value>, source: &str, entry: &mut PropertyConstraints) {
    if let Some(n) = obj.get("minimum").and_then(Value::as_f64) {
        entry.minimum.push((source.to_string(), n));
    }
    if let Some(n) = obj.get("exclusiveMinimum").and_then(Value::as_f64) {
        entry.minimum.push((source.to_string(), n + f64::EPSILON));
    }
    if let Some(n) = obj.get("maximum").and_then(Value::as_f64) {
        entry.maximum.push((source.to_string(), n));
    }
    if let Some(n) = obj.get("exclusiveMaximum").and_then(Value::as_f64) {
        entry.maximum.push((source.to_string(), n - f64::EPSILON));
    }
    if let Some(n) = obj.get("minLength").and_then(Value::as_u64) {
        entry.min_length.push((source.to_string(), n));
    }
    if let Some(n) = obj.get("maxLength").and_then(Value::as_u64) {
        entry.max_length.push((source.to_string(), n));
    }
    if let Some(n) = obj.get("minItems").and_then(Value::as_u64) {
        entry.min_items.push((source.to_string(), n));
    }
    if let Some(n) = obj.get("maxItems").and_then(Value::as_u64) {
        entry.max_items.push((source.to_string(), n));
    }
    if let Some(Value::Array(values)) = obj.get("enum") {
        entry.enums.push((source.to_string(), values.clone()));
    }
    if let Some(v) = obj.get("const") {
        entry.enums.push((source.to_string(), vec![v.clone()]));
    }
    match obj.get("type") {
        Some(Value::String(t)) => entry.types.push((source.to_string(), vec![t.clone()])),
        Some(Value::Array(ts)) => {
            let names = ts.iter().filter_map(|v| v.as_str().map(str::to_string)).collect();
            entry.types.push((source.to_string(), names));
        }
        _ => {}
    }
}

fn check_property(path: &str, c: &PropertyConstraints) -> Vec<ConstraintConflict> {
    let mut conflicts = Vec::new();

    if let (Some((min_src, min)), Some((max_src, max))) =
        (c.minimum.iter().max_by(|a, b| a.1.total_cmp(&b.1)), c.maximum.iter().min_by(|a, b| a.1.total_cmp(&b.1)))
    {
        if min > max {
            conflicts.push(ConstraintConflict {
                kind: ConstraintConflictKind::Range,
                path: path.to_string(),
                detail: format!("'{min_src}' requires >= {min} but '{max_src}' requires <= {max}"),
            });
        }
    }

    if let (Some((min_src, min)), Some((max_src, max))) =
        (c.min_length.iter().max_by_key(|e| e.1), c.max_length.iter().min_by_key(|e| e.1))
    {
        if min > max {
            conflicts.push(ConstraintConflict {
                kind: ConstraintConflictKind::StringLength,
                path: path.to_string(),
                detail: format!("'{min_src}' requires minLength {min} but '{max_src}' requires maxLength {max}"),
            });
        }
    }

    if let (Some((min_src, min)), Some((max_src, max))) =
        (c.min_items.iter().max_by_key(|e| e.1), c.max_items.iter().min_by_key(|e| e.1))
    {
        if min > max {
            conflicts.push(ConstraintConflict {
                kind: ConstraintConflictKind::ArrayLength,
                path: path.to_string(),
                detail: format!("'{min_src}' requires minItems {min} but '{max_src}' requires maxItems {max}"),
            });
        }
    }

    if c.enums.len() >= 2 {
        let mut sets = c.enums.iter();
        let (first_src, first_set) = sets.next().unwrap();
        let mut intersection: Vec<&Value> = first_set.iter().collect();
        let mut offending_src = first_src.clone();
        for (src, set) in sets {
            intersection.retain(|v| set.contains(v));
            offending_src = src.clone();
            if intersection.is_empty() {
                break;
            }
        }
        if intersection.is_empty() {
            conflicts.push(ConstraintConflict {
                kind: ConstraintConflictKind::Enum,
                path: path.to_string(),
                detail: format!("'{first_src}' and '{offending_src}' declare disjoint enum/const sets"),
            });
        }
    }

    if c.types.len() >= 2 {
        let mut sets = c.types.iter();
        let (first_src, first_set) = sets.next().unwrap();
        let mut intersection: Vec<String> = first_set.clone();
        let mut offending_src = first_src.clone();
        for (src, set) in sets {
            intersection.retain(|t| set.contains(t));
            offending_src = src.clone();
            if intersection.is_empty() {
                break;
            }
        }
        if intersection.is_empty() {
            conflicts.push(ConstraintConflict {
                kind: ConstraintConflictKind::Type,
                path: path.to_string(),
                detail: format!("'{first_src}' and '{offending_src}' declare incompatible types"),
            });
        }
    }

    conflicts
}
