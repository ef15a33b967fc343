//! Multi-pass validator (spec.md §4.9, component 9).
//!
//! Runs five ordered passes per instance: a base envelope pass, one pass
//! per lineage schema layer, one pass per declared aspect, a semantic
//! format/placeholder pass, and a lint pass. One failing instance never
//! aborts the batch - every pass's issues are collected into a
//! [`ValidationSummary`], and the orchestrator decides whether any
//! `level=error` issue aborts the build. Structured diagnostics here mirror
//! the teacher's `src/core/error_builders.rs` + `error_formatting.rs` split
//! between building rich data and formatting it for humans later.

use crate::model::{AspectDef, Instance, ResolvedClass};
use crate::schema::SchemaCache;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;

/// Severity of one validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Fails the build when any instance has at least one.
    Error,
    /// Surfaced in `meta/validation.json`, never fails the build on its own.
    Warning,
}

/// One structured finding from any validation pass.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ValidationIssue {
    /// Whether this finding fails the build.
    pub level: Level,
    /// Short machine-readable identifier, stable across releases.
    pub code: String,
    /// Which pass raised this: `base`, `lineage:<class>`, `aspect:<name>`,
    /// `semantic`, or `lint`.
    pub layer: String,
    /// JSON-pointer-style path within the instance.
    pub path: String,
    /// Human-readable explanation.
    pub message: String,
    /// The instance's `$id`.
    pub instance: String,
    /// The aspect name, for `aspect:*` layer issues only.
    pub aspect: Option<String>,
}

impl ValidationIssue {
    fn error(instance: &str, layer: impl Into<String>, code: impl Into<String>, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            code: code.into(),
            layer: layer.into(),
            path: path.into(),
            message: message.into(),
            instance: instance.to_string(),
            aspect: None,
        }
    }

    fn warning(instance: &str, layer: impl Into<String>, code: impl Into<String>, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: Level::Warning,
            code: code.into(),
            layer: layer.into(),
            path: path.into(),
            message: message.into(),
            instance: instance.to_string(),
            aspect: None,
        }
    }

    fn with_aspect(mut self, aspect: impl Into<String>) -> Self {
        self.aspect = Some(aspect.into());
        self
    }
}

const RESERVED_TOP_LEVEL_KEYS: [&str; 4] = ["$id", "$class", "$aspects", "$render"];

/// Lint-pass configuration: which array fields are considered "significant"
/// (an empty one is worth a warning).
#[derive(Debug, Clone)]
pub struct LintConfig {
    /// Field names whose empty-array value triggers a lint warning.
    pub significant_arrays: Vec<String>,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self { significant_arrays: vec!["tags".to_string()] }
    }
}

/// Validate one instance against its resolved class, running all five
/// passes and returning every issue found (errors and warnings together).
pub fn validate_instance(
    instance: &Instance,
    resolved: &ResolvedClass,
    aspects: &BTreeMap<String, AspectDef>,
    schema_cache: &mut SchemaCache,
    lint: &LintConfig,
) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    issues.extend(base_pass(instance));
    issues.extend(lineage_passes(instance, resolved, schema_cache));
    issues.extend(aspect_passes(instance, resolved, aspects, schema_cache));
    issues.extend(semantic_pass(instance));
    issues.extend(lint_pass(instance, lint));

    issues
}

/// Pass 1: the instance's top-level shape matches the required envelope -
/// `$id`/`$class` present as non-empty strings, and no unexpected
/// `$`-prefixed keys beyond the four reserved ones.
fn base_pass(instance: &Instance) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if instance.id.trim().is_empty() {
        issues.push(ValidationIssue::error(&instance.id, "base", "empty-id", "/$id", "$id must be a non-empty string"));
    }
    if instance.class.trim().is_empty() {
        issues.push(ValidationIssue::error(&instance.id, "base", "empty-class", "/$class", "$class must be a non-empty string"));
    }

    for key in instance.extra.keys() {
        if key.starts_with('$') && !RESERVED_TOP_LEVEL_KEYS.contains(&key.as_str()) {
            issues.push(ValidationIssue::error(
                &instance.id,
                "base",
                "unexpected-reserved-key",
                format!("/{key}"),
                format!("unexpected reserved key '{key}' at the top level"),
            ));
        }
    }

    issues
}

/// Pass 2: validate the instance's raw data against each lineage member's
/// own schema fragment, root first.
fn lineage_passes(instance: &Instance, resolved: &ResolvedClass, schema_cache: &mut SchemaCache) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let instance_value = instance.to_value();

    for (name, schema) in resolved.lineage.iter().zip(resolved.schemas.iter()) {
        let layer = format!("lineage:{name}");
        match schema_cache.get_or_compile(name, schema, name) {
            Ok(compiled) => {
                for (path, reason) in compiled.violations(&instance_value) {
                    issues.push(ValidationIssue::error(&instance.id, layer.clone(), "schema-violation", path, reason));
                }
            }
            Err(_) => {
                issues.push(ValidationIssue::error(
                    &instance.id,
                    layer,
                    "no-validator-registered",
                    "/",
                    format!("no validator registered for class '{name}'"),
                ));
            }
        }
    }

    issues
}

/// Pass 3: every aspect the instance's lineage declares must either be
/// satisfied by a default source or supplied by the instance; data the
/// instance supplies is validated against the aspect's schema. An aspect
/// the instance supplies but the lineage never declared is an error.
fn aspect_passes(
    instance: &Instance,
    resolved: &ResolvedClass,
    aspects: &BTreeMap<String, AspectDef>,
    schema_cache: &mut SchemaCache,
) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    for name in instance.aspects.keys() {
        if !resolved.uses_aspects.contains(name) {
            issues.push(
                ValidationIssue::error(
                    &instance.id,
                    "aspect",
                    "undeclared-aspect",
                    format!("/$aspects/{name}"),
                    format!("instance declares undeclared aspect '{name}'"),
                )
                .with_aspect(name.clone()),
            );
        }
    }

    for name in &resolved.uses_aspects {
        let layer = format!("aspect:{name}");
        let supplied = instance.aspects.get(name);
        let has_default = resolved
            .aspect_defaults
            .get(name)
            .map(|v| !is_empty_object(v))
            .unwrap_or(false)
            || aspects.get(name).map(|a| !is_empty_object(&a.defaults)).unwrap_or(false);

        match supplied {
            Some(data) => {
                let Some(aspect_def) = aspects.get(name) else {
                    issues.push(ValidationIssue::error(
                        &instance.id,
                        layer,
                        "no-validator-registered",
                        format!("/$aspects/{name}"),
                        format!("no validator registered for aspect '{name}'"),
                    ));
                    continue;
                };
                match schema_cache.get_or_compile(name, &aspect_def.schema, name) {
                    Ok(compiled) => {
                        for (path, reason) in compiled.violations(data) {
                            issues.push(
                                ValidationIssue::error(
                                    &instance.id,
                                    layer.clone(),
                                    "schema-violation",
                                    format!("/$aspects/{name}{path}"),
                                    reason,
                                )
                                .with_aspect(name.clone()),
                            );
                        }
                    }
                    Err(_) => {
                        issues.push(ValidationIssue::error(
                            &instance.id,
                            layer,
                            "no-validator-registered",
                            format!("/$aspects/{name}"),
                            format!("no validator registered for aspect '{name}'"),
                        ));
                    }
                }
            }
            None if !has_default => {
                issues.push(
                    ValidationIssue::error(
                        &instance.id,
                        layer,
                        "missing-required-aspect",
                        format!("/$aspects/{name}"),
                        format!("instance is missing required aspect '{name}'"),
                    )
                    .with_aspect(name.clone()),
                );
            }
            None => {}
        }
    }

    issues
}

fn is_empty_object(value: &Value) -> bool {
    matches!(value, Value::Object(map) if map.is_empty()) || value.is_null()
}

const PLACEHOLDER_MARKERS: [&str; 4] = ["TODO", "FIXME", "XXX", "TBD"];

/// Pass 4: shallow format spot-checks and placeholder detection, all
/// warnings.
fn semantic_pass(instance: &Instance) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    walk_strings(&instance.id, "", &Value::Object(instance.extra.clone()), &mut |path, key, value| {
        check_format(&instance.id, key, path, value, &mut issues);
        check_placeholder(&instance.id, path, value, &mut issues);
    });
    issues
}

fn check_format(instance_id: &str, key: &str, path: &str, value: &str, issues: &mut Vec<ValidationIssue>) {
    let lower = key.to_lowercase();
    if lower.contains("email") && !value.is_empty() && !is_plausible_email(value) {
        issues.push(ValidationIssue::warning(instance_id, "semantic", "format-email", path, format!("'{value}' does not look like an email address")));
    } else if (lower.contains("url") || lower.contains("uri")) && !value.is_empty() && !is_plausible_uri(value) {
        issues.push(ValidationIssue::warning(instance_id, "semantic", "format-uri", path, format!("'{value}' does not look like a URI")));
    } else if lower.contains("hostname") && !value.is_empty() && !is_plausible_hostname(value) {
        issues.push(ValidationIssue::warning(instance_id, "semantic", "format-hostname", path, format!("'{value}' does not look like a hostname")));
    } else if lower.contains("ip") && !value.is_empty() && !is_plausible_ipv4(value) {
        issues.push(ValidationIssue::warning(instance_id, "semantic", "format-ipv4", path, format!("'{value}' does not look like an IPv4 address")));
    }
}

fn check_placeholder(instance_id: &str, path: &str, value: &str, issues: &mut Vec<ValidationIssue>) {
    let upper = value.to_uppercase();
    for marker in PLACEHOLDER_MARKERS {
        if upper.contains(marker) {
            issues.push(ValidationIssue::warning(
                instance_id,
                "semantic",
                "placeholder-text",
                path,
                format!("value at '{path}' contains placeholder marker '{marker}'"),
            ));
            break;
        }
    }
}

fn is_plausible_email(value: &str) -> bool {
    static RE: std::sync::LazyLock<Regex> =
        std::sync::LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s.]+(\.[^@\s.]+)+$").unwrap());
    RE.is_match(value)
}

fn is_plausible_uri(value: &str) -> bool {
    static RE: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.-]*://\S+$").unwrap());
    RE.is_match(value)
}

fn is_plausible_hostname(value: &str) -> bool {
    static RE: std::sync::LazyLock<Regex> =
        std::sync::LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(\.[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$").unwrap());
    value.len() <= 253 && RE.is_match(value)
}

fn is_plausible_ipv4(value: &str) -> bool {
    static RE: std::sync::LazyLock<Regex> =
        std::sync::LazyLock::new(|| Regex::new(r"^(\d{1,3})\.(\d{1,3})\.(\d{1,3})\.(\d{1,3})$").unwrap());
    RE.captures(value).is_some_and(|caps| (1..=4).all(|i| caps[i].parse::<u8>().is_ok()))
}

/// Pass 5: convention lints - missing description, non-kebab-case id,
/// empty significant arrays, suspicious scalar values.
fn lint_pass(instance: &Instance, config: &LintConfig) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if !instance.extra.contains_key("description") {
        issues.push(ValidationIssue::warning(&instance.id, "lint", "missing-description", "/description", "instance has no description field"));
    }

    if !is_kebab_case(&instance.id) {
        issues.push(ValidationIssue::warning(&instance.id, "lint", "id-not-kebab-case", "/$id", format!("'{}' is not kebab-case", instance.id)));
    }

    for name in &config.significant_arrays {
        if let Some(Value::Array(items)) = instance.extra.get(name) {
            if items.is_empty() {
                issues.push(ValidationIssue::warning(
                    &instance.id,
                    "lint",
                    "empty-significant-array",
                    format!("/{name}"),
                    format!("'{name}' is present but empty"),
                ));
            }
        }
    }

    if let Some(Value::Number(n)) = instance.extra.get("port") {
        if n.as_i64() == Some(0) {
            issues.push(ValidationIssue::warning(&instance.id, "lint", "suspicious-port-zero", "/port", "port is 0"));
        }
    }
    if let Some(Value::String(s)) = instance.extra.get("name") {
        if s.is_empty() {
            issues.push(ValidationIssue::warning(&instance.id, "lint", "suspicious-empty-name", "/name", "name is an empty string"));
        }
    }

    issues
}

fn is_kebab_case(value: &str) -> bool {
    !value.is_empty()
        && value.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !value.starts_with('-')
        && !value.ends_with('-')
        && !value.contains("--")
}

/// Recursively visit every string leaf under `value`, calling `visit` with
/// its JSON-pointer path and originating key name.
fn walk_strings(instance_id: &str, path: &str, value: &Value, visit: &mut impl FnMut(&str, &str, &str)) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let child_path = format!("{path}/{key}");
                match child {
                    Value::String(s) => visit(&child_path, key, s),
                    _ => walk_strings(instance_id, &child_path, child, visit),
                }
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                let child_path = format!("{path}/{i}");
                walk_strings(instance_id, &child_path, item, visit);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    fn resolved_class(schema: Value, uses_aspects: &[&str]) -> ResolvedClass {
        ResolvedClass {
            lineage: vec!["server".to_string()],
            schemas: vec![schema],
            fields: json!({}),
            uses_aspects: uses_aspects.iter().map(|s| s.to_string()).collect(),
            aspect_defaults: serde_json::Map::new(),
        }
    }

    fn instance(id: &str, extra: Value) -> Instance {
        Instance::new(id.to_string(), "server".to_string(), extra.as_object().cloned().unwrap_or_default(), PathBuf::from("i.json"))
    }

    #[test]
    fn base_pass_rejects_unexpected_reserved_key() {
        let mut inst = instance("web-1", json!({}));
        inst.extra.insert("$bogus".to_string(), json!(1));
        let issues = base_pass(&inst);
        assert!(issues.iter().any(|i| i.code == "unexpected-reserved-key"));
    }

    #[test]
    fn lineage_pass_reports_schema_violation() {
        let resolved = resolved_class(json!({"type": "object", "properties": {"cpu": {"type": "integer"}}, "required": ["cpu"]}), &[]);
        let inst = instance("web-1", json!({"cpu": "not-a-number"}));
        let mut cache = SchemaCache::new();
        let issues = lineage_passes(&inst, &resolved, &mut cache);
        assert!(issues.iter().any(|i| i.code == "schema-violation"));
    }

    #[test]
    fn aspect_pass_flags_undeclared_aspect() {
        let resolved = resolved_class(json!({"type": "object"}), &[]);
        let mut inst = instance("web-1", json!({}));
        inst.aspects.insert("network".to_string(), json!({}));
        let aspects = BTreeMap::new();
        let mut cache = SchemaCache::new();
        let issues = aspect_passes(&inst, &resolved, &aspects, &mut cache);
        assert!(issues.iter().any(|i| i.code == "undeclared-aspect"));
    }

    #[test]
    fn aspect_pass_flags_missing_required_aspect_with_no_defaults() {
        let resolved = resolved_class(json!({"type": "object"}), &["network"]);
        let inst = instance("web-1", json!({}));
        let aspects = BTreeMap::new();
        let mut cache = SchemaCache::new();
        let issues = aspect_passes(&inst, &resolved, &aspects, &mut cache);
        assert!(issues.iter().any(|i| i.code == "missing-required-aspect"));
    }

    #[test]
    fn semantic_pass_flags_placeholder_text() {
        let inst = instance("web-1", json!({"note": "TODO: fix this"}));
        let issues = semantic_pass(&inst);
        assert!(issues.iter().any(|i| i.code == "placeholder-text"));
    }

    #[test]
    fn lint_pass_flags_missing_description_and_bad_id() {
        let inst = instance("Web_1", json!({}));
        let issues = lint_pass(&inst, &LintConfig::default());
        assert!(issues.iter().any(|i| i.code == "missing-description"));
        assert!(issues.iter().any(|i| i.code == "id-not-kebab-case"));
    }

    #[test]
    fn lint_pass_accepts_well_formed_instance() {
        let inst = instance("web-1", json!({"description": "a web server", "tags": ["a"]}));
        let issues = lint_pass(&inst, &LintConfig::default());
        assert!(issues.is_empty());
    }
}
