//! Draft-07 JSON-Schema meta-validation and compiled-schema caching.
//!
//! Classes and aspects each carry a `$schema` fragment that must itself be
//! a valid draft-07 JSON Schema (spec.md invariant 6). This module compiles
//! a fragment with the `jsonschema` crate's strict draft-07 mode - a
//! fragment that isn't well-formed JSON Schema fails to compile, which
//! doubles as meta-validation - and caches the compiled validator by name
//! so the multi-pass validator (`crate::validator`) never recompiles the
//! same schema twice, grounded on the teacher's `src/templating/cache.rs`
//! compile-once-cache-by-name shape.

pub mod constraint;

use crate::core::StrukturError;
use jsonschema::{Draft, Validator};
use serde_json::Value;
use std::collections::HashMap;

/// A compiled draft-07 validator plus the raw fragment it was built from.
pub struct CompiledSchema {
    validator: Validator,
}

impl std::fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledSchema").finish_non_exhaustive()
    }
}

impl CompiledSchema {
    /// Compile `schema` as a strict draft-07 fragment.
    ///
    /// A schema that isn't well-formed JSON Schema (unknown keyword shapes,
    /// malformed `$ref`, etc.) fails here; this is how meta-validation
    /// (spec.md §4.3/§4.4) is enforced without a second, separate pass.
    pub fn compile(schema: &Value) -> Result<Self, String> {
        let validator = jsonschema::options()
            .with_draft(Draft::Draft7)
            .build(schema)
            .map_err(|e| e.to_string())?;
        Ok(Self { validator })
    }

    /// Validate `instance` against this schema, returning one
    /// `(json_pointer_path, message)` pair per violation.
    ///
    /// Always returns every violation rather than stopping at the first,
    /// so the multi-pass validator can report everything wrong with an
    /// instance in one pass.
    #[must_use]
    pub fn violations(&self, instance: &Value) -> Vec<(String, String)> {
        self.validator
            .iter_errors(instance)
            .map(|error| {
                let path = error.instance_path.to_string();
                let path = if path.is_empty() { "/".to_string() } else { path };
                (path, error.to_string())
            })
            .collect()
    }

    /// Whether `instance` satisfies this schema.
    #[must_use]
    pub fn is_valid(&self, instance: &Value) -> bool {
        self.validator.is_valid(instance)
    }
}

/// Meta-validate a `$schema` fragment, mapping a compile failure to the
/// loader-facing error variant.
///
/// `file` and `kind`/`name` are only used to build the error message; the
/// schema itself is otherwise opaque to this function.
pub fn meta_validate(schema: &Value, file: &str) -> Result<CompiledSchema, StrukturError> {
    CompiledSchema::compile(schema).map_err(|reason| StrukturError::InvalidSchemaMetaValidation {
        file: file.to_string(),
        reason,
    })
}

/// Compile-once-per-name cache of [`CompiledSchema`]s.
///
/// One cache instance lives for the duration of a build (single-threaded,
/// per spec.md §5); `get_or_compile` registers idempotently, matching
/// spec.md §4.9's "registration caching" requirement.
#[derive(Default)]
pub struct SchemaCache {
    compiled: HashMap<String, std::rc::Rc<CompiledSchema>>,
}

impl SchemaCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the compiled schema registered under `key`, compiling and
    /// caching it on first use.
    pub fn get_or_compile(
        &mut self,
        key: &str,
        schema: &Value,
        file: &str,
    ) -> Result<std::rc::Rc<CompiledSchema>, StrukturError> {
        if let Some(existing) = self.compiled.get(key) {
            return Ok(existing.clone());
        }
        let compiled = std::rc::Rc::new(meta_validate(schema, file)?);
        self.compiled.insert(key.to_string(), compiled.clone());
        Ok(compiled)
    }

    /// Number of distinct schemas compiled so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.compiled.len()
    }

    /// Whether nothing has been compiled yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.compiled.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn compiles_valid_draft7_schema() {
        let schema = json!({
            "type": "object",
            "properties": { "name": { "type": "string" } },
            "required": ["name"]
        });
        CompiledSchema::compile(&schema).unwrap();
    }

    #[test]
    fn reports_violations_with_paths() {
        let schema = json!({
            "type": "object",
            "properties": { "port": { "type": "integer" } },
            "required": ["port"]
        });
        let compiled = CompiledSchema::compile(&schema).unwrap();
        let violations = compiled.violations(&json!({"port": "not a number"}));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].0, "/port");
    }

    #[test]
    fn valid_instance_has_no_violations() {
        let schema = json!({"type": "object", "properties": {"name": {"type": "string"}}});
        let compiled = CompiledSchema::compile(&schema).unwrap();
        assert!(compiled.is_valid(&json!({"name": "ok"})));
    }

    #[test]
    fn cache_compiles_once_per_key() {
        let mut cache = SchemaCache::new();
        let schema = json!({"type": "object"});
        cache.get_or_compile("server", &schema, "server.class.json").unwrap();
        cache.get_or_compile("server", &schema, "server.class.json").unwrap();
        assert_eq!(cache.len(), 1);
    }
}
