//! Class resolver (spec.md §4.7, component 7).
//!
//! Walks `$parent` pointers from a class to its root ancestor, producing a
//! root-to-leaf `$lineage`, one schema fragment per lineage member
//! (never merged), a class-merged `$fields`/`$aspect_defaults` (leaf wins),
//! and the union of every lineage member's `$uses_aspects`. Results are
//! memoized per [`ClassResolver`] instance, which lives for one build
//! (single-threaded per spec.md §5), grounded on the teacher's
//! `src/templating/cache.rs` compile-once-cache-by-name shape.

use crate::core::StrukturError;
use crate::merge::class_merge;
use crate::model::{ClassDef, ResolvedClass};
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::Rc;

/// Resolves class lineages against a fixed class registry, caching results.
pub struct ClassResolver<'a> {
    registry: &'a BTreeMap<String, ClassDef>,
    cache: RefCell<HashMap<String, Rc<ResolvedClass>>>,
}

impl<'a> ClassResolver<'a> {
    /// Build a resolver over `registry`. The registry must not change for
    /// the lifetime of the resolver - cached results would otherwise go
    /// stale silently.
    #[must_use]
    pub fn new(registry: &'a BTreeMap<String, ClassDef>) -> Self {
        Self { registry, cache: RefCell::new(HashMap::new()) }
    }

    /// Resolve `class_name`'s full lineage, caching the result.
    pub fn resolve(&self, class_name: &str) -> Result<Rc<ResolvedClass>, StrukturError> {
        if let Some(cached) = self.cache.borrow().get(class_name) {
            return Ok(cached.clone());
        }

        let lineage = self.lineage_names(class_name)?;

        let mut schemas = Vec::with_capacity(lineage.len());
        let mut fields = Value::Object(Map::new());
        let mut uses_aspects: Vec<String> = Vec::new();
        let mut aspect_defaults: Map<String, Value> = Map::new();

        for name in &lineage {
            let class = &self.registry[name];
            schemas.push(class.schema.clone());
            fields = class_merge(&fields, &class.fields);

            for aspect in &class.uses_aspects {
                if !uses_aspects.contains(aspect) {
                    uses_aspects.push(aspect.clone());
                }
            }

            for (aspect_name, defaults) in &class.aspect_defaults {
                let merged = match aspect_defaults.get(aspect_name) {
                    Some(existing) => class_merge(existing, defaults),
                    None => defaults.clone(),
                };
                aspect_defaults.insert(aspect_name.clone(), merged);
            }
        }

        let resolved = Rc::new(ResolvedClass { lineage, schemas, fields, uses_aspects, aspect_defaults });
        self.cache.borrow_mut().insert(class_name.to_string(), resolved.clone());
        Ok(resolved)
    }

    /// Walk `$parent` pointers from `class_name` to the root, returning
    /// names in root-first order.
    fn lineage_names(&self, class_name: &str) -> Result<Vec<String>, StrukturError> {
        let mut chain: Vec<String> = Vec::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut current = class_name.to_string();

        loop {
            if !visited.insert(current.clone()) {
                chain.push(current);
                return Err(StrukturError::CircularInheritance { chain: chain.join(" -> ") });
            }

            let class = self.registry.get(&current).ok_or_else(|| StrukturError::UnknownParent {
                class: chain.last().cloned().unwrap_or_else(|| class_name.to_string()),
                parent: current.clone(),
            })?;
            chain.push(current.clone());

            match &class.parent {
                Some(parent) => current = parent.clone(),
                None => break,
            }
        }

        chain.reverse();
        Ok(chain)
    }
}
