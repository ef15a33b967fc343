//! Shared data types for the build pipeline: class/aspect/instance
//! definitions as loaded from disk, the computed types the resolver and
//! canonical builder produce, and the small render-task record both build
//! configuration and instances can contribute.
//!
//! All `$`-prefixed field names are part of the public wire contract (they
//! appear verbatim in `canonical.json` and in the template context) and are
//! preserved with `#[serde(rename = "...")]`, the same way the teacher
//! preserves its manifest's external field names.

mod class;
mod instance;
mod resolved;

pub use class::{AspectDef, ClassDef};
pub use instance::{Instance, RenderTask};
pub use resolved::{CanonicalModel, ResolvedClass, ValidationSummary};

use serde_json::Value;

/// Extract a non-empty required string field from a JSON object, or `None`
/// if absent, blank, or not a string.
///
/// Shared by the class, aspect, and instance loaders to apply the same
/// "missing or empty means missing" rule spec.md's loader sections require.
#[must_use]
pub fn required_string(obj: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}
