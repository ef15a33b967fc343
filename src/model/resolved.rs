use serde::Serialize;
use serde_json::{Map, Value};

/// A class's resolved lineage and accumulated schema/default data.
///
/// Computed by [`crate::resolver`], memoized per build. `$schemas` holds
/// one schema fragment per lineage entry in the same order as `$lineage` -
/// schemas are *never* merged with each other, only instances are checked
/// against each layer in turn.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedClass {
    /// Ordered list of class names, root first, this class last (inclusive
    /// of itself).
    #[serde(rename = "$lineage")]
    pub lineage: Vec<String>,

    /// One schema fragment per `$lineage` entry, same order, unmerged.
    #[serde(rename = "$schemas")]
    pub schemas: Vec<Value>,

    /// Union of every lineage member's `$fields`, class-merged leaf-last.
    #[serde(rename = "$fields")]
    pub fields: Value,

    /// Union of every lineage member's `$uses_aspects`.
    #[serde(rename = "$uses_aspects")]
    pub uses_aspects: Vec<String>,

    /// Per-aspect defaults, class-merged across the lineage, leaf-last.
    #[serde(rename = "$aspect_defaults")]
    pub aspect_defaults: Map<String, Value>,
}

/// Aggregate validation outcome for one build: how many instances were
/// checked, how many passed, and the full list of structured issues
/// (errors and warnings alike).
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationSummary {
    /// Number of instances the validator examined.
    pub total: usize,
    /// Number of instances with zero `level=error` issues.
    pub valid: usize,
    /// Number of instances with at least one `level=error` issue.
    pub invalid: usize,
    /// Every issue raised across the batch, errors and warnings together.
    pub errors: Vec<crate::validator::ValidationIssue>,
}

/// The canonical model: every loaded instance merged, indexed, and
/// annotated, ready to hand to the renderer or serialize as
/// `canonical.json`.
///
/// Field order in the emitted JSON matches spec.md §3's canonical model
/// field order; `serde_json`'s `preserve_order` feature keeps each map's
/// *internal* key order as the order keys were inserted (creation order),
/// satisfying the "round-trip serialize -> parse -> re-serialize is
/// byte-identical" testable property.
#[derive(Debug, Clone)]
pub struct CanonicalModel {
    /// Every merged instance, in load order.
    pub instances: Vec<Map<String, Value>>,
    /// Merged instances keyed by `$id`.
    pub instances_by_id: Map<String, Value>,
    /// Resolved classes keyed by class name.
    pub classes_by_id: Map<String, Value>,
    /// Aspect definitions keyed by aspect name, each decorated with
    /// description, pretty name, schema, and defaults.
    pub aspects_by_id: Map<String, Value>,
    /// Build metadata: timestamp, generator version, instance/class/aspect
    /// counts.
    pub metadata: Value,
    /// The validation summary produced by the multi-pass validator.
    pub validation: ValidationSummary,
}

impl Serialize for CanonicalModel {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("CanonicalModel", 6)?;
        state.serialize_field("$instances", &self.instances)?;
        state.serialize_field("$instances_by_id", &self.instances_by_id)?;
        state.serialize_field("$classes_by_id", &self.classes_by_id)?;
        state.serialize_field("$aspects_by_id", &self.aspects_by_id)?;
        state.serialize_field("$metadata", &self.metadata)?;
        state.serialize_field("$validation", &self.validation)?;
        state.end()
    }
}
