use serde::Serialize;
use serde_json::{Map, Value};
use std::path::PathBuf;

/// A class definition loaded from a `*.class.json` file.
///
/// Structural validation (presence of `$class`/`$schema`, rejection of a
/// `$parent` array, rejection of the legacy unprefixed shape) happens in
/// [`crate::loader::class_loader`] rather than via a `Deserialize` impl,
/// because several of those checks need to fail with a specific
/// [`crate::core::StrukturError`] variant carrying the source file path -
/// information a derived `Deserialize` cannot attach.
#[derive(Debug, Clone, Serialize)]
pub struct ClassDef {
    /// Unique class identifier (`$class`).
    #[serde(rename = "$class")]
    pub class: String,

    /// Single parent class name, if any (`$parent`). Multi-parent forms are
    /// rejected before a `ClassDef` is ever constructed.
    #[serde(rename = "$parent", skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    /// The class's own JSON-Schema fragment (`$schema`), meta-validated
    /// against draft-07 at load time. Never merged with ancestor schemas -
    /// the resolver keeps one entry per lineage member.
    #[serde(rename = "$schema")]
    pub schema: Value,

    /// Default field values merged into instances of this class
    /// (`$fields`). Always a JSON object; defaults to `{}`.
    #[serde(rename = "$fields")]
    pub fields: Value,

    /// Aspect names this class declares (`$uses_aspects`). Any descendant
    /// class may populate them on an instance.
    #[serde(rename = "$uses_aspects")]
    pub uses_aspects: Vec<String>,

    /// Per-aspect default data merged into instances (`$aspect_defaults`).
    #[serde(rename = "$aspect_defaults")]
    pub aspect_defaults: Map<String, Value>,

    /// Path to the file this class was loaded from, for diagnostics. Never
    /// serialized to the canonical model.
    #[serde(skip)]
    pub source_file: PathBuf,
}

/// An aspect definition loaded from a `*.class.json` file under an aspect
/// directory.
///
/// Aspects are not polymorphic - there is no `$parent`, no lineage, and no
/// inheritance among them.
#[derive(Debug, Clone, Serialize)]
pub struct AspectDef {
    /// Aspect identifier (`$aspect`); must equal `$class` in the same file.
    #[serde(rename = "$aspect")]
    pub aspect: String,

    /// The aspect's JSON-Schema fragment (`$schema`).
    #[serde(rename = "$schema")]
    pub schema: Value,

    /// Default data merged as layer 1 of the three-layer aspect merge
    /// (`$defaults`). Always a JSON object; defaults to `{}`.
    #[serde(rename = "$defaults")]
    pub defaults: Value,

    /// Path to the file this aspect was loaded from, for diagnostics.
    #[serde(skip)]
    pub source_file: PathBuf,
}
