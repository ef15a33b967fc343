use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// A render task: one file to produce from one template.
///
/// Exactly `{"template": <string>, "output": <string>}` - no other keys are
/// permitted, whether the task originates from build configuration or from
/// an instance's `$render` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderTask {
    /// Name of the template to render, resolved against the registered
    /// template search paths.
    pub template: String,

    /// Output path, relative to the build directory, that the rendered
    /// content is written to.
    pub output: String,
}

/// A typed data record: `$id` plus `$class` plus arbitrary class-schema
/// data, loaded from an instance JSON file.
///
/// `extra` captures every field besides the reserved `$id`/`$class`/
/// `$aspects`/`$render` keys - the instance's actual schema-governed data.
/// This mirrors the teacher's captured-extras pattern for forward-
/// compatible fields on `ResourceDependency`/`DetailedDependency`.
#[derive(Debug, Clone, Serialize)]
pub struct Instance {
    /// Unique instance identifier (`$id`), unique across all loaded
    /// fragments after merging.
    #[serde(rename = "$id")]
    pub id: String,

    /// Name of the class this instance belongs to (`$class`); must resolve.
    #[serde(rename = "$class")]
    pub class: String,

    /// Aspect name -> aspect data (`$aspects`), present only for aspects
    /// the instance itself supplies data for.
    #[serde(rename = "$aspects")]
    pub aspects: Map<String, Value>,

    /// Render tasks this instance contributes (`$render`).
    #[serde(rename = "$render")]
    pub render: Vec<RenderTask>,

    /// Arbitrary class-schema data, flattened at the top level alongside
    /// the `$`-prefixed keys when serialized.
    #[serde(flatten)]
    pub extra: Map<String, Value>,

    /// Every source file this instance's data was merged from, most
    /// recently loaded first load order preserved. Used for merge
    /// diagnostics; never serialized.
    #[serde(skip)]
    pub source_files: Vec<PathBuf>,
}

impl Instance {
    /// Construct a fresh instance record with no aspects, no render tasks,
    /// and a single source file.
    #[must_use]
    pub fn new(id: String, class: String, extra: Map<String, Value>, source_file: PathBuf) -> Self {
        Self {
            id,
            class,
            aspects: Map::new(),
            render: Vec::new(),
            extra,
            source_files: vec![source_file],
        }
    }

    /// Flatten this instance into one JSON object carrying `$id`/`$class`/
    /// `$aspects`/`$render` plus its extra data, so [`crate::merge::instance_merge`]
    /// can combine two fragments wholesale - `$render` entries merge as an
    /// object array (kept as-is, never deduplicated) and `$aspects` merges
    /// recursively like any other object, for free.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut obj = self.extra.clone();
        obj.insert("$id".to_string(), Value::String(self.id.clone()));
        obj.insert("$class".to_string(), Value::String(self.class.clone()));
        obj.insert("$aspects".to_string(), Value::Object(self.aspects.clone()));
        obj.insert(
            "$render".to_string(),
            Value::Array(self.render.iter().map(|t| serde_json::to_value(t).unwrap_or(Value::Null)).collect()),
        );
        Value::Object(obj)
    }

    /// Reconstruct an [`Instance`] from a merged JSON object previously
    /// produced by repeated [`Self::to_value`] + `instance_merge` calls.
    ///
    /// # Panics
    ///
    /// Panics if `value` is not an object, or is missing `$id`/`$class` as
    /// strings - callers are expected to have validated those already
    /// during loading, before any merge happens.
    #[must_use]
    pub fn from_merged_value(value: Value, source_files: Vec<PathBuf>) -> Self {
        let mut obj = match value {
            Value::Object(obj) => obj,
            other => panic!("expected a JSON object after instance merge, got {other:?}"),
        };
        let id = obj.remove("$id").and_then(|v| v.as_str().map(str::to_string)).expect("merged instance missing $id");
        let class =
            obj.remove("$class").and_then(|v| v.as_str().map(str::to_string)).expect("merged instance missing $class");
        let aspects = match obj.remove("$aspects") {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        let render = match obj.remove("$render") {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|v| serde_json::from_value::<RenderTask>(v).ok())
                .collect(),
            _ => Vec::new(),
        };
        Self { id, class, aspects, render, extra: obj, source_files }
    }
}
