//! Render context and buffers (spec.md §4.11, component 11).
//!
//! One [`RenderContext`] lives for the duration of rendering a single
//! top-level task (content phase then, if the task extends a layout, the
//! layout phase) so a layout's `yield` calls see the buffers its content
//! phase wrote. A `render_file`/partial sub-render gets a brand new
//! context via [`RenderContext::sub_context`] so its buffer writes never
//! leak back into the parent.

use crate::model::CanonicalModel;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// A [`RenderContext`] shared between the renderer and the helpers a
/// concrete adapter installs, so `buffer`/`yield`/`render_file` can read
/// and write the same buffer/output state the renderer later drains.
///
/// `Arc<Mutex<_>>` rather than `Rc<RefCell<_>>`: both `tera::Function` and
/// `handlebars::HelperDef` require `Send + Sync` on anything a helper
/// closure captures, even though the orchestrator only ever drives one
/// build at a time (spec.md §5) - the mutex is never contended.
///
/// One `SharedRenderState` is created per top-level render task (content
/// phase and, if the task extends a layout, the layout phase share it);
/// [`RenderContext::sub_context`] produces the fresh, isolated context a
/// `render_file` sub-render gets instead.
pub type SharedRenderState = Arc<Mutex<RenderContext>>;

/// How a buffer write combines with whatever the buffer already holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferMode {
    /// Discard any existing content.
    Replace,
    /// Append after existing content.
    Append,
    /// Insert before existing content.
    Prepend,
}

/// A named, mutable string accumulator a template writes into and a layout
/// reads back via `yield`.
#[derive(Debug, Clone, Default)]
pub struct Buffer {
    /// The buffer's name, as passed to the `buffer` helper.
    pub name: String,
    /// Accumulated content.
    pub content: String,
    /// An optional direct output destination this buffer also feeds.
    pub destination: Option<String>,
}

/// Per-task rendering state: the canonical model, the build directory,
/// build metadata, named buffers, and queued output content.
pub struct RenderContext {
    /// The canonical model being rendered, shared read-only across tasks.
    pub canonical: Arc<CanonicalModel>,
    /// The build's output root directory.
    pub build_dir: PathBuf,
    /// Build metadata surfaced to templates (same data as `$metadata`).
    pub metadata: Value,
    /// `bufferName -> Buffer`.
    buffers: HashMap<String, Buffer>,
    /// `outputDestination (relative path) -> content`, populated by
    /// `render_file`/`file` engine helpers queuing additional outputs
    /// beyond the task's own declared output.
    outputs: HashMap<String, String>,
    /// The layout template name passed to the `extends` helper during the
    /// content phase, if any - drives whether the renderer runs a layout
    /// phase for this task.
    extends: Option<String>,
    /// The relative path prefix (`"../"` repeated once per output-path
    /// directory component) a template uses to link back to the build
    /// root, recomputed per sub-render by [`Self::sub_context`].
    path_prefix: String,
    /// `(partialName, outputDestination)` pairs queued by `render_file`,
    /// drained by the renderer after this context's own render call
    /// returns - `render_file` cannot render its partial from inside the
    /// adapter's own function-call stack (the adapter only exposes
    /// `&self`/`&mut self` methods, never a reentrant handle a registered
    /// helper closure could call back into), so it defers the actual
    /// sub-render to the renderer's drive loop instead.
    pending_renders: Vec<(String, String)>,
}

impl RenderContext {
    /// Create a fresh context with no buffers and no queued outputs.
    #[must_use]
    pub fn new(canonical: Arc<CanonicalModel>, build_dir: PathBuf, metadata: Value) -> Self {
        Self {
            canonical,
            build_dir,
            metadata,
            buffers: HashMap::new(),
            outputs: HashMap::new(),
            extends: None,
            path_prefix: String::new(),
            pending_renders: Vec::new(),
        }
    }

    /// Spawn an isolated child context for a sub-render (e.g. `render_file`),
    /// sharing the canonical model, build directory, and metadata but
    /// starting with empty buffers and outputs.
    #[must_use]
    pub fn sub_context(&self) -> Self {
        Self::new(self.canonical.clone(), self.build_dir.clone(), self.metadata.clone())
    }

    /// The `"../"`-repeated prefix templates use to link back to the build
    /// root from a nested output path.
    #[must_use]
    pub fn path_prefix(&self) -> &str {
        &self.path_prefix
    }

    /// Set the path prefix, computed by the renderer from an output path's
    /// depth before a sub-render runs.
    pub fn set_path_prefix(&mut self, prefix: impl Into<String>) {
        self.path_prefix = prefix.into();
    }

    /// Queue a `render_file(partial, outputPath)` request for the renderer
    /// to carry out once this context's own render call returns.
    pub fn queue_render(&mut self, partial: impl Into<String>, destination: impl Into<String>) {
        self.pending_renders.push((partial.into(), destination.into()));
    }

    /// Drain every queued `render_file` request.
    pub fn take_pending_renders(&mut self) -> Vec<(String, String)> {
        std::mem::take(&mut self.pending_renders)
    }

    /// Write into the named buffer according to `mode`, creating it if
    /// absent.
    pub fn write_buffer(&mut self, name: &str, content: &str, mode: BufferMode, destination: Option<String>) {
        let buffer = self.buffers.entry(name.to_string()).or_insert_with(|| Buffer {
            name: name.to_string(),
            content: String::new(),
            destination: None,
        });
        if destination.is_some() {
            buffer.destination = destination;
        }
        match mode {
            BufferMode::Replace => buffer.content = content.to_string(),
            BufferMode::Append => buffer.content.push_str(content),
            BufferMode::Prepend => {
                let mut combined = content.to_string();
                combined.push_str(&buffer.content);
                buffer.content = combined;
            }
        }
    }

    /// Read a buffer's content by name, or an empty string when absent -
    /// `yield` with no default uses this.
    #[must_use]
    pub fn read_buffer(&self, name: &str) -> String {
        self.buffers.get(name).map(|b| b.content.clone()).unwrap_or_default()
    }

    /// Whether a buffer with this name has ever been written to.
    #[must_use]
    pub fn buffer_exists(&self, name: &str) -> bool {
        self.buffers.contains_key(name)
    }

    /// Queue additional output content under a relative destination path,
    /// for the writer phase to pick up alongside the task's own output.
    pub fn queue_output(&mut self, destination: impl Into<String>, content: impl Into<String>) {
        self.outputs.insert(destination.into(), content.into());
    }

    /// Every queued output beyond the task's own declared output.
    #[must_use]
    pub fn queued_outputs(&self) -> &HashMap<String, String> {
        &self.outputs
    }

    /// Buffers that declared a direct output destination, to be written
    /// alongside queued outputs once rendering finishes.
    #[must_use]
    pub fn buffers_with_destination(&self) -> Vec<(&str, &str)> {
        self.buffers
            .values()
            .filter_map(|b| b.destination.as_deref().map(|dest| (dest, b.content.as_str())))
            .collect()
    }

    /// Record the layout template named by an `extends` call during the
    /// content phase. The last call wins, matching a template that only
    /// meaningfully calls `extends` once.
    pub fn set_extends(&mut self, layout: impl Into<String>) {
        self.extends = Some(layout.into());
    }

    /// The layout template this task's content phase declared, if any.
    #[must_use]
    pub fn extends(&self) -> Option<&str> {
        self.extends.as_deref()
    }

    /// Take and clear the declared layout, so the renderer's layout-phase
    /// loop can tell a layout that itself calls `extends` (chaining
    /// further) apart from one that doesn't (ending the chain).
    pub fn take_extends(&mut self) -> Option<String> {
        self.extends.take()
    }
}
