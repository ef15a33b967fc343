//! Template adapter interface (spec.md §4.12, component 12).
//!
//! The renderer speaks only this trait; it never names `tera` or
//! `handlebars` directly. Grounded on the teacher's resource-trait pattern
//! in `src/core/resource.rs`, which lets the installer drive any resource
//! kind through one interface.
//!
//! A generic `register_helper(name, closure)` trait method was deliberately
//! left out: tera's `Function`/`Filter` traits and handlebars' `HelperDef`
//! have no common closure shape, and object-safety falls apart trying to
//! unify them. Instead each concrete adapter installs its own equivalent
//! helpers from [`register_default_helpers`](TemplateAdapter::register_default_helpers).

use crate::core::StrukturError;
use crate::model::CanonicalModel;
use crate::render::context::SharedRenderState;
use std::path::Path;
use std::rc::Rc;

/// Result of validating a single template without fully rendering it.
#[derive(Debug, Clone)]
pub struct TemplateValidation {
    /// Whether the template compiles/parses cleanly.
    pub valid: bool,
    /// The compiler's error message, when `valid` is false.
    pub error: Option<String>,
}

impl TemplateValidation {
    /// A successful validation result.
    #[must_use]
    pub fn ok() -> Self {
        Self { valid: true, error: None }
    }

    /// A failed validation result carrying the engine's message.
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self { valid: false, error: Some(error.into()) }
    }
}

/// The contract every concrete template engine must satisfy so the
/// renderer can drive it without knowing which engine it is.
pub trait TemplateAdapter {
    /// Set the directories templates and partials are resolved against, in
    /// priority order.
    fn set_search_paths(&mut self, paths: &[std::path::PathBuf]);

    /// Recursively register every file under `dir` as a partial, named by
    /// its path relative to `dir` (including extension).
    ///
    /// Returns the set of partial names registered, so the caller can
    /// detect cross-directory name collisions itself.
    fn load_partials(&mut self, dir: &Path) -> Result<Vec<String>, StrukturError>;

    /// Register one partial's source directly under `name`.
    fn register_partial(&mut self, name: &str, source: &str) -> Result<(), StrukturError>;

    /// Install the generic pure helpers and the struktur-specific helpers
    /// bound to `canonical`. Called once per build, before any render task
    /// runs. The buffer/layout and engine helpers are registered
    /// separately, per task, by [`install_engine_helpers`](Self::install_engine_helpers).
    fn register_default_helpers(&mut self, canonical: Rc<CanonicalModel>);

    /// Bind this adapter's render-context-dependent helpers (`buffer`,
    /// `yield`, `buffer_exists`, `extends`, `render_file`, `file`) to
    /// `state` for every subsequent [`render`](Self::render) call until this
    /// is called again with a different state.
    ///
    /// Called once per top-level render task, before the content phase and
    /// again (with a fresh sub-context) for each `render_file` sub-render -
    /// see [`SharedRenderState`]. `build_dir` lets `render_file`/`file`
    /// resolve the sub-template path and compute the output's `pathPrefix`.
    fn install_engine_helpers(&mut self, state: SharedRenderState, build_dir: std::path::PathBuf);

    /// Check that `template_name` parses, without rendering it.
    fn validate(&self, template_name: &str) -> TemplateValidation;

    /// Render `template_name` against the render state most recently bound
    /// via [`install_engine_helpers`](Self::install_engine_helpers),
    /// returning the rendered string.
    fn render(&self, template_name: &str) -> Result<String, StrukturError>;
}
