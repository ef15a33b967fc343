//! Handlebars-backed [`TemplateAdapter`] (spec.md §4.12).
//!
//! Mirrors `tera_adapter`'s design exactly - the same generic/struktur
//! dispatch tables, the same plain-function buffer/layout/engine helpers,
//! the same deferred `render_file` queue - but Handlebars helpers receive
//! ordinary positional parameters (`h.param(0)`, `h.param(1)`, ...) instead
//! of Tera's named-only arguments, so no lettered-key convention is needed
//! here: [`crate::render::helpers::call`] and
//! [`crate::render::struktur_helpers::call`] are driven straight from
//! `h.params()`.
//!
//! Every helper here implements `call_inner` rather than `call`, so its
//! return value is usable both as a standalone output (`{{eq a b}}`) and as
//! a subexpression feeding another helper (`{{#if (eq a b)}}`), matching
//! how the teacher's own helpers compose in `src/templating/helpers.rs`.

use crate::core::StrukturError;
use crate::model::CanonicalModel;
use crate::render::adapter::{TemplateAdapter, TemplateValidation};
use crate::render::context::{BufferMode, SharedRenderState};
use handlebars::{
    Context as HbContext, Handlebars, Helper, HelperDef, RenderContext as HbRenderContext, RenderError,
    RenderErrorReason, ScopedJson,
};
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

const GENERIC_HELPER_NAMES: &[&str] = &[
    "eq", "ne", "lt", "lte", "gt", "gte", "and", "or", "not", "is_truthy", "lowercase", "uppercase",
    "capitalize", "title_case", "trim", "split", "replace", "substring", "escape", "slugify", "where",
    "where_includes", "sort_by", "pluck", "group_by", "unique", "first", "last", "flatten", "compact",
    "reverse", "length", "default", "default_value", "array", "identity", "json", "concat", "is_array",
    "is_object", "is_string", "is_number", "is_boolean", "is_nil", "type_of", "values", "keys", "lookup",
    "get", "has", "exists", "add", "sub", "abs",
];

const STRUKTUR_HELPER_NAMES: &[&str] = &[
    "schema_required",
    "schema_has",
    "schema_props",
    "schema_prop_source",
    "schema_required_by_source",
    "inherits",
    "filter_inherits",
    "class_lineage",
];

fn positional_args(h: &Helper) -> Vec<Value> {
    h.params().iter().map(|p| p.value().clone()).collect()
}

fn named_str(h: &Helper, index: usize) -> String {
    h.param(index).and_then(|p| p.value().as_str()).unwrap_or_default().to_string()
}

fn poisoned() -> RenderError {
    RenderErrorReason::Other("render state poisoned".to_string()).into()
}

struct GenericHelper {
    name: String,
}

impl HelperDef for GenericHelper {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc HbContext,
        _: &mut HbRenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'reg, 'rc>, RenderError> {
        crate::render::helpers::call(&self.name, &positional_args(h))
            .map(ScopedJson::Derived)
            .ok_or_else(|| RenderErrorReason::Other(format!("unknown helper '{}'", self.name)).into())
    }
}

struct StrukturHelper {
    name: String,
    canonical: Arc<CanonicalModel>,
}

impl HelperDef for StrukturHelper {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc HbContext,
        _: &mut HbRenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'reg, 'rc>, RenderError> {
        crate::render::struktur_helpers::call(&self.canonical, &self.name, &positional_args(h))
            .map(ScopedJson::Derived)
            .ok_or_else(|| RenderErrorReason::Other(format!("unknown helper '{}'", self.name)).into())
    }
}

struct BufferHelper {
    state: SharedRenderState,
}

impl HelperDef for BufferHelper {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc HbContext,
        _: &mut HbRenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'reg, 'rc>, RenderError> {
        let name = named_str(h, 0);
        let content = named_str(h, 1);
        let mode = match h.param(2).and_then(|p| p.value().as_str()) {
            Some("append") => BufferMode::Append,
            Some("prepend") => BufferMode::Prepend,
            _ => BufferMode::Replace,
        };
        let destination = h.param(3).and_then(|p| p.value().as_str()).map(str::to_string);
        let mut ctx = self.state.lock().map_err(|_| poisoned())?;
        ctx.write_buffer(&name, &content, mode, destination);
        Ok(ScopedJson::Derived(Value::String(String::new())))
    }
}

struct YieldHelper {
    state: SharedRenderState,
}

impl HelperDef for YieldHelper {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc HbContext,
        _: &mut HbRenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'reg, 'rc>, RenderError> {
        let name = named_str(h, 0);
        let ctx = self.state.lock().map_err(|_| poisoned())?;
        if ctx.buffer_exists(&name) {
            Ok(ScopedJson::Derived(Value::String(ctx.read_buffer(&name))))
        } else {
            let default = h.param(1).map(|p| p.value().clone()).unwrap_or(Value::String(String::new()));
            Ok(ScopedJson::Derived(default))
        }
    }
}

struct BufferExistsHelper {
    state: SharedRenderState,
}

impl HelperDef for BufferExistsHelper {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc HbContext,
        _: &mut HbRenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'reg, 'rc>, RenderError> {
        let name = named_str(h, 0);
        let ctx = self.state.lock().map_err(|_| poisoned())?;
        Ok(ScopedJson::Derived(Value::Bool(ctx.buffer_exists(&name))))
    }
}

struct ExtendsHelper {
    state: SharedRenderState,
}

impl HelperDef for ExtendsHelper {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc HbContext,
        _: &mut HbRenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'reg, 'rc>, RenderError> {
        let layout = named_str(h, 0);
        let mut ctx = self.state.lock().map_err(|_| poisoned())?;
        ctx.set_extends(layout);
        Ok(ScopedJson::Derived(Value::String(String::new())))
    }
}

struct RenderFileHelper {
    state: SharedRenderState,
}

impl HelperDef for RenderFileHelper {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc HbContext,
        _: &mut HbRenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'reg, 'rc>, RenderError> {
        let partial = named_str(h, 0);
        let output_path = named_str(h, 1);
        let mut ctx = self.state.lock().map_err(|_| poisoned())?;
        ctx.queue_render(partial, output_path);
        Ok(ScopedJson::Derived(Value::String(String::new())))
    }
}

struct FileHelper {
    state: SharedRenderState,
}

impl HelperDef for FileHelper {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc HbContext,
        _: &mut HbRenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'reg, 'rc>, RenderError> {
        let name = named_str(h, 0);
        let content = named_str(h, 1);
        let mut ctx = self.state.lock().map_err(|_| poisoned())?;
        ctx.queue_output(name, content);
        Ok(ScopedJson::Derived(Value::String(String::new())))
    }
}

struct PartialExistsHelper {
    names: HashSet<String>,
}

impl HelperDef for PartialExistsHelper {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc HbContext,
        _: &mut HbRenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'reg, 'rc>, RenderError> {
        let name = named_str(h, 0);
        Ok(ScopedJson::Derived(Value::Bool(self.names.contains(&name))))
    }
}

/// Walk a Handlebars error's `source()` chain, the same way
/// `tera_adapter::tera_error_reason` does for Tera.
fn handlebars_error_reason(error: &dyn std::error::Error) -> String {
    let mut messages = vec![error.to_string()];
    let mut current = error.source();
    while let Some(source) = current {
        messages.push(source.to_string());
        current = source.source();
    }
    messages.join(": ")
}

/// Wraps one `handlebars::Handlebars` registry in strict mode (undefined
/// variable access is an error, matching Tera's default), with every
/// template and partial this build uses pre-registered by name.
pub struct HandlebarsAdapter {
    hb: Handlebars<'static>,
    search_paths: Vec<PathBuf>,
    partial_names: HashSet<String>,
    state: Option<SharedRenderState>,
}

impl HandlebarsAdapter {
    #[must_use]
    pub fn new() -> Self {
        let mut hb = Handlebars::new();
        hb.set_strict_mode(true);
        Self { hb, search_paths: Vec::new(), partial_names: HashSet::new(), state: None }
    }
}

impl Default for HandlebarsAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateAdapter for HandlebarsAdapter {
    fn set_search_paths(&mut self, paths: &[PathBuf]) {
        self.search_paths = paths.to_vec();
    }

    fn load_partials(&mut self, dir: &Path) -> Result<Vec<String>, StrukturError> {
        let mut names = Vec::new();
        for entry in walkdir::WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(|e| StrukturError::Other {
                message: format!("failed to read directory entry under {}: {e}", dir.display()),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry.path().strip_prefix(dir).unwrap_or(entry.path());
            let name = relative.to_string_lossy().replace('\\', "/");
            let source = std::fs::read_to_string(entry.path())?;
            self.register_partial(&name, &source)?;
            names.push(name);
        }
        Ok(names)
    }

    fn register_partial(&mut self, name: &str, source: &str) -> Result<(), StrukturError> {
        self.hb.register_template_string(name, source).map_err(|e| StrukturError::TemplateSyntax {
            name: name.to_string(),
            reason: handlebars_error_reason(&e),
        })?;
        self.partial_names.insert(name.to_string());
        Ok(())
    }

    fn register_default_helpers(&mut self, canonical: Rc<CanonicalModel>) {
        let canonical = Arc::new((*canonical).clone());
        for name in GENERIC_HELPER_NAMES {
            self.hb.register_helper(name, Box::new(GenericHelper { name: (*name).to_string() }));
        }
        for name in STRUKTUR_HELPER_NAMES {
            self.hb
                .register_helper(name, Box::new(StrukturHelper { name: (*name).to_string(), canonical: canonical.clone() }));
        }
    }

    fn install_engine_helpers(&mut self, state: SharedRenderState, _build_dir: PathBuf) {
        self.state = Some(state.clone());
        self.hb.register_helper("buffer", Box::new(BufferHelper { state: state.clone() }));
        self.hb.register_helper("yield", Box::new(YieldHelper { state: state.clone() }));
        self.hb.register_helper("buffer_exists", Box::new(BufferExistsHelper { state: state.clone() }));
        self.hb.register_helper("extends", Box::new(ExtendsHelper { state: state.clone() }));
        self.hb.register_helper("render_file", Box::new(RenderFileHelper { state: state.clone() }));
        self.hb.register_helper("file", Box::new(FileHelper { state }));
        self.hb.register_helper("partial_exists", Box::new(PartialExistsHelper { names: self.partial_names.clone() }));
    }

    fn validate(&self, template_name: &str) -> TemplateValidation {
        if self.hb.get_template(template_name).is_some() {
            TemplateValidation::ok()
        } else {
            TemplateValidation::failed(format!("template '{template_name}' is not registered"))
        }
    }

    fn render(&self, template_name: &str) -> Result<String, StrukturError> {
        let state = self.state.as_ref().ok_or_else(|| StrukturError::Other {
            message: "render called before install_engine_helpers".to_string(),
        })?;
        let (canonical, metadata, path_prefix) = {
            let ctx = state.lock().map_err(|_| StrukturError::Other { message: "render state poisoned".to_string() })?;
            (ctx.canonical.clone(), ctx.metadata.clone(), ctx.path_prefix().to_string())
        };

        let data = serde_json::json!({
            "instances": canonical.instances,
            "instances_by_id": canonical.instances_by_id,
            "classes_by_id": canonical.classes_by_id,
            "aspects_by_id": canonical.aspects_by_id,
            "metadata": metadata,
            "path_prefix": path_prefix,
        });

        self.hb
            .render(template_name, &data)
            .map_err(|e| StrukturError::TemplateRender { name: template_name.to_string(), reason: handlebars_error_reason(&e) })
    }
}
