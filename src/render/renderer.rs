//! The render pipeline (spec.md §4.13): plans every render task, drives
//! one [`TemplateAdapter`] through content and layout phases for each, and
//! writes every output inside the build directory.
//!
//! Grounded on the teacher's `src/templating/renderer.rs`
//! (`TemplateRenderer::render` - one engine instance, a pre-flight pass
//! over every referenced template before any file is written, Levenshtein
//! suggestions via `find_similar_variables`/`SIMILARITY_THRESHOLD_PERCENT`
//! for a template that doesn't resolve) generalized from Tera-only to the
//! engine-agnostic [`TemplateAdapter`] trait.

use crate::config::{BuildConfig, Engine};
use crate::core::StrukturError;
use crate::model::{CanonicalModel, RenderTask};
use crate::path_safety::{self, CollisionTracker};
use crate::render::adapter::TemplateAdapter;
use crate::render::adapters::{handlebars_adapter::HandlebarsAdapter, tera_adapter::TeraAdapter};
use crate::render::context::{BufferMode, RenderContext, SharedRenderState};
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

const SIMILARITY_THRESHOLD_PERCENT: f64 = 60.0;

/// One planned render task, resolved from either build configuration or
/// an instance's `$render` array, labeled for error/collision messages.
struct PlannedTask {
    label: String,
    template: String,
    output: String,
}

/// What a completed render pass produced, for the orchestrator to log and
/// fold into the build manifest.
#[derive(Debug, Default)]
pub struct RenderSummary {
    /// Every file written, in write order.
    pub files_written: Vec<PathBuf>,
    /// Non-fatal collision warnings surfaced while checking prior builds
    /// (currently always empty; reserved for warnings the renderer itself
    /// chooses not to fail on).
    pub warnings: Vec<String>,
}

/// Build the concrete adapter named by `engine`.
fn build_adapter(engine: Engine) -> Box<dyn TemplateAdapter> {
    match engine {
        Engine::Tera => Box::new(TeraAdapter::new()),
        Engine::Handlebars => Box::new(HandlebarsAdapter::new()),
    }
}

/// Gather every configured and instance-contributed render task, config
/// tasks first, in spec.md §4.13's config-first order.
fn collect_tasks(config: &BuildConfig, canonical: &CanonicalModel) -> Result<Vec<PlannedTask>, StrukturError> {
    let mut tasks = Vec::new();

    for (index, task) in config.render_tasks.iter().enumerate() {
        tasks.push(PlannedTask {
            label: format!("config render task #{index}"),
            template: task.template.clone(),
            output: task.output.clone(),
        });
    }

    for instance in &canonical.instances {
        let id = instance.get("$id").and_then(Value::as_str).unwrap_or("<unknown>").to_string();
        let Some(Value::Array(items)) = instance.get("$render") else { continue };
        for (index, item) in items.iter().enumerate() {
            let render_task: RenderTask = serde_json::from_value(item.clone()).map_err(|e| StrukturError::InvalidRenderTask {
                file: format!("instance '{id}'"),
                reason: e.to_string(),
            })?;
            tasks.push(PlannedTask {
                label: format!("instance '{id}' render task #{index}"),
                template: render_task.template,
                output: render_task.output,
            });
        }
    }

    Ok(tasks)
}

/// Find the best-matching registered template name for a typo'd one, the
/// way the teacher's `find_similar_variables` suggests a close variable
/// name - Levenshtein distance normalized to a percent-similarity score,
/// only offered above `SIMILARITY_THRESHOLD_PERCENT`.
fn suggest_template(target: &str, candidates: &HashSet<String>) -> Option<String> {
    let mut best: Option<(String, f64)> = None;
    for candidate in candidates {
        let distance = strsim::levenshtein(target, candidate);
        let max_len = target.chars().count().max(candidate.chars().count()).max(1);
        let similarity = (1.0 - distance as f64 / max_len as f64) * 100.0;
        if similarity >= SIMILARITY_THRESHOLD_PERCENT && best.as_ref().is_none_or(|(_, best_sim)| similarity > *best_sim) {
            best = Some((candidate.clone(), similarity));
        }
    }
    best.map(|(name, _)| name)
}

/// Check that `template` is registered, failing with a suggestion drawn
/// from `registered` otherwise.
fn ensure_template_exists(
    adapter: &dyn TemplateAdapter,
    template: &str,
    registered: &HashSet<String>,
) -> Result<(), StrukturError> {
    let validation = adapter.validate(template);
    if validation.valid {
        return Ok(());
    }
    let suggestion = suggest_template(template, registered).map(|s| format!(" - did you mean '{s}'?")).unwrap_or_default();
    Err(StrukturError::TemplateNotFound { name: template.to_string(), suggestion })
}

/// How many `"../"` segments an output path at this depth needs to link
/// back to the build root.
fn path_prefix_for(output: &str) -> String {
    let depth = Path::new(output).components().count().saturating_sub(1);
    "../".repeat(depth)
}

/// Render `template` and follow its `extends` chain to completion against
/// `state`, failing with [`StrukturError::CircularExtends`] the moment a
/// layout already on the chain reappears. Shared by the actual render pass
/// and the pre-flight dry run, so both walk the chain identically.
fn run_content_and_layout_chain(
    adapter: &mut dyn TemplateAdapter,
    state: &SharedRenderState,
    registered: &HashSet<String>,
    template: &str,
    label: &str,
) -> Result<String, StrukturError> {
    ensure_template_exists(adapter, template, registered)?;

    let mut current_text = adapter.render(template)?;
    debug!(task = label, template, "content phase rendered");

    let mut visited_layouts: Vec<String> = Vec::new();
    loop {
        let next_layout = {
            let mut locked = state.lock().map_err(|_| StrukturError::Other { message: "render state poisoned".to_string() })?;
            locked.take_extends()
        };
        let Some(layout) = next_layout else { break };
        if visited_layouts.contains(&layout) {
            let mut chain = visited_layouts.clone();
            chain.push(layout);
            return Err(StrukturError::CircularExtends { chain });
        }
        visited_layouts.push(layout.clone());

        ensure_template_exists(adapter, &layout, registered)?;
        {
            let mut locked = state.lock().map_err(|_| StrukturError::Other { message: "render state poisoned".to_string() })?;
            locked.write_buffer("content", &current_text, BufferMode::Replace, None);
        }
        current_text = adapter.render(&layout)?;
        debug!(task = label, layout, "layout phase rendered");
    }

    Ok(current_text)
}

/// Dry-run a task's content + layout chain against a throwaway render
/// state, to surface a missing template or a circular `extends` chain
/// during pre-flight, before any file is written.
fn preflight_task(
    adapter: &mut dyn TemplateAdapter,
    canonical: &Arc<CanonicalModel>,
    build_dir: &Path,
    metadata: &Value,
    registered: &HashSet<String>,
    template: &str,
    output: &str,
    label: &str,
) -> Result<(), StrukturError> {
    let context = RenderContext::new(canonical.clone(), build_dir.to_path_buf(), metadata.clone());
    let state: SharedRenderState = Arc::new(Mutex::new(context));
    {
        let mut locked = state.lock().map_err(|_| StrukturError::Other { message: "render state poisoned".to_string() })?;
        locked.set_path_prefix(path_prefix_for(output));
    }
    adapter.install_engine_helpers(state.clone(), build_dir.to_path_buf());
    run_content_and_layout_chain(adapter, &state, registered, template, label)?;
    Ok(())
}

/// Run the full content + layout + nested-`render_file` pipeline for one
/// task, writing every resulting file under `build_dir` and registering
/// each with `collisions`.
#[allow(clippy::too_many_arguments)]
fn render_task(
    adapter: &mut dyn TemplateAdapter,
    canonical: &Arc<CanonicalModel>,
    build_dir: &Path,
    metadata: &Value,
    collisions: &mut CollisionTracker,
    registered: &HashSet<String>,
    template: &str,
    output: &str,
    label: &str,
    summary: &mut RenderSummary,
) -> Result<(), StrukturError> {
    let context = RenderContext::new(canonical.clone(), build_dir.to_path_buf(), metadata.clone());
    let state: SharedRenderState = Arc::new(Mutex::new(context));
    {
        let mut locked = state.lock().map_err(|_| StrukturError::Other { message: "render state poisoned".to_string() })?;
        locked.set_path_prefix(path_prefix_for(output));
    }
    adapter.install_engine_helpers(state.clone(), build_dir.to_path_buf());

    let current_text = run_content_and_layout_chain(adapter, &state, registered, template, label)?;

    let resolved_path = path_safety::resolve_output_path(build_dir, output)?;
    collisions.register(resolved_path.clone(), label)?;
    crate::utils::atomic_write(&resolved_path, current_text.as_bytes())?;
    summary.files_written.push(resolved_path);

    let (queued_outputs, buffer_outputs, pending_renders) = {
        let mut locked = state.lock().map_err(|_| StrukturError::Other { message: "render state poisoned".to_string() })?;
        let queued: Vec<(String, String)> = locked.queued_outputs().iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        let buffers: Vec<(String, String)> =
            locked.buffers_with_destination().into_iter().map(|(dest, content)| (dest.to_string(), content.to_string())).collect();
        let pending = locked.take_pending_renders();
        (queued, buffers, pending)
    };

    for (destination, content) in queued_outputs.into_iter().chain(buffer_outputs) {
        let resolved = path_safety::resolve_output_path(build_dir, &destination)?;
        collisions.register(resolved.clone(), &format!("{label} (queued output)"))?;
        crate::utils::atomic_write(&resolved, content.as_bytes())?;
        summary.files_written.push(resolved);
    }

    for (partial, destination) in pending_renders {
        let nested_label = format!("{label} -> render_file({partial})");
        render_task(adapter, canonical, build_dir, metadata, collisions, registered, &partial, &destination, &nested_label, summary)?;
    }

    Ok(())
}

/// Run the full render pipeline for a build: pick the configured engine,
/// register helpers, load every template directory's partials, pre-flight
/// every planned task's template, then render and write each in turn.
pub fn render(config: &BuildConfig, canonical: &Arc<CanonicalModel>, build_dir: &Path) -> Result<RenderSummary, StrukturError> {
    let mut adapter = build_adapter(config.engine);
    let template_dirs = BuildConfig::existing_dirs(&config.template_dirs);
    adapter.set_search_paths(&template_dirs);
    adapter.register_default_helpers(Rc::new((**canonical).clone()));

    let mut registered: HashSet<String> = HashSet::new();
    let mut owning_dir: std::collections::HashMap<String, PathBuf> = std::collections::HashMap::new();
    for dir in &template_dirs {
        let names = adapter.load_partials(dir)?;
        for name in names {
            if let Some(first_dir) = owning_dir.get(&name) {
                if first_dir != dir {
                    return Err(StrukturError::PartialCollision { name });
                }
            }
            owning_dir.insert(name.clone(), dir.clone());
            registered.insert(name);
        }
    }
    info!(count = registered.len(), "templates registered");

    let tasks = collect_tasks(config, canonical)?;
    let mut preflight_issues: Vec<String> = Vec::new();
    for task in &tasks {
        if let Err(e) = preflight_task(
            &mut *adapter,
            canonical,
            build_dir,
            &canonical.metadata,
            &registered,
            &task.template,
            &task.output,
            &task.label,
        ) {
            preflight_issues.push(format!("{} ({e})", task.label));
        }
    }
    if !preflight_issues.is_empty() {
        return Err(StrukturError::RenderPreflightFailed { count: preflight_issues.len(), issues: preflight_issues.join("; ") });
    }
    debug!(count = tasks.len(), "render tasks passed pre-flight");

    let mut collisions = CollisionTracker::new();
    let mut summary = RenderSummary::default();
    for task in &tasks {
        render_task(
            &mut *adapter,
            canonical,
            build_dir,
            &canonical.metadata,
            &mut collisions,
            &registered,
            &task.template,
            &task.output,
            &task.label,
            &mut summary,
        )?;
    }

    if tasks.is_empty() {
        warn!("build configured no render tasks; nothing was rendered");
    }

    Ok(summary)
}
