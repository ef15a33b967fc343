//! The fixed build sequence (spec.md §5): load, resolve, check, canonicalize,
//! write, render, record - in that order, every time, with no incremental or
//! partial-rebuild mode.
//!
//! Grounded on the teacher's `src/cli/install.rs`/`src/resolver/mod.rs`
//! top-level orchestration shape: one function drives every stage in a
//! fixed order, annotating each stage's errors with its own `tracing` span
//! rather than letting a lower-level error surface unexplained.

use crate::canonical;
use crate::config::BuildConfig;
use crate::core::StrukturError;
use crate::loader::{aspect_loader, class_loader, instance_loader, instance_merger};
use crate::manifest::{self, BuildInputs};
use crate::model::{AspectDef, CanonicalModel, ClassDef};
use crate::render::renderer::{self, RenderSummary};
use crate::resolver::ClassResolver;
use crate::schema::constraint::{self, ConstraintConflict, ConstraintConflictKind};
use crate::schema::SchemaCache;
use crate::validator::LintConfig;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What a completed build produced, for the CLI to print.
#[derive(Debug)]
pub struct BuildReport {
    /// Where the build actually landed (`<build_dir>/build-<hash8>/` or
    /// `build_dir` itself, per `deterministic`).
    pub build_dir: PathBuf,
    /// The 8-hex-character content address computed from configured
    /// directories.
    pub hash: String,
    /// How many classes, aspects, and merged instances fed the build.
    pub class_count: usize,
    pub aspect_count: usize,
    pub instance_count: usize,
    /// The canonical model's own validation summary.
    pub validation: crate::model::ValidationSummary,
    /// Schema constraint conflicts found across every class's lineage,
    /// formatted for display - present regardless of whether
    /// `fail_on_constraint_conflicts` made them fatal.
    pub constraint_warnings: Vec<String>,
    /// Non-fatal warnings collected along the way (build-directory hash
    /// collisions, an empty render task list, and so on).
    pub warnings: Vec<String>,
    /// What the render phase wrote.
    pub render_summary: RenderSummary,
}

fn constraint_error(class: &str, conflict: &ConstraintConflict) -> StrukturError {
    let class = class.to_string();
    let path = conflict.path.clone();
    let detail = conflict.detail.clone();
    match conflict.kind {
        ConstraintConflictKind::Range => StrukturError::RangeConflict { class, path, detail },
        ConstraintConflictKind::Enum => StrukturError::EnumConflict { class, path, detail },
        ConstraintConflictKind::Type => StrukturError::ConstraintTypeConflict { class, path, detail },
        ConstraintConflictKind::StringLength => StrukturError::StringLengthConflict { class, path, detail },
        ConstraintConflictKind::ArrayLength => StrukturError::ArrayLengthConflict { class, path, detail },
    }
}

/// Resolve every class's lineage and run the schema constraint checker over
/// it (spec.md §4.8), independent of any instance data.
///
/// Returns every conflict found, formatted for display. When
/// `fail_on_constraint_conflicts` is set and any conflict was found, the
/// first one (in class, then path, order) is returned as a fatal error
/// instead.
fn check_class_constraints(classes: &BTreeMap<String, ClassDef>, fail_on_conflicts: bool) -> Result<Vec<String>, StrukturError> {
    let resolver = ClassResolver::new(classes);
    let mut warnings = Vec::new();

    for class_name in classes.keys() {
        let resolved = resolver.resolve(class_name)?;
        let lineage: Vec<(String, Value)> = resolved.lineage.iter().cloned().zip(resolved.schemas.iter().cloned()).collect();
        let conflicts = constraint::check_constraints(&lineage);
        for conflict in &conflicts {
            if fail_on_conflicts {
                return Err(constraint_error(class_name, conflict));
            }
            warnings.push(constraint_error(class_name, conflict).to_string());
        }
    }

    Ok(warnings)
}

/// Load every class and aspect definition, the shared first step of all
/// three entry points below.
fn load_definitions(
    config: &BuildConfig,
    schema_cache: &mut SchemaCache,
) -> Result<(BTreeMap<String, ClassDef>, BTreeMap<String, AspectDef>), StrukturError> {
    let class_dirs = BuildConfig::existing_dirs(&config.class_dirs);
    let classes = class_loader::load_classes(&class_dirs, schema_cache)?;

    let aspect_dirs = BuildConfig::existing_dirs(&config.aspect_dirs);
    let aspects = aspect_loader::load_aspects(&aspect_dirs, schema_cache)?;

    Ok((classes, aspects))
}

/// What `check_constraints` or `validate` found, short of running a full
/// build: no build directory is resolved, nothing is written.
#[derive(Debug)]
pub struct ValidationReport {
    pub class_count: usize,
    pub aspect_count: usize,
    pub instance_count: usize,
    /// The canonical model's own validation summary.
    pub validation: crate::model::ValidationSummary,
    /// Schema constraint conflicts across every class's lineage, formatted
    /// for display.
    pub constraint_warnings: Vec<String>,
}

/// Check every class's lineage for schema constraint conflicts (spec.md
/// §4.8) without loading or merging any instance data.
///
/// Always diagnostic here, regardless of `config.fail_on_constraint_conflicts`
/// - this is the entry point a user runs specifically to see conflicts, so
/// it never aborts early on the first one.
pub fn check_constraints(config: &BuildConfig) -> Result<Vec<String>, StrukturError> {
    config.validate_directories()?;
    let mut schema_cache = SchemaCache::new();
    let (classes, _aspects) = load_definitions(config, &mut schema_cache)?;
    check_class_constraints(&classes, false)
}

/// Load, resolve, and canonicalize everything a build would, but never
/// resolve a build directory, write output, or render templates.
///
/// Unlike [`run`], a canonical model with invalid instances is not an
/// error here - the whole point of this entry point is to report what's
/// wrong, not to fail fast.
pub fn validate(config: &BuildConfig) -> Result<ValidationReport, StrukturError> {
    config.validate_directories()?;
    let mut schema_cache = SchemaCache::new();
    let (classes, aspects) = load_definitions(config, &mut schema_cache)?;

    let constraint_warnings = check_class_constraints(&classes, config.fail_on_constraint_conflicts)?;

    let instance_dirs = BuildConfig::existing_dirs(&config.instance_dirs);
    let load_report = instance_loader::load_instances(&instance_dirs)?;
    let records = load_report.into_instances()?;
    let (merged_instances, _merge_stats) = instance_merger::merge_instances(records)?;

    let lint_config = LintConfig::default();
    let canonical = canonical::build_canonical_model(&merged_instances, &classes, &aspects, &mut schema_cache, &lint_config)?;

    Ok(ValidationReport {
        class_count: classes.len(),
        aspect_count: aspects.len(),
        instance_count: canonical.instances.len(),
        validation: canonical.validation,
        constraint_warnings,
    })
}

/// Write `meta/classes/<class>.json`, `meta/aspects/<aspect>.json`, and
/// `meta/validation.json` alongside `canonical.json`, the supplementary
/// per-definition files spec.md §4.14 calls for beyond the canonical model
/// itself.
fn write_meta_files(
    build_dir: &PathBuf,
    classes: &BTreeMap<String, ClassDef>,
    aspects: &BTreeMap<String, AspectDef>,
    canonical: &CanonicalModel,
) -> Result<(), StrukturError> {
    let resolver = ClassResolver::new(classes);
    let classes_dir = build_dir.join("meta").join("classes");
    crate::utils::ensure_dir(&classes_dir)?;
    for class_name in classes.keys() {
        let resolved = resolver.resolve(class_name)?;
        let path = classes_dir.join(format!("{class_name}.json"));
        crate::utils::atomic_write_json(&path, &serde_json::to_value(&*resolved)?)?;
    }

    let aspects_dir = build_dir.join("meta").join("aspects");
    crate::utils::ensure_dir(&aspects_dir)?;
    for (aspect_name, aspect) in aspects {
        let path = aspects_dir.join(format!("{aspect_name}.json"));
        crate::utils::atomic_write_json(&path, &serde_json::to_value(aspect)?)?;
    }

    let meta_dir = build_dir.join("meta");
    crate::utils::ensure_dir(&meta_dir)?;
    crate::utils::atomic_write_json(&meta_dir.join("validation.json"), &serde_json::to_value(&canonical.validation)?)?;

    Ok(())
}

/// Run the entire build: load every definition, resolve classes, check
/// lineage constraints, build the canonical model, write it and its
/// supplementary metadata, render every template task, and record the
/// build manifest.
///
/// Every stage runs unconditionally in this order (spec.md §5: no
/// incremental or partial-rebuild mode); a failure at any stage aborts the
/// whole build without writing partial output beyond what that stage had
/// already flushed.
pub fn run(config: &BuildConfig) -> Result<BuildReport, StrukturError> {
    let timestamp = chrono::Utc::now().to_rfc3339();
    let mut warnings = Vec::new();

    info!("validating configured directories");
    config.validate_directories()?;

    let inputs = BuildInputs {
        class_dirs: config.class_dirs.iter().map(|d| d.path().to_path_buf()).collect(),
        aspect_dirs: config.aspect_dirs.iter().map(|d| d.path().to_path_buf()).collect(),
        instance_dirs: config.instance_dirs.iter().map(|d| d.path().to_path_buf()).collect(),
        template_dirs: config.template_dirs.iter().map(|d| d.path().to_path_buf()).collect(),
    };
    let (build_dir, hash) = manifest::resolve_build_dir(&config.build_dir, &inputs, config.deterministic);
    crate::utils::ensure_dir(&build_dir)?;
    info!(build_dir = %build_dir.display(), hash, "build directory resolved");

    if let Some(warning) = manifest::check_collision(&build_dir, &hash, config.fail_on_collisions)? {
        warn!("{warning}");
        warnings.push(warning);
    }

    let mut schema_cache = SchemaCache::new();

    debug!("loading classes and aspects");
    let (classes, aspects) = load_definitions(config, &mut schema_cache)?;

    debug!("checking schema constraints across class lineages");
    let constraint_warnings = check_class_constraints(&classes, config.fail_on_constraint_conflicts)?;
    for warning in &constraint_warnings {
        warn!("{warning}");
    }

    debug!("loading and merging instances");
    let instance_dirs = BuildConfig::existing_dirs(&config.instance_dirs);
    let load_report = instance_loader::load_instances(&instance_dirs)?;
    let records = load_report.into_instances()?;
    let (merged_instances, merge_stats) = instance_merger::merge_instances(records)?;
    debug!(
        total = merge_stats.total_records,
        unique = merge_stats.unique_ids,
        merged = merge_stats.merged_groups,
        "instances merged"
    );

    info!("building canonical model");
    let lint_config = LintConfig::default();
    let canonical = canonical::build_canonical_model(&merged_instances, &classes, &aspects, &mut schema_cache, &lint_config)?;
    if canonical.validation.invalid > 0 {
        return Err(StrukturError::Other {
            message: format!(
                "{} of {} instances failed validation; see meta/validation.json for details",
                canonical.validation.invalid, canonical.validation.total
            ),
        });
    }

    let class_count = classes.len();
    let aspect_count = aspects.len();
    let instance_count = canonical.instances.len();
    let validation = canonical.validation.clone();

    let canonical_path = build_dir.join("canonical.json");
    crate::utils::atomic_write_json(&canonical_path, &serde_json::to_value(&canonical)?)?;
    info!(path = %canonical_path.display(), "canonical model written");

    write_meta_files(&build_dir, &classes, &aspects, &canonical)?;

    let canonical = Arc::new(canonical);

    info!("rendering templates");
    let render_summary = renderer::render(config, &canonical, &build_dir)?;
    info!(files = render_summary.files_written.len(), "render complete");

    manifest::write_manifest(&build_dir, &hash, &timestamp, inputs)?;
    debug!("build manifest written");

    Ok(BuildReport {
        build_dir,
        hash,
        class_count,
        aspect_count,
        instance_count,
        validation,
        constraint_warnings,
        warnings,
        render_summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_error_maps_every_kind() {
        let conflict =
            ConstraintConflict { kind: ConstraintConflictKind::Range, path: "/width".to_string(), detail: "impossible".to_string() };
        assert!(matches!(constraint_error("widget", &conflict), StrukturError::RangeConflict { .. }));
    }
}
