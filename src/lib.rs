//! struktur - a data-driven build engine
//!
//! struktur compiles a set of JSON class, aspect, and instance definitions
//! into a single canonical model, then renders that model through a
//! pluggable template engine (Tera or Handlebars) into a deterministic,
//! content-addressed output tree.
//!
//! # Architecture
//!
//! A build moves through a fixed pipeline, with no incremental mode:
//!
//! 1. **Load** every `*.class.json` class and aspect file, and every
//!    instance definition, from the directories named in `struktur.toml`.
//! 2. **Resolve** each class's `$parent` chain into a lineage, merging
//!    fields and aspect defaults leaf-last but keeping schemas unmerged.
//! 3. **Check** every resolved lineage's `$schemas` for impossible
//!    constraints (a `minimum` above a later `maximum`, disjoint `enum`
//!    sets, and so on).
//! 4. **Merge** same-`$id` instance fragments and layer the three-source
//!    aspect defaults (aspect defaults, class aspect defaults, instance
//!    data) into each instance record.
//! 5. **Validate** every instance against its lineage's schemas and its
//!    declared aspects, producing a validation summary.
//! 6. **Canonicalize** everything into one `CanonicalModel`, written as
//!    `canonical.json` alongside per-class and per-aspect metadata files.
//! 7. **Render** every configured and instance-contributed template task,
//!    including layout inheritance and nested partial sub-renders.
//! 8. **Record** a content-addressed build manifest so a later build with
//!    the same inputs reuses the same output directory.
//!
//! # Core Modules
//!
//! - [`canonical`] - builds the canonical model from resolved classes,
//!   aspects, and merged instances
//! - [`cli`] - command-line interface (`build`, `validate`, `check-constraints`)
//! - [`config`] - `struktur.toml` parsing and directory validation
//! - [`core`] - error taxonomy and user-friendly error reporting
//! - [`loader`] - class, aspect, and instance file discovery and parsing
//! - [`manifest`] - content-addressed build directories and build manifests
//! - [`merge`] - deep-merge semantics shared by the resolver and canonical builder
//! - [`model`] - class, aspect, instance, and canonical model types
//! - [`orchestrator`] - the fixed build sequence tying every stage together
//! - [`path_safety`] - output path sandboxing and collision detection
//! - [`render`] - the template adapter trait, concrete engines, and the renderer
//! - [`resolver`] - class lineage resolution with memoized caching
//! - [`schema`] - JSON-Schema meta-validation and the constraint checker
//! - [`utils`] - atomic file writes and directory helpers
//! - [`validator`] - the multi-pass per-instance validator
//!
//! # Example
//!
//! ```toml
//! # struktur.toml
//! class_dirs = ["classes"]
//! aspect_dirs = ["aspects"]
//! instance_dirs = ["instances"]
//! template_dirs = ["templates"]
//! build_dir = "build"
//! engine = "tera"
//! ```
//!
//! # Usage
//!
//! ```bash
//! # Build the canonical model and render every template task
//! struktur build
//!
//! # Validate every definition without writing any output
//! struktur validate
//!
//! # Check class lineages for impossible schema constraints
//! struktur check-constraints
//! ```

pub mod canonical;
pub mod cli;
pub mod config;
pub mod core;
pub mod loader;
pub mod manifest;
pub mod merge;
pub mod model;
pub mod orchestrator;
pub mod path_safety;
pub mod render;
pub mod resolver;
pub mod schema;
pub mod utils;
pub mod validator;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
