//! Error handling for struktur
//!
//! This module provides the error types and user-friendly error reporting
//! used throughout the build pipeline. The error system is designed around
//! two core principles:
//! 1. **Strongly-typed errors** for precise handling in code
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Architecture
//!
//! The error system consists of two main types:
//! - [`StrukturError`] - the full taxonomy of failure modes across every
//!   pipeline stage (loaders, resolver, merger, validator, constraint
//!   checker, path safety, template adapters, orchestrator)
//! - [`ErrorContext`] - a wrapper that adds a user-friendly suggestion and
//!   extra details on top of a [`StrukturError`]
//!
//! # Propagation policy
//!
//! Loader and resolver errors abort the build immediately, with the
//! offending file path attached. Validator errors aggregate per instance
//! and per batch - the orchestrator decides whether any validation error
//! aborts the build (default: yes). Renderer pre-flight collects every
//! issue it can find before aborting, so a single rebuild surfaces as many
//! problems as possible. Warnings (semantic/lint pass) never abort; they
//! are written to `meta/validation.json` alongside the canonical model.
//!
//! # Examples
//!
//! ```rust,no_run
//! use struktur_cli::core::{StrukturError, ErrorContext};
//!
//! fn handle_missing_parent() -> Result<(), StrukturError> {
//!     Err(StrukturError::UnknownParent {
//!         class: "web-service".into(),
//!         parent: "service".into(),
//!     })
//! }
//!
//! match handle_missing_parent() {
//!     Ok(_) => println!("resolved"),
//!     Err(e) => {
//!         let ctx = ErrorContext::new(e)
//!             .with_suggestion("Check the $parent field against the classes/ directory");
//!         ctx.display();
//!     }
//! }
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The error taxonomy for struktur's build pipeline.
///
/// Variants are grouped by the pipeline stage that raises them, matching
/// the error taxonomy in the design document: loaders, resolver, merger,
/// validator, constraint checker, semantic/lint pass, path safety,
/// template rendering, and the orchestrator.
#[derive(Error, Debug)]
pub enum StrukturError {
    // ---- Loader errors ------------------------------------------------
    /// A class, aspect, or instance file is missing a field its shape requires.
    #[error("{kind} '{name}' in {file} is missing required field '{field}'")]
    MissingRequiredField {
        /// `class`, `aspect`, or `instance`
        kind: String,
        /// The `$id`/`$class` name, when known
        name: String,
        /// Path to the offending file
        file: String,
        /// The missing field name
        field: String,
    },

    /// A definition file does not parse as JSON.
    #[error("invalid JSON in {file}: {reason}")]
    InvalidJson {
        /// Path to the offending file
        file: String,
        /// The underlying parse error message
        reason: String,
    },

    /// A `$schemas` fragment failed draft-07 meta-validation.
    #[error("schema fragment in {file} is not a valid draft-07 JSON Schema: {reason}")]
    InvalidSchemaMetaValidation {
        /// Path to the offending file
        file: String,
        /// The meta-validation failure reason
        reason: String,
    },

    /// Two definitions of the same kind declare the same identity.
    #[error("duplicate {kind} name '{name}': already defined in {first}, redefined in {second}")]
    DuplicateName {
        /// `class`, `aspect`, or `instance`
        kind: String,
        /// The duplicated identity
        name: String,
        /// The file where the name was first seen
        first: String,
        /// The file where the name was seen again
        second: String,
    },

    /// A definition uses the unprefixed legacy key shape (`id`/`class`/`render`/`aspects`).
    #[error("{file} uses the legacy unprefixed shape; struktur only accepts $-prefixed keys")]
    LegacyShape {
        /// Path to the offending file
        file: String,
    },

    /// An instance file's top-level JSON value is an array, not an object.
    #[error("instance file {file} contains a top-level array; one instance per file is required")]
    ArrayInstanceFile {
        /// Path to the offending file
        file: String,
    },

    /// A definition was found inside a directory reserved for build output.
    #[error("{file} is inside the reserved output directory '{directory}'")]
    ReservedDirectory {
        /// Path to the offending file
        file: String,
        /// The reserved directory name
        directory: String,
    },

    /// One or more instance records had no `$class`; these are collected
    /// rather than failing at the first one, so the orchestrator can report
    /// every offending file together.
    #[error("{count} instance record(s) have no $class: {files}")]
    ClasslessInstances {
        /// Number of offending records
        count: usize,
        /// Comma-joined list of offending file paths
        files: String,
    },

    // ---- Resolver errors ------------------------------------------------
    /// A class declares a `$parent` that does not resolve to any loaded class.
    #[error("class '{class}' declares unknown parent '{parent}'")]
    UnknownParent {
        /// The class declaring the bad parent
        class: String,
        /// The unresolved parent name
        parent: String,
    },

    /// Walking `$parent` links revisited a class already on the current chain.
    #[error("circular inheritance detected: {chain}")]
    CircularInheritance {
        /// The lineage chain as it stood when the cycle was detected
        chain: String,
    },

    /// An instance references a class that was never loaded.
    #[error("instance '{instance}' references unresolved class '{class}'")]
    UnresolvedClass {
        /// The instance's `$id`
        instance: String,
        /// The missing class name
        class: String,
    },

    /// A class declares `$parent` as a JSON array instead of a single string.
    #[error("class '{class}' declares $parent as a list; multi-parent inheritance is rejected")]
    MultiParentRejected {
        /// The offending class
        class: String,
    },

    // ---- Merger errors --------------------------------------------------
    /// Two merge sources disagree on the JSON type at the same path.
    #[error("type conflict merging '{path}': {left_type} vs {right_type}")]
    TypeConflict {
        /// The JSON pointer path of the conflict
        path: String,
        /// The type contributed by the earlier source
        left_type: String,
        /// The type contributed by the later source
        right_type: String,
    },

    /// An instance-merge group mixes more than one `$class` value.
    #[error("instance group '{id}' has conflicting $class values: '{first}' and '{second}'")]
    ClassMismatch {
        /// The instance `$id` shared by the group
        id: String,
        /// The first class seen
        first: String,
        /// The conflicting class seen later
        second: String,
    },

    /// An instance fragment has no `$id`.
    #[error("instance fragment in {file} has no $id")]
    MissingId {
        /// Path to the offending file
        file: String,
    },

    /// An instance's `$render` entry is missing `template`/`output` or
    /// carries unexpected keys.
    #[error("invalid $render entry in {file}: {reason}")]
    InvalidRenderTask {
        /// Path to the offending file
        file: String,
        /// Why the entry was rejected
        reason: String,
    },

    // ---- Validator errors ------------------------------------------------
    /// An instance violates a schema at some layer of its lineage.
    #[error("instance '{instance}' violates schema at layer '{layer}', path '{path}': {reason}")]
    SchemaViolation {
        /// The instance `$id`
        instance: String,
        /// Which layer's schema was violated (a class name, or an aspect name)
        layer: String,
        /// The JSON pointer path within the instance
        path: String,
        /// The violation detail from the schema validator
        reason: String,
    },

    /// An instance's class requires an aspect the instance does not declare.
    #[error("instance '{instance}' is missing required aspect '{aspect}'")]
    MissingRequiredAspect {
        /// The instance `$id`
        instance: String,
        /// The missing aspect name
        aspect: String,
    },

    /// An instance declares an aspect that is not usable by its class lineage.
    #[error("instance '{instance}' declares undeclared aspect '{aspect}'")]
    UndeclaredAspect {
        /// The instance `$id`
        instance: String,
        /// The undeclared aspect name
        aspect: String,
    },

    /// An instance's class has no usable schema at all (nothing to validate against).
    #[error("no validator registered for class '{class}'")]
    NoValidatorRegistered {
        /// The class with no schema
        class: String,
    },

    // ---- Schema constraint checker errors --------------------------------
    /// A numeric range constraint across a class's lineage is impossible to satisfy.
    #[error("class '{class}' has an impossible numeric range at '{path}': {detail}")]
    RangeConflict {
        /// The class whose lineage produced the conflict
        class: String,
        /// The JSON pointer path of the conflicting property
        path: String,
        /// Human-readable description of the impossible range
        detail: String,
    },

    /// Two lineage layers declare `enum`/`const` sets with an empty intersection.
    #[error("class '{class}' has a conflicting enum constraint at '{path}': {detail}")]
    EnumConflict {
        /// The class whose lineage produced the conflict
        class: String,
        /// The JSON pointer path of the conflicting property
        path: String,
        /// Human-readable description of the disjoint enum sets
        detail: String,
    },

    /// Two lineage layers declare incompatible `type` constraints for the same property.
    #[error("class '{class}' has a conflicting type constraint at '{path}': {detail}")]
    ConstraintTypeConflict {
        /// The class whose lineage produced the conflict
        class: String,
        /// The JSON pointer path of the conflicting property
        path: String,
        /// Human-readable description of the incompatible types
        detail: String,
    },

    /// `minLength` exceeds `maxLength` across a class's lineage.
    #[error("class '{class}' has an impossible string length constraint at '{path}': {detail}")]
    StringLengthConflict {
        /// The class whose lineage produced the conflict
        class: String,
        /// The JSON pointer path of the conflicting property
        path: String,
        /// Human-readable description of the impossible length range
        detail: String,
    },

    /// `minItems` exceeds `maxItems` across a class's lineage.
    #[error("class '{class}' has an impossible array length constraint at '{path}': {detail}")]
    ArrayLengthConflict {
        /// The class whose lineage produced the conflict
        class: String,
        /// The JSON pointer path of the conflicting property
        path: String,
        /// Human-readable description of the impossible length range
        detail: String,
    },

    // ---- Path safety errors ------------------------------------------------
    /// A resolved path would escape the sandboxed root directory.
    #[error("path '{path}' escapes the allowed root '{root}'")]
    UnsafePath {
        /// The offending path
        path: String,
        /// The root it should have stayed under
        root: String,
    },

    /// Two render tasks would write to the same output path.
    #[error("output collision at '{path}': written by both '{first}' and '{second}'")]
    OutputCollision {
        /// The colliding output path
        path: String,
        /// The first task that claimed the path
        first: String,
        /// The task that collided with it
        second: String,
    },

    // ---- Template errors ------------------------------------------------
    /// A referenced template file does not exist in the templates directory.
    #[error("template '{name}' not found{suggestion}")]
    TemplateNotFound {
        /// The requested template name
        name: String,
        /// A "did you mean '...'" suffix, or empty
        suggestion: String,
    },

    /// A template fails to parse.
    #[error("syntax error in template '{name}': {reason}")]
    TemplateSyntax {
        /// The template name
        name: String,
        /// The parser's error message
        reason: String,
    },

    /// A template fails during rendering (missing variable, filter error, etc).
    #[error("failed to render template '{name}': {reason}")]
    TemplateRender {
        /// The template name
        name: String,
        /// The rendering engine's error message
        reason: String,
    },

    /// A `{% block %}`/`yield` referenced a buffer that was never populated.
    #[error("buffer '{name}' was never populated while rendering '{template}'")]
    BufferNotFound {
        /// The expected buffer name
        name: String,
        /// The template that referenced it
        template: String,
    },

    /// Layout inheritance (`extends`) forms a cycle.
    #[error("circular template inheritance detected: {chain}")]
    CircularExtends {
        /// The extends chain as it stood when the cycle was detected
        chain: String,
    },

    /// Two templates registered the same partial/include name with different content.
    #[error("partial '{name}' registered twice with conflicting content")]
    PartialCollision {
        /// The partial name
        name: String,
    },

    /// One or more render tasks failed pre-flight (missing template or a
    /// circular `extends` chain), collected rather than failing at the
    /// first one so every offending task can be reported together.
    #[error("{count} render task(s) failed pre-flight: {issues}")]
    RenderPreflightFailed {
        /// Number of offending tasks
        count: usize,
        /// Semicolon-joined list of per-task failure messages
        issues: String,
    },

    // ---- Orchestrator errors ------------------------------------------------
    /// The build manifest has no recorded build directory for a completed run.
    #[error("build manifest is missing its build directory entry")]
    MissingBuildDir,

    /// `struktur.toml` names an explicit directory that does not exist on disk.
    #[error("configured directory '{path}' ({purpose}) does not exist")]
    ExplicitDirectoryMissing {
        /// What the directory was supposed to hold (classes, aspects, instances, templates)
        purpose: String,
        /// The configured path
        path: String,
    },

    /// The canonical model references a class that the resolver never produced.
    #[error("canonical model references unresolved class '{class}' for instance '{instance}'")]
    UnresolvedClassInCanonical {
        /// The instance `$id`
        instance: String,
        /// The missing class
        class: String,
    },

    // ---- Conversions & catch-all ------------------------------------------------
    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// TOML parsing error (`struktur.toml`)
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// JSON parsing/serialization error outside the loader's own `InvalidJson` path
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Catch-all for conditions that don't warrant their own variant
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

/// Error context wrapper that adds user-friendly suggestions to a [`StrukturError`]
///
/// This is the primary way struktur presents errors to CLI users: a
/// [`StrukturError`] carries the precise, typed failure; `ErrorContext`
/// adds an optional suggestion and optional extra detail line for
/// display.
///
/// # Display format
///
/// 1. **error**: the main message, in red
/// 2. **details**: additional context, in yellow (optional)
/// 3. **suggestion**: an actionable next step, in green (optional)
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying struktur error
    pub error: StrukturError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context from a [`StrukturError`] with no suggestion or details yet.
    #[must_use]
    pub const fn new(error: StrukturError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Attach an actionable suggestion, displayed in green.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Attach additional detail, displayed in yellow.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error, details, and suggestion to stderr with terminal colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into a user-friendly [`ErrorContext`] with an actionable suggestion.
///
/// Groups by keyword the way the CLI's final report does: missing
/// required fields, type mismatches, pattern/format errors, unexpected
/// fields, and everything else. Walks the error chain so a
/// [`StrukturError`] wrapped by `anyhow::Context` is still recognized.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(struktur_error) = error.downcast_ref::<StrukturError>() {
        return create_error_context(struktur_error);
    }

    let mut current: &dyn std::error::Error = error.as_ref();
    loop {
        if let Some(struktur_error) = current.downcast_ref::<StrukturError>() {
            return create_error_context(struktur_error);
        }
        match current.source() {
            Some(source) => current = source,
            None => break,
        }
    }

    ErrorContext::new(StrukturError::Other {
        message: error.to_string(),
    })
}

/// Build a tailored [`ErrorContext`] for a known [`StrukturError`] variant.
fn create_error_context(error: &StrukturError) -> ErrorContext {
    match error {
        StrukturError::MissingRequiredField { field, file, .. } => {
            ErrorContext::new(clone_display(error))
                .with_suggestion(format!("Add '{field}' to {file}"))
                .with_details("Every class, aspect, and instance must declare its identity fields")
        }
        StrukturError::InvalidJson { file, .. } => ErrorContext::new(clone_display(error))
            .with_suggestion(format!("Check {file} for a trailing comma or unquoted key")),
        StrukturError::InvalidSchemaMetaValidation { file, .. } => {
            ErrorContext::new(clone_display(error))
                .with_suggestion(format!("Validate the $schemas block in {file} against draft-07"))
        }
        StrukturError::DuplicateName { first, second, .. } => {
            ErrorContext::new(clone_display(error)).with_suggestion(format!(
                "Rename one of the definitions in {first} or {second}"
            ))
        }
        StrukturError::LegacyShape { file } => ErrorContext::new(clone_display(error))
            .with_suggestion(format!("Rename the keys in {file} to their $-prefixed form")),
        StrukturError::UnknownParent { parent, .. } => ErrorContext::new(clone_display(error))
            .with_suggestion(format!(
                "Check that a class named '{parent}' exists in the classes directory"
            )),
        StrukturError::CircularInheritance { .. } => ErrorContext::new(clone_display(error))
            .with_suggestion("Break the cycle by changing one class's $parent"),
        StrukturError::UnsafePath { root, .. } => ErrorContext::new(clone_display(error))
            .with_suggestion(format!("Keep generated output paths under '{root}'")),
        StrukturError::OutputCollision { first, second, .. } => {
            ErrorContext::new(clone_display(error)).with_suggestion(format!(
                "Give '{first}' or '{second}' a distinct output path"
            ))
        }
        StrukturError::TemplateNotFound { .. } => {
            ErrorContext::new(clone_display(error)).with_suggestion("Check the template name and the templates directory")
        }
        StrukturError::SchemaViolation { layer, .. } => ErrorContext::new(clone_display(error))
            .with_suggestion(format!("Fix the instance data, or relax the schema on '{layer}'")),
        _ => ErrorContext::new(clone_display(error)),
    }
}

/// `StrukturError` doesn't implement `Clone` (some conversions wrap foreign error
/// types that don't implement it either); rebuild an equivalent `Other` variant
/// carrying the same display text for attaching to a fresh `ErrorContext`.
fn clone_display(error: &StrukturError) -> StrukturError {
    StrukturError::Other {
        message: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = StrukturError::UnknownParent {
            class: "web-service".into(),
            parent: "service".into(),
        };
        assert_eq!(
            error.to_string(),
            "class 'web-service' declares unknown parent 'service'"
        );
    }

    #[test]
    fn test_error_context_builder() {
        let ctx = ErrorContext::new(StrukturError::MissingBuildDir)
            .with_suggestion("Run struktur build first")
            .with_details("No build manifest was found");

        assert_eq!(ctx.suggestion, Some("Run struktur build first".to_string()));
        assert_eq!(ctx.details, Some("No build manifest was found".to_string()));
    }

    #[test]
    fn test_error_context_display_contains_message() {
        let ctx = ErrorContext::new(StrukturError::UnsafePath {
            path: "../etc/passwd".into(),
            root: "/build/out".into(),
        });

        let display = format!("{ctx}");
        assert!(display.contains("escapes the allowed root"));
    }

    #[test]
    fn test_user_friendly_error_recognizes_struktur_error() {
        let err = anyhow::Error::new(StrukturError::CircularInheritance {
            chain: "a -> b -> a".into(),
        });
        let ctx = user_friendly_error(err);
        assert!(ctx.suggestion.is_some());
    }

    #[test]
    fn test_user_friendly_error_falls_back_on_generic_errors() {
        let err = anyhow::anyhow!("something unexpected happened");
        let ctx = user_friendly_error(err);
        assert!(ctx.suggestion.is_none());
        assert!(ctx.to_string().contains("something unexpected happened"));
    }
}
