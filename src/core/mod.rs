//! Core types shared across struktur: the error taxonomy and a handful of
//! identifiers used at every layer of the pipeline.
//!
//! # Modules
//!
//! - [`error`] - the [`StrukturError`] taxonomy and user-friendly formatting

pub mod error;

pub use error::{ErrorContext, StrukturError, user_friendly_error};

/// Convenience result alias used throughout the crate for internal plumbing.
///
/// Public APIs that want a typed error use `Result<T, StrukturError>`
/// directly; this alias is for call sites that only need to propagate with
/// `?` and add [`anyhow::Context`].
pub type Result<T> = anyhow::Result<T>;
