//! Rendering pipeline: render context/buffers, the template adapter
//! interface, two concrete adapters, the generic and struktur-specific
//! helper tables, and the renderer that drives them (spec.md §4.11-§4.13,
//! components 11-13).
//!
//! Grounded end to end on the teacher's `src/templating/` module:
//! [`context`] generalizes `src/templating/context.rs`'s single
//! `agpm`-namespaced Tera context into the buffer/output map this spec's
//! layout-inheritance protocol needs; [`adapter`] and [`adapters`]
//! generalize `src/templating/renderer.rs`'s single-engine wrapper into a
//! trait two engines implement; [`helpers`]/[`struktur_helpers`] generalize
//! `src/templating/filters.rs`'s per-filter functions into engine-agnostic
//! dispatch tables; [`renderer`] generalizes `src/templating/renderer.rs`'s
//! pre-flight/render flow into the spec's eight-phase sequence.

pub mod adapter;
pub mod adapters;
pub mod context;
pub mod helpers;
pub mod renderer;
pub mod struktur_helpers;
