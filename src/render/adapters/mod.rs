//! Concrete template engine adapters (spec.md §4.12).
//!
//! Two engines, one [`crate::render::adapter::TemplateAdapter`] each:
//! [`tera_adapter`] wraps the teacher's own `tera` dependency,
//! [`handlebars_adapter`] wraps `handlebars`. Neither module is reachable
//! from the other; [`crate::render::renderer`] picks one by
//! [`crate::config::Engine`] and talks to it only through the trait.

pub mod handlebars_adapter;
pub mod tera_adapter;
