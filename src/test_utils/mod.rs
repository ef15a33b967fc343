//! Test utilities for struktur.
//!
//! Provides a complete temporary build project ([`environment::TestEnvironment`])
//! and sample class/aspect/instance/template fixtures
//! ([`fixtures::ClassFixture`] and friends) for integration tests, grounded
//! on the teacher's `test_utils` module of the same shape.

pub mod environment;
pub mod fixtures;

pub use environment::TestEnvironment;
pub use fixtures::{AspectFixture, ClassFixture, InstanceFixture, TemplateFixture};

use std::sync::Once;

static INIT_LOGGING: Once = Once::new();

/// Initialize `tracing` for tests, once, respecting `RUST_LOG` if set.
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("off"));
        let _ = tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().try_init();
    });
}
