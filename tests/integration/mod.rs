//! Integration test suite: assembles a small build project with
//! `struktur_cli::test_utils` and drives `orchestrator::{run, validate,
//! check_constraints}` directly, asserting on the written build directory
//! and returned reports. Grounded on the teacher's `tests/integration/`
//! split of one file per behavior area, but calling library entry points
//! instead of spawning the compiled binary, since the whole pipeline is a
//! library API first and a CLI second.

mod build_tests;
mod check_constraints_tests;
mod cli_tests;
mod validate_tests;
