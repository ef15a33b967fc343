//! Unit test suite: exercises individual modules through their public API,
//! without spinning up a full temporary build project (see `tests/integration`
//! for that). Grounded on the teacher's split between a fast unit suite and
//! a slower integration suite (`tests/test_config.rs` vs `tests/integration/`).

mod manifest_tests;
mod merge_tests;
mod path_safety_tests;
mod resolver_tests;
