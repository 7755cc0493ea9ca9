//! Helpers for tests of the booking engine and of crates built on it. Enabled with the `test_utils` feature.
pub mod fakes;
pub mod prepare_env;
