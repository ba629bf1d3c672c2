//! Shared pieces of the fraud check workspace: the configuration model,
//! YAML `!include` merging for per-environment config files, and test helpers
//! used by the `scoring` and `fraud_check` test suites.

pub mod config;
pub mod yaml_include;

// Test helpers module - available for both development and test builds
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

#[cfg(any(test, feature = "test-helpers"))]
pub use test_helpers::{TestError, TestResult};
