//! Shared test utilities for deploy-wizard integration tests.
//!
//! - Builders for Application payloads
//! - `TestHarness` with the shipped templates and a scratch directory

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::*;
