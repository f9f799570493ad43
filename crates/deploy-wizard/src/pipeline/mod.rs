//! The publish pipeline: validate, default, render, clone, commit, push.

pub mod error;
pub mod runner;

pub use error::{ReleaseError, CODE_RENDER_FAILURE};
pub use runner::{release_message, Pipeline, ReleaseReport};
