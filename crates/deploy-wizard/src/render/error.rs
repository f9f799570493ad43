//! Error types for template loading and manifest rendering.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a render call.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template directory {path:?} does not exist")]
    TemplateDirNotFound { path: PathBuf },

    #[error("the {template:?} template must exist and be readable")]
    ReadTemplate {
        template: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse template {template:?}: {message}")]
    ParseTemplate {
        template: &'static str,
        message: String,
    },

    #[error("failed to build context for template {template:?}: {message}")]
    Context {
        template: &'static str,
        message: String,
    },

    #[error("failed to execute template {template:?}: {message}")]
    Execute {
        template: &'static str,
        message: String,
    },

    #[error("component {index} has no service")]
    MissingService { index: usize },

    #[error("application is missing {0}")]
    Incomplete(&'static str),

    #[error("manifest {0:?} was not rendered")]
    MissingManifest(String),
}

impl RenderError {
    /// Returns the file name of the template the error is about, if any.
    pub fn template(&self) -> Option<&'static str> {
        match self {
            RenderError::ReadTemplate { template, .. }
            | RenderError::ParseTemplate { template, .. }
            | RenderError::Context { template, .. }
            | RenderError::Execute { template, .. } => Some(template),
            _ => None,
        }
    }
}

/// Flattens a Tera error and its causes into one line.
pub(crate) fn describe_tera_error(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Result type for render operations.
pub type Result<T> = std::result::Result<T, RenderError>;
