use std::path::PathBuf;
use thiserror::Error;

use crate::git::PublishError;
use crate::pipeline::ReleaseError;
use crate::render::RenderError;
use crate::secrets::SecretError;

#[derive(Error, Debug)]
pub enum DeployWizardError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),

    #[error("Release error: {0}")]
    Release(#[from] ReleaseError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Failed to decode config: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },

    #[error("Failed to resolve git {field}: {source}")]
    Secret {
        field: &'static str,
        #[source]
        source: SecretError,
    },
}

pub type Result<T> = std::result::Result<T, DeployWizardError>;
