pub mod application;
pub mod config;
pub mod error;
pub mod git;
pub mod pipeline;
pub mod render;
pub mod secrets;

pub use application::{
    apply_defaults, parse_application, validate_application, validate_payload, Application,
    Defaults, ErrorNode, ErrorTree,
};
pub use config::{load_config, load_config_from_str, Config};
pub use error::{ConfigError, DeployWizardError, Result};
pub use git::{
    Credentials, GitCliBackend, GitError, MemoryBackend, PublishError, RepositoryBackend,
    RepositoryPublisher, Signature,
};
pub use pipeline::{Pipeline, ReleaseError, ReleaseReport};
pub use render::{ManifestSet, RenderError, Renderer, TemplateStore};
pub use secrets::{resolve_secret, resolve_secret_optional, SecretError};
