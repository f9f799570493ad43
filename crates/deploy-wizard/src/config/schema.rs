use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::application::Defaults;
use crate::error::ConfigError;
use crate::git::{Credentials, GitCliBackend, Signature};
use crate::secrets::resolve_secret_optional;

pub const DEFAULT_TEMPLATE_DIR: &str = "templates";
pub const DEFAULT_USERNAME_ENV_VAR: &str = "DEPLOY_WIZARD_GIT_USERNAME";
pub const DEFAULT_PASSWORD_ENV_VAR: &str = "DEPLOY_WIZARD_GIT_PASSWORD";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub template_dir: PathBuf,
    pub git: GitSettings,
    pub defaults: Defaults,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            template_dir: PathBuf::from(DEFAULT_TEMPLATE_DIR),
            git: GitSettings::default(),
            defaults: Defaults::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GitSettings {
    pub insecure_skip_verify: bool,
    pub author: Signature,
    pub credentials: GitCredentialSettings,
}

impl GitSettings {
    /// Builds a git CLI backend with the resolved credentials.
    pub fn backend(&self) -> Result<GitCliBackend, ConfigError> {
        let credentials = self.credentials.resolve()?.map(std::sync::Arc::new);
        Ok(GitCliBackend::new()
            .with_credentials(credentials)
            .with_insecure_skip_verify(self.insecure_skip_verify))
    }
}

/// Where the basic-auth username and password come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GitCredentialSettings {
    pub username: Option<String>,
    pub username_file: Option<String>,
    pub username_env_var: String,
    pub password: Option<String>,
    pub password_file: Option<String>,
    pub password_env_var: String,
}

impl Default for GitCredentialSettings {
    fn default() -> Self {
        Self {
            username: None,
            username_file: None,
            username_env_var: DEFAULT_USERNAME_ENV_VAR.to_string(),
            password: None,
            password_file: None,
            password_env_var: DEFAULT_PASSWORD_ENV_VAR.to_string(),
        }
    }
}

impl GitCredentialSettings {
    /// Resolves the credentials. No username and no password means anonymous
    /// access; having only one of them is an error.
    pub fn resolve(&self) -> Result<Option<Credentials>, ConfigError> {
        use secrecy::ExposeSecret;

        let username = resolve_secret_optional(
            self.username.as_deref(),
            self.username_file.as_deref(),
            Some(self.username_env_var.as_str()),
        )
        .map_err(|e| ConfigError::Secret {
            field: "username",
            source: e,
        })?;

        let password = resolve_secret_optional(
            self.password.as_deref(),
            self.password_file.as_deref(),
            Some(self.password_env_var.as_str()),
        )
        .map_err(|e| ConfigError::Secret {
            field: "password",
            source: e,
        })?;

        match (username, password) {
            (Some(username), Some(password)) => Ok(Some(Credentials::new(
                username.expose_secret().to_string(),
                password,
            ))),
            (None, None) => Ok(None),
            (Some(_), None) => Err(ConfigError::Validation {
                message: "git username is configured but no password was found".to_string(),
            }),
            (None, Some(_)) => Err(ConfigError::Validation {
                message: "git password is configured but no username was found".to_string(),
            }),
        }
    }
}
