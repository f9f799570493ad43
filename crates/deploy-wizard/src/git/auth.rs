//! Basic authentication for the git CLI.
//!
//! Credentials are handed to git through a throwaway `GIT_ASKPASS` script that
//! answers the username and password prompts. The script is deleted as soon
//! as the [`AuthEnv`] holding it is dropped.

use std::fmt;
use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};
use tracing::warn;

use super::error::{GitError, Result};

/// Username and password for an HTTP(S) remote.
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Escapes a token for safe use in single-quoted shell strings.
/// Replaces single quotes with '\'' (end quote, escaped quote, start quote).
pub fn shell_escape_token(token: &str) -> String {
    token.replace('\'', "'\\''")
}

/// RAII guard that deletes the askpass script on drop.
#[derive(Debug)]
pub struct AskpassCleanup {
    path: Option<PathBuf>,
}

impl AskpassCleanup {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    pub(crate) fn empty() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }
}

impl Drop for AskpassCleanup {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            if let Err(e) = std::fs::remove_file(&path) {
                warn!(error = %e, "Failed to clean up askpass script");
            }
        }
    }
}

/// Authentication environment for git commands.
#[derive(Debug)]
pub struct AuthEnv {
    /// Environment variables to set for the git command.
    pub env_vars: Vec<(String, String)>,
    /// Must outlive the git command to keep the askpass script alive.
    pub _cleanup: AskpassCleanup,
}

/// Builds the git environment for `credentials`.
///
/// Without credentials only terminal prompting is disabled, so an anonymous
/// remote that asks for a password fails instead of hanging.
pub fn build_auth_env(credentials: Option<&Credentials>) -> Result<AuthEnv> {
    let mut env = vec![("GIT_TERMINAL_PROMPT".to_string(), "0".to_string())];

    let Some(credentials) = credentials else {
        return Ok(AuthEnv {
            env_vars: env,
            _cleanup: AskpassCleanup::empty(),
        });
    };

    if credentials.username.is_empty() {
        return Err(GitError::Credentials("username is empty".to_string()));
    }

    let script = askpass_script(
        &shell_escape_token(&credentials.username),
        &shell_escape_token(credentials.password.expose_secret()),
    );

    let askpass_path =
        std::env::temp_dir().join(format!(".git-askpass-{}.sh", uuid::Uuid::new_v4()));

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .mode(0o700)
            .open(&askpass_path)
            .map_err(|e| GitError::WriteFile {
                path: askpass_path.clone(),
                source: e,
            })?;
        std::io::Write::write_all(&mut file, script.as_bytes()).map_err(|e| {
            GitError::WriteFile {
                path: askpass_path.clone(),
                source: e,
            }
        })?;
    }

    #[cfg(not(unix))]
    {
        std::fs::write(&askpass_path, &script).map_err(|e| GitError::WriteFile {
            path: askpass_path.clone(),
            source: e,
        })?;
    }

    let cleanup = AskpassCleanup::new(askpass_path.clone());

    let askpass_path_str = askpass_path
        .to_str()
        .ok_or_else(|| {
            GitError::Credentials("Temp directory path contains non-UTF8 characters".to_string())
        })?
        .to_string();

    env.push(("GIT_ASKPASS".to_string(), askpass_path_str));

    Ok(AuthEnv {
        env_vars: env,
        _cleanup: cleanup,
    })
}

fn askpass_script(username: &str, password: &str) -> String {
    format!(
        r#"#!/bin/sh
case "$1" in
  Username*) echo '{}' ;;
  *) echo '{}' ;;
esac
"#,
        username, password
    )
}
