//! Repository backends: the clone/write/commit/push capability the publisher drives.

use std::path::{Component, Path, PathBuf};
use std::process::{Command, Output};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tempfile::TempDir;
use tracing::{debug, info};

use super::auth::{build_auth_env, Credentials};
use super::error::{classify_git_error, GitError, Result};
use super::parse::{format_git_error, parse_branch, parse_commit_id};

pub const DEFAULT_AUTHOR_NAME: &str = "deploy-wizard";
pub const DEFAULT_AUTHOR_EMAIL: &str = "deploy-wizard@localhost";

/// Revision name that selects the remote's default branch.
pub const HEAD_REVISION: &str = "HEAD";

/// Commit author and committer identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Signature {
    pub name: String,
    pub email: String,
}

impl Default for Signature {
    fn default() -> Self {
        Self {
            name: DEFAULT_AUTHOR_NAME.to_string(),
            email: DEFAULT_AUTHOR_EMAIL.to_string(),
        }
    }
}

/// Source-control operations needed to publish one set of files.
///
/// Implementations hold a single working tree; `clone_remote` must succeed
/// before any other call.
pub trait RepositoryBackend {
    /// Clones `url` and checks out `revision` (`HEAD` for the default branch).
    fn clone_remote(&mut self, url: &str, revision: &str) -> Result<()>;

    /// Writes `content` to `path`, relative to the working tree root, and stages it.
    fn write_file(&mut self, path: &str, content: &[u8]) -> Result<()>;

    /// Records one commit of everything staged and returns its id.
    fn commit(&mut self, message: &str, author: &Signature) -> Result<String>;

    /// Pushes the checked-out branch to the remote it was cloned from.
    fn push(&mut self) -> Result<()>;
}

impl<B: RepositoryBackend + ?Sized> RepositoryBackend for &mut B {
    fn clone_remote(&mut self, url: &str, revision: &str) -> Result<()> {
        (**self).clone_remote(url, revision)
    }

    fn write_file(&mut self, path: &str, content: &[u8]) -> Result<()> {
        (**self).write_file(path, content)
    }

    fn commit(&mut self, message: &str, author: &Signature) -> Result<String> {
        (**self).commit(message, author)
    }

    fn push(&mut self) -> Result<()> {
        (**self).push()
    }
}

/// Rejects absolute paths and paths that leave the working tree.
pub fn validate_relative_path(path: &str) -> Result<&Path> {
    let relative = Path::new(path);
    let escapes = relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if path.is_empty() || relative.is_absolute() || escapes {
        return Err(GitError::InvalidPath(path.to_string()));
    }
    Ok(relative)
}

/// Backend that drives the `git` executable in a temporary working tree.
///
/// The working tree is removed when the backend is dropped.
#[derive(Debug, Default)]
pub struct GitCliBackend {
    credentials: Option<Arc<Credentials>>,
    insecure_skip_verify: bool,
    workdir: Option<TempDir>,
    branch: Option<String>,
}

impl GitCliBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses basic authentication for clone and push.
    pub fn with_credentials(mut self, credentials: Option<Arc<Credentials>>) -> Self {
        self.credentials = credentials;
        self
    }

    /// Disables TLS certificate verification for the remote.
    pub fn with_insecure_skip_verify(mut self, insecure: bool) -> Self {
        self.insecure_skip_verify = insecure;
        self
    }

    /// Returns the working tree path once cloned.
    pub fn repo_path(&self) -> Option<PathBuf> {
        self.workdir.as_ref().map(|dir| dir.path().join("repo"))
    }

    /// Returns the checked-out branch once cloned.
    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }

    fn require_repo(&self) -> Result<PathBuf> {
        self.repo_path().ok_or(GitError::NotInitialized)
    }

    fn git_command(&self, dir: &Path) -> Command {
        let mut cmd = Command::new("git");
        cmd.current_dir(dir);
        if self.insecure_skip_verify {
            cmd.args(["-c", "http.sslVerify=false"]);
        }
        cmd
    }

    /// Runs a git command that does not talk to the remote.
    fn run_git(&self, dir: &Path, args: &[&str]) -> Result<Output> {
        self.git_command(dir)
            .args(args)
            .output()
            .map_err(GitError::Spawn)
    }

    /// Runs a git command against the remote with the auth environment set.
    fn run_git_remote(&self, dir: &Path, args: &[&str]) -> Result<Output> {
        let auth = build_auth_env(self.credentials.as_deref())?;

        let mut cmd = self.git_command(dir);
        cmd.args(args);
        for (key, value) in &auth.env_vars {
            cmd.env(key, value);
        }

        let output = cmd.output().map_err(GitError::Spawn);
        drop(auth);
        output
    }
}

impl RepositoryBackend for GitCliBackend {
    fn clone_remote(&mut self, url: &str, revision: &str) -> Result<()> {
        let workdir = tempfile::Builder::new()
            .prefix("deploy-wizard-")
            .tempdir()
            .map_err(|e| GitError::WriteFile {
                path: std::env::temp_dir(),
                source: e,
            })?;
        let target = workdir.path().join("repo");
        let target_str = target.to_string_lossy().to_string();

        let mut args = vec!["clone", "--single-branch"];
        if revision != HEAD_REVISION {
            args.extend(["--branch", revision]);
        }
        args.extend(["--", url, target_str.as_str()]);

        info!(url = %url, revision = %revision, "Cloning repository");
        let output = self.run_git_remote(workdir.path(), &args)?;
        if !output.status.success() {
            return Err(classify_git_error(&format_git_error(&output)));
        }

        let output = self.run_git(&target, &["symbolic-ref", "--short", "HEAD"])?;
        if !output.status.success() {
            return Err(GitError::Operation(format_git_error(&output)));
        }
        let branch = parse_branch(&output.stdout)
            .ok_or_else(|| GitError::Operation("could not determine cloned branch".to_string()))?;
        debug!(branch = %branch, "Checked out branch");

        self.branch = Some(branch);
        self.workdir = Some(workdir);
        Ok(())
    }

    fn write_file(&mut self, path: &str, content: &[u8]) -> Result<()> {
        let repo = self.require_repo()?;
        let relative = validate_relative_path(path)?;
        let full_path = repo.join(relative);

        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| GitError::WriteFile {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        std::fs::write(&full_path, content).map_err(|e| GitError::WriteFile {
            path: full_path.clone(),
            source: e,
        })?;

        let output = self.run_git(&repo, &["add", "--", path])?;
        if !output.status.success() {
            return Err(GitError::Operation(format_git_error(&output)));
        }
        Ok(())
    }

    fn commit(&mut self, message: &str, author: &Signature) -> Result<String> {
        let repo = self.require_repo()?;
        let user_name = format!("user.name={}", author.name);
        let user_email = format!("user.email={}", author.email);

        let output = self.run_git(
            &repo,
            &[
                "-c",
                &user_name,
                "-c",
                &user_email,
                "commit",
                "--allow-empty",
                "--no-verify",
                "--no-gpg-sign",
                "-m",
                message,
            ],
        )?;
        if !output.status.success() {
            return Err(GitError::Operation(format_git_error(&output)));
        }

        let output = self.run_git(&repo, &["rev-parse", "HEAD"])?;
        if !output.status.success() {
            return Err(GitError::Operation(format_git_error(&output)));
        }
        parse_commit_id(&output.stdout).ok_or_else(|| {
            GitError::Operation(format!(
                "unexpected rev-parse output: {}",
                String::from_utf8_lossy(&output.stdout).trim()
            ))
        })
    }

    fn push(&mut self) -> Result<()> {
        let repo = self.require_repo()?;
        let branch = self.branch.clone().ok_or(GitError::NotInitialized)?;
        let refspec = format!("HEAD:refs/heads/{}", branch);

        info!(branch = %branch, "Pushing to remote");
        let output = self.run_git_remote(&repo, &["push", "origin", &refspec])?;
        if output.status.success() {
            Ok(())
        } else {
            Err(classify_git_error(&format_git_error(&output)))
        }
    }
}
