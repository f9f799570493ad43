//! In-memory repository backend.
//!
//! Records every write, commit and push without touching a remote. Used for
//! dry runs and to exercise the publisher without a network-capable git.

use std::collections::BTreeMap;

use super::backend::{validate_relative_path, RepositoryBackend, Signature};
use super::error::{GitError, Result};

/// A commit recorded by [`MemoryBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryCommit {
    pub id: String,
    pub message: String,
    pub author: Signature,
    /// Paths staged by this commit.
    pub changed: Vec<String>,
}

/// Repository backend that keeps its working tree and history in memory.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    remote: Option<(String, String)>,
    tree: BTreeMap<String, Vec<u8>>,
    staged: Vec<String>,
    commits: Vec<MemoryCommit>,
    pushed: Vec<String>,
    clone_failure: Option<GitError>,
    commit_failure: Option<GitError>,
    push_failure: Option<GitError>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next clone fail with `error`.
    pub fn fail_clone(mut self, error: GitError) -> Self {
        self.clone_failure = Some(error);
        self
    }

    /// Makes the next commit fail with `error`.
    pub fn fail_commit(mut self, error: GitError) -> Self {
        self.commit_failure = Some(error);
        self
    }

    /// Makes the next push fail with `error`.
    pub fn fail_push(mut self, error: GitError) -> Self {
        self.push_failure = Some(error);
        self
    }

    /// URL and revision of the last successful clone.
    pub fn remote(&self) -> Option<(&str, &str)> {
        self.remote.as_ref().map(|(u, r)| (u.as_str(), r.as_str()))
    }

    /// Current working tree contents.
    pub fn files(&self) -> &BTreeMap<String, Vec<u8>> {
        &self.tree
    }

    pub fn file(&self, path: &str) -> Option<&str> {
        self.tree
            .get(path)
            .and_then(|content| std::str::from_utf8(content).ok())
    }

    pub fn commits(&self) -> &[MemoryCommit] {
        &self.commits
    }

    /// Ids of the commits that were pushed, in push order.
    pub fn pushed(&self) -> &[String] {
        &self.pushed
    }

    fn require_clone(&self) -> Result<()> {
        if self.remote.is_some() {
            Ok(())
        } else {
            Err(GitError::NotInitialized)
        }
    }
}

impl RepositoryBackend for MemoryBackend {
    fn clone_remote(&mut self, url: &str, revision: &str) -> Result<()> {
        if let Some(error) = self.clone_failure.take() {
            return Err(error);
        }
        self.remote = Some((url.to_string(), revision.to_string()));
        Ok(())
    }

    fn write_file(&mut self, path: &str, content: &[u8]) -> Result<()> {
        self.require_clone()?;
        validate_relative_path(path)?;
        self.tree.insert(path.to_string(), content.to_vec());
        self.staged.push(path.to_string());
        Ok(())
    }

    fn commit(&mut self, message: &str, author: &Signature) -> Result<String> {
        self.require_clone()?;
        if let Some(error) = self.commit_failure.take() {
            return Err(error);
        }
        let id = format!("{:040x}", self.commits.len() + 1);
        self.commits.push(MemoryCommit {
            id: id.clone(),
            message: message.to_string(),
            author: author.clone(),
            changed: std::mem::take(&mut self.staged),
        });
        Ok(id)
    }

    fn push(&mut self) -> Result<()> {
        self.require_clone()?;
        if let Some(error) = self.push_failure.take() {
            return Err(error);
        }
        let head = self.commits.last().ok_or(GitError::NotInitialized)?;
        self.pushed.push(head.id.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_history() {
        let mut backend = MemoryBackend::new();
        backend.clone_remote("https://git.example.com/x.git", "HEAD").unwrap();
        backend.write_file("apps/a.yaml", b"a: 1\n").unwrap();
        let id = backend.commit("first", &Signature::default()).unwrap();
        backend.push().unwrap();

        assert_eq!(backend.remote(), Some(("https://git.example.com/x.git", "HEAD")));
        assert_eq!(backend.file("apps/a.yaml"), Some("a: 1\n"));
        assert_eq!(backend.commits()[0].changed, vec!["apps/a.yaml"]);
        assert_eq!(backend.pushed(), &[id]);
    }

    #[test]
    fn test_injected_failure_fires_once() {
        let mut backend =
            MemoryBackend::new().fail_clone(GitError::Network("unreachable".to_string()));
        assert!(backend.clone_remote("u", "HEAD").is_err());
        assert!(backend.clone_remote("u", "HEAD").is_ok());
    }

    #[test]
    fn test_write_before_clone_fails() {
        let mut backend = MemoryBackend::new();
        assert!(matches!(
            backend.write_file("a.yaml", b""),
            Err(GitError::NotInitialized)
        ));
    }
}
