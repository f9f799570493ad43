//! Publishes a set of rendered files to a destination repository as one commit.
//!
//! State machine: `Uninitialized -> Cloned -> Committed -> Pushed`, with any
//! failed transition moving to `Failed`.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::backend::{RepositoryBackend, Signature};
use super::error::GitError;
use crate::application::Destination;

pub const CODE_CLONE_FAILURE: u16 = 301;
pub const CODE_COMMIT_FAILURE: u16 = 302;
pub const CODE_PUSH_FAILURE: u16 = 303;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublisherState {
    Uninitialized,
    Cloned,
    Committed,
    Pushed,
    Failed,
}

impl fmt::Display for PublisherState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PublisherState::Uninitialized => "uninitialized",
            PublisherState::Cloned => "cloned",
            PublisherState::Committed => "committed",
            PublisherState::Pushed => "pushed",
            PublisherState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Errors raised by [`RepositoryPublisher`].
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("repository has not been cloned")]
    NotCloned,

    #[error("cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: PublisherState,
    },

    #[error("clone failed: {0}")]
    Clone(#[source] GitError),

    #[error("commit failed: {0}")]
    Commit(#[source] GitError),

    #[error("push failed: {0}")]
    Push(#[source] GitError),
}

impl PublishError {
    /// Numeric classification for repository failures.
    pub fn code(&self) -> Option<u16> {
        match self {
            PublishError::Clone(_) => Some(CODE_CLONE_FAILURE),
            PublishError::Commit(_) => Some(CODE_COMMIT_FAILURE),
            PublishError::Push(_) => Some(CODE_PUSH_FAILURE),
            PublishError::NotCloned | PublishError::InvalidState { .. } => None,
        }
    }

    /// Returns true if the caller may retry the whole publish.
    ///
    /// Usage errors are never retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            PublishError::Clone(e) | PublishError::Push(e) => e.is_retryable(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, PublishError>;

/// Joins the destination prefix and a file name into a repository path.
pub fn destination_path(prefix: &str, name: &str) -> String {
    let prefix = prefix.trim_start_matches('/').trim_end_matches('/');
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", prefix, name)
    }
}

/// Drives a [`RepositoryBackend`] through one clone/stage/commit/push cycle.
#[derive(Debug)]
pub struct RepositoryPublisher<B> {
    backend: B,
    url: String,
    revision: String,
    prefix: String,
    author: Signature,
    staged: BTreeMap<String, String>,
    state: PublisherState,
}

impl<B: RepositoryBackend> RepositoryPublisher<B> {
    pub fn new(backend: B, destination: &Destination) -> Self {
        Self {
            backend,
            url: destination.url.clone(),
            revision: destination.target_revision.clone(),
            prefix: destination.path.clone(),
            author: Signature::default(),
            staged: BTreeMap::new(),
            state: PublisherState::Uninitialized,
        }
    }

    pub fn with_author(mut self, author: Signature) -> Self {
        self.author = author;
        self
    }

    pub fn state(&self) -> PublisherState {
        self.state
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Names of the buffered files, relative to the destination prefix.
    pub fn staged(&self) -> impl Iterator<Item = &str> {
        self.staged.keys().map(String::as_str)
    }

    /// Repository paths the buffered files will be written to.
    pub fn staged_paths(&self) -> Vec<String> {
        self.staged
            .keys()
            .map(|name| destination_path(&self.prefix, name))
            .collect()
    }

    /// Clones the destination repository.
    pub fn clone_remote(&mut self) -> Result<()> {
        if self.state != PublisherState::Uninitialized {
            return Err(self.fail(PublishError::InvalidState {
                operation: "clone",
                state: self.state,
            }));
        }

        let revision = if self.revision.is_empty() {
            super::backend::HEAD_REVISION
        } else {
            self.revision.as_str()
        };

        match self.backend.clone_remote(&self.url, revision) {
            Ok(()) => {
                info!(url = %self.url, revision = %revision, "Cloned destination repository");
                self.state = PublisherState::Cloned;
                Ok(())
            }
            Err(e) => Err(self.fail(PublishError::Clone(e))),
        }
    }

    /// Buffers a file for the next commit. Staging the same name twice keeps the last content.
    pub fn stage(&mut self, name: impl Into<String>, content: impl Into<String>) {
        let name = name.into();
        debug!(file = %name, "Staged file");
        self.staged.insert(name, content.into());
    }

    /// Writes every buffered file under the destination prefix and creates
    /// exactly one commit, even when nothing was staged.
    pub fn commit(&mut self, message: &str) -> Result<String> {
        match self.state {
            PublisherState::Cloned => {}
            PublisherState::Uninitialized => return Err(self.fail(PublishError::NotCloned)),
            state => {
                return Err(self.fail(PublishError::InvalidState {
                    operation: "commit",
                    state,
                }))
            }
        }

        let mut written = Ok(());
        for (name, content) in &self.staged {
            let path = destination_path(&self.prefix, name);
            if let Err(e) = self.backend.write_file(&path, content.as_bytes()) {
                written = Err(e);
                break;
            }
        }
        if let Err(e) = written {
            return Err(self.fail(PublishError::Commit(e)));
        }

        match self.backend.commit(message, &self.author) {
            Ok(id) => {
                info!(commit = %id, files = self.staged.len(), "Created commit");
                self.state = PublisherState::Committed;
                Ok(id)
            }
            Err(e) => Err(self.fail(PublishError::Commit(e))),
        }
    }

    /// Pushes the commit to the remote.
    pub fn push(&mut self) -> Result<()> {
        match self.state {
            PublisherState::Committed => {}
            PublisherState::Uninitialized => return Err(self.fail(PublishError::NotCloned)),
            state => {
                return Err(self.fail(PublishError::InvalidState {
                    operation: "push",
                    state,
                }))
            }
        }

        match self.backend.push() {
            Ok(()) => {
                info!(url = %self.url, "Pushed to destination repository");
                self.state = PublisherState::Pushed;
                Ok(())
            }
            Err(e) => Err(self.fail(PublishError::Push(e))),
        }
    }

    fn fail(&mut self, error: PublishError) -> PublishError {
        warn!(state = %self.state, error = %error, "Publish failed");
        self.state = PublisherState::Failed;
        error
    }
}
