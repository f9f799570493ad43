//! Git-specific error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by a repository backend.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Git operation failed: {0}")]
    Operation(String),

    #[error("Git network error: {0}")]
    Network(String),

    #[error("Git authentication failed: {0}")]
    AuthFailed(String),

    #[error("Git push rejected (non-fast-forward): {0}")]
    NonFastForward(String),

    #[error("Failed to run git: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid file path: {0}")]
    InvalidPath(String),

    #[error("Invalid git credentials: {0}")]
    Credentials(String),

    #[error("Git repository not initialized")]
    NotInitialized,
}

impl GitError {
    /// Returns true if the error is likely transient and the operation can be retried.
    ///
    /// A non-fast-forward rejection means another publisher won the race to the
    /// remote; it is retryable after re-cloning.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GitError::Network(_) | GitError::NonFastForward(_))
    }
}

/// Classifies a git stderr string into a more specific error variant.
pub fn classify_git_error(stderr: &str) -> GitError {
    let lower = stderr.to_lowercase();
    let message = stderr.trim().to_string();

    if lower.contains("authentication failed")
        || lower.contains("permission denied")
        || lower.contains("invalid credentials")
        || lower.contains("could not read username")
        || lower.contains("returned error: 401")
        || lower.contains("returned error: 403")
    {
        return GitError::AuthFailed(message);
    }

    if lower.contains("could not resolve host")
        || lower.contains("connection refused")
        || lower.contains("connection timed out")
        || lower.contains("network is unreachable")
        || lower.contains("unable to access")
        || lower.contains("failed to connect")
        || lower.contains("couldn't connect to server")
        || lower.contains("the remote end hung up unexpectedly")
    {
        return GitError::Network(message);
    }

    if lower.contains("non-fast-forward")
        || lower.contains("fetch first")
        || lower.contains("updates were rejected")
        || lower.contains("[rejected]")
    {
        return GitError::NonFastForward(message);
    }

    GitError::Operation(message)
}

/// Result type for git operations.
pub type Result<T> = std::result::Result<T, GitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_network() {
        let err = classify_git_error(
            "fatal: unable to access 'https://git.example.com/x.git/': Could not resolve host: git.example.com",
        );
        assert!(matches!(err, GitError::Network(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_classify_auth_before_network() {
        let err = classify_git_error(
            "fatal: unable to access 'https://git.example.com/x.git/': The requested URL returned error: 403",
        );
        assert!(matches!(err, GitError::AuthFailed(_)));
        assert!(!err.is_retryable());

        let err = classify_git_error("remote: Invalid credentials\nfatal: Authentication failed");
        assert!(matches!(err, GitError::AuthFailed(_)));
    }

    #[test]
    fn test_classify_non_fast_forward() {
        let stderr = "To /tmp/remote.git\n ! [rejected]        HEAD -> main (fetch first)\n\
                      error: failed to push some refs to '/tmp/remote.git'\n\
                      hint: Updates were rejected because the remote contains work that you do not have locally.";
        let err = classify_git_error(stderr);
        assert!(matches!(err, GitError::NonFastForward(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_classify_other() {
        let err = classify_git_error("  fatal: not a git repository  \n");
        match err {
            GitError::Operation(message) => assert_eq!(message, "fatal: not a git repository"),
            other => panic!("unexpected variant: {:?}", other),
        }
    }
}
