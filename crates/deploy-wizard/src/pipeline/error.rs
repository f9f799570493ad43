use thiserror::Error;

use crate::application::ErrorTree;
use crate::git::PublishError;
use crate::render::RenderError;

pub const CODE_RENDER_FAILURE: u16 = 101;

/// Why a release did not reach the remote.
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// The payload is malformed or inconsistent. Carries the complete tree.
    #[error("application is invalid: {0}")]
    Validation(ErrorTree),

    #[error("render failed: {0}")]
    Render(#[from] RenderError),

    #[error(transparent)]
    Publish(#[from] PublishError),
}

impl ReleaseError {
    /// Numeric failure classification: 101 render, 301 clone, 302 commit, 303 push.
    pub fn code(&self) -> Option<u16> {
        match self {
            ReleaseError::Validation(_) => None,
            ReleaseError::Render(_) => Some(CODE_RENDER_FAILURE),
            ReleaseError::Publish(e) => e.code(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            ReleaseError::Publish(e) => e.is_retryable(),
            _ => false,
        }
    }

    pub fn validation_errors(&self) -> Option<&ErrorTree> {
        match self {
            ReleaseError::Validation(tree) => Some(tree),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ReleaseError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::GitError;

    #[test]
    fn test_codes() {
        let render = ReleaseError::Render(RenderError::MissingManifest("x.yaml".to_string()));
        assert_eq!(render.code(), Some(101));
        assert!(!render.is_retryable());

        let clone = ReleaseError::from(PublishError::Clone(GitError::Network(
            "could not resolve host".to_string(),
        )));
        assert_eq!(clone.code(), Some(301));
        assert!(clone.is_retryable());

        let push = ReleaseError::from(PublishError::Push(GitError::AuthFailed(
            "denied".to_string(),
        )));
        assert_eq!(push.code(), Some(303));
        assert!(!push.is_retryable());

        let invalid = ReleaseError::Validation(ErrorTree::root("not an application object"));
        assert_eq!(invalid.code(), None);
        assert!(invalid.validation_errors().is_some());
    }
}
