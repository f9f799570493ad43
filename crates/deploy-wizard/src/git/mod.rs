//! Publishing rendered manifests to a git repository.

pub mod auth;
pub mod backend;
pub mod error;
pub mod memory;
pub mod parse;
pub mod publisher;

pub use auth::Credentials;
pub use backend::{GitCliBackend, RepositoryBackend, Signature};
pub use error::{classify_git_error, GitError};
pub use memory::MemoryBackend;
pub use publisher::{PublishError, PublisherState, RepositoryPublisher};
