//! Git metadata extraction
//!
//! [`RepoInspector`] collects a [`RepoInfo`](crate::core::RepoInfo) snapshot
//! and walks ancestor commits through the [`VcsBackend`] capability
//! interface. [`Git2Backend`] implements that interface with libgit2.

pub mod backend;
pub mod git2_backend;
pub mod inspector;

pub use backend::{CommitId, HeadCommit, RepoHandle, VcsBackend};
pub use git2_backend::Git2Backend;
pub use inspector::{extract_metadata, get_ancestors, RepoInspector};

use thiserror::Error;

/// Errors that can occur during VCS queries
#[derive(Error, Debug)]
pub enum VcsError {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Not a git repository: {0}")]
    NotARepo(String),

    #[error("HEAD is detached")]
    DetachedHead,

    #[error("Reference not found: {0}")]
    RefNotFound(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}
