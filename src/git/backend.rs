//! VCS capability interface
//!
//! The inspector only talks to version control through these traits, so the
//! git2 implementation can be swapped for a test double or another VCS.

use chrono::{DateTime, FixedOffset};
use std::path::Path;

use super::VcsError;

/// A full commit identifier (hex object id for git)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommitId(String);

impl CommitId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for CommitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Facts about the commit HEAD points at.
///
/// Values the VCS cannot decode (e.g. non UTF-8 author names) are `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadCommit {
    pub id: CommitId,
    pub message: Option<String>,
    pub time: Option<DateTime<FixedOffset>>,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
}

/// Locates repositories.
pub trait VcsBackend: Send + Sync {
    /// Find the repository containing `start`, searching parent directories.
    ///
    /// Returns `Ok(None)` when `start` is not inside a usable working copy.
    fn open_repository(&self, start: &Path) -> Result<Option<Box<dyn RepoHandle>>, VcsError>;
}

/// Queries against one opened working copy.
pub trait RepoHandle {
    /// Whether tracked files differ from HEAD (untracked files ignored)
    fn is_working_tree_dirty(&self) -> Result<bool, VcsError>;

    /// The commit HEAD points at
    fn head_commit(&self) -> Result<HeadCommit, VcsError>;

    /// Name of the checked-out branch; fails on a detached HEAD
    fn active_branch_name(&self) -> Result<String, VcsError>;

    /// Most recent tag describing HEAD; fails when no tag is reachable
    fn describe_latest_tag(&self) -> Result<String, VcsError>;

    /// Patch text of the working tree against HEAD
    fn diff_working_tree(&self) -> Result<String, VcsError>;

    /// Resolve a revision (id, ref name, `HEAD^`, ...) to a commit
    fn resolve_commit(&self, rev: &str) -> Result<CommitId, VcsError>;

    /// Parents of `commit`, first parent first
    fn commit_parents(&self, commit: &CommitId) -> Result<Vec<CommitId>, VcsError>;

    /// Whether `name` exists as a local branch or as a branch of `remote`
    fn branch_exists(&self, remote: &str, name: &str) -> Result<bool, VcsError>;

    /// Default branch advertised by `remote`, if known
    fn default_base_branch(&self, remote: &str) -> Result<Option<String>, VcsError>;

    /// Most recent commit shared with `remote`'s (or the local) `base_branch`
    fn base_branch_merge_ancestor(
        &self,
        remote: &str,
        base_branch: &str,
    ) -> Result<Option<CommitId>, VcsError>;
}
