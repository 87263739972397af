//! Scripted VCS backend for inspector tests.
//!
//! Each query answers from a preset value; `None` makes the query fail.
//! Calls are logged so tests can check which queries ran.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::DateTime;
use gitstamp::git::{CommitId, HeadCommit, RepoHandle, VcsBackend, VcsError};

/// A scripted working copy.
#[derive(Clone, Default)]
pub struct MockRepo {
    pub dirty: Option<bool>,
    pub head: Option<HeadCommit>,
    pub branch: Option<String>,
    pub tag: Option<String>,
    pub diff: Option<String>,
    pub default_base: Option<String>,
    /// Branch names `branch_exists` reports as present
    pub existing_branches: Vec<String>,
    pub merge_ancestor: Option<String>,
    /// commit id -> parent ids, first parent first
    pub parents: HashMap<String, Vec<String>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_head(mut self, head: HeadCommit) -> Self {
        self.head = Some(head);
        self
    }

    pub fn with_dirty(mut self, dirty: bool) -> Self {
        self.dirty = Some(dirty);
        self
    }

    pub fn with_branch(mut self, branch: &str) -> Self {
        self.branch = Some(branch.to_string());
        self
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tag = Some(tag.to_string());
        self
    }

    pub fn with_diff(mut self, diff: &str) -> Self {
        self.diff = Some(diff.to_string());
        self
    }

    pub fn with_default_base(mut self, branch: &str) -> Self {
        self.default_base = Some(branch.to_string());
        self
    }

    pub fn with_existing_branches(mut self, names: &[&str]) -> Self {
        self.existing_branches = names.iter().map(|name| name.to_string()).collect();
        self
    }

    pub fn with_merge_ancestor(mut self, id: &str) -> Self {
        self.merge_ancestor = Some(id.to_string());
        self
    }

    pub fn with_parents(mut self, id: &str, parents: &[&str]) -> Self {
        self.parents
            .insert(id.to_string(), parents.iter().map(|p| p.to_string()).collect());
        self
    }

    /// Queries made so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn was_called(&self, query: &str) -> bool {
        self.calls().iter().any(|call| call.starts_with(query))
    }

    fn log(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

fn fail(query: &str) -> VcsError {
    VcsError::OperationFailed(format!("{query} unavailable"))
}

impl RepoHandle for MockRepo {
    fn is_working_tree_dirty(&self) -> Result<bool, VcsError> {
        self.log("is_working_tree_dirty");
        self.dirty.ok_or_else(|| fail("dirty"))
    }

    fn head_commit(&self) -> Result<HeadCommit, VcsError> {
        self.log("head_commit");
        self.head.clone().ok_or_else(|| fail("head"))
    }

    fn active_branch_name(&self) -> Result<String, VcsError> {
        self.log("active_branch_name");
        self.branch.clone().ok_or(VcsError::DetachedHead)
    }

    fn describe_latest_tag(&self) -> Result<String, VcsError> {
        self.log("describe_latest_tag");
        self.tag
            .clone()
            .ok_or_else(|| VcsError::RefNotFound("no tag".to_string()))
    }

    fn diff_working_tree(&self) -> Result<String, VcsError> {
        self.log("diff_working_tree");
        self.diff.clone().ok_or_else(|| fail("diff"))
    }

    fn resolve_commit(&self, rev: &str) -> Result<CommitId, VcsError> {
        self.log(format!("resolve_commit:{rev}"));
        Ok(CommitId::new(rev))
    }

    fn commit_parents(&self, commit: &CommitId) -> Result<Vec<CommitId>, VcsError> {
        self.log(format!("commit_parents:{commit}"));
        self.parents
            .get(commit.as_str())
            .map(|ids| ids.iter().map(CommitId::new).collect())
            .ok_or_else(|| VcsError::RefNotFound(commit.to_string()))
    }

    fn branch_exists(&self, remote: &str, name: &str) -> Result<bool, VcsError> {
        self.log(format!("branch_exists:{remote}/{name}"));
        Ok(self.existing_branches.iter().any(|branch| branch == name))
    }

    fn default_base_branch(&self, remote: &str) -> Result<Option<String>, VcsError> {
        self.log(format!("default_base_branch:{remote}"));
        Ok(self.default_base.clone())
    }

    fn base_branch_merge_ancestor(
        &self,
        remote: &str,
        base_branch: &str,
    ) -> Result<Option<CommitId>, VcsError> {
        self.log(format!("base_branch_merge_ancestor:{remote}/{base_branch}"));
        Ok(self.merge_ancestor.as_deref().map(CommitId::new))
    }
}

/// Backend that hands out clones of one scripted repository.
#[derive(Clone, Default)]
pub struct MockBackend {
    repo: Option<MockRepo>,
    opens: Arc<AtomicUsize>,
}

impl MockBackend {
    /// A backend that finds no repository.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_repo(repo: MockRepo) -> Self {
        Self {
            repo: Some(repo),
            opens: Arc::default(),
        }
    }

    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl VcsBackend for MockBackend {
    fn open_repository(&self, _start: &Path) -> Result<Option<Box<dyn RepoHandle>>, VcsError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .repo
            .clone()
            .map(|repo| Box::new(repo) as Box<dyn RepoHandle>))
    }
}

/// A head commit with fixed author and time.
pub fn head_commit(id: &str, message: &str) -> HeadCommit {
    HeadCommit {
        id: CommitId::new(id),
        message: Some(message.to_string()),
        time: DateTime::parse_from_rfc3339("2024-01-15T10:30:00+00:00").ok(),
        author_name: Some("Test User".to_string()),
        author_email: Some("test@example.com".to_string()),
    }
}
