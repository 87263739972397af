//! libgit2-backed implementation of the VCS capability interface

use chrono::{DateTime, FixedOffset};
use git2::{DescribeOptions, DiffFormat, ErrorCode, Oid, Repository, StatusOptions};
use std::path::Path;
use tracing::debug;

use super::backend::{CommitId, HeadCommit, RepoHandle, VcsBackend};
use super::VcsError;

/// Opens repositories with `git2::Repository::discover`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Git2Backend;

impl Git2Backend {
    pub fn new() -> Self {
        Self
    }
}

impl VcsBackend for Git2Backend {
    fn open_repository(&self, start: &Path) -> Result<Option<Box<dyn RepoHandle>>, VcsError> {
        match Repository::discover(start) {
            Ok(repo) if repo.is_bare() => {
                debug!(path = %start.display(), "bare repository has no working tree");
                Ok(None)
            }
            Ok(repo) => Ok(Some(Box::new(Git2Repo { repo }))),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(VcsError::NotARepo(format!("{}: {}", start.display(), e))),
        }
    }
}

/// An opened working copy.
pub struct Git2Repo {
    repo: Repository,
}

impl std::fmt::Debug for Git2Repo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git2Repo")
            .field("path", &self.repo.path())
            .finish()
    }
}

impl Git2Repo {
    /// Wrap an already opened repository.
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// HEAD's tree, or `None` before the first commit.
    fn head_tree(&self) -> Result<Option<git2::Tree<'_>>, VcsError> {
        match self.repo.head() {
            Ok(head) => Ok(Some(head.peel_to_tree()?)),
            Err(e) if e.code() == ErrorCode::UnbornBranch => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

fn commit_time(time: git2::Time) -> Option<DateTime<FixedOffset>> {
    let offset = FixedOffset::east_opt(time.offset_minutes() * 60)?;
    DateTime::from_timestamp(time.seconds(), 0).map(|utc| utc.with_timezone(&offset))
}

impl RepoHandle for Git2Repo {
    fn is_working_tree_dirty(&self) -> Result<bool, VcsError> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(false).include_ignored(false);

        let statuses = self.repo.statuses(Some(&mut opts))?;
        Ok(!statuses.is_empty())
    }

    fn head_commit(&self) -> Result<HeadCommit, VcsError> {
        let commit = self.repo.head()?.peel_to_commit()?;
        let author = commit.author();

        Ok(HeadCommit {
            id: CommitId::new(commit.id().to_string()),
            message: commit.message().map(str::to_string),
            time: commit_time(commit.time()),
            author_name: author.name().map(str::to_string),
            author_email: author.email().map(str::to_string),
        })
    }

    fn active_branch_name(&self) -> Result<String, VcsError> {
        let head = match self.repo.head() {
            Ok(head) => head,
            Err(e) if e.code() == ErrorCode::UnbornBranch => {
                // No commits yet: HEAD still names the branch symbolically
                let head_ref = self.repo.find_reference("HEAD")?;
                return head_ref
                    .symbolic_target()
                    .and_then(|target| target.strip_prefix("refs/heads/"))
                    .map(str::to_string)
                    .ok_or(VcsError::DetachedHead);
            }
            Err(e) => return Err(e.into()),
        };

        if !head.is_branch() {
            return Err(VcsError::DetachedHead);
        }

        head.shorthand().map(str::to_string).ok_or_else(|| {
            VcsError::OperationFailed("branch name is not valid UTF-8".to_string())
        })
    }

    fn describe_latest_tag(&self) -> Result<String, VcsError> {
        let mut opts = DescribeOptions::new();
        opts.describe_tags();

        let describe = self.repo.describe(&opts)?;
        Ok(describe.format(None)?)
    }

    fn diff_working_tree(&self) -> Result<String, VcsError> {
        let tree = self.head_tree()?;
        let diff = self
            .repo
            .diff_tree_to_workdir_with_index(tree.as_ref(), None)?;

        let mut text = String::new();
        diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
            if matches!(line.origin(), '+' | '-' | ' ') {
                text.push(line.origin());
            }
            text.push_str(&String::from_utf8_lossy(line.content()));
            true
        })?;
        Ok(text)
    }

    fn resolve_commit(&self, rev: &str) -> Result<CommitId, VcsError> {
        let commit = self.repo.revparse_single(rev)?.peel_to_commit()?;
        Ok(CommitId::new(commit.id().to_string()))
    }

    fn commit_parents(&self, commit: &CommitId) -> Result<Vec<CommitId>, VcsError> {
        let oid = Oid::from_str(commit.as_str())?;
        let commit = self.repo.find_commit(oid)?;
        Ok(commit
            .parent_ids()
            .map(|id| CommitId::new(id.to_string()))
            .collect())
    }

    fn branch_exists(&self, remote: &str, name: &str) -> Result<bool, VcsError> {
        let candidates = [
            format!("refs/heads/{}", name),
            format!("refs/remotes/{}/{}", remote, name),
        ];
        for refname in &candidates {
            match self.repo.find_reference(refname) {
                Ok(_) => return Ok(true),
                Err(e) if e.code() == ErrorCode::NotFound => {}
                Err(e) if e.code() == ErrorCode::InvalidSpec => return Ok(false),
                Err(e) => return Err(e.into()),
            }
        }
        Ok(false)
    }

    fn default_base_branch(&self, remote: &str) -> Result<Option<String>, VcsError> {
        let refname = format!("refs/remotes/{}/HEAD", remote);
        let prefix = format!("refs/remotes/{}/", remote);

        match self.repo.find_reference(&refname) {
            Ok(reference) => Ok(reference
                .symbolic_target()
                .and_then(|target| target.strip_prefix(prefix.as_str()))
                .map(str::to_string)),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn base_branch_merge_ancestor(
        &self,
        remote: &str,
        base_branch: &str,
    ) -> Result<Option<CommitId>, VcsError> {
        let head = self.repo.head()?.peel_to_commit()?;

        // A clean checkout is the commit under test, so compare from its
        // parent; uncommitted work is compared from HEAD itself. A clean
        // root commit has no parent and is compared from HEAD, so a
        // single-commit history still reports that commit.
        let start = if self.is_working_tree_dirty()? {
            head.id()
        } else {
            head.parent_id(0).unwrap_or_else(|_| head.id())
        };

        let candidates = [
            format!("refs/remotes/{}/{}", remote, base_branch),
            format!("refs/heads/{}", base_branch),
        ];
        let Some(base) = candidates
            .iter()
            .find_map(|name| self.repo.refname_to_id(name).ok())
        else {
            debug!(remote, base_branch, "base branch not found");
            return Ok(None);
        };

        match self.repo.merge_base(start, base) {
            Ok(oid) => Ok(Some(CommitId::new(oid.to_string()))),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
