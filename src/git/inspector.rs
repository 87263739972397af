//! Repository metadata extraction
//!
//! [`RepoInspector`] turns a working copy into a [`RepoInfo`] snapshot and
//! walks first-parent ancestors from the base-branch merge point. Every VCS
//! query runs inside [`attempt_named`], so an unavailable fact leaves its
//! field empty and a missing repository yields `None`. Nothing here returns
//! an error to the caller.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, trace};

use super::backend::{RepoHandle, VcsBackend};
use super::git2_backend::Git2Backend;
use crate::core::config::InspectorConfig;
use crate::core::repo_info::RepoInfo;
use crate::core::settings::{CollectMode, GitMetadataSettings, RepoField};
use crate::telemetry::{SpanExt, VcsSpan};
use crate::util::{attempt_named, truncate_to_byte_limit};

#[cfg(feature = "telemetry")]
use crate::telemetry::metrics::GLOBAL_METRICS;

/// Base branch used when nothing else identifies one.
pub const DEFAULT_BASE_BRANCH: &str = "main";

/// Conventional base branch names, tried in order when the remote
/// advertises no default branch.
pub const BASE_BRANCH_CANDIDATES: [&str; 3] = ["main", "master", "develop"];

/// Collects git metadata for the repository containing `start_path`.
///
/// The backend is passed in explicitly; nothing is looked up from process
/// state except by [`RepoInspector::from_current_dir`].
#[derive(Debug, Clone)]
pub struct RepoInspector<B: VcsBackend = Git2Backend> {
    backend: B,
    start_path: PathBuf,
    config: InspectorConfig,
}

impl RepoInspector<Git2Backend> {
    /// Inspect the repository containing the process working directory.
    pub fn from_current_dir() -> Self {
        let start = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::new(Git2Backend::new(), start)
    }
}

impl<B: VcsBackend> RepoInspector<B> {
    /// Create an inspector with the default configuration.
    pub fn new(backend: B, start_path: impl Into<PathBuf>) -> Self {
        Self::with_config(backend, start_path, InspectorConfig::default())
    }

    /// Create an inspector with an explicit configuration.
    pub fn with_config(backend: B, start_path: impl Into<PathBuf>, config: InspectorConfig) -> Self {
        Self {
            backend,
            start_path: start_path.into(),
            config,
        }
    }

    pub fn config(&self) -> &InspectorConfig {
        &self.config
    }

    pub fn start_path(&self) -> &Path {
        &self.start_path
    }

    /// Collect a snapshot according to `settings` (`None` collects everything).
    ///
    /// Returns `None` when collection is disabled or no repository is found.
    pub fn extract(&self, settings: Option<&GitMetadataSettings>) -> Option<RepoInfo> {
        let all = GitMetadataSettings::all();
        let settings = settings.unwrap_or(&all);

        if settings.collect == CollectMode::None {
            return None;
        }

        let span = VcsSpan::new("extract", &self.start_path.display().to_string());
        let _guard = span.enter();
        let start = Instant::now();

        let info = self
            .open()
            .map(|repo| self.collect(repo.as_ref(), settings));

        let duration = start.elapsed();
        span.record_success(info.is_some());
        span.record_duration_ms(duration.as_secs_f64() * 1000.0);
        #[cfg(feature = "telemetry")]
        GLOBAL_METRICS.record_operation("extract", duration);

        info
    }

    /// Collect a snapshot using the configured settings.
    pub fn extract_configured(&self) -> Option<RepoInfo> {
        self.extract(Some(&self.config.git_metadata))
    }

    /// Up to `n` commit ids, starting at the base-branch ancestor and
    /// following first parents.
    ///
    /// Empty when there is no repository or no base-branch ancestor.
    pub fn ancestors(&self, n: usize) -> Vec<String> {
        let span = VcsSpan::new("ancestors", &self.start_path.display().to_string());
        let _guard = span.enter();
        let start = Instant::now();

        let ids = self.walk_ancestors(n);

        let duration = start.elapsed();
        span.record_success(!ids.is_empty());
        span.record_duration_ms(duration.as_secs_f64() * 1000.0);
        #[cfg(feature = "telemetry")]
        GLOBAL_METRICS.record_operation("ancestors", duration);

        ids
    }

    /// [`ancestors`](Self::ancestors) bounded by `config.max_ancestors`.
    pub fn default_ancestors(&self) -> Vec<String> {
        self.ancestors(self.config.max_ancestors)
    }

    fn open(&self) -> Option<Box<dyn RepoHandle>> {
        let repo = attempt_named("open_repository", || {
            self.backend.open_repository(&self.start_path)
        })
        .flatten();

        if repo.is_none() {
            debug!(path = %self.start_path.display(), "no repository found");
        }
        repo
    }

    fn collect(&self, repo: &dyn RepoHandle, settings: &GitMetadataSettings) -> RepoInfo {
        // Queries for fields that would be discarded are skipped
        let wants_head = RepoField::ALL
            .iter()
            .any(|field| field.is_commit_field() && settings.wants(*field));
        let wants_diff = settings.wants(RepoField::GitDiff);

        let head = if wants_head {
            attempt_named("head_commit", || repo.head_commit())
        } else {
            None
        };

        let dirty = if settings.wants(RepoField::Dirty) || wants_diff {
            attempt_named("is_working_tree_dirty", || repo.is_working_tree_dirty())
        } else {
            None
        };

        let git_diff = if dirty == Some(true) && wants_diff {
            attempt_named("diff_working_tree", || repo.diff_working_tree()).map(|mut diff| {
                let keep = truncate_to_byte_limit(&diff, self.config.diff_byte_limit).len();
                diff.truncate(keep);
                diff
            })
        } else {
            None
        };

        let branch = if settings.wants(RepoField::Branch) {
            attempt_named("active_branch_name", || repo.active_branch_name())
        } else {
            None
        };

        let tag = if settings.wants(RepoField::Tag) {
            attempt_named("describe_latest_tag", || repo.describe_latest_tag())
        } else {
            None
        };

        let mut info = RepoInfo {
            commit: head.as_ref().map(|h| h.id.as_str().trim().to_string()),
            branch,
            tag,
            dirty,
            author_name: head
                .as_ref()
                .and_then(|h| h.author_name.as_deref())
                .map(|name| name.trim().to_string()),
            author_email: head
                .as_ref()
                .and_then(|h| h.author_email.as_deref())
                .map(|email| email.trim().to_string()),
            commit_message: head
                .as_ref()
                .and_then(|h| h.message.as_deref())
                .map(|message| message.trim().to_string()),
            commit_time: head.as_ref().and_then(|h| h.time).map(|t| t.to_rfc3339()),
            git_diff,
        };

        if settings.collect == CollectMode::Selected {
            info.retain_fields(&settings.fields);
        }
        info
    }

    /// Configured base branch, else the remote's default branch, else the
    /// first conventional name that exists, else [`DEFAULT_BASE_BRANCH`].
    fn base_branch(&self, repo: &dyn RepoHandle) -> String {
        if let Some(ref base) = self.config.base_branch {
            return base.clone();
        }

        let remote = self.config.remote.as_str();
        if let Some(base) =
            attempt_named("default_base_branch", || repo.default_base_branch(remote)).flatten()
        {
            return base;
        }

        BASE_BRANCH_CANDIDATES
            .iter()
            .find(|name| {
                attempt_named("branch_exists", || repo.branch_exists(remote, name)) == Some(true)
            })
            .map_or_else(|| DEFAULT_BASE_BRANCH.to_string(), |name| name.to_string())
    }

    fn walk_ancestors(&self, n: usize) -> Vec<String> {
        if n == 0 {
            return Vec::new();
        }
        let Some(repo) = self.open() else {
            return Vec::new();
        };

        let remote = self.config.remote.as_str();
        let base_branch = self.base_branch(repo.as_ref());

        let Some(ancestor) = attempt_named("base_branch_merge_ancestor", || {
            repo.base_branch_merge_ancestor(remote, &base_branch)
        })
        .flatten() else {
            debug!(remote, base_branch = %base_branch, "no base-branch ancestor");
            return Vec::new();
        };

        let Some(mut current) =
            attempt_named("resolve_commit", || repo.resolve_commit(ancestor.as_str()))
        else {
            return Vec::new();
        };

        let mut ids = Vec::with_capacity(n.min(1024));
        loop {
            ids.push(current.as_str().to_string());
            if ids.len() >= n {
                break;
            }

            let Some(parents) = attempt_named("commit_parents", || repo.commit_parents(&current))
            else {
                break;
            };

            match parents.into_iter().next() {
                // A commit listing itself as parent would loop forever
                Some(parent) if parent != current => {
                    trace!(commit = %parent, "following first parent");
                    current = parent;
                }
                _ => break,
            }
        }
        ids
    }
}

/// Collect metadata for the repository containing the working directory.
pub fn extract_metadata(settings: Option<&GitMetadataSettings>) -> Option<RepoInfo> {
    RepoInspector::from_current_dir().extract(settings)
}

/// Walk up to `n` ancestors of the repository containing the working directory.
pub fn get_ancestors(n: usize) -> Vec<String> {
    RepoInspector::from_current_dir().ancestors(n)
}
