//! gitstamp - best-effort git metadata for tracing and telemetry SDKs
//!
//! Collects a [`RepoInfo`] snapshot of the working copy (commit, branch, tag,
//! dirty flag, author, message, time and a size-bounded diff) and the
//! first-parent ancestors of the base-branch merge point. Collection never
//! fails the caller: anything that cannot be determined is left empty.
//!
//! Also exports the helpers the collection is built from: byte-limited
//! truncation, guarded calls, path-aware deep merge and lazily computed values.

pub mod core;
pub mod git;
pub mod telemetry;
pub mod util;

pub use crate::core::{
    merge, merge_dicts, merge_with_paths, CollectMode, GitMetadataSettings, InspectorConfig,
    MergeError, RepoField, RepoInfo,
};
pub use crate::git::{extract_metadata, get_ancestors, Git2Backend, RepoInspector, VcsBackend};
pub use crate::util::{attempt, truncate_to_byte_limit, LazyValue};
