//! Core data types and algorithms for gitstamp

pub mod config;
pub mod merge;
pub mod repo_info;
pub mod settings;

pub use config::{ConfigError, InspectorConfig};
pub use merge::{merge, merge_dicts, merge_with_paths, KeyPath, MergeError, MergeSide};
pub use repo_info::RepoInfo;
pub use settings::{CollectMode, GitMetadataSettings, RepoField, SettingsError};
