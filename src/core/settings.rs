//! Git metadata collection settings
//!
//! Controls which [`RepoInfo`](super::repo_info::RepoInfo) fields are
//! collected. Settings from several levels (organization, project,
//! experiment) can be combined with [`GitMetadataSettings::merge`], which
//! always keeps the most restrictive choice.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur when building settings
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Unknown git metadata field: {0}")]
    UnknownField(String),
}

/// A collectible piece of repository metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepoField {
    Commit,
    Branch,
    Tag,
    Dirty,
    AuthorName,
    AuthorEmail,
    CommitMessage,
    CommitTime,
    GitDiff,
}

impl RepoField {
    /// Every collectible field, in snapshot order.
    pub const ALL: [RepoField; 9] = [
        RepoField::Commit,
        RepoField::Branch,
        RepoField::Tag,
        RepoField::Dirty,
        RepoField::AuthorName,
        RepoField::AuthorEmail,
        RepoField::CommitMessage,
        RepoField::CommitTime,
        RepoField::GitDiff,
    ];

    /// The serialized name of this field.
    pub fn as_str(&self) -> &'static str {
        match self {
            RepoField::Commit => "commit",
            RepoField::Branch => "branch",
            RepoField::Tag => "tag",
            RepoField::Dirty => "dirty",
            RepoField::AuthorName => "author_name",
            RepoField::AuthorEmail => "author_email",
            RepoField::CommitMessage => "commit_message",
            RepoField::CommitTime => "commit_time",
            RepoField::GitDiff => "git_diff",
        }
    }

    /// Fields read from the HEAD commit.
    pub fn is_commit_field(&self) -> bool {
        matches!(
            self,
            RepoField::Commit
                | RepoField::AuthorName
                | RepoField::AuthorEmail
                | RepoField::CommitMessage
                | RepoField::CommitTime
        )
    }
}

impl std::fmt::Display for RepoField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RepoField {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RepoField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| SettingsError::UnknownField(s.to_string()))
    }
}

/// How much git metadata to collect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CollectMode {
    /// Collect nothing; extraction returns no snapshot
    None,
    /// Collect every available field
    #[default]
    All,
    /// Collect only the listed fields
    #[serde(alias = "some")]
    Selected,
}

impl std::fmt::Display for CollectMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectMode::None => write!(f, "none"),
            CollectMode::All => write!(f, "all"),
            CollectMode::Selected => write!(f, "selected"),
        }
    }
}

/// Which git metadata fields to collect
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GitMetadataSettings {
    #[serde(default)]
    pub collect: CollectMode,
    /// Only meaningful when `collect` is `selected`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<RepoField>,
}

impl GitMetadataSettings {
    /// Collect nothing.
    pub fn none() -> Self {
        Self {
            collect: CollectMode::None,
            fields: Vec::new(),
        }
    }

    /// Collect everything available.
    pub fn all() -> Self {
        Self {
            collect: CollectMode::All,
            fields: Vec::new(),
        }
    }

    /// Collect only `fields`.
    pub fn selected(fields: impl IntoIterator<Item = RepoField>) -> Self {
        let mut selected = Vec::new();
        for field in fields {
            if !selected.contains(&field) {
                selected.push(field);
            }
        }
        Self {
            collect: CollectMode::Selected,
            fields: selected,
        }
    }

    /// Whether `field` survives this selection policy.
    pub fn wants(&self, field: RepoField) -> bool {
        match self.collect {
            CollectMode::None => false,
            CollectMode::All => true,
            CollectMode::Selected => self.fields.contains(&field),
        }
    }

    /// Combine two settings, keeping the most restrictive outcome.
    ///
    /// `all` defers to the other side, `none` wins over anything else, and
    /// two selections keep only the fields they share (in `self`'s order).
    /// An empty intersection collects nothing.
    pub fn merge(&self, other: &GitMetadataSettings) -> GitMetadataSettings {
        match (self.collect, other.collect) {
            (CollectMode::All, _) => other.clone(),
            (_, CollectMode::All) => self.clone(),
            (CollectMode::None, _) => self.clone(),
            (_, CollectMode::None) => other.clone(),
            (CollectMode::Selected, CollectMode::Selected) => {
                let fields: Vec<RepoField> = self
                    .fields
                    .iter()
                    .copied()
                    .filter(|field| other.fields.contains(field))
                    .collect();
                if fields.is_empty() {
                    GitMetadataSettings::none()
                } else {
                    GitMetadataSettings::selected(fields)
                }
            }
        }
    }
}
