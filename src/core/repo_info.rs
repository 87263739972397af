//! Repository metadata snapshot

use serde::{Deserialize, Serialize};

use super::settings::RepoField;

/// Source-control context attached to recorded events.
///
/// Every field is independently optional: `None` means the fact was not
/// available (or not selected), never that extraction failed as a whole.
/// Absent fields are omitted from the serialized form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dirty: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_message: Option<String>,
    /// Commit timestamp in RFC 3339 form
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_time: Option<String>,
    /// Working-tree diff, only present when `dirty`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_diff: Option<String>,
}

impl RepoInfo {
    /// Clear every field not listed in `fields`.
    pub fn retain_fields(&mut self, fields: &[RepoField]) {
        for field in RepoField::ALL {
            if !fields.contains(&field) {
                self.clear(field);
            }
        }
    }

    /// Clear a single field.
    pub fn clear(&mut self, field: RepoField) {
        match field {
            RepoField::Commit => self.commit = None,
            RepoField::Branch => self.branch = None,
            RepoField::Tag => self.tag = None,
            RepoField::Dirty => self.dirty = None,
            RepoField::AuthorName => self.author_name = None,
            RepoField::AuthorEmail => self.author_email = None,
            RepoField::CommitMessage => self.commit_message = None,
            RepoField::CommitTime => self.commit_time = None,
            RepoField::GitDiff => self.git_diff = None,
        }
    }

    /// Whether `field` holds a value.
    pub fn has(&self, field: RepoField) -> bool {
        match field {
            RepoField::Commit => self.commit.is_some(),
            RepoField::Branch => self.branch.is_some(),
            RepoField::Tag => self.tag.is_some(),
            RepoField::Dirty => self.dirty.is_some(),
            RepoField::AuthorName => self.author_name.is_some(),
            RepoField::AuthorEmail => self.author_email.is_some(),
            RepoField::CommitMessage => self.commit_message.is_some(),
            RepoField::CommitTime => self.commit_time.is_some(),
            RepoField::GitDiff => self.git_diff.is_some(),
        }
    }

    /// Whether every field is absent.
    pub fn is_empty(&self) -> bool {
        RepoField::ALL.iter().all(|field| !self.has(*field))
    }
}
