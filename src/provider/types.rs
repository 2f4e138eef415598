//! Normalized context records handed to the prompt-construction and
//! comment-formatting stages.
//!
//! Every field is populated with either real data or an explicit empty value
//! (`""`, `[]`), never an absent field, so downstream consumers need no
//! null-checks on top-level fields. Records are created fresh per fetch and
//! are immutable after construction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimal author snapshot taken at fetch time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub username: String,
    pub name: String,
}

/// Triple of SHAs anchoring a diff view, required to post correctly
/// positioned inline comments.
///
/// Resolution falls back through two source locations (metadata response,
/// then changes response) before defaulting to empty strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiffRefs {
    pub base_sha: String,
    pub head_sha: String,
    pub start_sha: String,
}

/// One changed file in a merge request, in the order the API returned it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileChange {
    pub old_path: String,
    pub new_path: String,
    pub is_new: bool,
    pub is_renamed: bool,
    pub is_deleted: bool,
    /// Unified diff text; empty when the provider returns none.
    pub diff: String,
}

/// A single note (comment) inside a discussion thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: u64,
    pub body: String,
    pub author: Author,
    pub created_at: DateTime<Utc>,
}

/// A threaded group of notes attached to an MR or issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Discussion {
    pub id: String,
    pub notes: Vec<Note>,
}

/// Complete normalized snapshot of a merge request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeRequestContext {
    pub iid: u64,
    pub project_id: u64,
    pub title: String,
    pub description: String,
    pub state: String,
    pub source_branch: String,
    pub target_branch: String,
    pub author: Author,
    pub web_url: String,
    pub diff_refs: DiffRefs,
    pub changes: Vec<FileChange>,
    pub discussions: Vec<Discussion>,
}

/// Complete normalized snapshot of an issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueContext {
    pub iid: u64,
    pub project_id: u64,
    pub title: String,
    pub description: String,
    pub state: String,
    pub author: Author,
    pub web_url: String,
    /// Label names; string and `{ name }` wire forms both normalize here.
    pub labels: Vec<String>,
    pub discussions: Vec<Discussion>,
}
