//! Version-control host seam
//!
//! The operations the batch publisher needs from a git hosting API: read the
//! branch tip, upload content, assemble a tree and commit, then move the
//! branch pointer without forcing.

use crate::domain::{Lookup, Result};
use async_trait::async_trait;

/// One file in a tree being created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// Repository-relative path with `/` separators
    pub path: String,

    /// Sha of the uploaded blob
    pub sha: String,
}

impl TreeEntry {
    pub fn new(path: impl Into<String>, sha: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            sha: sha.into(),
        }
    }
}

/// Git hosting API
#[async_trait]
pub trait VcsHost: Send + Sync {
    /// Commit sha the branch points at, or `NotFound` if the branch does not exist
    async fn get_branch_tip(&self, branch: &str) -> Result<Lookup<String>>;

    /// Tree sha of a commit
    async fn get_commit_tree(&self, commit_sha: &str) -> Result<String>;

    /// Uploads file content and returns the blob sha
    async fn create_blob(&self, content: &[u8]) -> Result<String>;

    /// Creates a tree layered over `base_tree`; paths not listed are kept
    async fn create_tree(&self, base_tree: &str, entries: &[TreeEntry]) -> Result<String>;

    /// Creates a commit object and returns its sha
    async fn create_commit(&self, message: &str, tree_sha: &str, parents: &[String])
        -> Result<String>;

    /// Fast-forwards `branch` to `commit_sha`
    ///
    /// Never forced. If the branch moved since its tip was read the host
    /// refuses and this returns [`crate::domain::VcsError::RefUpdateRejected`].
    async fn update_ref(&self, branch: &str, commit_sha: &str) -> Result<()>;
}
