//! Batch publisher
//!
//! Publishes the export root as one commit:
//!
//! ```text
//! COLLECT -> BLOB -> TREE -> COMMIT -> UPDATE_REF -> { DONE | ABORTED | REJECTED }
//! ```
//!
//! The branch tip is read once, right after a non-empty collect, and used
//! both as the parent of the new commit and as the source of the base tree.
//! The ref update is never forced, so it is the single point where the
//! publish becomes visible. A failure at any earlier step leaves the branch
//! untouched.

use super::ignore::IgnoreFilter;
use crate::adapters::vcs::{TreeEntry, VcsHost};
use crate::config::PublishConfig;
use crate::core::materialize::ARTIFACT_EXTENSION;
use crate::domain::{IdsnapError, Lookup, VcsError};
use crate::log_publish_stage;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use walkdir::WalkDir;

/// Publish cycle stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishState {
    Collect,
    Blob,
    Tree,
    Commit,
    UpdateRef,
    Done,
    Aborted,
    Rejected,
}

impl fmt::Display for PublishState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Collect => "COLLECT",
            Self::Blob => "BLOB",
            Self::Tree => "TREE",
            Self::Commit => "COMMIT",
            Self::UpdateRef => "UPDATE_REF",
            Self::Done => "DONE",
            Self::Aborted => "ABORTED",
            Self::Rejected => "REJECTED",
        };
        f.write_str(s)
    }
}

/// Successful publish result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Nothing qualified; no remote call was made
    NoOp,
    /// The branch now points at `commit_sha`
    Published {
        commit_sha: String,
        tree_sha: String,
        parent_sha: String,
        files: usize,
    },
}

/// Publish-fatal errors
#[derive(Debug, Error)]
pub enum PublishError {
    /// A step failed; later steps were not attempted and the branch is unchanged
    #[error("Publish aborted at {stage}: {source}")]
    Aborted {
        stage: PublishState,
        #[source]
        source: IdsnapError,
    },

    /// The branch moved after its tip was read; nothing was overwritten
    #[error("Publish to '{branch}' rejected, branch moved past {expected_parent}: {message}")]
    Rejected {
        branch: String,
        expected_parent: String,
        message: String,
    },
}

impl PublishError {
    fn aborted(stage: PublishState, source: impl Into<IdsnapError>) -> Self {
        Self::Aborted {
            stage,
            source: source.into(),
        }
    }

    /// Terminal state this error represents
    pub fn state(&self) -> PublishState {
        match self {
            Self::Aborted { .. } => PublishState::Aborted,
            Self::Rejected { .. } => PublishState::Rejected,
        }
    }
}

/// A file selected for publication
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishFile {
    /// Path below the export root, `/`-separated
    pub relative_path: String,
    pub absolute_path: PathBuf,
}

/// Walk `root` and return every non-excluded artifact, sorted by relative path
///
/// Only `.json` files qualify, so staging leftovers never reach a commit.
/// Excluded directories are pruned, so rules like `SOURCE/` never descend.
pub fn collect(root: &Path, filter: &IgnoreFilter) -> crate::domain::Result<Vec<PublishFile>> {
    if !root.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| match entry.path().strip_prefix(root) {
            Ok(rel) if !rel.as_os_str().is_empty() => {
                !filter.excludes_entry(rel, entry.file_type().is_dir())
            }
            _ => true,
        });

    for entry in walker {
        let entry = entry.map_err(|e| IdsnapError::Io(format!("Walk error: {e}")))?;
        if !entry.file_type().is_file() || !is_artifact(entry.path()) {
            continue;
        }

        let rel = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| IdsnapError::Io(format!("Walk error: {e}")))?;
        if filter.should_exclude(rel) {
            tracing::debug!(path = %rel.display(), "Skipped by ignore rules");
            continue;
        }

        let relative_path = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        files.push(PublishFile {
            relative_path,
            absolute_path: entry.path().to_path_buf(),
        });
    }

    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(files)
}

fn is_artifact(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == ARTIFACT_EXTENSION)
}

/// Publishes one export root per call
pub struct BatchPublisher {
    host: Arc<dyn VcsHost>,
    branch: String,
    path_prefix: String,
    blob_concurrency: usize,
}

impl BatchPublisher {
    pub fn new(host: Arc<dyn VcsHost>, config: &PublishConfig) -> Self {
        Self {
            host,
            branch: config.branch.clone(),
            path_prefix: config.path_prefix.trim_matches('/').to_string(),
            blob_concurrency: config.blob_concurrency.max(1),
        }
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    fn repo_path(&self, relative_path: &str) -> String {
        if self.path_prefix.is_empty() {
            relative_path.to_string()
        } else {
            format!("{}/{}", self.path_prefix, relative_path)
        }
    }

    /// Run one publish cycle over `root`
    pub async fn publish(
        &self,
        root: &Path,
        filter: &IgnoreFilter,
        message: &str,
    ) -> Result<PublishOutcome, PublishError> {
        let result = self.run_cycle(root, filter, message).await;
        match &result {
            Ok(PublishOutcome::NoOp) => {
                tracing::info!(branch = %self.branch, "No artifacts qualified, publish skipped");
            }
            Ok(PublishOutcome::Published {
                commit_sha, files, ..
            }) => {
                tracing::info!(branch = %self.branch, commit = %commit_sha, files = files, "Batch commit published");
            }
            Err(e) => {
                tracing::error!(branch = %self.branch, state = %e.state(), error = %e, "Publish failed");
            }
        }
        result
    }

    async fn run_cycle(
        &self,
        root: &Path,
        filter: &IgnoreFilter,
        message: &str,
    ) -> Result<PublishOutcome, PublishError> {
        // COLLECT
        let walk_root = root.to_path_buf();
        let walk_filter = filter.clone();
        let files = tokio::task::spawn_blocking(move || collect(&walk_root, &walk_filter))
            .await
            .map_err(|e| {
                PublishError::aborted(PublishState::Collect, IdsnapError::Other(e.to_string()))
            })?
            .map_err(|e| PublishError::aborted(PublishState::Collect, e))?;

        log_publish_stage!(PublishState::Collect, self.branch, files.len());
        if files.is_empty() {
            log_publish_stage!(PublishState::Done, self.branch, 0usize);
            return Ok(PublishOutcome::NoOp);
        }

        let parent_sha = match self.host.get_branch_tip(&self.branch).await {
            Ok(Lookup::Found(sha)) => sha,
            Ok(Lookup::NotFound(what)) => {
                return Err(PublishError::aborted(
                    PublishState::Collect,
                    IdsnapError::Validation(format!("{what} does not exist")),
                ))
            }
            Err(e) => return Err(PublishError::aborted(PublishState::Collect, e)),
        };
        tracing::debug!(branch = %self.branch, tip = %parent_sha, "Observed branch tip");

        // BLOB
        log_publish_stage!(PublishState::Blob, self.branch, files.len());
        let mut entries: Vec<TreeEntry> = stream::iter(files)
            .map(|file| self.upload(file))
            .buffer_unordered(self.blob_concurrency)
            .try_collect()
            .await
            .map_err(|e| PublishError::aborted(PublishState::Blob, e))?;
        entries.sort_by(|a, b| a.path.cmp(&b.path));

        // TREE
        log_publish_stage!(PublishState::Tree, self.branch, entries.len());
        let base_tree = self
            .host
            .get_commit_tree(&parent_sha)
            .await
            .map_err(|e| PublishError::aborted(PublishState::Tree, e))?;
        let tree_sha = self
            .host
            .create_tree(&base_tree, &entries)
            .await
            .map_err(|e| PublishError::aborted(PublishState::Tree, e))?;

        // COMMIT
        log_publish_stage!(PublishState::Commit, self.branch, entries.len());
        let commit_sha = self
            .host
            .create_commit(message, &tree_sha, std::slice::from_ref(&parent_sha))
            .await
            .map_err(|e| PublishError::aborted(PublishState::Commit, e))?;

        // UPDATE_REF
        log_publish_stage!(PublishState::UpdateRef, self.branch, entries.len());
        match self.host.update_ref(&self.branch, &commit_sha).await {
            Ok(()) => {}
            Err(IdsnapError::Vcs(VcsError::RefUpdateRejected { message, .. })) => {
                log_publish_stage!(PublishState::Rejected, self.branch, entries.len());
                return Err(PublishError::Rejected {
                    branch: self.branch.clone(),
                    expected_parent: parent_sha,
                    message,
                });
            }
            Err(e) => return Err(PublishError::aborted(PublishState::UpdateRef, e)),
        }

        log_publish_stage!(PublishState::Done, self.branch, entries.len());
        Ok(PublishOutcome::Published {
            commit_sha,
            tree_sha,
            parent_sha,
            files: entries.len(),
        })
    }

    async fn upload(&self, file: PublishFile) -> crate::domain::Result<TreeEntry> {
        let bytes = tokio::fs::read(&file.absolute_path).await.map_err(|e| {
            IdsnapError::Io(format!("Failed to read {}: {e}", file.relative_path))
        })?;
        let sha = self.host.create_blob(&bytes).await?;
        tracing::trace!(path = %file.relative_path, blob = %sha, "Blob uploaded");
        Ok(TreeEntry::new(self.repo_path(&file.relative_path), sha))
    }
}
