//! Artifact materializer
//!
//! Turns the objects of a completed export into files under
//! `<export_root>/<KIND>/<stem>.json`. The stem comes from
//! [`naming::resolve_name`] and [`naming::sanitize_name`]; the content from
//! [`canonical::to_canonical_bytes`].
//!
//! Two objects of one kind resolving to the same stem share a file and the
//! last write wins. Each write lands through a rename, so the surviving file
//! is always one complete document.

pub mod canonical;
pub mod naming;

use crate::domain::context::ResultExt;
use crate::domain::{EntityKind, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// File extension of materialized artifacts
pub const ARTIFACT_EXTENSION: &str = "json";

/// A written artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub kind: EntityKind,

    /// Path below the export root, `/`-separated
    pub relative_path: String,

    /// SHA-256 of the written bytes
    pub checksum: String,

    pub size: usize,
}

/// Relative artifact path for an object of `kind`
pub fn artifact_path(kind: EntityKind, object: &Value) -> String {
    let stem = naming::sanitize_name(naming::resolve_name(object));
    format!("{}/{}.{}", kind.as_str(), stem, ARTIFACT_EXTENSION)
}

/// Writes artifacts below one export root
#[derive(Debug, Clone)]
pub struct Materializer {
    root: PathBuf,
}

impl Materializer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write every object of an export result, returning what was written
    pub async fn materialize(&self, kind: EntityKind, objects: &[Value]) -> Result<Vec<Artifact>> {
        let mut artifacts = Vec::with_capacity(objects.len());

        for object in objects {
            let relative_path = artifact_path(kind, object);
            let bytes = canonical::to_canonical_bytes(object)
                .with_context(|| format!("Failed to serialize {relative_path}"))?;

            self.write(&relative_path, &bytes)
                .await
                .with_context(|| format!("Failed to write {relative_path}"))?;

            tracing::debug!(kind = %kind, path = %relative_path, bytes = bytes.len(), "Artifact written");

            artifacts.push(Artifact {
                kind,
                checksum: canonical::checksum_bytes(&bytes),
                size: bytes.len(),
                relative_path,
            });
        }

        Ok(artifacts)
    }

    async fn write(&self, relative_path: &str, bytes: &[u8]) -> std::io::Result<()> {
        let target = self.root.join(relative_path);
        let dir = target.parent().unwrap_or(&self.root);
        tokio::fs::create_dir_all(dir).await?;

        let file_name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let staging = dir.join(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4().simple()));

        let staged = async {
            tokio::fs::write(&staging, bytes).await?;
            tokio::fs::rename(&staging, &target).await
        }
        .await;

        if let Err(e) = staged {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(e);
        }
        Ok(())
    }
}
