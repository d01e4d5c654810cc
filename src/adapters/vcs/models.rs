//! GitHub git-data API models

use serde::{Deserialize, Serialize};

/// Regular non-executable file
pub const FILE_MODE: &str = "100644";

/// Object reference carried in ref and commit responses
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectRef {
    pub sha: String,
}

/// `GET /git/ref/heads/{branch}`
#[derive(Debug, Clone, Deserialize)]
pub struct RefResponse {
    pub object: ObjectRef,
}

/// `GET /git/commits/{sha}`
#[derive(Debug, Clone, Deserialize)]
pub struct CommitResponse {
    pub sha: String,
    pub tree: ObjectRef,
}

/// Any create endpoint answering with the new object's sha
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedObject {
    pub sha: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlobRequest {
    pub content: String,
    pub encoding: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct TreeItem<'a> {
    pub path: &'a str,
    pub mode: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub sha: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct TreeRequest<'a> {
    pub base_tree: &'a str,
    pub tree: Vec<TreeItem<'a>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommitRequest<'a> {
    pub message: &'a str,
    pub tree: &'a str,
    pub parents: &'a [String],
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateRefRequest<'a> {
    pub sha: &'a str,
    pub force: bool,
}
