//! In-memory collaborators for driving a whole run without a network
#![allow(dead_code)]

use async_trait::async_trait;
use idsnap::adapters::identity::{BackendJobStatus, ExportBackend, InventorySource};
use idsnap::adapters::vcs::{TreeEntry, VcsHost};
use idsnap::config::{
    secret_string, ApplicationConfig, ExportConfig, IdentityConfig, IdsnapConfig, LoggingConfig,
    PublishConfig, RetryConfig,
};
use idsnap::domain::{
    EntityKind, IdentityError, InventoryItem, ItemId, JobId, Lookup, Result, VcsError,
};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

fn digest(parts: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
        hasher.update([0u8]);
    }
    format!("{:x}", hasher.finalize())
}

/// JSON log lines emitted on the current thread while installed
#[derive(Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    /// Make this the thread's subscriber until the guard drops
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(self.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    /// Every captured event
    pub fn events(&self) -> Vec<Value> {
        let buffer = self.buffer.lock().unwrap();
        String::from_utf8_lossy(&buffer)
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    /// Captured events with the given message
    pub fn events_with_message(&self, message: &str) -> Vec<Value> {
        self.events()
            .into_iter()
            .filter(|event| event["fields"]["message"] == message)
            .collect()
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Identity platform whose jobs complete on the first poll
#[derive(Default)]
pub struct FakeIdentity {
    inventory: BTreeMap<EntityKind, Vec<(InventoryItem, Value)>>,
    failing_kinds: HashSet<EntityKind>,
    failing_items: HashSet<String>,
    jobs: Mutex<HashMap<String, String>>,
    submitted: AtomicUsize,
}

impl FakeIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an item whose export yields `object`
    pub fn with_item(mut self, kind: EntityKind, id: &str, name: &str, object: Value) -> Self {
        let item = InventoryItem::new(kind, ItemId::new(id).unwrap(), name);
        self.inventory.entry(kind).or_default().push((item, object));
        self
    }

    /// Export jobs for this item end FAILED
    pub fn failing_item(mut self, id: &str) -> Self {
        self.failing_items.insert(id.to_string());
        self
    }

    /// Listing this kind returns an error
    pub fn failing_kind(mut self, kind: EntityKind) -> Self {
        self.failing_kinds.insert(kind);
        self
    }

    pub fn submitted(&self) -> usize {
        self.submitted.load(Ordering::SeqCst)
    }

    fn object(&self, id: &str) -> Option<&Value> {
        self.inventory
            .values()
            .flatten()
            .find(|(item, _)| item.id.as_str() == id)
            .map(|(_, object)| object)
    }
}

#[async_trait]
impl InventorySource for FakeIdentity {
    async fn list(&self, kind: EntityKind) -> Result<Vec<InventoryItem>> {
        if self.failing_kinds.contains(&kind) {
            return Err(IdentityError::RequestFailed {
                status: 500,
                message: format!("{kind} listing unavailable"),
            }
            .into());
        }
        Ok(self
            .inventory
            .get(&kind)
            .map(|entries| entries.iter().map(|(item, _)| item.clone()).collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl ExportBackend for FakeIdentity {
    async fn submit_export(&self, _: EntityKind, ids: &[ItemId], _: &str) -> Result<JobId> {
        let n = self.submitted.fetch_add(1, Ordering::SeqCst);
        let job = format!("job-{n}");
        self.jobs
            .lock()
            .unwrap()
            .insert(job.clone(), ids[0].to_string());
        Ok(JobId::new(job).unwrap())
    }

    async fn get_status(&self, job_id: &JobId) -> Result<BackendJobStatus> {
        let jobs = self.jobs.lock().unwrap();
        let item = &jobs[job_id.as_str()];
        if self.failing_items.contains(item) {
            Ok(BackendJobStatus::Failed)
        } else {
            Ok(BackendJobStatus::Complete)
        }
    }

    async fn get_result(&self, job_id: &JobId) -> Result<Lookup<Vec<Value>>> {
        let item = self.jobs.lock().unwrap()[job_id.as_str()].clone();
        Ok(match self.object(&item) {
            Some(object) => Lookup::Found(vec![object.clone()]),
            None => Lookup::NotFound(format!("result of {job_id}")),
        })
    }

    async fn get_rule(&self, id: &ItemId) -> Result<Lookup<Value>> {
        Ok(match self.object(id.as_str()) {
            Some(object) => Lookup::Found(object.clone()),
            None => Lookup::NotFound(format!("rule {id}")),
        })
    }
}

#[derive(Debug, Clone)]
pub struct CommitObject {
    pub message: String,
    pub tree: String,
    pub parents: Vec<String>,
}

/// Git host keeping objects in memory, addressed by content hash
///
/// Ref updates are fast-forward only, like the real API without `force`.
#[derive(Default)]
pub struct FakeVcs {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    trees: Mutex<HashMap<String, BTreeMap<String, String>>>,
    commits: Mutex<HashMap<String, CommitObject>>,
    branches: Mutex<HashMap<String, String>>,
    commit_count: AtomicUsize,
    ref_updates: AtomicUsize,
    race_on_commit: AtomicBool,
}

impl FakeVcs {
    /// Repository with `branch` pointing at an empty root commit
    pub fn with_branch(branch: &str) -> Self {
        let vcs = Self::default();
        let tree = vcs.store_tree(BTreeMap::new());
        let root = vcs.store_commit("initial", &tree, Vec::new());
        vcs.branches
            .lock()
            .unwrap()
            .insert(branch.to_string(), root);
        vcs
    }

    /// Another writer advances the branch right after our commit object is made
    pub fn race_on_next_commit(&self) {
        self.race_on_commit.store(true, Ordering::SeqCst);
    }

    pub fn tip(&self, branch: &str) -> Option<String> {
        self.branches.lock().unwrap().get(branch).cloned()
    }

    pub fn commit(&self, sha: &str) -> CommitObject {
        self.commits.lock().unwrap()[sha].clone()
    }

    /// Commits created through the API, excluding the seeded root
    pub fn commits_created(&self) -> usize {
        self.commit_count.load(Ordering::SeqCst).saturating_sub(1)
    }

    pub fn ref_updates(&self) -> usize {
        self.ref_updates.load(Ordering::SeqCst)
    }

    /// Path to content of the tree at the branch tip
    pub fn files_at(&self, branch: &str) -> BTreeMap<String, Vec<u8>> {
        let Some(tip) = self.tip(branch) else {
            return BTreeMap::new();
        };
        let tree = self.commit(&tip).tree;
        let trees = self.trees.lock().unwrap();
        let blobs = self.blobs.lock().unwrap();
        trees[&tree]
            .iter()
            .map(|(path, sha)| (path.clone(), blobs[sha].clone()))
            .collect()
    }

    fn store_tree(&self, entries: BTreeMap<String, String>) -> String {
        let serialized = serde_json::to_vec(&entries).unwrap();
        let sha = digest(&[b"tree".as_slice(), serialized.as_slice()]);
        self.trees.lock().unwrap().insert(sha.clone(), entries);
        sha
    }

    fn store_commit(&self, message: &str, tree: &str, parents: Vec<String>) -> String {
        let n = self.commit_count.fetch_add(1, Ordering::SeqCst);
        let sha = digest(&[
            b"commit".as_slice(),
            message.as_bytes(),
            tree.as_bytes(),
            parents.join(",").as_bytes(),
            n.to_string().as_bytes(),
        ]);
        self.commits.lock().unwrap().insert(
            sha.clone(),
            CommitObject {
                message: message.to_string(),
                tree: tree.to_string(),
                parents,
            },
        );
        sha
    }
}

#[async_trait]
impl VcsHost for FakeVcs {
    async fn get_branch_tip(&self, branch: &str) -> Result<Lookup<String>> {
        Ok(match self.tip(branch) {
            Some(sha) => Lookup::Found(sha),
            None => Lookup::NotFound(format!("branch {branch}")),
        })
    }

    async fn get_commit_tree(&self, commit_sha: &str) -> Result<String> {
        self.commits
            .lock()
            .unwrap()
            .get(commit_sha)
            .map(|c| c.tree.clone())
            .ok_or_else(|| {
                VcsError::RequestFailed {
                    status: 404,
                    message: format!("commit {commit_sha}"),
                }
                .into()
            })
    }

    async fn create_blob(&self, content: &[u8]) -> Result<String> {
        let sha = digest(&[b"blob".as_slice(), content]);
        self.blobs
            .lock()
            .unwrap()
            .insert(sha.clone(), content.to_vec());
        Ok(sha)
    }

    async fn create_tree(&self, base_tree: &str, entries: &[TreeEntry]) -> Result<String> {
        let mut merged = self
            .trees
            .lock()
            .unwrap()
            .get(base_tree)
            .cloned()
            .unwrap_or_default();
        for entry in entries {
            merged.insert(entry.path.clone(), entry.sha.clone());
        }
        Ok(self.store_tree(merged))
    }

    async fn create_commit(
        &self,
        message: &str,
        tree_sha: &str,
        parents: &[String],
    ) -> Result<String> {
        let sha = self.store_commit(message, tree_sha, parents.to_vec());

        if self.race_on_commit.swap(false, Ordering::SeqCst) {
            let foreign = self.store_commit("concurrent push", tree_sha, parents.to_vec());
            for tip in self.branches.lock().unwrap().values_mut() {
                *tip = foreign.clone();
            }
        }

        Ok(sha)
    }

    async fn update_ref(&self, branch: &str, commit_sha: &str) -> Result<()> {
        self.ref_updates.fetch_add(1, Ordering::SeqCst);
        let parents = self.commit(commit_sha).parents;
        let mut branches = self.branches.lock().unwrap();
        let current = branches.get(branch).cloned().unwrap_or_default();

        if !parents.contains(&current) {
            return Err(VcsError::RefUpdateRejected {
                branch: branch.to_string(),
                status: 422,
                message: "Update is not a fast forward".to_string(),
            }
            .into());
        }

        branches.insert(branch.to_string(), commit_sha.to_string());
        Ok(())
    }
}

/// Complete configuration pointing at `export_root`
pub fn test_config(export_root: &Path) -> IdsnapConfig {
    IdsnapConfig {
        application: ApplicationConfig::default(),
        identity: IdentityConfig {
            base_url: "https://acme.api.identitynow.com".to_string(),
            access_token: secret_string("tok".to_string()),
            timeout_seconds: 30,
            page_size: 250,
            kinds: EntityKind::ALL.to_vec(),
            retry: RetryConfig::default(),
        },
        export: ExportConfig {
            export_root: export_root.to_path_buf(),
            workers: 3,
            poll_interval_seconds: 1,
            poll_timeout_seconds: 30,
            shutdown_timeout_secs: 5,
        },
        publish: PublishConfig {
            api_url: "https://api.github.com".to_string(),
            owner: "acme".to_string(),
            repository: "iam-config".to_string(),
            branch: "main".to_string(),
            token: secret_string("ghp".to_string()),
            ignore_file: None,
            ignore_patterns: Vec::new(),
            path_prefix: String::new(),
            commit_message: "Automated export of identity configuration".to_string(),
            blob_concurrency: 4,
            timeout_seconds: 30,
        },
        logging: LoggingConfig::default(),
    }
}
