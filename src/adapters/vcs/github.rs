//! GitHub git-data API client
//!
//! Talks to `/repos/{owner}/{repo}/git/...` with a bearer token. Reads and
//! blob uploads are retried with backoff; tree, commit and ref writes are
//! sent once so a refused ref update surfaces immediately.

use super::models::{
    BlobRequest, CommitRequest, CommitResponse, CreatedObject, RefResponse, TreeItem, TreeRequest,
    UpdateRefRequest, FILE_MODE,
};
use super::traits::{TreeEntry, VcsHost};
use crate::config::{PublishConfig, RetryConfig};
use crate::domain::{IdsnapError, Lookup, Result, VcsError};
use crate::log_retry_attempt;
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::{Client, ClientBuilder, RequestBuilder, Response, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// GitHub client bound to one repository
pub struct GitHubClient {
    /// `{api_url}/repos/{owner}/{repo}/git`
    git_url: String,
    client: Client,
    config: PublishConfig,
    retry: RetryConfig,
}

impl GitHubClient {
    /// Create a client for the repository named in `config`
    pub fn new(config: PublishConfig) -> Result<Self> {
        let git_url = format!(
            "{}/repos/{}/{}/git",
            config.api_url.trim_end_matches('/'),
            config.owner,
            config.repository
        );

        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("idsnap/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                IdsnapError::Configuration(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            git_url,
            client,
            config,
            retry: RetryConfig::default(),
        })
    }

    /// Override the backoff used for reads and blob uploads
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn git_url(&self) -> &str {
        &self.git_url
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        request
            .header(
                reqwest::header::AUTHORIZATION,
                self.config.token.expose_secret().bearer(),
            )
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .send()
            .await
            .map_err(|e| VcsError::ConnectionFailed(e.to_string()).into())
    }

    async fn error_for(response: Response) -> IdsnapError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let err = match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                VcsError::AuthenticationFailed(format!("{status}: {body}"))
            }
            _ => VcsError::RequestFailed {
                status: status.as_u16(),
                message: body,
            },
        };
        err.into()
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T> {
        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }
        response
            .json::<T>()
            .await
            .map_err(|e| VcsError::InvalidResponse(e.to_string()).into())
    }

    /// Retry an idempotent request with exponential backoff
    async fn retry_request<F, T, Fut>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    attempt += 1;
                    // Auth failures will not fix themselves
                    let fatal = matches!(e, IdsnapError::Vcs(VcsError::AuthenticationFailed(_)));
                    if fatal || attempt >= self.retry.max_retries {
                        return Err(e);
                    }

                    let delay_ms = (self.retry.initial_delay_ms as f64
                        * self.retry.backoff_multiplier.powf((attempt - 1) as f64))
                        as u64;
                    let delay_ms = delay_ms.min(self.retry.max_delay_ms);

                    log_retry_attempt!(attempt, self.retry.max_retries, delay_ms, e);

                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
            }
        }
    }
}

#[async_trait]
impl VcsHost for GitHubClient {
    async fn get_branch_tip(&self, branch: &str) -> Result<Lookup<String>> {
        let url = format!("{}/ref/heads/{}", self.git_url, branch);

        self.retry_request(|| async {
            let response = self.send(self.client.get(&url)).await?;
            if response.status() == StatusCode::NOT_FOUND {
                return Ok(Lookup::NotFound(format!("branch {branch}")));
            }
            let parsed: RefResponse = Self::parse(response).await?;
            Ok(Lookup::Found(parsed.object.sha))
        })
        .await
    }

    async fn get_commit_tree(&self, commit_sha: &str) -> Result<String> {
        let url = format!("{}/commits/{}", self.git_url, commit_sha);

        self.retry_request(|| async {
            let response = self.send(self.client.get(&url)).await?;
            let parsed: CommitResponse = Self::parse(response).await?;
            tracing::trace!(commit = %parsed.sha, tree = %parsed.tree.sha, "Resolved base tree");
            Ok(parsed.tree.sha)
        })
        .await
    }

    async fn create_blob(&self, content: &[u8]) -> Result<String> {
        let url = format!("{}/blobs", self.git_url);
        let body = BlobRequest {
            content: general_purpose::STANDARD.encode(content),
            encoding: "base64",
        };

        self.retry_request(|| async {
            let response = self.send(self.client.post(&url).json(&body)).await?;
            let created: CreatedObject = Self::parse(response).await?;
            Ok(created.sha)
        })
        .await
    }

    async fn create_tree(&self, base_tree: &str, entries: &[TreeEntry]) -> Result<String> {
        let url = format!("{}/trees", self.git_url);
        let body = TreeRequest {
            base_tree,
            tree: entries
                .iter()
                .map(|e| TreeItem {
                    path: &e.path,
                    mode: FILE_MODE,
                    kind: "blob",
                    sha: &e.sha,
                })
                .collect(),
        };

        let response = self.send(self.client.post(&url).json(&body)).await?;
        let created: CreatedObject = Self::parse(response).await?;
        Ok(created.sha)
    }

    async fn create_commit(
        &self,
        message: &str,
        tree_sha: &str,
        parents: &[String],
    ) -> Result<String> {
        let url = format!("{}/commits", self.git_url);
        let body = CommitRequest {
            message,
            tree: tree_sha,
            parents,
        };

        let response = self.send(self.client.post(&url).json(&body)).await?;
        let created: CreatedObject = Self::parse(response).await?;
        Ok(created.sha)
    }

    async fn update_ref(&self, branch: &str, commit_sha: &str) -> Result<()> {
        let url = format!("{}/refs/heads/{}", self.git_url, branch);
        let body = UpdateRefRequest {
            sha: commit_sha,
            force: false,
        };

        let response = self.send(self.client.patch(&url).json(&body)).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        // 422 "Update is not a fast forward"; 409 on concurrent ref writes
        if status == StatusCode::UNPROCESSABLE_ENTITY || status == StatusCode::CONFLICT {
            let message = response.text().await.unwrap_or_default();
            return Err(VcsError::RefUpdateRejected {
                branch: branch.to_string(),
                status: status.as_u16(),
                message,
            }
            .into());
        }

        Err(Self::error_for(response).await)
    }
}
