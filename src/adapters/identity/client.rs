//! Identity platform REST client
//!
//! [`IdentityClient`] implements both [`InventorySource`] and [`ExportBackend`]
//! over the platform's HTTP API with a bearer access token.

use super::models::{ExportDownload, ExportJobResponse, ExportPayload, ListedObject};
use super::traits::{BackendJobStatus, ExportBackend, InventorySource};
use crate::config::IdentityConfig;
use crate::domain::{
    EntityKind, IdentityError, IdsnapError, InventoryItem, ItemId, JobId, Lookup, Result,
};
use crate::log_retry_attempt;
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, RequestBuilder, Response, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Identity platform client
///
/// # Example
///
/// ```no_run
/// use idsnap::adapters::identity::{IdentityClient, InventorySource};
/// use idsnap::config::load_config;
/// use idsnap::domain::EntityKind;
///
/// # async fn example() -> idsnap::domain::Result<()> {
/// let config = load_config("idsnap.toml")?;
/// let client = IdentityClient::new(config.identity)?;
/// let roles = client.list(EntityKind::Role).await?;
/// # Ok(())
/// # }
/// ```
pub struct IdentityClient {
    /// Base URL without trailing slash
    base_url: String,

    /// HTTP client for making requests
    client: Client,

    config: IdentityConfig,
}

impl IdentityClient {
    /// Create a new client from configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built.
    pub fn new(config: IdentityConfig) -> Result<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();

        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(30))
            .user_agent(concat!("idsnap/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                IdsnapError::Configuration(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            base_url,
            client,
            config,
        })
    }

    /// Base URL of the tenant API
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List endpoint for a kind
    fn list_path(kind: EntityKind) -> &'static str {
        match kind {
            EntityKind::Role => "/v3/roles",
            EntityKind::Source => "/v3/sources",
            EntityKind::Workflow => "/v3/workflows",
            EntityKind::Transform => "/v3/transforms",
            EntityKind::AccessProfile => "/v3/access-profiles",
            EntityKind::ServiceDeskIntegration => "/v3/service-desk-integrations",
            EntityKind::IdentityProfile => "/v3/identity-profiles",
            EntityKind::Rule => "/beta/connector-rules",
        }
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(
                reqwest::header::AUTHORIZATION,
                self.config.access_token.expose_secret().bearer(),
            )
            .header(reqwest::header::ACCEPT, "application/json")
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        self.authorized(request)
            .send()
            .await
            .map_err(|e| IdentityError::ConnectionFailed(e.to_string()).into())
    }

    /// Turns a non-success response into an error, keeping the body for context
    async fn error_for(response: Response) -> IdsnapError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let err = match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                IdentityError::AuthenticationFailed(format!("{status}: {body}"))
            }
            _ => IdentityError::RequestFailed {
                status: status.as_u16(),
                message: body,
            },
        };
        err.into()
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| IdentityError::InvalidResponse(e.to_string()).into())
    }

    /// GET returning `NotFound` on 404
    async fn get_lookup<T: DeserializeOwned>(&self, path: &str, what: String) -> Result<Lookup<T>> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.send(self.client.get(&url)).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(Lookup::NotFound(what)),
            status if status.is_success() => Ok(Lookup::Found(Self::parse(response).await?)),
            _ => Err(Self::error_for(response).await),
        }
    }

    /// Retry a request with exponential backoff
    async fn retry_request<F, T, Fut>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let retry = &self.config.retry;
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    attempt += 1;
                    if attempt >= retry.max_retries {
                        return Err(e);
                    }

                    let delay_ms = (retry.initial_delay_ms as f64
                        * retry.backoff_multiplier.powf((attempt - 1) as f64))
                        as u64;
                    let delay_ms = delay_ms.min(retry.max_delay_ms);

                    log_retry_attempt!(attempt, retry.max_retries, delay_ms, e);

                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
            }
        }
    }

    async fn list_page(&self, kind: EntityKind, offset: usize) -> Result<Vec<ListedObject>> {
        let url = format!("{}{}", self.base_url, Self::list_path(kind));
        let limit = self.config.page_size.to_string();
        let offset = offset.to_string();

        self.retry_request(|| async {
            let request = self
                .client
                .get(&url)
                .query(&[("limit", limit.as_str()), ("offset", offset.as_str())]);
            let response = self.send(request).await?;
            if !response.status().is_success() {
                return Err(Self::error_for(response).await);
            }
            Self::parse::<Vec<ListedObject>>(response).await
        })
        .await
    }
}

#[async_trait]
impl InventorySource for IdentityClient {
    async fn list(&self, kind: EntityKind) -> Result<Vec<InventoryItem>> {
        let page_size = self.config.page_size;
        let mut items = Vec::new();
        let mut offset = 0;

        loop {
            let page = self.list_page(kind, offset).await?;
            let page_len = page.len();

            for listed in page {
                let Some(raw_id) = listed.id else {
                    tracing::warn!(kind = %kind, name = ?listed.name, "Skipping listed object without id");
                    continue;
                };
                match ItemId::new(raw_id.clone()) {
                    Ok(id) => {
                        let name = listed.name.unwrap_or_else(|| raw_id.clone());
                        items.push(InventoryItem::new(kind, id, name));
                    }
                    Err(e) => {
                        tracing::warn!(kind = %kind, error = %e, "Skipping invalid item id");
                    }
                }
            }

            if page_len < page_size {
                break;
            }
            offset += page_size;
        }

        tracing::debug!(kind = %kind, count = items.len(), "Listed inventory items");
        Ok(items)
    }
}

#[async_trait]
impl ExportBackend for IdentityClient {
    async fn submit_export(
        &self,
        kind: EntityKind,
        ids: &[ItemId],
        description: &str,
    ) -> Result<JobId> {
        let url = format!("{}/beta/sp-config/export", self.base_url);
        let payload = ExportPayload::scoped(kind, ids, description);

        let response = self.send(self.client.post(&url).json(&payload)).await?;
        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }

        let job: ExportJobResponse = Self::parse(response).await?;
        JobId::new(job.job_id)
            .map_err(|e| IdentityError::InvalidResponse(format!("Export job id: {e}")).into())
    }

    async fn get_status(&self, job_id: &JobId) -> Result<BackendJobStatus> {
        let url = format!("{}/beta/sp-config/export/{}", self.base_url, job_id);

        let response = self.send(self.client.get(&url)).await?;
        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }

        let job: ExportJobResponse = Self::parse(response).await?;
        let wire = job.status.unwrap_or_default();
        BackendJobStatus::from_wire(&wire).ok_or_else(|| {
            IdentityError::InvalidResponse(format!("Unknown export job status '{wire}'")).into()
        })
    }

    async fn get_result(&self, job_id: &JobId) -> Result<Lookup<Vec<Value>>> {
        let path = format!("/beta/sp-config/export/{job_id}/download");
        let download: Lookup<ExportDownload> = self
            .get_lookup(&path, format!("export result for job {job_id}"))
            .await?;
        Ok(download.map(|d| d.objects))
    }

    async fn get_rule(&self, id: &ItemId) -> Result<Lookup<Value>> {
        let path = format!("/beta/connector-rules/{id}");
        self.get_lookup(&path, format!("connector rule {id}")).await
    }
}
