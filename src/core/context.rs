//! Per-run context
//!
//! Everything a run needs is passed explicitly through [`RunContext`]
//! rather than read from process-wide state.

use crate::config::IdsnapConfig;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct RunContext {
    /// Correlates every log line of one run
    pub run_id: Uuid,

    pub started_at: DateTime<Utc>,

    pub config: Arc<IdsnapConfig>,
}

impl RunContext {
    pub fn new(config: IdsnapConfig) -> Self {
        Self::with_start(config, Utc::now())
    }

    /// Context with a fixed start time
    pub fn with_start(config: IdsnapConfig, started_at: DateTime<Utc>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at,
            config: Arc::new(config),
        }
    }

    /// Configured message with the run's UTC start appended
    pub fn commit_message(&self) -> String {
        format!(
            "{} ({})",
            self.config.publish.commit_message,
            self.started_at.format("%Y-%m-%d %H:%M:%S")
        )
    }

    /// Span carrying the run id
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!("run", run_id = %self.run_id)
    }

    pub fn dry_run(&self) -> bool {
        self.config.application.dry_run
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        secret_string, ApplicationConfig, ExportConfig, IdentityConfig, LoggingConfig,
        PublishConfig, RetryConfig,
    };
    use crate::domain::EntityKind;
    use chrono::TimeZone;

    fn config() -> IdsnapConfig {
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
            export: ExportConfig::default(),
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

    #[test]
    fn test_commit_message_appends_utc_timestamp() {
        let started = Utc.with_ymd_and_hms(2025, 3, 11, 7, 5, 9).unwrap();
        let ctx = RunContext::with_start(config(), started);

        assert_eq!(
            ctx.commit_message(),
            "Automated export of identity configuration (2025-03-11 07:05:09)"
        );
    }

    #[test]
    fn test_each_run_gets_its_own_id() {
        assert_ne!(RunContext::new(config()).run_id, RunContext::new(config()).run_id);
    }
}
