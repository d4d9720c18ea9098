//! Publishing filtered coverage reports to an external service.
//!
//! The upload stage is the only networked part of the runner. It reads the
//! tracefile from its well-known path, drops excluded sections, and POSTs
//! the remaining tracefile text with a digest and labeling metadata. The
//! stage carries no retry logic of its own; its tolerance to service
//! failures is expressed solely through the stage's fault-tolerance flag.

use crate::core::ActionOutcome;
use crate::coverage::{filter_sections, load_sections, render_sections, PathFilter};
use crate::errors::UploadError;
use crate::stages::StageAction;
use crate::trigger::{EventKind, TriggerContext};
use async_trait::async_trait;
use md5::{Digest as _, Md5};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Configuration for the coverage service client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Endpoint the report is POSTed to.
    pub endpoint: String,
    /// Bearer token, if the service requires one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: f64,
}

fn default_timeout() -> f64 {
    30.0
}

impl PublishConfig {
    /// Creates a configuration for the given endpoint.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: None,
            timeout_seconds: default_timeout(),
        }
    }

    /// Sets the bearer token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Gets the timeout as a Duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_seconds)
    }
}

/// One upload: the filtered tracefile text plus labeling metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageUpload {
    /// The event that started the run.
    pub event: EventKind,
    /// Free-text run label, if one was provided.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// MD5 digest of the tracefile text.
    pub digest: String,
    /// The filtered tracefile text.
    pub tracefile: String,
}

impl CoverageUpload {
    /// Creates an upload, computing the digest of the body.
    #[must_use]
    pub fn new(event: EventKind, label: Option<String>, tracefile: String) -> Self {
        let digest = hex::encode(Md5::digest(tracefile.as_bytes()));
        Self {
            event,
            label,
            digest,
            tracefile,
        }
    }
}

/// Trait for coverage service clients.
///
/// Kept narrow so tests can substitute the external service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CoveragePublisher: Send + Sync {
    /// Publishes one upload.
    async fn publish(&self, upload: &CoverageUpload) -> Result<(), UploadError>;
}

/// An HTTP publisher POSTing JSON to the configured endpoint.
#[derive(Debug, Clone)]
pub struct HttpPublisher {
    client: reqwest::Client,
    config: PublishConfig,
}

impl HttpPublisher {
    /// Creates a publisher from the given configuration.
    pub fn new(config: PublishConfig) -> Result<Self, UploadError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl CoveragePublisher for HttpPublisher {
    async fn publish(&self, upload: &CoverageUpload) -> Result<(), UploadError> {
        debug!(endpoint = %self.config.endpoint, digest = %upload.digest, "Publishing coverage report");

        let mut request = self.client.post(&self.config.endpoint).json(upload);
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::Rejected {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

/// The upload stage action: load, filter, publish.
///
/// Load and filter problems surface as failure outcomes exactly like service
/// errors; whether any of them aborts the pipeline is decided by the owning
/// stage's fault-tolerance flag.
pub struct UploadAction {
    tracefile: PathBuf,
    filter: PathFilter,
    publisher: Arc<dyn CoveragePublisher>,
}

impl UploadAction {
    /// Creates an upload action.
    #[must_use]
    pub fn new(
        tracefile: impl AsRef<Path>,
        filter: PathFilter,
        publisher: Arc<dyn CoveragePublisher>,
    ) -> Self {
        Self {
            tracefile: tracefile.as_ref().to_path_buf(),
            filter,
            publisher,
        }
    }
}

impl fmt::Debug for UploadAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadAction")
            .field("tracefile", &self.tracefile)
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl StageAction for UploadAction {
    async fn run(&self, ctx: &TriggerContext) -> ActionOutcome {
        let sections = match load_sections(&self.tracefile) {
            Ok(sections) => sections,
            Err(err) => return ActionOutcome::failure(err.to_string()),
        };

        let (kept, stats) = filter_sections(sections, &self.filter);
        let body = render_sections(&kept);
        let upload = CoverageUpload::new(ctx.event(), ctx.run_label().map(str::to_string), body);

        match self.publisher.publish(&upload).await {
            Ok(()) => ActionOutcome::success(format!(
                "Uploaded {} of {} sections ({} excluded)",
                stats.kept,
                stats.total(),
                stats.dropped
            )),
            Err(err) => ActionOutcome::failure(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trigger::RUN_LABEL_ENV;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    const TRACEFILE: &str = "SF:src/lib.rs\n\
DA:1,5\n\
LF:1\n\
LH:1\n\
end_of_record\n\
SF:bench/foo.rs\n\
DA:10,3\n\
LF:1\n\
LH:1\n\
end_of_record\n";

    fn write_tracefile() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(TRACEFILE.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_publish_config_defaults() {
        let config = PublishConfig::new("https://coverage.example/api/upload");
        assert!(config.token.is_none());
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_upload_digest_is_stable() {
        let a = CoverageUpload::new(EventKind::UpstreamCall, None, "SF:a.rs\n".to_string());
        let b = CoverageUpload::new(EventKind::UpstreamCall, None, "SF:a.rs\n".to_string());
        let c = CoverageUpload::new(EventKind::UpstreamCall, None, "SF:b.rs\n".to_string());

        assert_eq!(a.digest, b.digest);
        assert_ne!(a.digest, c.digest);
        assert_eq!(a.digest.len(), 32);
    }

    #[test]
    fn test_upload_serializes_labeling_fields() {
        let upload = CoverageUpload::new(
            EventKind::UpstreamCall,
            Some("nightly".to_string()),
            String::new(),
        );
        let json = serde_json::to_value(&upload).unwrap();

        assert_eq!(json["event"], "upstream_call");
        assert_eq!(json["label"], "nightly");
        assert!(json["digest"].is_string());
    }

    #[tokio::test]
    async fn test_upload_action_filters_before_publishing() {
        let file = write_tracefile();

        let mut publisher = MockCoveragePublisher::new();
        publisher
            .expect_publish()
            .withf(|upload| {
                upload.tracefile.contains("SF:src/lib.rs")
                    && !upload.tracefile.contains("bench/foo.rs")
            })
            .times(1)
            .returning(|_| Ok(()));

        let action = UploadAction::new(
            file.path(),
            PathFilter::default_excludes(),
            Arc::new(publisher),
        );
        let ctx = TriggerContext::new(EventKind::UpstreamCall);

        let outcome = action.run(&ctx).await;
        assert!(outcome.is_success());
        assert!(outcome.output.contains("1 of 2 sections"));
    }

    #[tokio::test]
    async fn test_upload_action_forwards_the_run_label() {
        let file = write_tracefile();

        let mut publisher = MockCoveragePublisher::new();
        publisher
            .expect_publish()
            .withf(|upload| upload.label.as_deref() == Some("release candidate"))
            .times(1)
            .returning(|_| Ok(()));

        let action = UploadAction::new(file.path(), PathFilter::keep_all(), Arc::new(publisher));
        let ctx = TriggerContext::new(EventKind::UpstreamCall)
            .with_env(RUN_LABEL_ENV, "release candidate");

        assert!(action.run(&ctx).await.is_success());
    }

    #[tokio::test]
    async fn test_service_rejection_is_a_failure_outcome() {
        let file = write_tracefile();

        let mut publisher = MockCoveragePublisher::new();
        publisher
            .expect_publish()
            .returning(|_| Err(UploadError::Rejected { status: 503 }));

        let action = UploadAction::new(file.path(), PathFilter::keep_all(), Arc::new(publisher));
        let ctx = TriggerContext::new(EventKind::UpstreamCall);

        let outcome = action.run(&ctx).await;
        assert!(outcome.is_failure());
        assert!(outcome.error.unwrap().contains("503"));
    }

    #[tokio::test]
    async fn test_missing_tracefile_is_a_failure_outcome() {
        let publisher = MockCoveragePublisher::new();
        let action = UploadAction::new(
            "/nonexistent/coverage.info",
            PathFilter::keep_all(),
            Arc::new(publisher),
        );
        let ctx = TriggerContext::new(EventKind::UpstreamCall);

        let outcome = action.run(&ctx).await;
        assert!(outcome.is_failure());
    }
}
