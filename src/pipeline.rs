//! Pipeline driver
//!
//! Composes the stages: ensure the destination directory exists, resolve the
//! latest release folder, list its files, fetch each one, and return the run
//! summary. This is the only component aware of overall run success or
//! failure for exit-status purposes.

use crate::config::Config;
use crate::error::Result;
use crate::fetch::FetchOrchestrator;
use crate::resolver::ListingClient;
use crate::retry::{RetryPolicy, TokioSleeper};
use crate::transfer::HttpDownloader;
use crate::types::{Event, Summary};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Event channel capacity; a subscriber that falls further behind loses old
/// events rather than blocking the pipeline
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// The end-to-end download pipeline
pub struct PipelineDriver {
    config: Config,
    resolver: ListingClient,
    orchestrator: FetchOrchestrator,
    events: broadcast::Sender<Event>,
    cancel: CancellationToken,
}

impl PipelineDriver {
    /// Build a pipeline from configuration
    pub fn new(config: Config) -> Result<Self> {
        let cancel = CancellationToken::new();
        let (events, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let resolver = ListingClient::new(config.timeout())?;
        let transport = Arc::new(HttpDownloader::new(config.timeout(), cancel.clone())?);
        let policy = RetryPolicy {
            max_attempts: config.max_retries,
            backoff: config.backoff(),
        };
        let orchestrator = FetchOrchestrator::new(
            transport,
            Arc::new(TokioSleeper),
            policy,
            config.strict_size_check,
            events.clone(),
            cancel.clone(),
        );

        Ok(Self {
            config,
            resolver,
            orchestrator,
            events,
            cancel,
        })
    }

    /// Subscribe to pipeline events
    ///
    /// Multiple subscribers are supported; each receives all events
    /// independently.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// Token that cancels the run; any in-flight partial file is deleted
    /// before the pipeline returns
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run the pipeline once
    ///
    /// Resolution errors (unreachable listing, no folders, no files) abort
    /// the run; per-file transfer failures are contained in the summary.
    pub async fn run(&self) -> Result<Summary> {
        tokio::fs::create_dir_all(&self.config.download_dir).await?;

        let base_url = self.base_url()?;
        let folder_url = self.resolver.resolve_latest(&base_url).await?;
        let _ = self.events.send(Event::FolderResolved {
            url: folder_url.to_string(),
        });

        let files = self.resolver.list_files(&folder_url).await?;
        let summary = self
            .orchestrator
            .fetch_all(&folder_url, &files, &self.config.download_dir)
            .await?;

        tracing::info!(
            skipped = summary.skipped(),
            succeeded = summary.succeeded(),
            failed = summary.failed(),
            total_bytes = summary.total_bytes_downloaded(),
            "run finished"
        );
        let _ = self.events.send(Event::RunSummary {
            total_bytes: summary.total_bytes_downloaded(),
            skipped: summary.skipped(),
            succeeded: summary.succeeded(),
            failed: summary.failed(),
        });

        Ok(summary)
    }

    /// The configured base URL, normalized to end with a slash so joining a
    /// folder token appends instead of replacing the last path segment
    fn base_url(&self) -> Result<Url> {
        let mut raw = self.config.base_url.clone();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Ok(Url::parse(&raw)?)
    }
}
