//! Per-file fetch orchestration
//!
//! Drives the skip/retry/accounting loop over a folder's files. Files are
//! processed strictly sequentially, one at a time — a politeness choice
//! toward the origin server, not an implementation limit. Each file is
//! carried to completion (skip, success, or exhausted retries) before the
//! next begins, and a per-file failure never aborts the run.

use crate::error::{Error, Result};
use crate::retry::{RetryPolicy, Sleeper, run_with_retry};
use crate::transfer::Transport;
use crate::types::{Event, FileOutcome, FileReport, Summary};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Orchestrates the download of every file in a release folder
pub struct FetchOrchestrator {
    transport: Arc<dyn Transport>,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
    strict_size_check: bool,
    events: broadcast::Sender<Event>,
    cancel: CancellationToken,
}

impl FetchOrchestrator {
    /// Build an orchestrator over an injectable transport and sleeper
    pub fn new(
        transport: Arc<dyn Transport>,
        sleeper: Arc<dyn Sleeper>,
        policy: RetryPolicy,
        strict_size_check: bool,
        events: broadcast::Sender<Event>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            transport,
            sleeper,
            policy,
            strict_size_check,
            events,
            cancel,
        }
    }

    /// Fetch every file in `files` from `folder_url` into `dest_dir`
    ///
    /// A destination that already exists non-empty is recorded as skipped
    /// with no verification of the pre-existing content — re-running the
    /// pipeline is the resume mechanism. Cancellation aborts the run between
    /// files and attempts; everything processed so far keeps its outcome.
    pub async fn fetch_all(
        &self,
        folder_url: &Url,
        files: &[String],
        dest_dir: &Path,
    ) -> Result<Summary> {
        let mut summary = Summary::default();

        for name in files {
            if self.cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let outcome = self.fetch_one(folder_url, name, dest_dir).await?;
            summary.files.push(FileReport {
                name: name.clone(),
                outcome,
            });
        }

        Ok(summary)
    }

    async fn fetch_one(
        &self,
        folder_url: &Url,
        name: &str,
        dest_dir: &Path,
    ) -> Result<FileOutcome> {
        let dest = dest_dir.join(name);

        // A non-empty destination is treated as already downloaded, with no
        // integrity check on the pre-existing file.
        if let Ok(meta) = tokio::fs::metadata(&dest).await {
            if meta.is_file() && meta.len() > 0 {
                tracing::info!(file = name, bytes = meta.len(), "already on disk, skipping");
                let _ = self.events.send(Event::FileSkipped {
                    name: name.to_string(),
                    bytes: meta.len(),
                });
                return Ok(FileOutcome::Skipped { bytes: meta.len() });
            }
        }

        let url = folder_url.join(name)?;
        tracing::info!(file = name, url = %url, "downloading");

        let transport = self.transport.clone();
        let strict = self.strict_size_check;
        let (result, attempts) = run_with_retry(&self.policy, self.sleeper.as_ref(), |_attempt| {
            let transport = transport.clone();
            let url = url.clone();
            let dest = dest.clone();
            async move {
                let result = transport.download(&url, &dest).await?;
                if result.verified() == Some(false) {
                    if strict {
                        // Strict mode escalates the soft mismatch to a failed
                        // attempt; the completed-but-short file must not
                        // survive as a skip signal.
                        let _ = tokio::fs::remove_file(&dest).await;
                        return Err(Error::Transfer {
                            url: url.to_string(),
                            reason: format!(
                                "size mismatch: expected {:?}, wrote {}",
                                result.expected, result.written
                            ),
                        });
                    }
                    tracing::warn!(
                        url = %url,
                        expected = ?result.expected,
                        written = result.written,
                        "size mismatch on completed transfer"
                    );
                }
                Ok(result)
            }
        })
        .await;

        match result {
            Ok(result) => {
                tracing::info!(file = name, bytes = result.written, attempts, "downloaded");
                let _ = self.events.send(Event::FileSucceeded {
                    name: name.to_string(),
                    bytes: result.written,
                    verified: result.verified(),
                });
                Ok(FileOutcome::Succeeded {
                    bytes: result.written,
                    verified: result.verified(),
                    attempts,
                })
            }
            Err(Error::Cancelled) => Err(Error::Cancelled),
            Err(e) => {
                tracing::error!(file = name, attempts, error = %e, "giving up on file");
                let _ = self.events.send(Event::FileFailed {
                    name: name.to_string(),
                    attempts,
                    error: e.to_string(),
                });
                Ok(FileOutcome::Failed {
                    attempts,
                    error: e.to_string(),
                })
            }
        }
    }
}
