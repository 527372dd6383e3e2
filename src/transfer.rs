//! Single-attempt file transfer
//!
//! One GET per attempt, streamed straight to disk. The expected size is read
//! from the response head before the body is consumed; the whole request,
//! connect through body read, honors the client timeout so a stalled
//! connection cannot hang an attempt. On every failure path the partially
//! written file is removed — a truncated file must never remain, because the
//! orchestrator later treats mere existence as a skip signal.

use crate::error::{Error, Result};
use crate::types::DownloadResult;
use async_trait::async_trait;
use futures::StreamExt;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use url::Url;

/// A single-file download attempt, injectable so the retry orchestration can
/// be tested without a network
#[async_trait]
pub trait Transport: Send + Sync {
    /// Download `url` to `dest` in one attempt
    async fn download(&self, url: &Url, dest: &Path) -> Result<DownloadResult>;
}

/// HTTP transport backed by reqwest
pub struct HttpDownloader {
    client: reqwest::Client,
    cancel: CancellationToken,
}

impl HttpDownloader {
    /// Build a downloader whose requests time out after `timeout`
    pub fn new(timeout: Duration, cancel: CancellationToken) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config {
                message: format!("failed to build HTTP client: {e}"),
                key: Some("timeout_secs".to_string()),
            })?;
        Ok(Self { client, cancel })
    }

    /// Perform one download attempt of `url` to `dest`
    ///
    /// Creates or truncates `dest`, streams the body into it, and reports the
    /// expected byte count (from `Content-Length`, `None` if absent) against
    /// the bytes written. A size mismatch on a completed body is a soft
    /// outcome: the attempt still returns `Ok` and escalation is the
    /// orchestrator's decision.
    pub async fn download_once(&self, url: &Url, dest: &Path) -> Result<DownloadResult> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| transfer_error(url, &e))?;

        if !response.status().is_success() {
            return Err(Error::Transfer {
                url: url.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        // Expected size from the response head, before the body is consumed.
        // Absent means "unknown expected size", not an error.
        let expected = response.content_length();

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    drop(file);
                    remove_partial(dest).await;
                    return Err(Error::Cancelled);
                }
                chunk = stream.next() => match chunk {
                    Some(Ok(bytes)) => {
                        if let Err(e) = file.write_all(&bytes).await {
                            drop(file);
                            remove_partial(dest).await;
                            return Err(Error::Transfer {
                                url: url.to_string(),
                                reason: format!("write failed: {e}"),
                            });
                        }
                        written += bytes.len() as u64;
                    }
                    Some(Err(e)) => {
                        drop(file);
                        remove_partial(dest).await;
                        return Err(transfer_error(url, &e));
                    }
                    None => break,
                }
            }
        }

        if let Err(e) = file.flush().await {
            drop(file);
            remove_partial(dest).await;
            return Err(Error::Transfer {
                url: url.to_string(),
                reason: format!("flush failed: {e}"),
            });
        }

        let result = DownloadResult { expected, written };
        tracing::debug!(url = %url, written, expected = ?expected, "attempt complete");
        Ok(result)
    }
}

#[async_trait]
impl Transport for HttpDownloader {
    async fn download(&self, url: &Url, dest: &Path) -> Result<DownloadResult> {
        self.download_once(url, dest).await
    }
}

fn transfer_error(url: &Url, e: &reqwest::Error) -> Error {
    let reason = if e.is_timeout() {
        format!("timed out: {e}")
    } else if e.is_connect() {
        format!("connection failed: {e}")
    } else {
        e.to_string()
    };
    Error::Transfer {
        url: url.to_string(),
        reason,
    }
}

/// Best-effort removal of a partial file; missing is fine, anything else is
/// logged because a leftover partial would be mistaken for a completed
/// download on the next run.
async fn remove_partial(dest: &Path) {
    if let Err(e) = tokio::fs::remove_file(dest).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %dest.display(), error = %e, "failed to remove partial file");
        }
    }
}
