//! Latest-folder resolution and folder file listing
//!
//! The portal publishes one date-coded folder per monthly release. The
//! tokens are zero-padded `yyyy-mm`, so lexicographic order equals
//! chronological order — selecting the greatest token selects the most
//! recent release. That equivalence is load-bearing, not accidental.

use crate::error::{Error, Result};
use crate::listing;
use std::time::Duration;
use url::Url;

/// Fetches directory listings and resolves names out of them
pub struct ListingClient {
    client: reqwest::Client,
}

impl ListingClient {
    /// Build a listing client whose requests time out after `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config {
                message: format!("failed to build HTTP client: {e}"),
                key: Some("timeout_secs".to_string()),
            })?;
        Ok(Self { client })
    }

    /// Resolve the most recent date-coded folder under `base_url`
    ///
    /// Returns the absolute folder URL, `base_url` + token + `/`. A network
    /// or HTTP failure is [`Error::ListingFetch`]; a reachable listing with
    /// zero folder matches is [`Error::NoFoldersFound`] — distinct so the
    /// two conditions are diagnosable apart.
    pub async fn resolve_latest(&self, base_url: &Url) -> Result<Url> {
        let html = self.fetch_listing(base_url).await?;

        let mut folders = listing::extract_folders(&html);
        if folders.is_empty() {
            return Err(Error::NoFoldersFound {
                url: base_url.to_string(),
            });
        }

        folders.sort_unstable_by(|a, b| b.cmp(a));
        let latest = &folders[0];
        tracing::info!(folder = %latest, "resolved latest release folder");

        Ok(base_url.join(&format!("{latest}/"))?)
    }

    /// List the `.zip`/`.txt` file names under `folder_url`, deduplicated,
    /// in first-seen order
    pub async fn list_files(&self, folder_url: &Url) -> Result<Vec<String>> {
        let html = self.fetch_listing(folder_url).await?;

        let files = listing::extract_files(&html);
        if files.is_empty() {
            return Err(Error::NoFilesFound {
                url: folder_url.to_string(),
            });
        }
        tracing::info!(count = files.len(), url = %folder_url, "listed release files");
        Ok(files)
    }

    async fn fetch_listing(&self, url: &Url) -> Result<String> {
        let response =
            self.client
                .get(url.clone())
                .send()
                .await
                .map_err(|e| Error::ListingFetch {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;

        if !response.status().is_success() {
            return Err(Error::ListingFetch {
                url: url.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        response.text().await.map_err(|e| Error::ListingFetch {
            url: url.to_string(),
            reason: format!("failed to read body: {e}"),
        })
    }
}
