//! Error types for cnpj-dl
//!
//! The taxonomy separates failures that abort a run (listing fetch, empty
//! listings, configuration) from per-file transfer failures that are
//! contained within that file's retry loop.

use thiserror::Error;

/// Result type alias for cnpj-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for cnpj-dl
///
/// Each variant carries enough context (listing URL, file URL) to diagnose a
/// failure without the underlying network exception detail, though the
/// original error text is preserved where available.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "base_url")
        key: Option<String>,
    },

    /// A directory listing page was unreachable or returned a non-success status
    #[error("failed to fetch listing {url}: {reason}")]
    ListingFetch {
        /// The listing URL that could not be fetched
        url: String,
        /// Why the fetch failed (network error text or HTTP status)
        reason: String,
    },

    /// The root listing parsed cleanly but contained no date-coded folders
    ///
    /// Distinct from [`Error::ListingFetch`]: the page was reachable, the
    /// markup just had nothing matching. Parsing is deterministic, so this is
    /// never retried.
    #[error("no date-coded folders found in listing {url}")]
    NoFoldersFound {
        /// The listing URL that yielded zero folder matches
        url: String,
    },

    /// The folder listing parsed cleanly but contained no downloadable files
    #[error("no .zip/.txt files found in listing {url}")]
    NoFilesFound {
        /// The listing URL that yielded zero file matches
        url: String,
    },

    /// Network or I/O failure mid-download, or a stalled transfer timeout
    ///
    /// Retried up to the per-file budget; on exhaustion recorded as that
    /// file's permanent failure without aborting the run.
    #[error("transfer failed for {url}: {reason}")]
    Transfer {
        /// The file URL whose transfer failed
        url: String,
        /// Why the transfer failed
        reason: String,
    },

    /// Run cancelled by a shutdown signal
    #[error("run cancelled")]
    Cancelled,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// URL composition error
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    /// Returns true if the error is transient and the operation should be retried
    ///
    /// Transfer failures and transient I/O retry; deterministic outcomes
    /// (empty listings, config, URL composition) and cancellation do not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transfer { .. } => true,
            Error::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::Interrupted
            ),
            Error::ListingFetch { .. }
            | Error::NoFoldersFound { .. }
            | Error::NoFilesFound { .. }
            | Error::Config { .. }
            | Error::Cancelled
            | Error::Url(_) => false,
        }
    }
}
