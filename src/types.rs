//! Core types and events for cnpj-dl

use serde::{Deserialize, Serialize};

/// Outcome of a single completed download attempt
///
/// `expected` is `None` when the server did not report `Content-Length`;
/// that is "unknown expected size", not an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadResult {
    /// Byte count the server reported, if any
    pub expected: Option<u64>,
    /// Bytes actually written to disk
    pub written: u64,
}

impl DownloadResult {
    /// `Some(true)` when the written byte count matches the reported size,
    /// `Some(false)` on a mismatch, `None` when the size was unknown.
    pub fn verified(&self) -> Option<bool> {
        self.expected.map(|e| e == self.written)
    }
}

/// Final per-file outcome after the retry loop
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "outcome")]
pub enum FileOutcome {
    /// Destination already existed non-empty; no download attempted and no
    /// verification performed on the pre-existing file
    Skipped {
        /// On-disk size of the pre-existing file
        bytes: u64,
    },
    /// An attempt completed and the file is on disk
    Succeeded {
        /// Bytes written by the successful attempt
        bytes: u64,
        /// Size verification result (`None` when the server reported no size)
        verified: Option<bool>,
        /// Attempts consumed, including the successful one
        attempts: u32,
    },
    /// Every attempt failed; nothing remains on disk
    Failed {
        /// Attempts consumed
        attempts: u32,
        /// Last error text
        error: String,
    },
}

/// One file's entry in the run manifest
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReport {
    /// File name relative to the remote folder
    pub name: String,
    /// What happened to it
    pub outcome: FileOutcome,
}

/// Aggregate result of a pipeline run
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Summary {
    /// Per-file reports in processing order
    pub files: Vec<FileReport>,
}

impl Summary {
    /// Number of files skipped because they were already on disk
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Skipped { .. }))
    }

    /// Number of files downloaded this run
    pub fn succeeded(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Succeeded { .. }))
    }

    /// Number of files whose retry budget was exhausted
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Failed { .. }))
    }

    /// Bytes downloaded this run (succeeded files only)
    pub fn total_bytes_downloaded(&self) -> u64 {
        self.files
            .iter()
            .map(|f| match f.outcome {
                FileOutcome::Succeeded { bytes, .. } => bytes,
                _ => 0,
            })
            .sum()
    }

    /// Bytes on disk for this run's manifest (succeeded + skipped files)
    pub fn bytes_on_disk(&self) -> u64 {
        self.files
            .iter()
            .map(|f| match f.outcome {
                FileOutcome::Succeeded { bytes, .. } | FileOutcome::Skipped { bytes } => bytes,
                FileOutcome::Failed { .. } => 0,
            })
            .sum()
    }

    /// True when no file failed
    pub fn is_complete(&self) -> bool {
        self.failed() == 0
    }

    fn count(&self, pred: impl Fn(&FileOutcome) -> bool) -> usize {
        self.files.iter().filter(|f| pred(&f.outcome)).count()
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "downloaded {} file(s) ({} bytes), skipped {}, failed {}",
            self.succeeded(),
            self.total_bytes_downloaded(),
            self.skipped(),
            self.failed()
        )
    }
}

/// Structured pipeline events
///
/// Emitted on a broadcast channel so any presentation layer (stdout,
/// structured log, UI) can render progress without the core knowing about it.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum Event {
    /// The latest date-coded folder was resolved
    FolderResolved {
        /// Absolute URL of the resolved folder
        url: String,
    },
    /// A file was skipped because it already exists locally
    FileSkipped {
        /// File name
        name: String,
        /// On-disk size of the pre-existing file
        bytes: u64,
    },
    /// A file finished downloading
    FileSucceeded {
        /// File name
        name: String,
        /// Bytes written
        bytes: u64,
        /// Size verification result
        verified: Option<bool>,
    },
    /// A file's retry budget was exhausted
    FileFailed {
        /// File name
        name: String,
        /// Attempts consumed
        attempts: u32,
        /// Last error text
        error: String,
    },
    /// The run finished
    RunSummary {
        /// Bytes downloaded this run
        total_bytes: u64,
        /// Files skipped
        skipped: usize,
        /// Files downloaded
        succeeded: usize,
        /// Files failed
        failed: usize,
    },
}
