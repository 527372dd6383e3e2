//! # cnpj-dl
//!
//! Resilient bulk downloader for the Brazilian CNPJ open data portal.
//!
//! The portal publishes monthly releases as date-coded folders (`yyyy-mm`)
//! in an auto-generated HTML directory index. This crate resolves the most
//! recent folder, downloads the archive files it contains sequentially with
//! bounded retries and linear backoff, verifies completeness by size, and
//! resumes across runs by skipping files already on disk.
//!
//! ## Quick Start
//!
//! ```no_run
//! use cnpj_dl::{Config, PipelineDriver};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let driver = PipelineDriver::new(Config::default())?;
//!
//!     // Subscribe to structured events
//!     let mut events = driver.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("event: {:?}", event);
//!         }
//!     });
//!
//!     let summary = driver.run().await?;
//!     println!("downloaded {} bytes", summary.total_bytes_downloaded());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Per-file fetch orchestration (skip, retry, accounting)
pub mod fetch;
/// Directory-listing parsing
pub mod listing;
/// Pipeline driver composing resolve → list → fetch
pub mod pipeline;
/// Latest-folder resolution
pub mod resolver;
/// Bounded retry with linear backoff
pub mod retry;
/// Single-attempt file transfer
pub mod transfer;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use fetch::FetchOrchestrator;
pub use pipeline::PipelineDriver;
pub use resolver::ListingClient;
pub use retry::{AttemptState, RetryPolicy, Sleeper, TokioSleeper};
pub use transfer::{HttpDownloader, Transport};
pub use types::{DownloadResult, Event, FileOutcome, FileReport, Summary};
