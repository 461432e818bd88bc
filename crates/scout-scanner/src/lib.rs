//! Scout Scanner - Concurrent wallet scanning and extraction engine.
//!
//! This crate drives a bounded pool of session-owning workers over a shared
//! queue of candidate wallets. Each worker runs a fetch-wait-parse protocol
//! against the JavaScript-rendered analyzer page through its exclusively
//! owned browser session, extracts two metrics, and reports wallets that
//! clear the request thresholds.
//!
//! # Features
//!
//! - Fixed worker pool with a pre-closed work queue for exhaustion detection
//! - Per-worker session ownership with self-healing replacement on fatal
//!   session faults
//! - Soft-skip taxonomy (no-data, timeout, below-threshold) that never
//!   aborts the scan
//! - Cooperative cancellation that preserves already-collected results
//! - Optional synchronous per-result observer
//!
//! # Example
//!
//! ```rust,ignore
//! use scout_scanner::WalletScanner;
//! use std::sync::Arc;
//!
//! let scanner = WalletScanner::new(Arc::new(browser_engine), config.scanning);
//! let results = scanner.scan(token, request, None).await;
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod dispatcher;
pub mod error;
pub mod extractor;
mod protocol;
pub mod sink;

// Re-export commonly used types
pub use dispatcher::{WalletScanner, MAX_WALLETS_PER_SCAN};
pub use error::{Result, ScanError};
pub use extractor::{extract_realized_pnl, extract_win_rate};
pub use sink::ResultSink;
