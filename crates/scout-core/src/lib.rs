//! Scout Core - Foundation crate for the Walletscout scanning engine.
//!
//! This crate provides the shared types, configuration management, and
//! error types that the scanner, browser, and discovery crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Configuration error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Shared domain types (`WalletId`, `WalletStats`, `ScanRequest`)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{
    AppConfig, BrowserConfig, DiscoveryConfig, FilterConfig, ScanningConfig, TokenSource,
};
pub use error::{ConfigError, ConfigResult};
pub use types::{ScanRequest, WalletId, WalletStats};
