//! Browser session adapter for the JavaScript-rendered wallet analyzer.
//!
//! Provides headless chromium control behind a small capability trait:
//! navigate, wait-for-marker, wait-for-idle, read-document, dispose. The
//! scanning engine depends only on this capability set, never on the
//! automation engine itself.

pub mod engine;
pub mod error;
pub mod session;

pub use engine::BrowserEngine;
pub use error::{BrowserError, Result};
pub use session::{SessionFactory, WalletSession};
