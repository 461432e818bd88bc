//! Session capability traits.
//!
//! One [`WalletSession`] wraps one live remote rendering context. A session
//! is exclusively owned by a single worker; when it reports a fatal fault
//! the worker disposes it and asks the [`SessionFactory`] for a fresh one.

use crate::error::Result;
use std::time::Duration;

/// Operations the scanning engine needs from one rendering session.
#[async_trait::async_trait]
pub trait WalletSession: Send {
    /// Load a URL, bounded by `timeout`.
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<()>;

    /// Wait until the rendered document contains `marker`, bounded by
    /// `timeout`.
    async fn wait_for_marker(&mut self, marker: &str, timeout: Duration) -> Result<()>;

    /// Advisory wait for network/render idle. Errors are defined to be
    /// ignorable by the caller; this wait is best effort only.
    async fn wait_for_idle(&mut self, timeout: Duration) -> Result<()>;

    /// Fetch the full rendered document text.
    async fn read_document(&mut self) -> Result<String>;

    /// Tear down the remote context. Best effort; the session must not be
    /// used afterwards.
    async fn dispose(&mut self);
}

/// Creates sessions for workers, both at startup and after a fatal fault.
#[async_trait::async_trait]
pub trait SessionFactory: Send + Sync {
    /// Open a new rendering session.
    async fn create_session(&self) -> Result<Box<dyn WalletSession>>;
}
