use thiserror::Error;

pub type Result<T> = std::result::Result<T, BrowserError>;

/// Error text fragments that indicate the remote rendering context is gone
/// and the session must be replaced rather than reused.
const FATAL_SIGNATURES: &[&str] = &[
    "Target closed",
    "Connection closed",
    "Browser closed",
    "Session closed",
    "channel closed",
];

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("chromium error: {0}")]
    ChromiumError(String),

    #[error("navigation failed: {0}")]
    NavigationError(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("session disposed")]
    Disposed,
}

impl BrowserError {
    /// Whether this error means the session is dead and must be replaced.
    ///
    /// Classification is by error text, matching the signatures the CDP
    /// transport reports when the target or connection goes away. Anything
    /// else is a soft, per-page failure on a still-usable session.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        if matches!(self, BrowserError::Disposed) {
            return true;
        }
        let text = self.to_string();
        FATAL_SIGNATURES.iter().any(|sig| text.contains(sig))
    }
}
