use scout_browser::BrowserError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScanError>;

/// Per-wallet outcome of the extraction protocol.
///
/// Everything except a fatal [`ScanError::Session`] is recoverable: the
/// worker logs it and moves on to the next wallet on the same session.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Scan context cancelled; the worker stops draining the queue.
    #[error("scan cancelled")]
    Cancelled,

    /// The analyzer page explicitly reported no data for this wallet.
    #[error("no data found")]
    NoData,

    /// The metric section never appeared within the selector timeout.
    #[error("timeout waiting for data")]
    Timeout,

    /// Metrics extracted but the win rate misses the request minimum.
    #[error("winrate {win_rate:.2}% below minimum {minimum:.2}%")]
    BelowWinRate {
        win_rate: f64,
        minimum: f64,
    },

    /// Metrics extracted but the realized PnL misses the request minimum.
    #[error("realized PnL {realized_pnl:.2}% below minimum {minimum:.2}%")]
    BelowRealizedPnl {
        realized_pnl: f64,
        minimum: f64,
    },

    /// Session-level failure. Fatal variants force session replacement.
    #[error("session error: {0}")]
    Session(#[from] BrowserError),
}

impl ScanError {
    /// Whether the owning worker must dispose and replace its session.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, ScanError::Session(e) if e.is_fatal())
    }

    /// Whether this is a quiet per-wallet skip rather than a failure worth
    /// an error-level log line.
    #[must_use]
    pub fn is_soft_skip(&self) -> bool {
        matches!(
            self,
            ScanError::NoData
                | ScanError::Timeout
                | ScanError::BelowWinRate { .. }
                | ScanError::BelowRealizedPnl { .. }
        )
    }
}
