//! Shared domain types for the scanning engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque wallet identifier.
///
/// The engine performs no validation or normalization: equality is exact
/// string match and the string is passed through to upstream APIs and the
/// analyzer page as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletId(String);

impl WalletId {
    /// Create a new `WalletId` from any string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for log lines (first 8 characters).
    ///
    /// Truncation counts chars, not bytes: identifiers are opaque and may
    /// contain multibyte text.
    #[must_use]
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((end, _)) => &self.0[..end],
            None => &self.0,
        }
    }
}

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for WalletId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for WalletId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Metrics extracted for one wallet that passed the request thresholds.
///
/// Immutable once created; ownership moves to the aggregator and then to
/// the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletStats {
    /// The wallet the metrics belong to
    pub wallet: WalletId,
    /// Win rate percentage as shown by the analyzer page
    pub win_rate: f64,
    /// Realized PnL percentage as shown by the analyzer page
    pub realized_pnl: f64,
}

/// A request to scan a batch of candidate wallets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRequest {
    /// Candidate wallets, in queue order
    pub wallets: Vec<WalletId>,
    /// Number of parallel workers (each owns one browser session)
    pub concurrency: usize,
    /// Minimum win rate percentage for a wallet to be reported
    pub min_win_rate: f64,
    /// Minimum realized PnL percentage for a wallet to be reported
    pub min_realized_pnl: f64,
}
