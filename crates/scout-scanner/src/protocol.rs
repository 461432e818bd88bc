//! Per-wallet extraction protocol.
//!
//! One pass through this state machine per queued wallet, terminal on the
//! first success, first fatal session fault, or cancellation. Soft
//! failures (`NoData`, `Timeout`, below-threshold) leave the session
//! usable for the next wallet.

use crate::error::{Result, ScanError};
use crate::extractor::{self, extract_realized_pnl, extract_win_rate};
use scout_browser::WalletSession;
use scout_core::{ScanningConfig, WalletId, WalletStats};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Analyzer page, one wallet per URL.
const ANALYZER_URL_BASE: &str = "https://dexcheck.ai/app/wallet-analyzer";

/// Content marker whose presence means the metric section has rendered.
const METRICS_MARKER: &str = "Win Rate";

/// Explicit empty-state marker for unknown or inactive wallets.
const NO_DATA_MARKER: &str = "No data found";

/// Title fragment left while client-side rendering is still in flight.
const LOADING_TITLE_MARKER: &str = "Loading...</title>";

/// Grace period before the single re-read of a still-loading document.
const LOADING_GRACE: Duration = Duration::from_secs(2);

/// Build the analyzer URL for one wallet.
pub(crate) fn wallet_url(wallet: &WalletId) -> String {
    format!("{ANALYZER_URL_BASE}/{wallet}")
}

/// Run the full fetch-wait-parse protocol for one wallet on one session.
pub(crate) async fn analyze_wallet(
    session: &mut dyn WalletSession,
    wallet: &WalletId,
    min_win_rate: f64,
    min_realized_pnl: f64,
    scanning: &ScanningConfig,
    token: &CancellationToken,
) -> Result<WalletStats> {
    if token.is_cancelled() {
        return Err(ScanError::Cancelled);
    }

    let url = wallet_url(wallet);
    tokio::select! {
        () = token.cancelled() => return Err(ScanError::Cancelled),
        res = session.navigate(&url, Duration::from_millis(scanning.page_timeout_ms)) => res?,
    }

    let marker_wait = tokio::select! {
        () = token.cancelled() => return Err(ScanError::Cancelled),
        res = session.wait_for_marker(
            METRICS_MARKER,
            Duration::from_millis(scanning.selector_timeout_ms),
        ) => res,
    };
    if let Err(e) = marker_wait {
        if e.is_fatal() {
            return Err(ScanError::Session(e));
        }
        // Distinguish an empty wallet from a page that never finished
        let html = session.read_document().await.unwrap_or_default();
        if html.contains(NO_DATA_MARKER) {
            return Err(ScanError::NoData);
        }
        return Err(ScanError::Timeout);
    }

    // Advisory settle: loading SVGs are usually replaced by real values
    // once the network goes idle. Failure here is swallowed by contract.
    let idle_wait = tokio::select! {
        () = token.cancelled() => return Err(ScanError::Cancelled),
        res = session.wait_for_idle(
            Duration::from_millis(scanning.load_state_timeout_ms),
        ) => res,
    };
    if let Err(e) = idle_wait {
        tracing::debug!("Idle wait skipped for {}: {}", wallet.short(), e);
    }

    let mut html = session.read_document().await?;
    if html.contains(LOADING_TITLE_MARKER) {
        tokio::time::sleep(LOADING_GRACE).await;
        html = session.read_document().await?;
    }

    let win_rate = extract_win_rate(&html);
    let realized_pnl = extract_realized_pnl(&html);

    if win_rate == 0.0 && realized_pnl == 0.0 {
        tracing::warn!(
            "Zero metrics extracted for {}. HTML snippet: {}",
            wallet,
            extractor::snippet(&html, extractor::SNIPPET_MAX_CHARS)
        );
    }

    if win_rate < min_win_rate {
        return Err(ScanError::BelowWinRate {
            win_rate,
            minimum: min_win_rate,
        });
    }
    if realized_pnl < min_realized_pnl {
        return Err(ScanError::BelowRealizedPnl {
            realized_pnl,
            minimum: min_realized_pnl,
        });
    }

    Ok(WalletStats {
        wallet: wallet.clone(),
        win_rate,
        realized_pnl,
    })
}
