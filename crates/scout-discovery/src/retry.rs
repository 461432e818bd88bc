//! Generic retrying call with exponential backoff and jitter.
//!
//! Retries transport errors, 429, and 5xx. Any other non-2xx status is
//! terminal on the spot. Backoff sleeps are raced against cancellation.

use crate::error::{DiscoveryError, Result};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Base delay doubled on every retry.
const BACKOFF_BASE: Duration = Duration::from_secs(1);

/// Upper bound of the random jitter added to each backoff sleep.
const JITTER_MAX_MS: u64 = 1000;

/// A fully read upstream response.
pub(crate) struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Backoff for the given retry attempt (attempt 1 is the first retry).
fn backoff_delay(attempt: u32) -> Duration {
    let backoff = BACKOFF_BASE * 2u32.saturating_pow(attempt.min(16));
    let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..JITTER_MAX_MS));
    backoff + jitter
}

/// Issue `call` until it yields a 2xx body, a terminal status, or the
/// retry ceiling is hit.
///
/// `call` is invoked once per attempt (`max_retries + 1` times at most)
/// and must perform one complete request.
pub(crate) async fn with_retry<F, Fut>(
    token: &CancellationToken,
    max_retries: u32,
    mut call: F,
) -> Result<Vec<u8>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<HttpResponse>>,
{
    let mut attempt = 0;
    loop {
        let err = match call().await {
            Ok(resp) if (200..300).contains(&resp.status) => return Ok(resp.body),
            Ok(resp) if resp.status == 429 || resp.status >= 500 => {
                DiscoveryError::TransientStatus(resp.status)
            }
            Ok(resp) => {
                return Err(DiscoveryError::Terminal {
                    status: resp.status,
                    body: String::from_utf8_lossy(&resp.body).into_owned(),
                });
            }
            Err(e) if e.is_transient() => e,
            Err(e) => return Err(e),
        };

        attempt += 1;
        if attempt > max_retries {
            return Err(DiscoveryError::Exhausted {
                attempts: attempt,
                source: Box::new(err),
            });
        }

        let delay = backoff_delay(attempt);
        tracing::debug!(
            "Upstream attempt {}/{} failed ({}), retrying in {:?}",
            attempt,
            max_retries + 1,
            err,
            delay
        );
        tokio::select! {
            () = token.cancelled() => return Err(DiscoveryError::Cancelled),
            () = tokio::time::sleep(delay) => {}
        }
    }
}
