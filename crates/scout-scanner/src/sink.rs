//! Streaming result observer.

use scout_core::WalletStats;

/// Consumer notified synchronously as each accepted result is appended.
///
/// Called from worker tasks, so implementations must be fast and must not
/// block: a slow sink stalls the worker that produced the result. Failures
/// belong to the integrator; the dispatcher never inspects the outcome.
pub trait ResultSink: Send + Sync {
    /// Observe one accepted result. Invoked after the result has been
    /// appended to the aggregated set.
    fn on_result(&self, stats: &WalletStats);
}

impl<F> ResultSink for F
where
    F: Fn(&WalletStats) + Send + Sync,
{
    fn on_result(&self, stats: &WalletStats) {
        self(stats);
    }
}
