//! Worker pool dispatcher.
//!
//! `WalletScanner::scan` caps and enqueues the candidate batch, runs N
//! session-owning workers until the queue drains (or the scan is
//! cancelled), and returns the aggregated results in arrival order.

use crate::error::ScanError;
use crate::protocol;
use crate::sink::ResultSink;
use scout_browser::SessionFactory;
use scout_core::{ScanRequest, ScanningConfig, WalletId, WalletStats};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

/// Hard cap on wallets per scan cycle. Requests beyond it are truncated,
/// not rejected.
pub const MAX_WALLETS_PER_SCAN: usize = 50;

/// Concurrent scanning engine over a shared wallet queue.
pub struct WalletScanner {
    factory: Arc<dyn SessionFactory>,
    scanning: ScanningConfig,
}

impl WalletScanner {
    /// Create a scanner backed by the given session factory.
    #[must_use]
    pub fn new(factory: Arc<dyn SessionFactory>, scanning: ScanningConfig) -> Self {
        Self { factory, scanning }
    }

    /// Scan the requested wallets and return every result that cleared the
    /// thresholds, in completion order.
    ///
    /// Blocks until all workers have exited. Per-wallet failures and
    /// session faults are handled inside the workers and never surface
    /// here; cancellation returns whatever was collected so far. A worker
    /// that cannot obtain a session logs and exits without aborting the
    /// scan, so the result set may simply be smaller than requested.
    pub async fn scan(
        &self,
        token: CancellationToken,
        mut request: ScanRequest,
        sink: Option<Arc<dyn ResultSink>>,
    ) -> Vec<WalletStats> {
        if request.wallets.len() > MAX_WALLETS_PER_SCAN {
            tracing::warn!(
                "Limiting scan to {} wallets (requested {})",
                MAX_WALLETS_PER_SCAN,
                request.wallets.len()
            );
            request.wallets.truncate(MAX_WALLETS_PER_SCAN);
        }

        // Populate fully, then drop the sender: workers detect exhaustion
        // through channel closure, no separate termination signal needed.
        let (tx, rx) = mpsc::channel(request.wallets.len().max(1));
        for wallet in request.wallets.drain(..) {
            // Channel is sized to the batch, send cannot block here
            let _ = tx.send(wallet).await;
        }
        drop(tx);

        let queue = Arc::new(Mutex::new(rx));
        let results = Arc::new(Mutex::new(Vec::new()));
        let concurrency = request.concurrency.max(1);

        let mut handles = Vec::with_capacity(concurrency);
        for id in 0..concurrency {
            let worker = Worker {
                id,
                factory: Arc::clone(&self.factory),
                queue: Arc::clone(&queue),
                results: Arc::clone(&results),
                sink: sink.clone(),
                scanning: self.scanning.clone(),
                min_win_rate: request.min_win_rate,
                min_realized_pnl: request.min_realized_pnl,
                token: token.clone(),
            };
            handles.push(tokio::spawn(worker.run()));
        }

        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!("Worker task failed to join: {}", e);
            }
        }

        match Arc::try_unwrap(results) {
            Ok(mutex) => mutex.into_inner(),
            // Unreachable once every worker has joined, but cloning is a
            // correct fallback
            Err(arc) => arc.lock().await.clone(),
        }
    }
}

/// One queue-draining worker and everything it shares with the pool.
struct Worker {
    id: usize,
    factory: Arc<dyn SessionFactory>,
    queue: Arc<Mutex<mpsc::Receiver<WalletId>>>,
    results: Arc<Mutex<Vec<WalletStats>>>,
    sink: Option<Arc<dyn ResultSink>>,
    scanning: ScanningConfig,
    min_win_rate: f64,
    min_realized_pnl: f64,
    token: CancellationToken,
}

impl Worker {
    async fn run(self) {
        let mut session = match self.factory.create_session().await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!("Worker {}: failed to create session: {}", self.id, e);
                return;
            }
        };

        loop {
            if self.token.is_cancelled() {
                break;
            }
            let Some(wallet) = self.next_wallet().await else {
                break;
            };

            match protocol::analyze_wallet(
                session.as_mut(),
                &wallet,
                self.min_win_rate,
                self.min_realized_pnl,
                &self.scanning,
                &self.token,
            )
            .await
            {
                Ok(stats) => {
                    tracing::info!(
                        "Worker {}: {} - WR: {:.2}%, PnL: {:.2}%",
                        self.id,
                        wallet.short(),
                        stats.win_rate,
                        stats.realized_pnl
                    );
                    self.accept(stats).await;
                }
                Err(ScanError::Cancelled) => break,
                Err(e) if e.is_fatal() => {
                    // The triggering wallet is dropped, not requeued
                    tracing::warn!(
                        "Worker {}: session fault on {}, replacing session: {}",
                        self.id,
                        wallet.short(),
                        e
                    );
                    session.dispose().await;
                    session = match self.factory.create_session().await {
                        Ok(session) => session,
                        Err(e) => {
                            tracing::error!(
                                "Worker {}: failed to recreate session: {}",
                                self.id,
                                e
                            );
                            return;
                        }
                    };
                }
                Err(e) if e.is_soft_skip() => {
                    tracing::info!("Worker {}: skipping {}: {}", self.id, wallet.short(), e);
                }
                Err(e) => {
                    tracing::error!("Worker {}: error analyzing {}: {}", self.id, wallet, e);
                }
            }
        }

        session.dispose().await;
    }

    async fn next_wallet(&self) -> Option<WalletId> {
        self.queue.lock().await.recv().await
    }

    /// Append under the accumulator lock, then notify the sink outside it.
    async fn accept(&self, stats: WalletStats) {
        {
            let mut results = self.results.lock().await;
            results.push(stats.clone());
        }
        if let Some(sink) = &self.sink {
            sink.on_result(&stats);
        }
    }
}
