//! Worker pool tests against scripted mock sessions.

use async_trait::async_trait;
use scout_browser::{BrowserError, SessionFactory, WalletSession};
use scout_core::{ScanRequest, ScanningConfig, WalletId, WalletStats};
use scout_scanner::{ResultSink, WalletScanner};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// What a mock session does for one wallet's page.
#[derive(Debug, Clone)]
enum PageBehavior {
    /// Serve this document; the marker wait succeeds if it contains the
    /// metric section.
    Html(String),
    /// Session dies during navigation with a fatal transport signature.
    FatalOnNavigate,
    /// Serve the analyzer's explicit empty state.
    NoData,
    /// Serve a page where the metric section never appears.
    Stuck,
    /// First document read sees a still-loading title, subsequent reads
    /// see this document.
    LoadingThenHtml(String),
}

struct MockFactory {
    default: PageBehavior,
    overrides: HashMap<String, PageBehavior>,
    sessions_created: AtomicUsize,
    document_reads: AtomicUsize,
    fail_create: bool,
}

impl MockFactory {
    fn serving(default: PageBehavior) -> Self {
        Self {
            default,
            overrides: HashMap::new(),
            sessions_created: AtomicUsize::new(0),
            document_reads: AtomicUsize::new(0),
            fail_create: false,
        }
    }

    fn with_override(mut self, wallet: &str, behavior: PageBehavior) -> Self {
        self.overrides.insert(wallet.to_string(), behavior);
        self
    }

    fn failing() -> Self {
        let mut factory = Self::serving(PageBehavior::Stuck);
        factory.fail_create = true;
        factory
    }

    fn sessions_created(&self) -> usize {
        self.sessions_created.load(Ordering::SeqCst)
    }

    fn document_reads(&self) -> usize {
        self.document_reads.load(Ordering::SeqCst)
    }

    fn behavior_for(&self, url: &str) -> PageBehavior {
        let wallet = url.rsplit('/').next().unwrap_or_default();
        self.overrides
            .get(wallet)
            .cloned()
            .unwrap_or_else(|| self.default.clone())
    }
}

/// Local newtype so the foreign `SessionFactory` trait can be implemented
/// for a shared `MockFactory` handle without violating the orphan rule.
struct MockFactoryHandle(Arc<MockFactory>);

#[async_trait]
impl SessionFactory for MockFactoryHandle {
    async fn create_session(&self) -> scout_browser::Result<Box<dyn WalletSession>> {
        if self.0.fail_create {
            return Err(BrowserError::ChromiumError("launch failed".to_string()));
        }
        self.0.sessions_created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockSession {
            factory: Arc::clone(&self.0),
            current: None,
            reads: 0,
        }))
    }
}

struct MockSession {
    factory: Arc<MockFactory>,
    current: Option<PageBehavior>,
    reads: usize,
}

impl MockSession {
    fn document(&self) -> String {
        match &self.current {
            Some(PageBehavior::Html(html)) => html.clone(),
            Some(PageBehavior::NoData) => "<div>No data found</div>".to_string(),
            Some(PageBehavior::LoadingThenHtml(html)) => {
                if self.reads == 0 {
                    // Marker is present, but rendering hasn't finished
                    "<html><head><title>Loading...</title></head>\
                     <body><h3>Win Rate</h3><p>rendering</p></body></html>"
                        .to_string()
                } else {
                    html.clone()
                }
            }
            _ => "<html><body></body></html>".to_string(),
        }
    }
}

#[async_trait]
impl WalletSession for MockSession {
    async fn navigate(&mut self, url: &str, _timeout: Duration) -> scout_browser::Result<()> {
        let behavior = self.factory.behavior_for(url);
        if matches!(behavior, PageBehavior::FatalOnNavigate) {
            return Err(BrowserError::ChromiumError("Target closed".to_string()));
        }
        self.current = Some(behavior);
        self.reads = 0;
        Ok(())
    }

    async fn wait_for_marker(
        &mut self,
        marker: &str,
        _timeout: Duration,
    ) -> scout_browser::Result<()> {
        if self.document().contains(marker) {
            Ok(())
        } else {
            Err(BrowserError::Timeout(format!("marker '{marker}' not found")))
        }
    }

    async fn wait_for_idle(&mut self, _timeout: Duration) -> scout_browser::Result<()> {
        Ok(())
    }

    async fn read_document(&mut self) -> scout_browser::Result<String> {
        let doc = self.document();
        self.reads += 1;
        self.factory.document_reads.fetch_add(1, Ordering::SeqCst);
        Ok(doc)
    }

    async fn dispose(&mut self) {
        self.current = None;
    }
}

fn analyzer_html(win_rate: f64, realized_pnl: f64) -> PageBehavior {
    PageBehavior::Html(format!(
        r#"<html><body><h3>Win Rate</h3><p class="text-2xl">{win_rate:.2}%</p><p>Realized</p><p>$100.00 <span>({realized_pnl:.2}%)</span></p></body></html>"#
    ))
}

fn loading_then(win_rate: f64, realized_pnl: f64) -> PageBehavior {
    let PageBehavior::Html(html) = analyzer_html(win_rate, realized_pnl) else {
        unreachable!()
    };
    PageBehavior::LoadingThenHtml(html)
}

fn request(wallets: &[&str], concurrency: usize) -> ScanRequest {
    ScanRequest {
        wallets: wallets.iter().map(|w| WalletId::new(*w)).collect(),
        concurrency,
        min_win_rate: 50.0,
        min_realized_pnl: 0.0,
    }
}

fn scanner(factory: &Arc<MockFactory>) -> WalletScanner {
    WalletScanner::new(
        Arc::new(MockFactoryHandle(Arc::clone(factory))),
        ScanningConfig::default(),
    )
}

#[tokio::test]
async fn test_collects_passing_wallets() {
    let factory = Arc::new(MockFactory::serving(analyzer_html(65.5, 12.0)));
    let results = scanner(&factory)
        .scan(CancellationToken::new(), request(&["w1", "w2", "w3"], 2), None)
        .await;

    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| (r.win_rate - 65.5).abs() < f64::EPSILON));
    let wallets: Vec<&str> = results.iter().map(|r| r.wallet.as_str()).collect();
    assert!(wallets.contains(&"w1") && wallets.contains(&"w2") && wallets.contains(&"w3"));
}

#[tokio::test]
async fn test_truncates_oversized_batch() {
    let names: Vec<String> = (0..60).map(|i| format!("wallet-{i}")).collect();
    let wallets: Vec<&str> = names.iter().map(String::as_str).collect();

    let factory = Arc::new(MockFactory::serving(analyzer_html(80.0, 5.0)));
    let results = scanner(&factory)
        .scan(CancellationToken::new(), request(&wallets, 4), None)
        .await;

    // Exactly the first 50 are processed, the rest are discarded
    assert_eq!(results.len(), 50);
    assert!(!results.iter().any(|r| r.wallet.as_str() == "wallet-50"));
}

#[tokio::test]
async fn test_threshold_filter_is_iff() {
    let factory = MockFactory::serving(analyzer_html(80.0, 5.0))
        // Exactly at both minimums: accepted
        .with_override("at-minimum", analyzer_html(50.0, 0.0))
        .with_override("low-wr", analyzer_html(49.99, 10.0))
        .with_override("low-pnl", analyzer_html(90.0, -0.01));
    let factory = Arc::new(factory);

    let results = scanner(&factory)
        .scan(
            CancellationToken::new(),
            request(&["at-minimum", "low-wr", "low-pnl", "good"], 1),
            None,
        )
        .await;

    let wallets: Vec<&str> = results.iter().map(|r| r.wallet.as_str()).collect();
    assert_eq!(wallets, vec!["at-minimum", "good"]);
}

#[tokio::test]
async fn test_session_fault_replaces_session_and_drops_wallet() {
    let factory = MockFactory::serving(analyzer_html(70.0, 3.0))
        .with_override("poison", PageBehavior::FatalOnNavigate);
    let factory = Arc::new(factory);

    let results = scanner(&factory)
        .scan(
            CancellationToken::new(),
            request(&["before", "poison", "after"], 1),
            None,
        )
        .await;

    // The faulting wallet is dropped, not requeued; the ones around it
    // are processed on the original and replacement sessions
    let wallets: Vec<&str> = results.iter().map(|r| r.wallet.as_str()).collect();
    assert_eq!(wallets, vec!["before", "after"]);
    assert_eq!(factory.sessions_created(), 2);
}

#[tokio::test]
async fn test_no_data_and_stuck_pages_are_soft_skips() {
    let factory = MockFactory::serving(analyzer_html(70.0, 3.0))
        .with_override("unknown", PageBehavior::NoData)
        .with_override("frozen", PageBehavior::Stuck);
    let factory = Arc::new(factory);

    let results = scanner(&factory)
        .scan(
            CancellationToken::new(),
            request(&["unknown", "frozen", "good"], 1),
            None,
        )
        .await;

    let wallets: Vec<&str> = results.iter().map(|r| r.wallet.as_str()).collect();
    assert_eq!(wallets, vec!["good"]);
    // Soft skips never cost a session
    assert_eq!(factory.sessions_created(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_still_loading_title_gets_one_grace_reread() {
    let factory = MockFactory::serving(analyzer_html(70.0, 3.0))
        .with_override("slow-render", loading_then(62.0, 8.0));
    let factory = Arc::new(factory);

    let results = scanner(&factory)
        .scan(CancellationToken::new(), request(&["slow-render"], 1), None)
        .await;

    // Accepted from the document served after the grace period
    assert_eq!(results.len(), 1);
    assert!((results[0].win_rate - 62.0).abs() < f64::EPSILON);
    // One initial read plus exactly one re-read
    assert_eq!(factory.document_reads(), 2);
}

#[tokio::test]
async fn test_sink_sees_every_accepted_result() {
    let factory = Arc::new(MockFactory::serving(analyzer_html(60.0, 1.0)));
    let seen: Arc<Mutex<Vec<WalletStats>>> = Arc::new(Mutex::new(Vec::new()));
    let seen_by_sink = Arc::clone(&seen);
    let sink: Arc<dyn ResultSink> = Arc::new(move |stats: &WalletStats| {
        seen_by_sink.lock().expect("sink lock").push(stats.clone());
    });

    let results = scanner(&factory)
        .scan(
            CancellationToken::new(),
            request(&["w1", "w2", "w3", "w4"], 2),
            Some(sink),
        )
        .await;

    let seen = seen.lock().expect("seen lock");
    assert_eq!(seen.len(), results.len());
    assert_eq!(seen.len(), 4);
}

#[tokio::test]
async fn test_pre_cancelled_scan_returns_promptly_and_empty() {
    let factory = Arc::new(MockFactory::serving(analyzer_html(60.0, 1.0)));
    let token = CancellationToken::new();
    token.cancel();

    let results = tokio::time::timeout(
        Duration::from_secs(5),
        scanner(&factory).scan(token, request(&["w1", "w2"], 2), None),
    )
    .await
    .expect("scan must not hang after cancellation");

    assert!(results.is_empty());
}

#[tokio::test]
async fn test_cancellation_preserves_collected_results() {
    let factory = Arc::new(MockFactory::serving(analyzer_html(60.0, 1.0)));
    let token = CancellationToken::new();

    // Cancel from inside the sink after the first accepted result
    let cancel_from_sink = token.clone();
    let sink: Arc<dyn ResultSink> = Arc::new(move |_: &WalletStats| {
        cancel_from_sink.cancel();
    });

    let names: Vec<String> = (0..20).map(|i| format!("wallet-{i}")).collect();
    let wallets: Vec<&str> = names.iter().map(String::as_str).collect();

    let results = tokio::time::timeout(
        Duration::from_secs(5),
        scanner(&factory).scan(token, request(&wallets, 1), Some(sink)),
    )
    .await
    .expect("scan must return after cancellation");

    // The result appended before cancellation is preserved; the rest of
    // the queue is abandoned
    assert_eq!(results.len(), 1);
}

#[tokio::test]
async fn test_all_workers_failing_to_start_still_returns() {
    let factory = Arc::new(MockFactory::failing());
    let results = tokio::time::timeout(
        Duration::from_secs(5),
        scanner(&factory).scan(CancellationToken::new(), request(&["w1", "w2"], 3), None),
    )
    .await
    .expect("scan must return when no worker can start");

    assert!(results.is_empty());
}
