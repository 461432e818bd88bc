use crate::error::{BrowserError, Result};
use crate::session::{SessionFactory, WalletSession};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::time::Duration;

/// How often the marker wait re-reads the document.
const MARKER_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Browser automation engine.
///
/// Owns the chromium process; hands out one [`Page`]-backed session per
/// worker through the [`SessionFactory`] impl.
pub struct BrowserEngine {
    browser: Browser,
}

impl BrowserEngine {
    /// Launch a chromium process configured from application settings.
    pub async fn new(config: &scout_core::BrowserConfig) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(config.window_width, config.window_height);
        if !config.headless {
            builder = builder.with_head();
        }
        let browser_config = builder
            .build()
            .map_err(BrowserError::ChromiumError)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;

        // Drive the CDP event loop for the lifetime of the browser
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        Ok(Self { browser })
    }
}

#[async_trait::async_trait]
impl SessionFactory for BrowserEngine {
    async fn create_session(&self) -> Result<Box<dyn WalletSession>> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;

        Ok(Box::new(PageSession { page: Some(page) }))
    }
}

/// One chromium tab, exclusively owned by one scan worker.
struct PageSession {
    page: Option<Page>,
}

impl PageSession {
    fn page(&self) -> Result<&Page> {
        self.page.as_ref().ok_or(BrowserError::Disposed)
    }
}

#[async_trait::async_trait]
impl WalletSession for PageSession {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<()> {
        let page = self.page()?;
        match tokio::time::timeout(timeout, page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(BrowserError::NavigationError(e.to_string())),
            Err(_) => Err(BrowserError::Timeout(format!("navigation to {url}"))),
        }
    }

    async fn wait_for_marker(&mut self, marker: &str, timeout: Duration) -> Result<()> {
        let page = self.page()?;
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            let html = page
                .content()
                .await
                .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;
            if html.contains(marker) {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(BrowserError::Timeout(format!("marker '{marker}' not found")));
            }
            tokio::time::sleep(MARKER_POLL_INTERVAL).await;
        }
    }

    async fn wait_for_idle(&mut self, timeout: Duration) -> Result<()> {
        let page = self.page()?;
        match tokio::time::timeout(timeout, page.wait_for_navigation()).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(BrowserError::ChromiumError(e.to_string())),
            Err(_) => Err(BrowserError::Timeout("network idle".to_string())),
        }
    }

    async fn read_document(&mut self) -> Result<String> {
        let page = self.page()?;
        page.content()
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))
    }

    async fn dispose(&mut self) {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                tracing::debug!("Ignoring error while closing page: {}", e);
            }
        }
    }
}
