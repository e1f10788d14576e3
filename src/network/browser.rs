//! Headless Chrome page fetcher
//!
//! Each fetch launches its own browser with a throwaway profile, renders
//! the page, waits for scripts to settle, and returns the final DOM. The
//! browser is killed and its profile removed on every exit path, including
//! when the fetch future is dropped by a caller's timeout or cancellation.

use super::fetcher::{FetchError, PageFetcher};
use super::user_agent::generate_user_agent;
use crate::config::BrowserSettings;
use crate::engines::EngineResponse;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::error::CdpError;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tracing::debug;

/// Time allowed for a graceful browser exit before it is killed
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

const DEFAULT_ARGS: &[&str] = &[
    "--no-sandbox",
    "--disable-dev-shm-usage",
    "--disable-blink-features=AutomationControlled",
    "--disable-extensions",
    "--no-first-run",
    "--disable-default-apps",
];

/// Aborts the CDP handler task when dropped
struct HandlerGuard(JoinHandle<()>);

impl Drop for HandlerGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Renders pages in headless Chrome
pub struct BrowserFetcher {
    executable: Option<PathBuf>,
    args: Vec<String>,
    settle_delay: Duration,
    /// Parent directory of the per-fetch profiles
    profile_root: PathBuf,
}

impl BrowserFetcher {
    pub fn new(settings: &BrowserSettings) -> Self {
        Self {
            executable: settings.executable.as_ref().map(PathBuf::from),
            args: settings.args.clone(),
            settle_delay: Duration::from_millis(settings.settle_delay_ms),
            profile_root: std::env::temp_dir(),
        }
    }

    /// Create profiles under `root` instead of the system temp directory
    pub fn with_profile_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.profile_root = root.into();
        self
    }

    /// A fresh profile directory, deleted when the returned guard drops
    fn profile(&self) -> Result<TempDir, FetchError> {
        tempfile::Builder::new()
            .prefix("mixsearch-browser-")
            .tempdir_in(&self.profile_root)
            .map_err(|e| FetchError::Unavailable(format!("cannot create browser profile: {e}")))
    }

    fn config(&self, profile_dir: &Path) -> Result<BrowserConfig, FetchError> {
        let mut args: Vec<String> = DEFAULT_ARGS.iter().map(|a| a.to_string()).collect();
        args.push(format!("--user-agent={}", generate_user_agent()));
        args.extend(self.args.iter().cloned());

        let mut builder = BrowserConfig::builder()
            .user_data_dir(profile_dir)
            .window_size(1366, 768)
            .args(args);
        if let Some(ref executable) = self.executable {
            builder = builder.chrome_executable(executable);
        }

        builder.build().map_err(FetchError::Unavailable)
    }

    async fn render(&self, browser: &Browser, url: &str) -> Result<EngineResponse, FetchError> {
        let page = browser.new_page("about:blank").await.map_err(cdp_error)?;
        page.goto(url).await.map_err(cdp_error)?;

        // let client-side rendering finish
        tokio::time::sleep(self.settle_delay).await;

        let html = page.content().await.map_err(cdp_error)?;
        let final_url = page
            .url()
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| url.to_string());

        if let Err(e) = page.close().await {
            debug!(error = %e, "page close failed");
        }

        Ok(EngineResponse::html(final_url, html))
    }
}

fn cdp_error(err: CdpError) -> FetchError {
    match err {
        CdpError::Timeout => FetchError::Timeout(Duration::ZERO),
        other => FetchError::Network(other.to_string()),
    }
}

#[async_trait]
impl PageFetcher for BrowserFetcher {
    fn name(&self) -> &str {
        "browser"
    }

    async fn fetch(&self, url: &str, timeout: Duration) -> Result<EngineResponse, FetchError> {
        // Declared first so it drops last, after the browser process is gone
        let profile = self.profile()?;
        let config = self.config(profile.path())?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| FetchError::Unavailable(e.to_string()))?;

        let _handler_task = HandlerGuard(tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                match event {
                    Ok(()) => {}
                    Err(CdpError::Ws(e)) => {
                        debug!(error = %e, "browser connection closed");
                        break;
                    }
                    // unknown CDP messages are harmless
                    Err(e) => debug!(error = %e, "CDP handler error"),
                }
            }
        }));

        debug!(url, "rendering in browser");
        let result = tokio::time::timeout(timeout, self.render(&browser, url)).await;

        let shutdown = async {
            if let Err(e) = browser.close().await {
                debug!(error = %e, "browser close failed");
            }
            let _ = browser.wait().await;
        };
        if tokio::time::timeout(CLOSE_TIMEOUT, shutdown).await.is_err() {
            debug!("browser did not exit in time, killing it");
        }

        match result {
            Ok(Err(FetchError::Timeout(_))) | Err(_) => Err(FetchError::Timeout(timeout)),
            Ok(other) => other,
        }
    }
}
