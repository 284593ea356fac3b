//! Headless Chromium fetcher for pages that render client-side.
//!
//! One browser per fetch: launch, run the instructions, read the rendered
//! DOM, close. The event handler runs on its own task while the browser is
//! alive and is aborted afterwards.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::text::html_to_text;
use crate::config::FetchSettings;
use crate::error::{FetchError, FetchResult};
use crate::traits::{PageFetcher, PageInstruction};
use crate::types::{NormalizedUrl, PageText};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Drives headless Chromium through page instructions before reading text.
pub struct BrowserFetcher {
    settings: FetchSettings,
    chrome_executable: Option<std::path::PathBuf>,
}

/// Browser plus its handler task; the task is aborted on drop.
struct Session {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl Drop for Session {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

impl BrowserFetcher {
    pub fn new(settings: FetchSettings) -> Self {
        Self {
            settings,
            chrome_executable: None,
        }
    }

    /// Use a specific Chrome binary instead of searching the system.
    pub fn with_chrome_executable(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.chrome_executable = Some(path.into());
        self
    }

    async fn launch(&self, url: &str) -> FetchResult<Session> {
        let mut builder = BrowserConfig::builder()
            .request_timeout(self.settings.timeout)
            .window_size(1366, 900)
            .arg(format!("--user-agent={}", self.settings.user_agent))
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-extensions")
            .arg("--mute-audio");
        if let Some(path) = &self.chrome_executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(|reason| FetchError::Browser {
            url: url.to_string(),
            reason: format!("invalid browser config: {reason}"),
        })?;

        let (browser, mut handler) =
            Browser::launch(config)
                .await
                .map_err(|e| FetchError::Browser {
                    url: url.to_string(),
                    reason: format!("failed to launch Chromium: {e}"),
                })?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = ?e, "browser handler event error");
                }
            }
        });

        Ok(Session { browser, handler })
    }

    async fn run_instructions(
        &self,
        page: &Page,
        url: &str,
        instructions: &[PageInstruction],
    ) -> FetchResult<()> {
        for step in instructions {
            debug!(url = %url, action = step.action(), "page instruction");
            match step {
                PageInstruction::Navigate { url: target } => {
                    page.goto(target.as_str())
                        .await
                        .map_err(|e| browser_error(url, format!("navigate to {target}: {e}")))?;
                    page.wait_for_navigation()
                        .await
                        .map_err(|e| browser_error(url, format!("navigate to {target}: {e}")))?;
                }
                PageInstruction::WaitFor {
                    selector,
                    timeout_ms,
                } => wait_for_selector(page, url, selector, Duration::from_millis(*timeout_ms)).await?,
                PageInstruction::Click { selector } => {
                    let element = page
                        .find_element(selector.as_str())
                        .await
                        .map_err(|e| browser_error(url, format!("no element `{selector}`: {e}")))?;
                    element
                        .click()
                        .await
                        .map_err(|e| browser_error(url, format!("click `{selector}`: {e}")))?;
                }
                PageInstruction::Sleep { ms } => tokio::time::sleep(Duration::from_millis(*ms)).await,
            }
        }
        Ok(())
    }
}

async fn wait_for_selector(
    page: &Page,
    url: &str,
    selector: &str,
    timeout: Duration,
) -> FetchResult<()> {
    let deadline = Instant::now() + timeout;
    loop {
        if page.find_element(selector).await.is_ok() {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(FetchError::Timeout {
                url: url.to_string(),
                reason: format!("`{selector}` did not appear within {}ms", timeout.as_millis()),
            });
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

fn browser_error(url: &str, reason: String) -> FetchError {
    FetchError::Browser {
        url: url.to_string(),
        reason,
    }
}

#[async_trait]
impl PageFetcher for BrowserFetcher {
    async fn fetch(
        &self,
        url: &NormalizedUrl,
        instructions: &[PageInstruction],
    ) -> FetchResult<PageText> {
        let start = Instant::now();
        let mut session = self.launch(url.as_str()).await?;

        let result = async {
            let page = session
                .browser
                .new_page(url.as_str())
                .await
                .map_err(|e| browser_error(url.as_str(), format!("open page: {e}")))?;
            page.wait_for_navigation()
                .await
                .map_err(|e| browser_error(url.as_str(), format!("load: {e}")))?;

            self.run_instructions(&page, url.as_str(), instructions).await?;

            let final_url = page
                .url()
                .await
                .ok()
                .flatten()
                .unwrap_or_else(|| url.to_string());
            let html = page
                .content()
                .await
                .map_err(|e| browser_error(url.as_str(), format!("read DOM: {e}")))?;
            Ok::<_, FetchError>((final_url, html))
        }
        .await;

        if let Err(e) = session.browser.close().await {
            warn!(url = %url, error = %e, "failed to close browser");
        }
        let _ = session.browser.wait().await;

        let (final_url, html) = result?;
        let (title, text) = html_to_text(&html);
        if text.is_empty() {
            return Err(FetchError::EmptyContent {
                url: url.to_string(),
            });
        }

        info!(
            url = %url,
            steps = instructions.len(),
            text_chars = text.chars().count(),
            duration_ms = start.elapsed().as_millis(),
            "page rendered"
        );

        let mut page = PageText::new(url.as_str(), text).with_final_url(final_url);
        if let Some(title) = title {
            page = page.with_title(title);
        }
        Ok(page)
    }

    fn name(&self) -> &str {
        "browser"
    }
}
