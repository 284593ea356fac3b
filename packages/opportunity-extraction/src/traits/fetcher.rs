//! Page-text fetching.
//!
//! A fetcher turns a URL into cleaned, whitespace-normalized text. Pages that
//! need JavaScript are driven through [`PageInstruction`]s first; fetchers
//! that cannot run a browser ignore them.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigResult, FetchResult};
use crate::types::{NormalizedUrl, PageText};

/// Default `wait_for` timeout.
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 10_000;

/// One step of page interaction before the DOM is read.
///
/// Deserialized from the domain config as `{ action = "wait_for", ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PageInstruction {
    /// Load another URL in the same tab
    Navigate { url: String },

    /// Poll every 100 ms until `selector` matches
    WaitFor {
        selector: String,
        #[serde(default = "default_wait_timeout")]
        timeout_ms: u64,
    },

    /// Click the first element matching `selector`
    Click { selector: String },

    /// Pause
    Sleep { ms: u64 },
}

fn default_wait_timeout() -> u64 {
    DEFAULT_WAIT_TIMEOUT_MS
}

impl PageInstruction {
    pub fn wait_for(selector: impl Into<String>) -> Self {
        PageInstruction::WaitFor {
            selector: selector.into(),
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
        }
    }

    pub fn click(selector: impl Into<String>) -> Self {
        PageInstruction::Click {
            selector: selector.into(),
        }
    }

    /// Short name for logs.
    pub fn action(&self) -> &'static str {
        match self {
            PageInstruction::Navigate { .. } => "navigate",
            PageInstruction::WaitFor { .. } => "wait_for",
            PageInstruction::Click { .. } => "click",
            PageInstruction::Sleep { .. } => "sleep",
        }
    }
}

/// Retrieves the cleaned text of one page.
///
/// Implementations:
/// - `HttpFetcher` - plain GET, for static pages
/// - `BrowserFetcher` - headless Chromium (feature `browser`)
/// - `StrategyFetcher` - routes by domain to one of the above
/// - `MockFetcher` - canned pages for tests
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url`, running `instructions` first where supported.
    ///
    /// Empty cleaned text is `FetchError::EmptyContent`.
    async fn fetch(
        &self,
        url: &NormalizedUrl,
        instructions: &[PageInstruction],
    ) -> FetchResult<PageText>;

    /// Fetch with no page interaction.
    async fn fetch_page(&self, url: &NormalizedUrl) -> FetchResult<PageText> {
        self.fetch(url, &[]).await
    }

    /// Fail with a `ConfigError` if this fetcher has no way to handle `url`.
    ///
    /// Called before any network activity.
    fn check_target(&self, _url: &NormalizedUrl) -> ConfigResult<()> {
        Ok(())
    }

    /// Fetcher name for logging.
    fn name(&self) -> &str {
        "unknown"
    }
}

#[async_trait]
impl<T: PageFetcher + ?Sized> PageFetcher for Box<T> {
    async fn fetch(
        &self,
        url: &NormalizedUrl,
        instructions: &[PageInstruction],
    ) -> FetchResult<PageText> {
        (**self).fetch(url, instructions).await
    }

    fn check_target(&self, url: &NormalizedUrl) -> ConfigResult<()> {
        (**self).check_target(url)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[async_trait]
impl<T: PageFetcher + ?Sized> PageFetcher for Arc<T> {
    async fn fetch(
        &self,
        url: &NormalizedUrl,
        instructions: &[PageInstruction],
    ) -> FetchResult<PageText> {
        (**self).fetch(url, instructions).await
    }

    fn check_target(&self, url: &NormalizedUrl) -> ConfigResult<()> {
        (**self).check_target(url)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
