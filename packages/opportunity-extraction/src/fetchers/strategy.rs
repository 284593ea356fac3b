//! Per-domain routing between the HTTP and browser fetchers.

use async_trait::async_trait;
use tracing::debug;

use super::HttpFetcher;
use crate::config::{DomainTable, FetchStrategy, Settings};
use crate::error::{ConfigError, ConfigResult, FetchResult};
use crate::traits::{PageFetcher, PageInstruction};
use crate::types::{NormalizedUrl, PageText};

/// Picks a fetcher by looking the URL's domain up in a [`DomainTable`].
///
/// With an empty table every domain uses HTTP with no instructions. Once a
/// table is configured, [`PageFetcher::check_target`] rejects domains it does
/// not cover (no entry, no parent entry, no `"*"` entry) with
/// `ConfigError::UnknownDomain`. Instructions passed by the caller run after
/// the configured ones.
pub struct StrategyFetcher {
    domains: DomainTable,
    http: Box<dyn PageFetcher>,
    browser: Option<Box<dyn PageFetcher>>,
}

impl StrategyFetcher {
    /// Fails with `UnsupportedStrategy` if a domain needs a browser and none
    /// was given.
    pub fn new(
        domains: DomainTable,
        http: Box<dyn PageFetcher>,
        browser: Option<Box<dyn PageFetcher>>,
    ) -> ConfigResult<Self> {
        if browser.is_none() {
            if let Some(domain) = domains.first_browser_domain() {
                return Err(ConfigError::UnsupportedStrategy {
                    domain: domain.to_string(),
                    strategy: FetchStrategy::Browser.to_string(),
                });
            }
        }

        Ok(Self {
            domains,
            http,
            browser,
        })
    }

    /// Build from settings: loads the domain table and the fetchers this
    /// build supports.
    pub fn from_settings(settings: &Settings) -> ConfigResult<Self> {
        let domains = settings.domain_table()?;
        let http = Box::new(HttpFetcher::new(settings.fetch.clone())?);

        #[cfg(feature = "browser")]
        let browser: Option<Box<dyn PageFetcher>> = Some(Box::new(
            super::BrowserFetcher::new(settings.fetch.clone()),
        ));
        #[cfg(not(feature = "browser"))]
        let browser: Option<Box<dyn PageFetcher>> = None;

        Self::new(domains, http, browser)
    }

    pub fn domains(&self) -> &DomainTable {
        &self.domains
    }
}

#[async_trait]
impl PageFetcher for StrategyFetcher {
    async fn fetch(
        &self,
        url: &NormalizedUrl,
        instructions: &[PageInstruction],
    ) -> FetchResult<PageText> {
        let domain = url.domain();
        let Some((matched, entry)) = self.domains.resolve(&domain) else {
            debug!(url = %url, domain = %domain, "no domain entry, using HTTP");
            return self.http.fetch(url, instructions).await;
        };

        let mut steps = entry.instructions.clone();
        steps.extend_from_slice(instructions);

        let fetcher = match (entry.strategy, &self.browser) {
            (FetchStrategy::Browser, Some(browser)) => browser,
            _ => &self.http,
        };

        debug!(
            url = %url,
            domain = %matched,
            strategy = %entry.strategy,
            fetcher = fetcher.name(),
            steps = steps.len(),
            "routing fetch"
        );

        fetcher.fetch(url, &steps).await
    }

    fn check_target(&self, url: &NormalizedUrl) -> ConfigResult<()> {
        if self.domains.is_empty() {
            return Ok(());
        }
        let domain = url.domain();
        match self.domains.resolve(&domain) {
            Some(_) => Ok(()),
            None => Err(ConfigError::UnknownDomain { domain }),
        }
    }

    fn name(&self) -> &str {
        "strategy"
    }
}
