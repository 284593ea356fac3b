//! One run: fetch, extract, persist.
//!
//! Stages run strictly in order and the first failure ends the run. Nothing
//! is written unless every earlier stage succeeded.

use std::time::Instant;

use tracing::{info, instrument, warn};

use crate::config::Settings;
use crate::error::{PipelineError, Result};
use crate::extractors;
use crate::fetchers::StrategyFetcher;
use crate::stores::JsonRecordStore;
use crate::traits::{InsertOutcome, PageFetcher, RecordStore, StructuredExtractor};
use crate::types::{normalize_url, Opportunity};

/// What a successful run did.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// The validated record (also when it was not written)
    pub record: Opportunity,
    pub insert: InsertOutcome,
}

impl RunOutcome {
    pub fn is_inserted(&self) -> bool {
        self.insert.is_inserted()
    }
}

/// Fetcher, extractor and store for one URL per run.
pub struct Pipeline<F: PageFetcher, E: StructuredExtractor, S: RecordStore> {
    fetcher: F,
    extractor: E,
    store: S,
}

/// The pipeline as assembled from [`Settings`].
pub type DefaultPipeline =
    Pipeline<StrategyFetcher, Box<dyn StructuredExtractor>, JsonRecordStore>;

impl<F: PageFetcher, E: StructuredExtractor, S: RecordStore> Pipeline<F, E, S> {
    pub fn new(fetcher: F, extractor: E, store: S) -> Self {
        Self {
            fetcher,
            extractor,
            store,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn extractor(&self) -> &E {
        &self.extractor
    }

    /// Process `input` end to end.
    ///
    /// A URL that is already stored is not an error: the outcome reports
    /// `AlreadyExists` and the store is left as it was.
    #[instrument(skip(self), fields(fetcher = self.fetcher.name(), extractor = self.extractor.name()))]
    pub async fn run(&self, input: &str) -> Result<RunOutcome> {
        let start = Instant::now();
        let url = normalize_url(input)?;
        self.fetcher.check_target(&url)?;

        let page = self.fetcher.fetch_page(&url).await.map_err(|e| {
            warn!(url = %url, error = %e, "fetch failed");
            PipelineError::from(e)
        })?;
        info!(
            url = %url,
            chars = page.char_count(),
            title = page.title.as_deref().unwrap_or(""),
            "stage complete: fetch"
        );

        let raw = self
            .extractor
            .extract(&page.text, url.as_str())
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "extraction failed");
                PipelineError::from(e)
            })?;
        let record = Opportunity::from_extracted(raw, url.as_str()).map_err(|e| {
            warn!(url = %url, error = %e, "extracted record rejected");
            PipelineError::from(e)
        })?;
        info!(
            url = %url,
            organization = %record.organization_name,
            tags = ?record.tags,
            "stage complete: extract"
        );

        let insert = self.store.insert_if_absent(&record).await?;
        info!(
            url = %url,
            inserted = insert.is_inserted(),
            duration_ms = start.elapsed().as_millis(),
            "stage complete: persist"
        );

        Ok(RunOutcome { record, insert })
    }
}

impl DefaultPipeline {
    /// Assemble the configured fetcher, extractor and JSON store.
    ///
    /// All configuration errors surface here, before any network activity.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let extractor = extractors::from_settings(settings)?;
        let fetcher = StrategyFetcher::from_settings(settings)?;
        let store = JsonRecordStore::new(settings.store_path.clone());
        Ok(Pipeline::new(fetcher, extractor, store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelProvider;
    use crate::error::ConfigError;

    #[test]
    fn test_from_settings_requires_credentials() {
        let settings = Settings::default().with_provider(ModelProvider::Gemini);
        let err = DefaultPipeline::from_settings(&settings).err().unwrap();

        assert_eq!(err.stage(), "config");
        assert!(matches!(
            err,
            PipelineError::Config(ConfigError::MissingCredential { .. })
        ));
    }

    #[test]
    fn test_from_settings_rejects_missing_domain_file() {
        let settings = Settings {
            gemini_api_key: Some("g".into()),
            ..Settings::default()
        }
        .with_domains_path("/no/such/domains.toml");

        let err = DefaultPipeline::from_settings(&settings).err().unwrap();
        assert!(matches!(err, PipelineError::Config(ConfigError::Io { .. })));
    }

    #[tokio::test]
    async fn test_uncovered_domain_fails_before_fetch() {
        use crate::config::DomainEntry;
        use crate::stores::MemoryRecordStore;
        use crate::testing::{food_bank_record, MockExtractor, MockFetcher};
        use crate::traits::PageInstruction;

        let mut domains = crate::config::DomainTable::default();
        domains.insert(
            "volunteermatch.org",
            DomainEntry::browser(vec![PageInstruction::wait_for(".opportunity")]),
        );
        let http = MockFetcher::new().with_default_text("page");
        let browser = MockFetcher::new().with_default_text("page");
        let fetcher = StrategyFetcher::new(
            domains,
            Box::new(http.clone()),
            Some(Box::new(browser.clone())),
        )
        .unwrap();
        let extractor = MockExtractor::new().with_default(food_bank_record());
        let pipeline = Pipeline::new(fetcher, extractor.clone(), MemoryRecordStore::new());

        let err = pipeline.run("soupmobile.org/volunteer").await.unwrap_err();

        assert_eq!(err.stage(), "config");
        assert!(matches!(
            err,
            PipelineError::Config(ConfigError::UnknownDomain { .. })
        ));
        assert_eq!(http.call_count() + browser.call_count(), 0);
        assert_eq!(extractor.call_count(), 0);
        assert!(pipeline.store().is_empty());
    }
}
