//! Testing utilities including mock implementations.
//!
//! These let applications exercise the pipeline without network access or
//! LLM calls. Clones share state, so a test can keep a handle for assertions
//! after moving a mock into a pipeline.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::{ExtractionError, ExtractionResult, FetchError, FetchResult};
use crate::traits::{PageFetcher, PageInstruction, StructuredExtractor};
use crate::types::{ExtractedOpportunity, NormalizedUrl, PageText};

// =============================================================================
// MockFetcher
// =============================================================================

/// A fetcher that serves canned text by URL.
#[derive(Default, Clone)]
pub struct MockFetcher {
    pages: Arc<RwLock<HashMap<String, String>>>,
    default_text: Arc<RwLock<Option<String>>>,
    /// Errors are returned once, then removed
    errors: Arc<RwLock<HashMap<String, FetchError>>>,
    calls: Arc<RwLock<Vec<(String, Vec<PageInstruction>)>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `text` for exactly `url`.
    pub fn with_page(self, url: impl Into<String>, text: impl Into<String>) -> Self {
        self.pages.write().unwrap().insert(url.into(), text.into());
        self
    }

    /// Serve `text` for any URL without its own page.
    pub fn with_default_text(self, text: impl Into<String>) -> Self {
        *self.default_text.write().unwrap() = Some(text.into());
        self
    }

    /// Fail the next fetch of `url` with `error`.
    pub fn with_error(self, url: impl Into<String>, error: FetchError) -> Self {
        self.errors.write().unwrap().insert(url.into(), error);
        self
    }

    /// URL and instructions of every fetch, in order.
    pub fn calls(&self) -> Vec<(String, Vec<PageInstruction>)> {
        self.calls.read().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch(
        &self,
        url: &NormalizedUrl,
        instructions: &[PageInstruction],
    ) -> FetchResult<PageText> {
        self.calls
            .write()
            .unwrap()
            .push((url.to_string(), instructions.to_vec()));

        if let Some(error) = self.errors.write().unwrap().remove(url.as_str()) {
            return Err(error);
        }

        let text = self
            .pages
            .read()
            .unwrap()
            .get(url.as_str())
            .cloned()
            .or_else(|| self.default_text.read().unwrap().clone());

        match text {
            Some(text) if !text.trim().is_empty() => Ok(PageText::new(url.as_str(), text)),
            Some(_) => Err(FetchError::EmptyContent {
                url: url.to_string(),
            }),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// =============================================================================
// MockExtractor
// =============================================================================

/// Record of a call made to the mock extractor.
#[derive(Debug, Clone)]
pub struct MockExtractCall {
    pub url: String,
    pub text: String,
}

/// An extractor that returns predefined records by URL.
#[derive(Default, Clone)]
pub struct MockExtractor {
    responses: Arc<RwLock<HashMap<String, ExtractedOpportunity>>>,
    default_response: Arc<RwLock<Option<ExtractedOpportunity>>>,
    errors: Arc<RwLock<HashMap<String, ExtractionError>>>,
    calls: Arc<RwLock<Vec<MockExtractCall>>>,
}

impl MockExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `record` for `url`.
    pub fn with_response(self, url: impl Into<String>, record: ExtractedOpportunity) -> Self {
        self.responses.write().unwrap().insert(url.into(), record);
        self
    }

    /// Return `record` for any URL without its own response.
    pub fn with_default(self, record: ExtractedOpportunity) -> Self {
        *self.default_response.write().unwrap() = Some(record);
        self
    }

    /// Fail the next extraction for `url` with `error`.
    pub fn with_error(self, url: impl Into<String>, error: ExtractionError) -> Self {
        self.errors.write().unwrap().insert(url.into(), error);
        self
    }

    pub fn calls(&self) -> Vec<MockExtractCall> {
        self.calls.read().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }
}

#[async_trait]
impl StructuredExtractor for MockExtractor {
    async fn extract(&self, text: &str, url: &str) -> ExtractionResult<ExtractedOpportunity> {
        self.calls.write().unwrap().push(MockExtractCall {
            url: url.to_string(),
            text: text.to_string(),
        });

        if let Some(error) = self.errors.write().unwrap().remove(url) {
            return Err(error);
        }

        self.responses
            .read()
            .unwrap()
            .get(url)
            .cloned()
            .or_else(|| self.default_response.read().unwrap().clone())
            .ok_or_else(|| ExtractionError::Parse {
                backend: "mock",
                message: format!("no canned response for {url}"),
            })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// A complete backend record for a food bank.
pub fn food_bank_record() -> ExtractedOpportunity {
    ExtractedOpportunity {
        organization_name: "North Side Food Shelf".into(),
        activity_type: "sorting and packing donated groceries".into(),
        location: "1200 Plymouth Ave N, Minneapolis, MN 55411".into(),
        time_slot: "TTh 1pm-4pm".into(),
        slot_availability: vec!["individual drop-in welcome".into()],
        contact_email: "volunteer@northsidefood.org".into(),
        contact_number: Some(6125550148),
        extra: "Closed-toe shoes required.".into(),
        tags: vec!["food security".into()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::normalize_url;

    #[tokio::test]
    async fn test_mock_fetcher_pages_and_errors() {
        let fetcher = MockFetcher::new()
            .with_page("https://a.org", "page a")
            .with_error(
                "https://b.org",
                FetchError::Timeout {
                    url: "https://b.org".into(),
                    reason: "slow".into(),
                },
            );

        let a = normalize_url("a.org").unwrap();
        let b = normalize_url("b.org").unwrap();

        assert_eq!(fetcher.fetch_page(&a).await.unwrap().text, "page a");
        assert!(matches!(
            fetcher.fetch_page(&b).await,
            Err(FetchError::Timeout { .. })
        ));
        assert!(matches!(
            fetcher.fetch_page(&b).await,
            Err(FetchError::Status { status: 404, .. })
        ));
        assert_eq!(fetcher.call_count(), 3);
    }

    #[tokio::test]
    async fn test_mock_extractor_tracks_calls() {
        let extractor = MockExtractor::new().with_default(food_bank_record());
        let handle = extractor.clone();

        let record = extractor.extract("text", "https://a.org").await.unwrap();
        assert_eq!(record.organization_name, "North Side Food Shelf");
        assert_eq!(handle.calls()[0].url, "https://a.org");
    }
}
