//! Structured-completion backends.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ExtractionResult;
use crate::types::ExtractedOpportunity;

/// A backend that fills the Opportunity schema from page text.
///
/// Implementations return the raw record; validation and normalization
/// happen once in `Opportunity::from_extracted`, the same for every backend.
#[async_trait]
pub trait StructuredExtractor: Send + Sync {
    /// Extract one record from `text`, which was fetched from `url`.
    async fn extract(&self, text: &str, url: &str) -> ExtractionResult<ExtractedOpportunity>;

    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Model identifier, if the backend has one.
    fn model(&self) -> Option<&str> {
        None
    }
}

#[async_trait]
impl<T: StructuredExtractor + ?Sized> StructuredExtractor for Box<T> {
    async fn extract(&self, text: &str, url: &str) -> ExtractionResult<ExtractedOpportunity> {
        (**self).extract(text, url).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn model(&self) -> Option<&str> {
        (**self).model()
    }
}

#[async_trait]
impl<T: StructuredExtractor + ?Sized> StructuredExtractor for Arc<T> {
    async fn extract(&self, text: &str, url: &str) -> ExtractionResult<ExtractedOpportunity> {
        (**self).extract(text, url).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn model(&self) -> Option<&str> {
        (**self).model()
    }
}
