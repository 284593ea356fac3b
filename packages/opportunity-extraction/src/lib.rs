//! Volunteer Opportunity Extraction
//!
//! Fetches one webpage, asks an LLM to fill a fixed Opportunity schema from
//! its text, and stores the result in a JSON file deduplicated by URL.
//!
//! # Design
//!
//! - One canonical schema (`ExtractedOpportunity`), translated per provider
//! - Validation and normalization happen once, after every backend
//! - The source URL always comes from the caller, never from the model
//! - Each stage sits behind a trait so it can be mocked
//!
//! # Usage
//!
//! ```rust,ignore
//! use opportunity_extraction::{DefaultPipeline, Settings};
//!
//! let settings = Settings::from_env()?;
//! let pipeline = DefaultPipeline::from_settings(&settings)?;
//!
//! let outcome = pipeline.run("soupmobile.org/volunteer").await?;
//! println!("{}", serde_json::to_string_pretty(&outcome.record)?);
//! ```
//!
//! # Modules
//!
//! - [`traits`] - `PageFetcher`, `StructuredExtractor`, `RecordStore`
//! - [`types`] - Opportunity record, page text, URL normalization
//! - [`fetchers`] - HTTP, headless browser (feature `browser`), per-domain routing
//! - [`extractors`] - OpenAI and Gemini backends, prompts
//! - [`stores`] - TinyDB-compatible JSON file, in-memory
//! - [`pipeline`] - fetch, extract, persist
//! - [`config`] - settings from the environment, domain table
//! - [`testing`] - mock fetcher and extractor

pub mod config;
pub mod credentials;
pub mod error;
pub mod extractors;
pub mod fetchers;
pub mod normalize;
pub mod pipeline;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use config::{
    DomainEntry, DomainTable, FetchSettings, FetchStrategy, ModelProvider, Settings,
};
pub use credentials::{BackendCredentials, SecretString};
pub use error::{
    ConfigError, ExtractionError, FetchError, PipelineError, Result, StoreError,
};
pub use extractors::{GeminiExtractor, OpenAIExtractor};
#[cfg(feature = "browser")]
pub use fetchers::BrowserFetcher;
pub use fetchers::{HttpFetcher, StrategyFetcher};
pub use pipeline::{DefaultPipeline, Pipeline, RunOutcome};
pub use stores::{JsonRecordStore, MemoryRecordStore};
pub use traits::{InsertOutcome, PageFetcher, PageInstruction, RecordStore, StructuredExtractor};
pub use types::{
    normalize_domain, normalize_url, ExtractedOpportunity, NormalizedUrl, Opportunity, PageText,
    SlotAvailability, Tag,
};
