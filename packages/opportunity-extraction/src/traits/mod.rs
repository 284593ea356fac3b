//! Seams between the three pipeline stages.
//!
//! Each stage is a trait so backends can be swapped from configuration and
//! replaced with mocks in tests.

pub mod extractor;
pub mod fetcher;
pub mod store;

pub use extractor::StructuredExtractor;
pub use fetcher::{PageFetcher, PageInstruction, DEFAULT_WAIT_TIMEOUT_MS};
pub use store::{InsertOutcome, RecordStore};
