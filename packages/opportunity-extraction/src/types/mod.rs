//! Data types for the extraction pipeline.

pub mod opportunity;
pub mod page;
pub mod target;

pub use opportunity::{
    ExtractedOpportunity, Opportunity, SlotAvailability, Tag, MAX_TAGS, NOT_AVAILABLE,
};
pub use page::PageText;
pub use target::{normalize_domain, normalize_url, NormalizedUrl};
