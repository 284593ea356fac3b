//! Page fetcher implementations.
//!
//! - [`HttpFetcher`] - reqwest GET plus HTML cleanup
//! - [`BrowserFetcher`] - headless Chromium (feature `browser`)
//! - [`StrategyFetcher`] - routes by domain using the domain table

#[cfg(feature = "browser")]
pub mod browser;
pub mod http;
pub mod strategy;
pub mod text;

#[cfg(feature = "browser")]
pub use browser::BrowserFetcher;
pub use http::HttpFetcher;
pub use strategy::StrategyFetcher;
pub use text::{html_to_text, normalize_whitespace, truncate_chars};
