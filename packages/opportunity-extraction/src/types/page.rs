//! Fetched page text.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cleaned text of one page, ready for extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageText {
    /// URL that was requested
    pub url: String,

    /// URL after redirects (equals `url` when none were followed)
    pub final_url: String,

    /// `<title>` if present
    pub title: Option<String>,

    /// Whitespace-normalized plain text
    pub text: String,

    /// When the page was fetched
    pub fetched_at: DateTime<Utc>,
}

impl PageText {
    pub fn new(url: impl Into<String>, text: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            final_url: url.clone(),
            url,
            title: None,
            text: text.into(),
            fetched_at: Utc::now(),
        }
    }

    /// Set the post-redirect URL.
    pub fn with_final_url(mut self, final_url: impl Into<String>) -> Self {
        self.final_url = final_url.into();
        self
    }

    /// Set the page title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Text length in characters.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    pub fn has_content(&self) -> bool {
        !self.text.trim().is_empty()
    }

    /// Whether a redirect landed somewhere else.
    pub fn was_redirected(&self) -> bool {
        self.url != self.final_url
    }
}
