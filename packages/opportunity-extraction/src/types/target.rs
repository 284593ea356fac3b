//! URL and domain normalization.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{FetchError, FetchResult};

/// An absolute http(s) URL with a host, as the user meant it.
///
/// The string form is what gets stored as the record's dedup key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedUrl(String);

impl NormalizedUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Host with `www.` removed, lowercased.
    pub fn domain(&self) -> String {
        Url::parse(&self.0)
            .ok()
            .and_then(|u| u.host_str().map(normalize_domain))
            .unwrap_or_default()
    }
}

impl fmt::Display for NormalizedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Normalize user input into an absolute URL.
///
/// Input without `://` gets `https://` prepended, so the whole given string
/// becomes host and path. The text is otherwise kept as typed (no trailing
/// slash is added), which keeps `example.org/volunteer` and
/// `https://example.org/volunteer` the same key.
pub fn normalize_url(input: &str) -> FetchResult<NormalizedUrl> {
    let trimmed = input.trim();
    let invalid = || FetchError::InvalidUrl {
        url: input.to_string(),
    };

    if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let parsed = Url::parse(&candidate).map_err(|_| invalid())?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid());
    }
    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(NormalizedUrl(candidate)),
        _ => Err(invalid()),
    }
}

/// Lowercase a host and drop a leading `www.`.
pub fn normalize_domain(host: &str) -> String {
    let lower = host.trim().trim_end_matches('.').to_lowercase();
    match lower.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => lower,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_scheme_is_added() {
        let url = normalize_url("example.org/volunteer").unwrap();
        assert_eq!(url.as_str(), "https://example.org/volunteer");
    }

    #[test]
    fn test_existing_scheme_kept() {
        let url = normalize_url("  http://example.org/help  ").unwrap();
        assert_eq!(url.as_str(), "http://example.org/help");
    }

    #[test]
    fn test_invalid_inputs() {
        for input in ["", "   ", "https://", "ftp://example.org", "not a url"] {
            assert!(
                matches!(normalize_url(input), Err(FetchError::InvalidUrl { .. })),
                "{input:?} should be invalid"
            );
        }
    }

    #[test]
    fn test_domain() {
        assert_eq!(normalize_domain("WWW.VolunteerMatch.org"), "volunteermatch.org");
        assert_eq!(normalize_domain("sub.example.org."), "sub.example.org");

        let url = normalize_url("https://www.SoupMobile.org/volunteer").unwrap();
        assert_eq!(url.domain(), "soupmobile.org");
    }

    proptest! {
        #[test]
        fn scheme_less_hosts_get_https_prefix(
            host in "[a-z][a-z0-9]{0,10}\\.(org|com|net)",
            path in "(/[a-z0-9_-]{1,8}){0,3}",
        ) {
            let input = format!("{host}{path}");
            let url = normalize_url(&input).unwrap();
            prop_assert_eq!(url.as_str(), format!("https://{input}"));
        }
    }
}
