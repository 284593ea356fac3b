//! Plain HTTP fetcher for static pages.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::redirect::Policy;
use tracing::{debug, info, warn};

use super::text::html_to_text;
use crate::config::FetchSettings;
use crate::error::{ConfigError, ConfigResult, FetchError, FetchResult};
use crate::traits::{PageFetcher, PageInstruction};
use crate::types::{NormalizedUrl, PageText};

/// Fetches a page with one GET and converts the HTML to text.
///
/// No JavaScript runs, so page instructions are ignored. Use
/// `BrowserFetcher` for pages that render client-side.
pub struct HttpFetcher {
    client: reqwest::Client,
    settings: FetchSettings,
}

impl HttpFetcher {
    /// Build the HTTP client: browser user agent, timeout, bounded redirects.
    pub fn new(settings: FetchSettings) -> ConfigResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.clone())
            .default_headers(headers)
            .redirect(Policy::limited(settings.max_redirects))
            .build()
            .map_err(|e| ConfigError::Invalid {
                key: "http_client".into(),
                reason: e.to_string(),
            })?;

        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    fn map_transport_error(&self, url: &str, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                reason: format!("no response within {}s", self.settings.timeout.as_secs()),
            }
        } else {
            FetchError::Http {
                url: url.to_string(),
                source: Box::new(e),
            }
        }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(
        &self,
        url: &NormalizedUrl,
        instructions: &[PageInstruction],
    ) -> FetchResult<PageText> {
        if !instructions.is_empty() {
            debug!(
                url = %url,
                count = instructions.len(),
                "HTTP fetcher ignores page instructions"
            );
        }

        let start = std::time::Instant::now();
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "HTTP request failed");
                self.map_transport_error(url.as_str(), e)
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = %status, "non-success status");
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().to_string();
        let html = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(url.as_str(), e))?;

        let (title, text) = html_to_text(&html);
        if text.is_empty() {
            return Err(FetchError::EmptyContent {
                url: url.to_string(),
            });
        }

        info!(
            url = %url,
            final_url = %final_url,
            html_bytes = html.len(),
            text_chars = text.chars().count(),
            duration_ms = start.elapsed().as_millis(),
            "page fetched"
        );

        let mut page = PageText::new(url.as_str(), text).with_final_url(final_url);
        if let Some(title) = title {
            page = page.with_title(title);
        }
        Ok(page)
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::normalize_url;
    use std::time::Duration;
    use wiremock::matchers::{header_regex, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher(timeout: Duration) -> HttpFetcher {
        HttpFetcher::new(FetchSettings {
            timeout,
            ..FetchSettings::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_cleans_html() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/volunteer"))
            .and(header_regex("user-agent", "Mozilla/5.0"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                "<html><head><title>Help Out</title></head><body><nav>Menu</nav>\
                 <h2>Food Pantry</h2><p>Sort donations   Saturdays 9am-12pm</p></body></html>",
                "text/html",
            ))
            .mount(&server)
            .await;

        let url = normalize_url(&format!("{}/volunteer", server.uri())).unwrap();
        let page = fetcher(Duration::from_secs(5)).fetch_page(&url).await.unwrap();

        assert_eq!(page.title.as_deref(), Some("Help Out"));
        assert_eq!(page.text, "Help Out\nFood Pantry\nSort donations\nSaturdays 9am-12pm");
        assert!(!page.was_redirected());
    }

    #[tokio::test]
    async fn test_follows_redirects() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(
                ResponseTemplate::new(301).insert_header("location", format!("{}/new", server.uri())),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("<p>Moved here</p>", "text/html"))
            .mount(&server)
            .await;

        let url = normalize_url(&format!("{}/old", server.uri())).unwrap();
        let page = fetcher(Duration::from_secs(5)).fetch_page(&url).await.unwrap();

        assert_eq!(page.text, "Moved here");
        assert!(page.final_url.ends_with("/new"));
        assert_eq!(page.url, url.as_str());
    }

    #[tokio::test]
    async fn test_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = normalize_url(&format!("{}/gone", server.uri())).unwrap();
        let err = fetcher(Duration::from_secs(5)).fetch_page(&url).await.unwrap_err();

        assert!(matches!(err, FetchError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_empty_content() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("<html><body><script>render()</script></body></html>", "text/html"),
            )
            .mount(&server)
            .await;

        let url = normalize_url(&server.uri()).unwrap();
        let err = fetcher(Duration::from_secs(5)).fetch_page(&url).await.unwrap_err();

        assert!(matches!(err, FetchError::EmptyContent { .. }));
    }

    #[tokio::test]
    async fn test_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("<p>late</p>", "text/html")
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let url = normalize_url(&server.uri()).unwrap();
        let err = fetcher(Duration::from_millis(200)).fetch_page(&url).await.unwrap_err();

        assert!(matches!(err, FetchError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_connection_refused_is_http_error() {
        let url = normalize_url("http://127.0.0.1:9/unreachable").unwrap();
        let err = fetcher(Duration::from_secs(2)).fetch_page(&url).await.unwrap_err();

        assert!(matches!(err, FetchError::Http { .. } | FetchError::Timeout { .. }));
    }
}
