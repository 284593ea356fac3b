//! API keys that never reach logs.
//!
//! Keys live in [`SecretString`] from the moment they are read. The only
//! place a key is exposed is the backend client constructor.

use secrecy::{ExposeSecret, SecretBox};
use std::fmt;

use crate::config::ModelProvider;
use crate::error::{ConfigError, ConfigResult};

/// A secret string that redacts itself in `Debug` and `Display`.
pub struct SecretString(SecretBox<str>);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretBox::new(Box::from(value.into().as_str())))
    }

    /// Only call this where the key is sent to the backend.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn is_blank(&self) -> bool {
        self.expose().trim().is_empty()
    }

    /// Last four characters, enough to tell two keys apart in a log line.
    pub fn hint(&self) -> String {
        let key = self.expose().trim();
        let count = key.chars().count();
        if count < 12 {
            return "[REDACTED]".to_string();
        }
        let tail: String = key.chars().skip(count - 4).collect();
        format!("...{tail}")
    }
}

impl Clone for SecretString {
    fn clone(&self) -> Self {
        Self::new(self.expose())
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Everything an extractor needs to reach its backend.
#[derive(Clone)]
pub struct BackendCredentials {
    pub provider: ModelProvider,
    pub api_key: SecretString,
    pub model: String,
    /// Override for proxies and tests
    pub base_url: Option<String>,
}

impl BackendCredentials {
    pub fn new(provider: ModelProvider, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider,
            api_key: SecretString::new(api_key),
            model: model.into(),
            base_url: None,
        }
    }

    /// Credentials for `provider` from an optional configured key.
    ///
    /// An absent or blank key is `MissingCredential`, naming the variable
    /// the provider reads its key from.
    pub fn resolve(
        provider: ModelProvider,
        api_key: Option<&SecretString>,
        model: &str,
        base_url: Option<&str>,
    ) -> ConfigResult<Self> {
        let key = api_key
            .filter(|k| !k.is_blank())
            .ok_or_else(|| ConfigError::MissingCredential {
                provider: provider.display_name(),
                var: provider.key_var(),
            })?;

        Ok(Self {
            provider,
            api_key: key.clone(),
            model: model.to_string(),
            base_url: base_url.map(str::to_string),
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Redacted key for logs.
    pub fn key_hint(&self) -> String {
        self.api_key.hint()
    }
}

impl fmt::Debug for BackendCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendCredentials")
            .field("provider", &self.provider)
            .field("api_key", &self.key_hint())
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_redacted() {
        let secret = SecretString::new("AIza-very-secret");
        assert_eq!(format!("{secret:?}"), "[REDACTED]");
        assert_eq!(format!("{secret}"), "[REDACTED]");
        assert_eq!(secret.expose(), "AIza-very-secret");
    }

    #[test]
    fn test_hint_shows_only_the_tail() {
        assert_eq!(SecretString::new("sk-proj-0123456789abcd").hint(), "...abcd");
        assert_eq!(SecretString::new("short-key").hint(), "[REDACTED]");
    }

    #[test]
    fn test_resolve_names_the_missing_variable() {
        let blank = SecretString::new("  ");
        for (provider, key, var) in [
            (ModelProvider::Gemini, None, "GEMINI_API_KEY"),
            (ModelProvider::OpenAI, Some(&blank), "OPENAI_API_KEY"),
        ] {
            let err = BackendCredentials::resolve(provider, key, "m", None).unwrap_err();
            assert!(matches!(err, ConfigError::MissingCredential { var: v, .. } if v == var));
        }
    }

    #[test]
    fn test_resolve_carries_provider_model_and_endpoint() {
        let key = SecretString::new("AIzaSyExampleKey0001");
        let creds = BackendCredentials::resolve(
            ModelProvider::Gemini,
            Some(&key),
            "gemini-2.5-flash",
            Some("http://127.0.0.1:9/v1beta"),
        )
        .unwrap();

        assert_eq!(creds.provider, ModelProvider::Gemini);
        assert_eq!(creds.api_key.expose(), "AIzaSyExampleKey0001");
        assert_eq!(creds.model, "gemini-2.5-flash");
        assert_eq!(creds.base_url.as_deref(), Some("http://127.0.0.1:9/v1beta"));
    }

    #[test]
    fn test_credentials_debug_hides_key() {
        let creds = BackendCredentials::new(ModelProvider::OpenAI, "sk-hidden-0123456789", "gpt-4.1-mini");
        let debug = format!("{creds:?}");
        assert!(!debug.contains("sk-hidden"));
        assert!(debug.contains("...6789"));
        assert!(debug.contains("gpt-4.1-mini"));
    }
}
