//! Runtime settings and the per-domain fetch table.
//!
//! `Settings` is built once (environment, then CLI overrides) and threaded
//! into each component. Nothing reads the environment after that.

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::credentials::{BackendCredentials, SecretString};
use crate::error::{ConfigError, ConfigResult};
use crate::traits::PageInstruction;
use crate::types::normalize_domain;

pub const DEFAULT_STORE_PATH: &str = "volunteer_opportunities.json";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4.1-mini";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_THINKING_BUDGET: u32 = 300;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MAX_REDIRECTS: usize = 5;
pub const DEFAULT_MAX_CONTENT_CHARS: usize = 60_000;

/// Desktop Chrome with a crawler token, so sites that block bare clients
/// still see a browser while the crawler stays identifiable.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko; compatible; VolunteerExtractor/0.1;) Chrome/124.0.0.0 Safari/537.36";

// =============================================================================
// Model selection
// =============================================================================

/// Which structured-completion backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelProvider {
    #[default]
    Gemini,
    OpenAI,
}

impl ModelProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelProvider::Gemini => "gemini",
            ModelProvider::OpenAI => "gpt",
        }
    }

    /// Environment variable holding this backend's key.
    pub fn key_var(&self) -> &'static str {
        match self {
            ModelProvider::Gemini => "GEMINI_API_KEY",
            ModelProvider::OpenAI => "OPENAI_API_KEY",
        }
    }

    pub(crate) fn display_name(&self) -> &'static str {
        match self {
            ModelProvider::Gemini => "Gemini",
            ModelProvider::OpenAI => "OpenAI",
        }
    }
}

impl fmt::Display for ModelProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Ok(ModelProvider::Gemini),
            "gpt" | "openai" => Ok(ModelProvider::OpenAI),
            _ => Err(ConfigError::UnknownModel(s.trim().to_string())),
        }
    }
}

// =============================================================================
// Settings
// =============================================================================

/// HTTP fetch knobs.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub timeout: Duration,
    pub user_agent: String,
    pub max_redirects: usize,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

/// Everything a run needs, resolved up front.
#[derive(Debug, Clone)]
pub struct Settings {
    pub provider: ModelProvider,
    pub openai_api_key: Option<SecretString>,
    pub gemini_api_key: Option<SecretString>,
    pub openai_model: String,
    pub gemini_model: String,
    pub openai_base_url: Option<String>,
    pub gemini_base_url: Option<String>,
    pub thinking_budget: u32,
    pub store_path: PathBuf,
    pub domains_path: Option<PathBuf>,
    pub max_content_chars: usize,
    pub fetch: FetchSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider: ModelProvider::default(),
            openai_api_key: None,
            gemini_api_key: None,
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            openai_base_url: None,
            gemini_base_url: None,
            thinking_budget: DEFAULT_THINKING_BUDGET,
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            domains_path: None,
            max_content_chars: DEFAULT_MAX_CONTENT_CHARS,
            fetch: FetchSettings::default(),
        }
    }
}

impl Settings {
    /// Load from the process environment, reading `.env` first if present.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_env_shadowed(&[])
    }

    /// Like [`Settings::from_env`], with the `shadowed` variables treated as
    /// unset. Used when a command-line flag replaces a variable, so a bad
    /// value in the environment cannot fail the run.
    pub fn from_env_shadowed(shadowed: &[&str]) -> ConfigResult<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup_shadowed(|key| env::var(key).ok(), shadowed)
    }

    pub fn from_lookup_shadowed(
        lookup: impl Fn(&str) -> Option<String>,
        shadowed: &[&str],
    ) -> ConfigResult<Self> {
        Self::from_lookup(|key| {
            if shadowed.iter().any(|s| *s == key) {
                None
            } else {
                lookup(key)
            }
        })
    }

    /// Load from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut settings = Self::default();

        if let Some(model) = get("VOLUNTEER_MODEL") {
            settings.provider = model.parse()?;
        }
        settings.openai_api_key = get("OPENAI_API_KEY").map(SecretString::from);
        settings.gemini_api_key = get("GEMINI_API_KEY").map(SecretString::from);
        if let Some(model) = get("OPENAI_MODEL") {
            settings.openai_model = model;
        }
        if let Some(model) = get("GEMINI_MODEL") {
            settings.gemini_model = model;
        }
        settings.openai_base_url = get("OPENAI_BASE_URL");
        settings.gemini_base_url = get("GEMINI_BASE_URL");
        if let Some(path) = get("VOLUNTEER_STORE") {
            settings.store_path = PathBuf::from(path);
        }
        settings.domains_path = get("VOLUNTEER_DOMAINS").map(PathBuf::from);

        if let Some(raw) = get("FETCH_TIMEOUT_SECS") {
            settings.fetch.timeout = parse_timeout(&raw)?;
        }
        if let Some(raw) = get("MAX_CONTENT_CHARS") {
            settings.max_content_chars =
                raw.parse::<usize>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| ConfigError::Invalid {
                        key: "MAX_CONTENT_CHARS".into(),
                        reason: format!("expected a positive integer, got `{raw}`"),
                    })?;
        }

        debug!(
            provider = %settings.provider,
            store = %settings.store_path.display(),
            domains = ?settings.domains_path,
            timeout_secs = settings.fetch.timeout.as_secs(),
            "settings loaded"
        );

        Ok(settings)
    }

    pub fn with_provider(mut self, provider: ModelProvider) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = path.into();
        self
    }

    pub fn with_domains_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.domains_path = Some(path.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.fetch.timeout = timeout;
        self
    }

    /// Key and model for the selected backend.
    ///
    /// Fails with `MissingCredential` before any request is made.
    pub fn credentials(&self) -> ConfigResult<BackendCredentials> {
        let (key, model, base_url) = match self.provider {
            ModelProvider::Gemini => (
                &self.gemini_api_key,
                &self.gemini_model,
                &self.gemini_base_url,
            ),
            ModelProvider::OpenAI => (
                &self.openai_api_key,
                &self.openai_model,
                &self.openai_base_url,
            ),
        };
        BackendCredentials::resolve(self.provider, key.as_ref(), model, base_url.as_deref())
    }

    /// Load the domain table named by `domains_path`, or an empty one.
    pub fn domain_table(&self) -> ConfigResult<DomainTable> {
        match &self.domains_path {
            Some(path) => DomainTable::load(path),
            None => Ok(DomainTable::default()),
        }
    }
}

fn parse_timeout(raw: &str) -> ConfigResult<Duration> {
    raw.parse::<u64>()
        .ok()
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .ok_or_else(|| ConfigError::Invalid {
            key: "FETCH_TIMEOUT_SECS".into(),
            reason: format!("expected a positive number of seconds, got `{raw}`"),
        })
}

// =============================================================================
// Domain table
// =============================================================================

/// How pages of a domain are fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStrategy {
    #[default]
    Http,
    Browser,
}

impl fmt::Display for FetchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchStrategy::Http => f.write_str("http"),
            FetchStrategy::Browser => f.write_str("browser"),
        }
    }
}

/// Fetch configuration for one domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DomainEntry {
    pub strategy: FetchStrategy,
    pub instructions: Vec<PageInstruction>,
}

impl DomainEntry {
    pub fn browser(instructions: Vec<PageInstruction>) -> Self {
        Self {
            strategy: FetchStrategy::Browser,
            instructions,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct DomainFile {
    domains: HashMap<String, DomainEntry>,
}

/// Table key that matches every domain without a more specific entry.
pub const WILDCARD_DOMAIN: &str = "*";

/// Per-domain fetch strategies, keyed by normalized domain.
#[derive(Debug, Clone, Default)]
pub struct DomainTable {
    entries: HashMap<String, DomainEntry>,
}

impl DomainTable {
    /// Read a TOML file. A missing file is an error; the caller named it.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_toml_str(&content).map_err(|e| match e {
            ConfigError::Parse { reason, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })?;

        debug!(path = %path.display(), domains = table.len(), "domain table loaded");
        Ok(table)
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let file: DomainFile = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            reason: e.to_string(),
        })?;

        let mut table = Self::default();
        for (domain, entry) in file.domains {
            validate_entry(&domain, &entry)?;
            table.insert(&domain, entry);
        }
        Ok(table)
    }

    /// Add or replace the entry for `domain` (normalized first).
    pub fn insert(&mut self, domain: &str, entry: DomainEntry) {
        self.entries.insert(normalize_domain(domain), entry);
    }

    pub fn get(&self, domain: &str) -> Option<&DomainEntry> {
        self.entries.get(&normalize_domain(domain))
    }

    /// Entry for `domain`, its nearest configured parent domain, or the
    /// `"*"` catch-all.
    ///
    /// `events.example.org` falls back to `example.org`; the bare TLD is
    /// never matched.
    pub fn resolve(&self, domain: &str) -> Option<(&str, &DomainEntry)> {
        let mut candidate = normalize_domain(domain);
        loop {
            if let Some((key, entry)) = self.entries.get_key_value(&candidate) {
                return Some((key.as_str(), entry));
            }
            match candidate.split_once('.') {
                Some((_, parent)) if parent.contains('.') => candidate = parent.to_string(),
                _ => break,
            }
        }
        self.entries
            .get_key_value(WILDCARD_DOMAIN)
            .map(|(key, entry)| (key.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DomainEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// First domain that needs a browser, if any.
    pub fn first_browser_domain(&self) -> Option<&str> {
        let mut browser: Vec<&str> = self
            .iter()
            .filter(|(_, e)| e.strategy == FetchStrategy::Browser)
            .map(|(d, _)| d)
            .collect();
        browser.sort_unstable();
        browser.first().copied()
    }
}

fn validate_entry(domain: &str, entry: &DomainEntry) -> ConfigResult<()> {
    if normalize_domain(domain).is_empty() {
        return Err(ConfigError::Invalid {
            key: "domains".into(),
            reason: "empty domain key".into(),
        });
    }

    for (i, step) in entry.instructions.iter().enumerate() {
        let blank_selector = match step {
            PageInstruction::WaitFor { selector, .. } | PageInstruction::Click { selector } => {
                selector.trim().is_empty()
            }
            PageInstruction::Navigate { url } => url.trim().is_empty(),
            PageInstruction::Sleep { .. } => false,
        };
        if blank_selector {
            return Err(ConfigError::Invalid {
                key: format!("domains.\"{domain}\".instructions[{i}]"),
                reason: format!("`{}` needs a non-empty target", step.action()),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_model_selector() {
        assert_eq!("gemini".parse::<ModelProvider>().unwrap(), ModelProvider::Gemini);
        assert_eq!("GPT".parse::<ModelProvider>().unwrap(), ModelProvider::OpenAI);
        assert_eq!("openai".parse::<ModelProvider>().unwrap(), ModelProvider::OpenAI);
        assert!(matches!(
            "claude".parse::<ModelProvider>(),
            Err(ConfigError::UnknownModel(m)) if m == "claude"
        ));
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();

        assert_eq!(settings.provider, ModelProvider::Gemini);
        assert_eq!(settings.store_path, PathBuf::from("volunteer_opportunities.json"));
        assert_eq!(settings.fetch.timeout, Duration::from_secs(10));
        assert_eq!(settings.fetch.max_redirects, 5);
        assert_eq!(settings.gemini_model, "gemini-2.5-flash");
        assert_eq!(settings.openai_model, "gpt-4.1-mini");
        assert_eq!(settings.thinking_budget, 300);
        assert!(settings.domains_path.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            ("VOLUNTEER_MODEL", "gpt"),
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_MODEL", "gpt-4.1"),
            ("VOLUNTEER_STORE", "/tmp/ops.json"),
            ("FETCH_TIMEOUT_SECS", "25"),
        ]))
        .unwrap();

        assert_eq!(settings.provider, ModelProvider::OpenAI);
        assert_eq!(settings.fetch.timeout, Duration::from_secs(25));
        let creds = settings.credentials().unwrap();
        assert_eq!(creds.model, "gpt-4.1");
        assert_eq!(creds.api_key.expose(), "sk-test");
    }

    #[test]
    fn test_bad_timeout_is_invalid() {
        for raw in ["soon", "0"] {
            let err = Settings::from_lookup(lookup(&[("FETCH_TIMEOUT_SECS", raw)])).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "FETCH_TIMEOUT_SECS"));
        }
    }

    #[test]
    fn test_shadowed_variables_are_ignored() {
        let env = [("VOLUNTEER_MODEL", "claude"), ("FETCH_TIMEOUT_SECS", "0")];

        assert!(Settings::from_lookup(lookup(&env)).is_err());

        let settings =
            Settings::from_lookup_shadowed(lookup(&env), &["VOLUNTEER_MODEL", "FETCH_TIMEOUT_SECS"])
                .unwrap();
        assert_eq!(settings.provider, ModelProvider::Gemini);
        assert_eq!(settings.fetch.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_missing_credential_detected() {
        let settings = Settings::from_lookup(lookup(&[("GEMINI_API_KEY", "   ")])).unwrap();
        let err = settings.credentials().unwrap_err();

        assert!(matches!(
            err,
            ConfigError::MissingCredential {
                var: "GEMINI_API_KEY",
                ..
            }
        ));
    }

    #[test]
    fn test_domain_table_parses_and_normalizes_keys() {
        let table = DomainTable::from_toml_str(
            r#"
            [domains."WWW.VolunteerMatch.org"]
            strategy = "browser"
            instructions = [
              { action = "wait_for", selector = ".opportunity", timeout_ms = 8000 },
              { action = "click", selector = "button.show-more" },
            ]

            [domains."soupmobile.org"]
            "#,
        )
        .unwrap();

        assert_eq!(table.len(), 2);
        let vm = table.get("volunteermatch.org").unwrap();
        assert_eq!(vm.strategy, FetchStrategy::Browser);
        assert_eq!(vm.instructions.len(), 2);
        assert_eq!(table.get("www.soupmobile.org").unwrap().strategy, FetchStrategy::Http);
        assert_eq!(table.first_browser_domain(), Some("volunteermatch.org"));

        let (key, _) = table.resolve("events.volunteermatch.org").unwrap();
        assert_eq!(key, "volunteermatch.org");
        assert!(table.resolve("org").is_none());
        assert!(table.resolve("example.org").is_none());
    }

    #[test]
    fn test_wildcard_entry_catches_unlisted_domains() {
        let table = DomainTable::from_toml_str(
            r#"
            [domains."volunteermatch.org"]
            strategy = "browser"

            [domains."*"]
            strategy = "http"
            "#,
        )
        .unwrap();

        let (key, entry) = table.resolve("soupmobile.org").unwrap();
        assert_eq!(key, "*");
        assert_eq!(entry.strategy, FetchStrategy::Http);

        let (key, _) = table.resolve("jobs.volunteermatch.org").unwrap();
        assert_eq!(key, "volunteermatch.org");
    }

    #[test]
    fn test_domain_table_errors() {
        let unknown = DomainTable::from_toml_str("[domains.\"a.org\"]\nstrategy = \"carrier-pigeon\"");
        assert!(matches!(unknown, Err(ConfigError::Parse { .. })));

        let blank = DomainTable::from_toml_str(
            "[domains.\"a.org\"]\ninstructions = [{ action = \"click\", selector = \" \" }]",
        );
        assert!(matches!(blank, Err(ConfigError::Invalid { .. })));

        let missing = DomainTable::load(Path::new("/definitely/not/here.toml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }
}
