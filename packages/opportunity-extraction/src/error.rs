//! Typed errors for each pipeline stage.
//!
//! Uses `thiserror` for library errors (not `anyhow`). Every kind is terminal
//! for a run; `PipelineError` tags which stage produced it.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from the page-text fetcher.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The input could not be turned into an absolute http(s) URL
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// Transport failure (DNS, connection refused, TLS)
    #[error("HTTP request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Non-2xx status after redirects
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// Request or page-interaction timeout
    #[error("timeout fetching {url}: {reason}")]
    Timeout { url: String, reason: String },

    /// The cleaned page text is empty
    #[error("no readable text at {url}")]
    EmptyContent { url: String },

    /// Headless browser failure (launch, navigation, missing element)
    #[error("browser error on {url}: {reason}")]
    Browser { url: String, reason: String },
}

/// Configuration errors. Raised before any network activity.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required API key is not set
    #[error("{var} is not set; set it in the environment or .env to use the {provider} backend")]
    MissingCredential {
        provider: &'static str,
        var: &'static str,
    },

    /// Model selector is not one of the supported backends
    #[error("unknown model `{0}` (expected `gemini` or `gpt`)")]
    UnknownModel(String),

    /// A domain table is configured but covers neither the host nor a parent
    #[error("no fetch configuration for domain `{domain}`; add it (or a \"*\" entry) to the domain table")]
    UnknownDomain { domain: String },

    /// Fetch strategy requested but not compiled in
    #[error("domain `{domain}` requires the `{strategy}` fetch strategy, which this build does not support")]
    UnsupportedStrategy { domain: String, strategy: String },

    /// Config file could not be read
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is malformed
    #[error("malformed config file {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    /// A setting has an unusable value
    #[error("invalid setting {key}: {reason}")]
    Invalid { key: String, reason: String },
}

/// Errors from the structured-completion stage.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Backend rejected the request (auth, quota, bad request, blocked)
    #[error("{backend} API error: {message}")]
    Api {
        backend: &'static str,
        message: String,
    },

    /// Backend unreachable
    #[error("{backend} network error: {message}")]
    Network {
        backend: &'static str,
        message: String,
    },

    /// Backend answered, but not with the requested structure
    #[error("{backend} returned an unparseable record: {message}")]
    Parse {
        backend: &'static str,
        message: String,
    },

    /// Function-calling backend answered without calling the forced tool
    #[error("{backend} did not call `{tool}`: {message}")]
    MissingToolCall {
        backend: &'static str,
        tool: &'static str,
        message: String,
    },

    /// Record parsed but violates the Opportunity contract
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },
}

impl ExtractionError {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        ExtractionError::Validation {
            field,
            reason: reason.into(),
        }
    }
}

/// Errors from the record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem failure
    #[error("record store I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Existing file is not a valid document collection
    #[error("record store {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    /// Record could not be serialized
    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A failed run, tagged with the stage that failed.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("fetch stage failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("extraction stage failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("persist stage failed: {0}")]
    Store(#[from] StoreError),
}

impl PipelineError {
    /// Short stage name for logs.
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Config(_) => "config",
            PipelineError::Fetch(_) => "fetch",
            PipelineError::Extraction(_) => "extract",
            PipelineError::Store(_) => "persist",
        }
    }
}

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for configuration loading.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for extraction operations.
pub type ExtractionResult<T> = std::result::Result<T, ExtractionError>;

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type alias for a full run.
pub type Result<T> = std::result::Result<T, PipelineError>;
