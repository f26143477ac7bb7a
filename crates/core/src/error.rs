/// Top-level error type. All public API functions return this or one of its parts.
#[derive(Debug, thiserror::Error)]
pub enum TmmError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Scrape error: {0}")]
    Scrape(#[from] ScrapeError),

    #[error("Enum registry error: {0}")]
    OpenEnum(#[from] OpenEnumError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Key '{0}' is not defined")]
    UnknownKey(String),

    #[error("Value '{value}' for key '{key}' is not in the list of possible values")]
    NotAllowed { key: String, value: String },

    #[error("Value '{value}' for key '{key}' is not a boolean")]
    NotBoolean { key: String, value: String },

    #[error("Malformed config {path}: {detail}")]
    Malformed { path: String, detail: String },

    #[error("Could not encrypt or decrypt value for key '{key}': {detail}")]
    Crypto { key: String, detail: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Provider '{0}' is already registered")]
    Duplicate(String),

    #[error("Provider '{0}' is not registered")]
    NotFound(String),

    #[error("Provider '{id}' does not support {capability}")]
    MissingCapability { id: String, capability: String },

    #[error("Provider '{id}' could not be initialized: {message}")]
    Init { id: String, message: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider {provider} returned error: {message}")]
    ProviderError { provider: String, message: String },

    #[error("No results found")]
    NotFound,

    #[error("No usable id for provider {0}")]
    MissingId(String),

    #[error("Provider {0} is not configured (missing API key)")]
    NotConfigured(String),

    #[error("Rate limited by {provider}, retry after {retry_after_ms}ms")]
    RateLimited {
        provider: String,
        retry_after_ms: u64,
    },

    #[error("Task was cancelled")]
    Cancelled,

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

#[derive(Debug, thiserror::Error)]
pub enum OpenEnumError {
    #[error("Constant '{0}' is already registered")]
    Duplicate(String),
}

/// A name that does not denote any variant of `kind`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {kind}: {value}")]
pub struct ParseNameError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseNameError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
