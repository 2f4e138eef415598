//! Crate-wide error hierarchy for gitlab-context-engine.

use thiserror::Error;

/// Convenient alias for crate-wide results.
pub type ContextEngineResult<T> = Result<T, ContextEngineError>;

/// Root error type for the gitlab-context-engine crate.
///
/// No variant is ever recovered from locally: every error propagates to the
/// orchestration layer, which decides whether to post a failure comment or
/// abort the pipeline run. No partial context records are returned alongside
/// an error.
#[derive(Debug, Error)]
pub enum ContextEngineError {
    /// A required identifier (e.g. merge-request IID) was absent from the
    /// pipeline context. Raised before any network call is attempted.
    #[error("missing identifier: {0}")]
    MissingIdentifier(&'static str),

    /// An identifier was present but could not be parsed (e.g. a
    /// non-numeric issue IID string).
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Non-2xx response from the direct changed-files fetch.
    #[error("upstream fetch failed: status {status} {reason}")]
    UpstreamFetch {
        /// HTTP status code of the failed response.
        status: u16,
        /// Canonical reason text for the status.
        reason: String,
    },

    /// Failure surfaced by the shared JSON API client (metadata and
    /// discussion calls). Opaque passthrough, never reinterpreted here.
    #[error(transparent)]
    ApiClient(#[from] ApiClientError),

    /// Configuration problems (missing token, missing CI variables).
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// API-client error used by the metadata/discussion request path.
#[derive(Debug, Error)]
pub enum ApiClientError {
    /// Unauthorized (HTTP 401).
    #[error("unauthorized")]
    Unauthorized,

    /// Forbidden (HTTP 403).
    #[error("forbidden")]
    Forbidden,

    /// Not found (HTTP 404).
    #[error("not found")]
    NotFound,

    /// Rate limited (HTTP 429).
    #[error("rate limited")]
    RateLimited {
        /// Optional `Retry-After` hint in seconds when available.
        retry_after_secs: Option<u64>,
    },

    /// Gateway / server error (HTTP 5xx).
    #[error("server error: status {0}")]
    Server(u16),

    /// Other HTTP status (non-2xx) not covered by specific variants.
    #[error("http status error: status {0}")]
    HttpStatus(u16),

    /// Timeout at transport level.
    #[error("timeout")]
    Timeout,

    /// Network/transport failure without HTTP status (DNS/connect/reset).
    #[error("network error: {0}")]
    Network(String),

    /// Unexpected/invalid shape of an API response.
    #[error("invalid api response: {0}")]
    InvalidResponse(String),
}

/// Configuration and setup errors (base host, missing token, CI variables).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Missing or empty GitLab access token.
    #[error("missing gitlab token")]
    MissingToken,

    /// A required CI environment variable was absent or empty.
    #[error("missing environment variable: {0}")]
    MissingVar(&'static str),
}

// ===== Conversions for `?` ergonomics at the crate root =====

impl From<reqwest::Error> for ContextEngineError {
    fn from(e: reqwest::Error) -> Self {
        ContextEngineError::ApiClient(ApiClientError::from(e))
    }
}

// ===== Mapping from reqwest::Error into ApiClientError =====

impl From<reqwest::Error> for ApiClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return ApiClientError::Timeout;
        }

        if e.is_decode() {
            return ApiClientError::InvalidResponse(e.to_string());
        }

        if let Some(status) = e.status() {
            let code = status.as_u16();
            return match code {
                401 => ApiClientError::Unauthorized,
                403 => ApiClientError::Forbidden,
                404 => ApiClientError::NotFound,
                429 => ApiClientError::RateLimited {
                    retry_after_secs: None,
                },
                500..=599 => ApiClientError::Server(code),
                _ => ApiClientError::HttpStatus(code),
            };
        }

        ApiClientError::Network(e.to_string())
    }
}
