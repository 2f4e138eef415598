//! Provider layer for the single supported backend (GitLab REST v4).
//!
//! The system performs exactly two fetch shapes (merge request, issue) for
//! exactly one provider, so there is no facade enum here: `GitLabClient`
//! is the concrete entry point. Any GitLab-compatible server implementing
//! the same API surface is a valid backend.

pub mod types;
pub use types::*;

pub mod gitlab;

/// Runtime configuration for the GitLab client.
///
/// Injected explicitly by the caller (usually assembled from CI environment
/// variables at the binary edge); the provider layer itself never reads the
/// process environment.
#[derive(Debug, Clone)]
pub struct GitLabConfig {
    /// Instance base URL, e.g. "https://gitlab.example.com".
    pub host: String,
    /// Access token sent as "PRIVATE-TOKEN".
    pub token: String,
}
