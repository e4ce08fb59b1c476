//! # GitHub Access Layer
//!
//! Installation-token exchange, the authenticated REST fetcher, the bounded
//! pagination loop and the contributor-stats poller.

pub mod app_token;
pub mod fetcher;
pub mod pagination;
pub mod stats;
pub mod types;

use thiserror::Error;

pub use app_token::{InstallationToken, InstallationTokenProvider};
pub use fetcher::{GhResponse, GitHubFetcher};

/// Errors raised while talking to GitHub.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// The GitHub App credential set is incomplete. Surfaced as a 500 without
    /// attempting any upstream call.
    #[error("GitHub App credentials are not configured: {0}")]
    Config(String),

    /// App JWT could not be signed.
    #[error("failed to sign GitHub App JWT: {0}")]
    Jwt(String),

    /// GitHub rejected the installation id (revoked or uninstalled).
    #[error("installation {installation_id} rejected by GitHub: {status} {message}")]
    InstallationRejected {
        installation_id: i64,
        status: u16,
        message: String,
    },

    /// Non-2xx from GitHub, with the upstream status and GitHub's own message
    /// attached so callers can inspect it.
    #[error("GitHub API error {status}: {message}")]
    Api { status: u16, message: String },

    /// The request failed before a response arrived.
    #[error("network error talking to GitHub: {0}")]
    Network(#[from] reqwest::Error),

    /// A 2xx payload did not match the expected shape.
    #[error("unexpected GitHub payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// Contributor statistics cannot be computed (history too large, 422).
    #[error("contributor statistics are unavailable for this repository")]
    StatsUnavailable,
}

impl GitHubError {
    /// The upstream HTTP status, when the error carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            GitHubError::Api { status, .. } | GitHubError::InstallationRejected { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}
