//! # Dual-credential GitHub proxy
//!
//! Every request handler follows the same shape: exchange the resolved
//! installation id for a token, issue the call, and — only when the
//! installation credential is denied with a 403 and the caller supplied a
//! user token — retry exactly once with that token. All other failures are
//! terminal immediately, and a failed fallback surfaces the original error so
//! the root cause is never masked.

use metrics::counter;
use reqwest::Method;
use tracing::{debug, warn};

use crate::github::fetcher::ACCEPT_JSON;
use crate::github::{GhResponse, GitHubError, GitHubFetcher, InstallationTokenProvider};

/// Which credential ultimately served the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Installation,
    UserFallback,
}

/// A successful proxied response, tagged with the credential that produced it.
#[derive(Debug)]
pub struct ProxyResponse {
    pub response: GhResponse,
    pub via: CredentialSource,
}

/// A request to forward to GitHub.
#[derive(Debug, Clone)]
pub struct GhRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub accept: &'static str,
}

impl GhRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            query: Vec::new(),
            accept: ACCEPT_JSON,
        }
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    pub fn with_accept(mut self, accept: &'static str) -> Self {
        self.accept = accept;
        self
    }
}

/// Orchestrates token exchange, the upstream call and the single documented
/// fallback.
#[derive(Clone)]
pub struct DualAuthProxy {
    tokens: InstallationTokenProvider,
    fetcher: GitHubFetcher,
}

impl DualAuthProxy {
    pub fn new(fetcher: GitHubFetcher, tokens: InstallationTokenProvider) -> Self {
        Self { tokens, fetcher }
    }

    pub async fn fetch(
        &self,
        installation_id: i64,
        fallback_token: Option<&str>,
        request: &GhRequest,
    ) -> Result<ProxyResponse, GitHubError> {
        // Configuration and installation-exchange failures are terminal; the
        // fallback only covers permission denials on the proxied call itself.
        let installation = self.tokens.installation_token(installation_id).await?;

        let primary = self
            .fetcher
            .request(
                &installation.token,
                request.method.clone(),
                &request.path,
                &request.query,
                request.accept,
            )
            .await;

        let denied = match primary {
            Ok(response) => {
                return Ok(ProxyResponse {
                    response,
                    via: CredentialSource::Installation,
                });
            }
            Err(err) => err,
        };

        if denied.status() != Some(403) {
            return Err(denied);
        }
        let Some(user_token) = fallback_token else {
            return Err(denied);
        };

        warn!(
            path = %request.path,
            "Installation credential denied with 403, retrying with user token"
        );
        counter!("repolens_fallback_attempts_total").increment(1);

        match self
            .fetcher
            .request(
                user_token,
                request.method.clone(),
                &request.path,
                &request.query,
                request.accept,
            )
            .await
        {
            Ok(response) => Ok(ProxyResponse {
                response,
                via: CredentialSource::UserFallback,
            }),
            Err(fallback_err) => {
                // Surface the installation credential's error, not the
                // fallback's, so the root cause stays visible.
                debug!(path = %request.path, error = %fallback_err, "Fallback token also failed");
                Err(denied)
            }
        }
    }
}
