//! GitHub App installation-token exchange.
//!
//! Each call signs a short-lived RS256 App JWT and trades it for an
//! installation access token. Tokens are re-derived per request; there is no
//! cross-request cache, so concurrent requests for the same installation each
//! pay the full exchange cost.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

use super::fetcher::{ACCEPT_JSON, GitHubFetcher};
use super::GitHubError;
use crate::config::GithubAppCredentials;

/// JWT claims for GitHub App authentication.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Issued at (seconds since epoch), backdated for clock skew.
    iat: u64,
    /// Expiration (seconds since epoch).
    exp: u64,
    /// Issuer: the GitHub App id.
    iss: String,
}

/// Sign the App JWT. GitHub caps the lifetime at 10 minutes; 9 gives buffer,
/// and iat is backdated 60 seconds against clock skew.
fn generate_app_jwt(app_id: u64, private_key_pem: &str) -> Result<String, GitHubError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| GitHubError::Jwt(format!("system time error: {e}")))?;

    let claims = Claims {
        iat: now.as_secs().saturating_sub(60),
        exp: now.as_secs() + Duration::from_secs(9 * 60).as_secs(),
        iss: app_id.to_string(),
    };

    let encoding_key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
        .map_err(|e| GitHubError::Jwt(format!("invalid RSA private key: {e}")))?;

    encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)
        .map_err(|e| GitHubError::Jwt(format!("failed to encode JWT: {e}")))
}

/// A short-lived installation access token.
#[derive(Debug, Clone, Deserialize)]
pub struct InstallationToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Exchanges the App identity plus an installation id for an installation
/// access token.
#[derive(Clone)]
pub struct InstallationTokenProvider {
    fetcher: GitHubFetcher,
    credentials: Option<GithubAppCredentials>,
}

impl InstallationTokenProvider {
    pub fn new(fetcher: GitHubFetcher, credentials: Option<GithubAppCredentials>) -> Self {
        Self {
            fetcher,
            credentials,
        }
    }

    /// Perform a fresh token exchange for the installation.
    ///
    /// Fails with [`GitHubError::Config`] before any upstream call when the
    /// App credential set is incomplete, and with
    /// [`GitHubError::InstallationRejected`] when GitHub no longer recognizes
    /// the installation (revoked or uninstalled).
    pub async fn installation_token(
        &self,
        installation_id: i64,
    ) -> Result<InstallationToken, GitHubError> {
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            GitHubError::Config(
                "app id, private key, OAuth client id and client secret are all required"
                    .to_string(),
            )
        })?;

        let jwt = generate_app_jwt(credentials.app_id, credentials.private_key.expose())?;

        let response = self
            .fetcher
            .request(
                &jwt,
                Method::POST,
                &format!("app/installations/{installation_id}/access_tokens"),
                &[],
                ACCEPT_JSON,
            )
            .await
            .map_err(|err| match err {
                GitHubError::Api { status, message } if status == 401 || status == 404 => {
                    GitHubError::InstallationRejected {
                        installation_id,
                        status,
                        message,
                    }
                }
                other => other,
            })?;

        let token: InstallationToken = response.json()?;
        debug!(
            installation_id,
            expires_at = %token.expires_at,
            "Exchanged installation access token"
        );
        Ok(token)
    }
}
