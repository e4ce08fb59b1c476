//! # Authentication
//!
//! This module resolves the caller identity for API endpoints. The session
//! store itself is an external collaborator; this layer only consumes a
//! "current user" lookup and assembles the optional fallback GitHub token
//! from the `X-GitHub-Token` header or the session.

use std::convert::Infallible;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use subtle::ConstantTimeEq;

use crate::config::SessionToken;
use crate::server::AppState;

/// Header carrying the caller's own GitHub OAuth token, consulted only as a
/// fallback credential.
pub const GITHUB_TOKEN_HEADER: &str = "x-github-token";

/// The authenticated end user as reported by the session provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub user_id: String,
    /// Provider-issued OAuth access token, when the session has one.
    pub github_token: Option<String>,
}

/// External identity/session provider, consumed via "get current user".
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn current_user(&self, bearer: &str) -> Option<SessionUser>;
}

/// Session provider backed by statically configured bearer tokens.
pub struct StaticSessionProvider {
    tokens: Vec<SessionToken>,
}

impl StaticSessionProvider {
    pub fn new(tokens: Vec<SessionToken>) -> Self {
        Self { tokens }
    }
}

#[async_trait]
impl SessionProvider for StaticSessionProvider {
    async fn current_user(&self, bearer: &str) -> Option<SessionUser> {
        self.tokens
            .iter()
            .find(|entry| {
                ConstantTimeEq::ct_eq(bearer.as_bytes(), entry.token.as_bytes()).into()
            })
            .map(|entry| SessionUser {
                user_id: entry.user_id.clone(),
                github_token: None,
            })
    }
}

/// The caller of a request: an optional authenticated user plus the optional
/// fallback GitHub token. Extraction never rejects; handlers decide between
/// 401 and public access.
#[derive(Debug, Clone, Default)]
pub struct Caller {
    pub user: Option<SessionUser>,
    pub github_token: Option<String>,
}

impl Caller {
    pub fn user_id(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.user_id.as_str())
    }

    /// The user OAuth token to retry with when the installation credential is
    /// denied. A header-supplied token wins over the session-provided one.
    pub fn fallback_token(&self) -> Option<&str> {
        self.github_token.as_deref()
    }

    pub async fn from_headers(headers: &HeaderMap, sessions: &dyn SessionProvider) -> Self {
        let bearer = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|header| header.strip_prefix("Bearer "));

        let user = match bearer {
            Some(token) => sessions.current_user(token).await,
            None => None,
        };

        let header_token = headers
            .get(GITHUB_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|token| !token.is_empty())
            .map(|token| token.to_string());

        let github_token =
            header_token.or_else(|| user.as_ref().and_then(|u| u.github_token.clone()));

        Self { user, github_token }
    }
}

impl FromRef<AppState> for Arc<dyn SessionProvider> {
    fn from_ref(app_state: &AppState) -> Self {
        Arc::clone(&app_state.sessions)
    }
}

impl<S> FromRequestParts<S> for Caller
where
    Arc<dyn SessionProvider>: FromRef<S>,
    S: Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let sessions = Arc::<dyn SessionProvider>::from_ref(state);
        Ok(Caller::from_headers(&parts.headers, sessions.as_ref()).await)
    }
}
