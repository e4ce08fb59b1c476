//! # API Handlers
//!
//! This module contains all the HTTP endpoint handlers for the RepoLens API.
//! Every repository endpoint follows the same shape: resolve the caller's
//! credential against the registry, proxy the GitHub call(s), and shape the
//! response.

use axum::response::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::access::{AccessMode, CredentialResolver, ResolvedCredential};
use crate::auth::Caller;
use crate::error::{ApiError, validation_error};
use crate::github::GitHubError;
use crate::server::AppState;

pub mod commits;
pub mod issues;
pub mod passthrough;
pub mod stars;
pub mod stats;
pub mod traffic;
pub mod types;

/// Basic service information returned by the root endpoint
#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceInfo {
    /// Service name
    pub name: String,
    /// Service version
    pub version: String,
    /// Service status
    pub status: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            name: "repolens".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            status: "ok".to_string(),
        }
    }
}

/// Root handler that returns basic service information
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service information", body = ServiceInfo)
    ),
    tag = "root"
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}

/// Validate path parameters and resolve the credential for (owner, repo).
pub(crate) async fn authorize(
    state: &AppState,
    caller: &Caller,
    owner: &str,
    repo: &str,
    mode: AccessMode,
) -> Result<ResolvedCredential, ApiError> {
    if owner.is_empty() || repo.is_empty() {
        return Err(validation_error(
            "Missing path parameters",
            serde_json::json!({ "owner": "required", "repo": "required" }),
        ));
    }

    CredentialResolver::new(state.registry.as_ref())
        .resolve(caller.user_id(), owner, repo, mode)
        .await
        .map_err(|denial| {
            tracing::warn!(owner, repo, reason = %denial, "Request denied");
            denial.into()
        })
}

/// Log an upstream failure with repository context before mapping it to the
/// API error shape.
pub(crate) fn github_error(owner: &str, repo: &str, error: GitHubError) -> ApiError {
    tracing::error!(owner, repo, %error, "GitHub request failed");
    error.into()
}

#[cfg(test)]
mod tests;
