//! # Traffic Endpoint
//!
//! Clone and view counts for the trailing two weeks. The two GitHub calls
//! are independent, so they are issued concurrently and joined — the only
//! intra-request parallelism in the service.

use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::access::AccessMode;
use crate::auth::Caller;
use crate::error::ApiError;
use crate::github::types::{TrafficClones, TrafficViews};
use crate::proxy::GhRequest;
use crate::server::AppState;

use super::{authorize, github_error};

/// Combined traffic summary.
#[derive(Debug, Serialize, ToSchema)]
pub struct TrafficSummary {
    pub clones: TrafficClones,
    pub views: TrafficViews,
}

#[utoipa::path(
    get,
    path = "/traffic/{owner}/{repo}",
    params(
        ("owner" = String, Path, description = "Repository owner"),
        ("repo" = String, Path, description = "Repository name"),
    ),
    responses(
        (status = 200, description = "Clone and view counts", body = TrafficSummary),
        (status = 401, description = "No caller identity", body = ApiError),
        (status = 403, description = "Caller is not authorized for this repository", body = ApiError),
        (status = 500, description = "Server configuration error", body = ApiError),
    ),
    tag = "traffic"
)]
pub async fn traffic_summary(
    State(state): State<AppState>,
    caller: Caller,
    Path((owner, repo)): Path<(String, String)>,
) -> Result<Json<TrafficSummary>, ApiError> {
    let credential = authorize(&state, &caller, &owner, &repo, AccessMode::OwnerOnly).await?;

    let clones_request = GhRequest::get(format!("repos/{owner}/{repo}/traffic/clones"));
    let views_request = GhRequest::get(format!("repos/{owner}/{repo}/traffic/views"));
    let fallback = caller.fallback_token();

    let (clones_result, views_result) = tokio::join!(
        state
            .proxy
            .fetch(credential.installation_id, fallback, &clones_request),
        state
            .proxy
            .fetch(credential.installation_id, fallback, &views_request),
    );

    let clones: TrafficClones = clones_result
        .and_then(|r| r.response.json())
        .map_err(|e| github_error(&owner, &repo, e))?;
    let views: TrafficViews = views_result
        .and_then(|r| r.response.json())
        .map_err(|e| github_error(&owner, &repo, e))?;

    Ok(Json(TrafficSummary { clones, views }))
}
