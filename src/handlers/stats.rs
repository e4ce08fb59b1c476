//! # Contributor Statistics Endpoint
//!
//! GitHub computes this payload asynchronously; while it does, the endpoint
//! answers 202 with a "Computing stats" message instead of an error.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::access::AccessMode;
use crate::auth::Caller;
use crate::error::ApiError;
use crate::github::stats::{
    ContributorStatsOutcome, ContributorTotals, STATS_MAX_RETRIES, poll_contributor_stats,
};
use crate::proxy::GhRequest;
use crate::server::AppState;

use super::{authorize, github_error};

#[utoipa::path(
    get,
    path = "/stats/contributors/{owner}/{repo}",
    params(
        ("owner" = String, Path, description = "Repository owner"),
        ("repo" = String, Path, description = "Repository name"),
    ),
    responses(
        (status = 200, description = "Top contributors by lines changed", body = Vec<ContributorTotals>),
        (status = 202, description = "GitHub is still computing the statistics"),
        (status = 401, description = "No caller identity", body = ApiError),
        (status = 403, description = "Caller is not authorized for this repository", body = ApiError),
        (status = 422, description = "Statistics cannot be computed for this repository", body = ApiError),
        (status = 500, description = "Server configuration error", body = ApiError),
    ),
    tag = "stats"
)]
pub async fn contributor_stats(
    State(state): State<AppState>,
    caller: Caller,
    Path((owner, repo)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let credential = authorize(&state, &caller, &owner, &repo, AccessMode::OwnerOnly).await?;

    let request = GhRequest::get(format!("repos/{owner}/{repo}/stats/contributors"));
    let proxy = &state.proxy;
    let fallback = caller.fallback_token();

    let outcome = poll_contributor_stats(STATS_MAX_RETRIES, || {
        let request = request.clone();
        async move {
            let result = proxy
                .fetch(credential.installation_id, fallback, &request)
                .await?;
            Ok(result.response)
        }
    })
    .await
    .map_err(|e| github_error(&owner, &repo, e))?;

    match outcome {
        ContributorStatsOutcome::Ready(totals) => Ok(Json(totals).into_response()),
        ContributorStatsOutcome::Computing => Ok((
            StatusCode::ACCEPTED,
            Json(json!({ "message": "Computing stats" })),
        )
            .into_response()),
    }
}
