//! # Commit Endpoints
//!
//! The latest-commit probe (the one endpoint that also serves anonymous
//! callers of public repositories) and the weekly-aggregated commit history.

use axum::{
    extract::{Path, Query, State},
    response::Json,
};

use crate::access::AccessMode;
use crate::aggregate::{WeeklyCommits, weekly_commit_buckets};
use crate::auth::Caller;
use crate::error::ApiError;
use crate::github::pagination::{MAX_PAGES, PER_PAGE, fetch_all_pages};
use crate::github::types::Commit;
use crate::proxy::GhRequest;
use crate::server::AppState;

use super::types::SinceQuery;
use super::{authorize, github_error};

/// Latest commit of the repository's default branch.
#[utoipa::path(
    get,
    path = "/commits/{owner}/{repo}",
    params(
        ("owner" = String, Path, description = "Repository owner"),
        ("repo" = String, Path, description = "Repository name"),
    ),
    responses(
        (status = 200, description = "Most recent commit, as a single-element list", body = Vec<Commit>),
        (status = 401, description = "No caller identity and the repository is not public", body = ApiError),
        (status = 403, description = "Caller is not authorized for this repository", body = ApiError),
        (status = 500, description = "Server configuration error", body = ApiError),
    ),
    tag = "commits"
)]
pub async fn latest_commit(
    State(state): State<AppState>,
    caller: Caller,
    Path((owner, repo)): Path<(String, String)>,
) -> Result<Json<Vec<Commit>>, ApiError> {
    let credential =
        authorize(&state, &caller, &owner, &repo, AccessMode::PublicFallback).await?;

    let request = GhRequest::get(format!("repos/{owner}/{repo}/commits"))
        .with_query(vec![("per_page".to_string(), "1".to_string())]);

    let result = state
        .proxy
        .fetch(credential.installation_id, caller.fallback_token(), &request)
        .await
        .map_err(|e| github_error(&owner, &repo, e))?;

    let commits: Vec<Commit> = result
        .response
        .json()
        .map_err(|e| github_error(&owner, &repo, e))?;
    Ok(Json(commits))
}

/// Commit history since a given instant, folded into ISO-week buckets.
#[utoipa::path(
    get,
    path = "/commits-over-time/{owner}/{repo}",
    params(
        ("owner" = String, Path, description = "Repository owner"),
        ("repo" = String, Path, description = "Repository name"),
        SinceQuery,
    ),
    responses(
        (status = 200, description = "Weekly commit buckets, chronological", body = Vec<WeeklyCommits>),
        (status = 401, description = "No caller identity", body = ApiError),
        (status = 403, description = "Caller is not authorized for this repository", body = ApiError),
        (status = 500, description = "Server configuration error", body = ApiError),
    ),
    tag = "commits"
)]
pub async fn commits_over_time(
    State(state): State<AppState>,
    caller: Caller,
    Path((owner, repo)): Path<(String, String)>,
    Query(params): Query<SinceQuery>,
) -> Result<Json<Vec<WeeklyCommits>>, ApiError> {
    let credential = authorize(&state, &caller, &owner, &repo, AccessMode::OwnerOnly).await?;

    let path = format!("repos/{owner}/{repo}/commits");
    let proxy = &state.proxy;
    let fallback = caller.fallback_token();

    let commits: Vec<Commit> = fetch_all_pages(PER_PAGE, MAX_PAGES, |page| {
        let mut query = vec![
            ("per_page".to_string(), PER_PAGE.to_string()),
            ("page".to_string(), page.to_string()),
        ];
        if let Some(since) = params.since {
            query.push(("since".to_string(), since.to_rfc3339()));
        }
        let request = GhRequest::get(path.clone()).with_query(query);

        async move {
            let result = proxy
                .fetch(credential.installation_id, fallback, &request)
                .await?;
            result.response.json::<Vec<Commit>>()
        }
    })
    .await
    .map_err(|e| github_error(&owner, &repo, e))?;

    Ok(Json(weekly_commit_buckets(&commits)))
}
