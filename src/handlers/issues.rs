//! # Issue Endpoints
//!
//! Paginated issue listing (a passthrough that forwards GitHub's pagination)
//! and the monthly opened/closed aggregation.

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;

use crate::access::AccessMode;
use crate::aggregate::{MonthlyIssues, monthly_issue_buckets};
use crate::auth::Caller;
use crate::error::ApiError;
use crate::github::pagination::{MAX_PAGES, PER_PAGE, fetch_all_pages};
use crate::github::types::Issue;
use crate::proxy::GhRequest;
use crate::server::AppState;

use super::types::{IssueListQuery, link_headers};
use super::{authorize, github_error};

/// One page of issues, with GitHub's `Link` header forwarded.
#[utoipa::path(
    get,
    path = "/issues/{owner}/{repo}",
    params(
        ("owner" = String, Path, description = "Repository owner"),
        ("repo" = String, Path, description = "Repository name"),
        IssueListQuery,
    ),
    responses(
        (status = 200, description = "Issues for the requested page", body = Vec<Issue>),
        (status = 400, description = "Invalid pagination or state filter", body = ApiError),
        (status = 401, description = "No caller identity", body = ApiError),
        (status = 403, description = "Caller is not authorized for this repository", body = ApiError),
        (status = 500, description = "Server configuration error", body = ApiError),
    ),
    tag = "issues"
)]
pub async fn list_issues(
    State(state): State<AppState>,
    caller: Caller,
    Path((owner, repo)): Path<(String, String)>,
    Query(params): Query<IssueListQuery>,
) -> Result<Response, ApiError> {
    let (page, per_page, issue_state) = params.resolve()?;
    let credential = authorize(&state, &caller, &owner, &repo, AccessMode::OwnerOnly).await?;

    let request = GhRequest::get(format!("repos/{owner}/{repo}/issues")).with_query(vec![
        ("page".to_string(), page.to_string()),
        ("per_page".to_string(), per_page.to_string()),
        ("state".to_string(), issue_state),
    ]);

    let result = state
        .proxy
        .fetch(credential.installation_id, caller.fallback_token(), &request)
        .await
        .map_err(|e| github_error(&owner, &repo, e))?;

    let issues: Vec<Issue> = result
        .response
        .json()
        .map_err(|e| github_error(&owner, &repo, e))?;
    Ok((link_headers(&result.response), Json(issues)).into_response())
}

/// Pure issues opened/closed per calendar month over the trailing year.
#[utoipa::path(
    get,
    path = "/issues-over-time/{owner}/{repo}",
    params(
        ("owner" = String, Path, description = "Repository owner"),
        ("repo" = String, Path, description = "Repository name"),
    ),
    responses(
        (status = 200, description = "Twelve monthly buckets ending at the current month", body = Vec<MonthlyIssues>),
        (status = 401, description = "No caller identity", body = ApiError),
        (status = 403, description = "Caller is not authorized for this repository", body = ApiError),
        (status = 500, description = "Server configuration error", body = ApiError),
    ),
    tag = "issues"
)]
pub async fn issues_over_time(
    State(state): State<AppState>,
    caller: Caller,
    Path((owner, repo)): Path<(String, String)>,
) -> Result<Json<Vec<MonthlyIssues>>, ApiError> {
    let credential = authorize(&state, &caller, &owner, &repo, AccessMode::OwnerOnly).await?;

    let path = format!("repos/{owner}/{repo}/issues");
    let proxy = &state.proxy;
    let fallback = caller.fallback_token();

    let issues: Vec<Issue> = fetch_all_pages(PER_PAGE, MAX_PAGES, |page| {
        let request = GhRequest::get(path.clone()).with_query(vec![
            ("state".to_string(), "all".to_string()),
            ("per_page".to_string(), PER_PAGE.to_string()),
            ("page".to_string(), page.to_string()),
        ]);

        async move {
            let result = proxy
                .fetch(credential.installation_id, fallback, &request)
                .await?;
            result.response.json::<Vec<Issue>>()
        }
    })
    .await
    .map_err(|e| github_error(&owner, &repo, e))?;

    Ok(Json(monthly_issue_buckets(&issues, Utc::now())))
}
