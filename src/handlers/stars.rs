//! # Stargazer Endpoint
//!
//! One page of stargazers with `starred_at` timestamps. The `Link` header is
//! forwarded verbatim so the list view can derive the page count.

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json, Response},
};

use crate::access::AccessMode;
use crate::auth::Caller;
use crate::error::ApiError;
use crate::github::fetcher::ACCEPT_STAR_JSON;
use crate::github::types::Stargazer;
use crate::proxy::GhRequest;
use crate::server::AppState;

use super::types::{PageQuery, link_headers};
use super::{authorize, github_error};

#[utoipa::path(
    get,
    path = "/stars/{owner}/{repo}",
    params(
        ("owner" = String, Path, description = "Repository owner"),
        ("repo" = String, Path, description = "Repository name"),
        PageQuery,
    ),
    responses(
        (status = 200, description = "Stargazers for the requested page", body = Vec<Stargazer>),
        (status = 400, description = "Invalid pagination", body = ApiError),
        (status = 401, description = "No caller identity", body = ApiError),
        (status = 403, description = "Caller is not authorized for this repository", body = ApiError),
        (status = 500, description = "Server configuration error", body = ApiError),
    ),
    tag = "stars"
)]
pub async fn list_stargazers(
    State(state): State<AppState>,
    caller: Caller,
    Path((owner, repo)): Path<(String, String)>,
    Query(params): Query<PageQuery>,
) -> Result<Response, ApiError> {
    let (page, per_page) = params.resolve()?;
    let credential = authorize(&state, &caller, &owner, &repo, AccessMode::OwnerOnly).await?;

    let request = GhRequest::get(format!("repos/{owner}/{repo}/stargazers"))
        .with_accept(ACCEPT_STAR_JSON)
        .with_query(vec![
            ("page".to_string(), page.to_string()),
            ("per_page".to_string(), per_page.to_string()),
        ]);

    let result = state
        .proxy
        .fetch(credential.installation_id, caller.fallback_token(), &request)
        .await
        .map_err(|e| github_error(&owner, &repo, e))?;

    let stargazers: Vec<Stargazer> = result
        .response
        .json()
        .map_err(|e| github_error(&owner, &repo, e))?;
    Ok((link_headers(&result.response), Json(stargazers)).into_response())
}
