//! # Generic Repository Proxy
//!
//! Authenticated passthrough to `repos/{owner}/{repo}/{path}` for resources
//! the dashboard consumes without server-side shaping (contributor listings,
//! languages, releases). Query string and `Link` header are forwarded in
//! both directions.

use axum::{
    extract::{Path, RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

use crate::access::AccessMode;
use crate::auth::Caller;
use crate::error::{ApiError, validation_error};
use crate::proxy::GhRequest;
use crate::server::AppState;

use super::types::link_headers;
use super::{authorize, github_error};

#[utoipa::path(
    get,
    path = "/gh/{owner}/{repo}/{path}",
    params(
        ("owner" = String, Path, description = "Repository owner"),
        ("repo" = String, Path, description = "Repository name"),
        ("path" = String, Path, description = "Repository-scoped GitHub API path"),
    ),
    responses(
        (status = 200, description = "Upstream response body, forwarded verbatim"),
        (status = 400, description = "Missing proxy path", body = ApiError),
        (status = 401, description = "No caller identity", body = ApiError),
        (status = 403, description = "Caller is not authorized for this repository", body = ApiError),
        (status = 500, description = "Server configuration error", body = ApiError),
    ),
    tag = "proxy"
)]
pub async fn proxy_repo_resource(
    State(state): State<AppState>,
    caller: Caller,
    Path((owner, repo, resource)): Path<(String, String, String)>,
    RawQuery(raw_query): RawQuery,
) -> Result<Response, ApiError> {
    if resource.is_empty() {
        return Err(validation_error(
            "Missing proxy path",
            serde_json::json!({ "path": "required" }),
        ));
    }

    let credential = authorize(&state, &caller, &owner, &repo, AccessMode::OwnerOnly).await?;

    let query: Vec<(String, String)> = raw_query
        .as_deref()
        .map(|raw| {
            url::form_urlencoded::parse(raw.as_bytes())
                .into_owned()
                .collect()
        })
        .unwrap_or_default();

    let request =
        GhRequest::get(format!("repos/{owner}/{repo}/{resource}")).with_query(query);

    let result = state
        .proxy
        .fetch(credential.installation_id, caller.fallback_token(), &request)
        .await
        .map_err(|e| github_error(&owner, &repo, e))?;

    let status = StatusCode::from_u16(result.response.status.as_u16())
        .unwrap_or(StatusCode::OK);
    let headers = link_headers(&result.response);
    let body = result.response.body;

    Ok((status, headers, Json(body)).into_response())
}
