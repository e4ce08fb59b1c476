//! # Common API Types
//!
//! Shared query structures and response helpers used across the repository
//! endpoints.

use axum::http::{HeaderMap, HeaderValue};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::error::{ApiError, validation_error};
use crate::github::GhResponse;

/// Pagination parameters forwarded to GitHub.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct PageQuery {
    /// Page number to fetch (default: 1)
    pub page: Option<u32>,
    /// Items per page (default: 30, max: 100)
    pub per_page: Option<u32>,
}

impl PageQuery {
    /// Validate and normalize into concrete (page, per_page) values.
    pub fn resolve(&self) -> Result<(u32, u32), ApiError> {
        let page = self.page.unwrap_or(1);
        let per_page = self.per_page.unwrap_or(30);
        if page == 0 {
            return Err(validation_error(
                "Invalid pagination",
                serde_json::json!({ "page": "must be at least 1" }),
            ));
        }
        if !(1..=100).contains(&per_page) {
            return Err(validation_error(
                "Invalid pagination",
                serde_json::json!({ "per_page": "must be between 1 and 100" }),
            ));
        }
        Ok((page, per_page))
    }
}

/// Pagination plus issue state filter.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct IssueListQuery {
    /// Page number to fetch (default: 1)
    pub page: Option<u32>,
    /// Items per page (default: 30, max: 100)
    pub per_page: Option<u32>,
    /// Issue state filter: open, closed or all (default: open)
    pub state: Option<String>,
}

impl IssueListQuery {
    pub fn resolve(&self) -> Result<(u32, u32, String), ApiError> {
        let (page, per_page) = PageQuery {
            page: self.page,
            per_page: self.per_page,
        }
        .resolve()?;

        let state = self.state.clone().unwrap_or_else(|| "open".to_string());
        if !matches!(state.as_str(), "open" | "closed" | "all") {
            return Err(validation_error(
                "Invalid issue state",
                serde_json::json!({ "state": "must be open, closed or all" }),
            ));
        }
        Ok((page, per_page, state))
    }
}

/// Lower bound for the commits-over-time window.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct SinceQuery {
    /// Only include commits authored after this ISO-8601 instant
    pub since: Option<DateTime<Utc>>,
}

/// Forward the upstream `Link` header so clients can drive pagination.
pub fn link_headers(response: &GhResponse) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Some(link) = response
        .link
        .as_deref()
        .and_then(|link| HeaderValue::from_str(link).ok())
    {
        headers.insert("link", link);
    }
    headers
}
