//! Paginated list-view client.
//!
//! The dashboard's contributor and stargazer list views page through their
//! resources via the RepoLens API. This client wraps those fetches in a
//! [`PageCache`] so navigating back to an already-seen page costs nothing,
//! and swaps the cache wholesale when the active repository changes.

use reqwest::{Client, StatusCode, header};
use thiserror::Error;

use crate::cache::PageCache;
use crate::github::fetcher::parse_last_page;

/// The list resources the dashboard pages through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListResource {
    Stars,
    Contributors,
}

impl ListResource {
    fn cache_key(self) -> &'static str {
        match self {
            ListResource::Stars => "stargazers",
            ListResource::Contributors => "contributors",
        }
    }

    fn endpoint(self, owner: &str, repo: &str) -> String {
        match self {
            ListResource::Stars => format!("stars/{owner}/{repo}"),
            ListResource::Contributors => format!("gh/{owner}/{repo}/contributors"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server answered {status}")]
    Status { status: StatusCode },
}

/// One rendered page of a list view.
#[derive(Debug, Clone)]
pub struct PageView {
    pub items: Vec<serde_json::Value>,
    pub total_pages: u32,
    pub total_count: Option<u64>,
    /// Whether this page was served from the cache.
    pub cached: bool,
}

/// Cached, paginated consumer of the stars/contributors endpoints.
pub struct ListViewClient {
    http: Client,
    base_url: String,
    session_token: Option<String>,
    per_page: usize,
    cache: PageCache<serde_json::Value>,
}

impl ListViewClient {
    pub fn new(
        base_url: impl Into<String>,
        session_token: Option<String>,
        owner: &str,
        repo: &str,
        per_page: usize,
    ) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session_token,
            per_page,
            cache: PageCache::new(owner, repo),
        }
    }

    /// Switch the active repository. Cached pages of the previous repository
    /// are discarded and can never leak into the new one.
    pub fn set_repo(&mut self, owner: &str, repo: &str) {
        self.cache.switch_repo(owner, repo);
    }

    /// Fetch one page, serving repeats from the cache.
    pub async fn page(
        &mut self,
        resource: ListResource,
        page: u32,
    ) -> Result<PageView, ClientError> {
        let key = resource.cache_key();

        if let Some(items) = self.cache.get(key, page) {
            let meta = self.cache.meta(key);
            return Ok(PageView {
                items: items.to_vec(),
                total_pages: meta.map(|m| m.total_pages).unwrap_or(1),
                total_count: meta.and_then(|m| m.total_count),
                cached: true,
            });
        }

        let url = format!(
            "{}/{}",
            self.base_url,
            resource.endpoint(self.cache.owner(), self.cache.repo())
        );
        let mut request = self.http.get(&url).query(&[
            ("page", page.to_string()),
            ("per_page", self.per_page.to_string()),
        ]);
        if let Some(token) = &self.session_token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status { status });
        }

        let last_page = response
            .headers()
            .get(header::LINK)
            .and_then(|h| h.to_str().ok())
            .and_then(parse_last_page);
        let items: Vec<serde_json::Value> = response.json().await?;

        self.cache
            .put(key, page, items.clone(), self.per_page, last_page);
        let meta = self.cache.meta(key);

        Ok(PageView {
            total_pages: meta.map(|m| m.total_pages).unwrap_or(1),
            total_count: meta.and_then(|m| m.total_count),
            items,
            cached: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn star_page(server: &MockServer, repo: &str, page: u32, len: usize, last: u32) -> Mock {
        let items: Vec<serde_json::Value> = (0..len)
            .map(|i| json!({"user": {"login": format!("{repo}-{page}-{i}")}}))
            .collect();
        let link = format!(
            "<{0}/stars/acme/{repo}?page={page}>; rel=\"next\", <{0}/stars/acme/{repo}?page={last}>; rel=\"last\"",
            server.uri()
        );
        Mock::given(method("GET"))
            .and(path(format!("/stars/acme/{repo}")))
            .and(query_param("page", page.to_string()))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(items)
                    .insert_header("link", link.as_str()),
            )
    }

    #[tokio::test]
    async fn repeated_page_is_served_from_cache() {
        let server = MockServer::start().await;
        star_page(&server, "widget", 1, 2, 3)
            .expect(1)
            .mount(&server)
            .await;

        let mut client = ListViewClient::new(server.uri(), None, "acme", "widget", 2);

        let first = client.page(ListResource::Stars, 1).await.unwrap();
        assert!(!first.cached);
        assert_eq!(first.total_pages, 3);

        let second = client.page(ListResource::Stars, 1).await.unwrap();
        assert!(second.cached);
        assert_eq!(second.items, first.items);
    }

    #[tokio::test]
    async fn switching_repo_never_serves_stale_pages() {
        let server = MockServer::start().await;
        star_page(&server, "widget", 1, 2, 3).mount(&server).await;
        star_page(&server, "gizmo", 1, 1, 1).mount(&server).await;

        let mut client = ListViewClient::new(server.uri(), None, "acme", "widget", 2);
        let widget_page = client.page(ListResource::Stars, 1).await.unwrap();

        client.set_repo("acme", "gizmo");
        let gizmo_page = client.page(ListResource::Stars, 1).await.unwrap();

        assert!(!gizmo_page.cached);
        assert_ne!(gizmo_page.items, widget_page.items);
        assert_eq!(gizmo_page.items[0]["user"]["login"], "gizmo-1-0");
    }

    #[tokio::test]
    async fn contributors_page_through_the_generic_proxy_route() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gh/acme/widget/contributors"))
            .and(query_param("per_page", "30"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"login": "octocat"}])))
            .expect(1)
            .mount(&server)
            .await;

        let mut client = ListViewClient::new(server.uri(), None, "acme", "widget", 30);
        let page = client.page(ListResource::Contributors, 1).await.unwrap();

        // No Link header: a single page whose count is the item count.
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.total_count, Some(1));
    }

    #[tokio::test]
    async fn upstream_error_is_not_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stars/acme/widget"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let mut client = ListViewClient::new(server.uri(), None, "acme", "widget", 30);
        let error = client.page(ListResource::Stars, 1).await.unwrap_err();
        assert!(matches!(
            error,
            ClientError::Status {
                status: StatusCode::FORBIDDEN
            }
        ));
    }
}
