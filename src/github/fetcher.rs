//! Thin authenticated wrapper over GitHub's REST API.
//!
//! The fetcher surfaces the upstream status and the `Link` header verbatim so
//! callers can drive pagination, and never swallows a non-2xx status: it is
//! re-thrown as [`GitHubError::Api`] with GitHub's own message attached.

use metrics::counter;
use reqwest::{Client, Method, StatusCode, header};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::GitHubError;

/// Default media type for REST calls.
pub const ACCEPT_JSON: &str = "application/vnd.github.v3+json";
/// Media type that adds `starred_at` timestamps to stargazer listings.
pub const ACCEPT_STAR_JSON: &str = "application/vnd.github.v3.star+json";

const USER_AGENT: &str = "RepoLens/0.1";

/// An upstream response: parsed JSON body plus the pagination metadata the
/// handlers forward.
#[derive(Debug, Clone)]
pub struct GhResponse {
    pub status: StatusCode,
    pub body: serde_json::Value,
    /// The raw `Link` response header, when GitHub sent one.
    pub link: Option<String>,
}

impl GhResponse {
    /// Deserialize the body into a typed record (or list of records).
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, GitHubError> {
        Ok(serde_json::from_value(self.body.clone())?)
    }

    /// The `rel="last"` page number from the `Link` header, if present.
    pub fn last_page(&self) -> Option<u32> {
        parse_last_page(self.link.as_deref()?)
    }
}

/// Parse the `rel="last"` page number out of a GitHub `Link` header.
///
/// Header format: `<https://api.github.com/...?page=2>; rel="next",
/// <https://api.github.com/...?page=9>; rel="last"`.
pub fn parse_last_page(link_header: &str) -> Option<u32> {
    for link in link_header.split(',') {
        let mut parts = link.split(';');
        let url_part = parts.next()?.trim();
        let is_last = parts.any(|attr| attr.trim() == r#"rel="last""#);
        if !is_last {
            continue;
        }

        let raw_url = url_part.strip_prefix('<')?.strip_suffix('>')?;
        let url = url::Url::parse(raw_url).ok()?;
        return url
            .query_pairs()
            .find(|(key, _)| key == "page")
            .and_then(|(_, value)| value.parse().ok());
    }
    None
}

/// Authenticated GitHub REST client shared across requests.
#[derive(Clone)]
pub struct GitHubFetcher {
    client: Client,
    base_url: String,
}

impl GitHubFetcher {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue a request with the supplied bearer token (installation or user
    /// token; the fetcher does not care which).
    pub async fn request(
        &self,
        token: &str,
        method: Method,
        path: &str,
        query: &[(String, String)],
        accept: &str,
    ) -> Result<GhResponse, GitHubError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));

        let mut request = self
            .client
            .request(method.clone(), &url)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::USER_AGENT, USER_AGENT)
            .header(header::ACCEPT, accept);
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request.send().await?;

        let status = response.status();
        let link = response
            .headers()
            .get(header::LINK)
            .and_then(|h| h.to_str().ok())
            .map(|s| s.to_string());
        let text = response.text().await?;

        counter!(
            "repolens_github_requests_total",
            "status" => status.as_u16().to_string()
        )
        .increment(1);

        if status.is_success() {
            // 202 ("still computing") and 204 arrive with an empty body.
            let body = if text.is_empty() {
                serde_json::Value::Null
            } else {
                serde_json::from_str(&text).unwrap_or(serde_json::Value::Null)
            };
            debug!(%method, path, status = status.as_u16(), "GitHub request succeeded");
            return Ok(GhResponse { status, body, link });
        }

        // Prefer GitHub's own error message over the raw body.
        let message = serde_json::from_str::<serde_json::Value>(&text)
            .ok()
            .and_then(|value| {
                value
                    .get("message")
                    .and_then(|m| m.as_str())
                    .map(|m| m.to_string())
            })
            .unwrap_or_else(|| {
                if text.is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("upstream error")
                        .to_string()
                } else {
                    text
                }
            });

        Err(GitHubError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// GET with the default media type.
    pub async fn get(
        &self,
        token: &str,
        path: &str,
        query: &[(String, String)],
    ) -> Result<GhResponse, GitHubError> {
        self.request(token, Method::GET, path, query, ACCEPT_JSON).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const LINK_FIXTURE: &str = "<https://api.github.com/repositories/1/stargazers?per_page=30&page=2>; rel=\"next\", <https://api.github.com/repositories/1/stargazers?per_page=30&page=9>; rel=\"last\"";

    #[test]
    fn parses_last_page_from_link_header() {
        assert_eq!(parse_last_page(LINK_FIXTURE), Some(9));
    }

    #[test]
    fn link_header_without_last_rel_yields_none() {
        let link = "<https://api.github.com/x?page=2>; rel=\"next\"";
        assert_eq!(parse_last_page(link), None);
        assert_eq!(parse_last_page("garbage"), None);
    }

    #[tokio::test]
    async fn forwards_status_body_and_link() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/widget/stargazers"))
            .and(header("authorization", "Bearer test-token"))
            .and(query_param("page", "1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"starred_at": "2024-03-01T00:00:00Z"}]))
                    .insert_header("link", LINK_FIXTURE),
            )
            .mount(&server)
            .await;

        let fetcher = GitHubFetcher::new(server.uri());
        let response = fetcher
            .get(
                "test-token",
                "repos/acme/widget/stargazers",
                &[("page".to_string(), "1".to_string())],
            )
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.last_page(), Some(9));
        assert!(response.body.is_array());
    }

    #[tokio::test]
    async fn non_2xx_surfaces_github_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/widget/commits"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(json!({"message": "Not Found", "status": "404"})),
            )
            .mount(&server)
            .await;

        let fetcher = GitHubFetcher::new(server.uri());
        let error = fetcher
            .get("test-token", "repos/acme/widget/commits", &[])
            .await
            .unwrap_err();

        match error {
            GitHubError::Api { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Not Found");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn accepted_with_empty_body_is_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/widget/stats/contributors"))
            .respond_with(ResponseTemplate::new(202))
            .mount(&server)
            .await;

        let fetcher = GitHubFetcher::new(server.uri());
        let response = fetcher
            .get("test-token", "repos/acme/widget/stats/contributors", &[])
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::ACCEPTED);
        assert!(response.body.is_null());
    }
}
