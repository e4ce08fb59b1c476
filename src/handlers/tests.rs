//! # Tests for Handlers
//!
//! Router-level tests exercising credential resolution, fail-closed
//! configuration handling and header forwarding through the real app router.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::auth::StaticSessionProvider;
use crate::config::{AppConfig, PrivateKey, SessionToken};
use crate::registry::{ConnectedRepository, InMemoryRegistry, RepoRegistry};
use crate::server::{AppState, create_app};

const TEST_PRIVATE_KEY: &str = include_str!("../../tests/fixtures/github_app_key.pem");

fn test_config(api_base: String, with_app_credentials: bool) -> AppConfig {
    let mut config = AppConfig {
        github_api_base: api_base,
        session_tokens: vec![SessionToken {
            token: "session-alice".to_string(),
            user_id: "alice".to_string(),
        }],
        ..Default::default()
    };
    if with_app_credentials {
        config.github_app_id = Some(4242);
        config.github_app_private_key = Some(PrivateKey::new(TEST_PRIVATE_KEY));
        config.github_oauth_client_id = Some("iv1.client".to_string());
        config.github_oauth_client_secret = Some("client-secret".to_string());
    }
    config
}

fn row(user_id: &str, is_public: bool) -> ConnectedRepository {
    ConnectedRepository {
        user_id: user_id.to_string(),
        owner: "acme".to_string(),
        name: "widget".to_string(),
        github_repo_id: 1,
        installation_id: Some(7),
        is_public,
        default_branch: "main".to_string(),
        display_name: None,
    }
}

async fn app_with_rows(
    server: &MockServer,
    with_app_credentials: bool,
    rows: Vec<ConnectedRepository>,
) -> axum::Router {
    let registry = Arc::new(InMemoryRegistry::new());
    for row in rows {
        registry.upsert(row).await;
    }
    let config = test_config(server.uri(), with_app_credentials);
    let sessions = Arc::new(StaticSessionProvider::new(config.session_tokens.clone()));
    create_app(AppState::with_parts(config, registry, sessions))
}

async fn mount_token_exchange(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/app/installations/7/access_tokens"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "token": "ghs_install",
            "expires_at": "2099-01-01T00:00:00Z"
        })))
        .mount(server)
        .await;
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn anonymous_caller_reads_latest_commit_of_public_repo() {
    let server = MockServer::start().await;
    mount_token_exchange(&server).await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widget/commits"))
        .and(query_param("per_page", "1"))
        .and(header("authorization", "Bearer ghs_install"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "sha": "abc123",
            "commit": {"author": {"name": "Jane", "date": "2024-01-03T10:00:00Z"}}
        }])))
        .mount(&server)
        .await;

    let app = app_with_rows(&server, true, vec![row("bob", true)]).await;
    let response = app
        .oneshot(
            Request::get("/commits/acme/widget")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body[0]["sha"], "abc123");
}

#[tokio::test]
async fn anonymous_caller_gets_401_for_private_repo() {
    let server = MockServer::start().await;
    let app = app_with_rows(&server, true, vec![row("bob", false)]).await;

    let response = app
        .oneshot(
            Request::get("/commits/acme/widget")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn authenticated_caller_without_row_gets_403() {
    let server = MockServer::start().await;
    let app = app_with_rows(&server, true, vec![]).await;

    let response = app
        .oneshot(
            Request::get("/stars/acme/widget")
                .header("authorization", "Bearer session-alice")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["code"], "FORBIDDEN");
}

#[tokio::test]
async fn missing_app_credentials_fail_closed_without_upstream_call() {
    let server = MockServer::start().await;
    // No mocks mounted: any upstream call would 404 the mock server and fail
    // differently than the asserted configuration error.
    let app = app_with_rows(&server, false, vec![row("alice", false)]).await;

    let response = app
        .oneshot(
            Request::get("/traffic/acme/widget")
                .header("authorization", "Bearer session-alice")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["code"], "SERVER_CONFIGURATION_ERROR");
    assert_eq!(server.received_requests().await.unwrap().len(), 0);
}

#[tokio::test]
async fn stars_endpoint_forwards_link_header() {
    let server = MockServer::start().await;
    mount_token_exchange(&server).await;
    let link = "<https://api.github.com/repos/acme/widget/stargazers?page=2>; rel=\"next\", <https://api.github.com/repos/acme/widget/stargazers?page=5>; rel=\"last\"";
    Mock::given(method("GET"))
        .and(path("/repos/acme/widget/stargazers"))
        .and(header("accept", "application/vnd.github.v3.star+json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"starred_at": "2024-03-01T00:00:00Z", "user": {"login": "octocat"}}]))
                .insert_header("link", link),
        )
        .mount(&server)
        .await;

    let app = app_with_rows(&server, true, vec![row("alice", false)]).await;
    let response = app
        .oneshot(
            Request::get("/stars/acme/widget?page=1&per_page=30")
                .header("authorization", "Bearer session-alice")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("link").unwrap(), link);
    let body = body_json(response).await;
    assert_eq!(body[0]["user"]["login"], "octocat");
}

#[tokio::test]
async fn invalid_pagination_is_rejected_before_any_upstream_call() {
    let server = MockServer::start().await;
    let app = app_with_rows(&server, true, vec![row("alice", false)]).await;

    let response = app
        .oneshot(
            Request::get("/stars/acme/widget?per_page=500")
                .header("authorization", "Bearer session-alice")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(server.received_requests().await.unwrap().len(), 0);
}

#[tokio::test]
async fn traffic_endpoint_joins_clones_and_views() {
    let server = MockServer::start().await;
    mount_token_exchange(&server).await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widget/traffic/clones"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 12, "uniques": 5, "clones": []
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widget/traffic/views"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 40, "uniques": 9, "views": []
        })))
        .mount(&server)
        .await;

    let app = app_with_rows(&server, true, vec![row("alice", false)]).await;
    let response = app
        .oneshot(
            Request::get("/traffic/acme/widget")
                .header("authorization", "Bearer session-alice")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["clones"]["count"], 12);
    assert_eq!(body["views"]["uniques"], 9);
}

#[tokio::test]
async fn contributor_stats_resolve_after_a_computing_round() {
    let server = MockServer::start().await;
    mount_token_exchange(&server).await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widget/stats/contributors"))
        .respond_with(ResponseTemplate::new(202))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widget/stats/contributors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "author": {"login": "octocat", "id": 1},
            "total": 2,
            "weeks": [{"w": 1704067200, "a": 40, "d": 10, "c": 2}]
        }])))
        .mount(&server)
        .await;

    let app = app_with_rows(&server, true, vec![row("alice", false)]).await;
    let response = app
        .oneshot(
            Request::get("/stats/contributors/acme/widget")
                .header("authorization", "Bearer session-alice")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body[0]["author"], "octocat");
    assert_eq!(body[0]["inserted"], 40);
}

#[tokio::test]
async fn contributor_stats_422_maps_to_stats_unavailable() {
    let server = MockServer::start().await;
    mount_token_exchange(&server).await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widget/stats/contributors"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({"message": "Repository too large"})),
        )
        .mount(&server)
        .await;

    let app = app_with_rows(&server, true, vec![row("alice", false)]).await;
    let response = app
        .oneshot(
            Request::get("/stats/contributors/acme/widget")
                .header("authorization", "Bearer session-alice")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["code"], "STATS_UNAVAILABLE");
}

#[tokio::test]
async fn passthrough_forwards_query_and_link() {
    let server = MockServer::start().await;
    mount_token_exchange(&server).await;
    let link = "<https://api.github.com/repos/acme/widget/contributors?page=2>; rel=\"last\"";
    Mock::given(method("GET"))
        .and(path("/repos/acme/widget/contributors"))
        .and(query_param("per_page", "50"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"login": "octocat", "contributions": 42}]))
                .insert_header("link", link),
        )
        .mount(&server)
        .await;

    let app = app_with_rows(&server, true, vec![row("alice", false)]).await;
    let response = app
        .oneshot(
            Request::get("/gh/acme/widget/contributors?per_page=50")
                .header("authorization", "Bearer session-alice")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("link").unwrap(), link);
    let body = body_json(response).await;
    assert_eq!(body[0]["contributions"], 42);
}

#[tokio::test]
async fn upstream_error_status_and_message_are_propagated() {
    let server = MockServer::start().await;
    mount_token_exchange(&server).await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widget/issues"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})),
        )
        .mount(&server)
        .await;

    let app = app_with_rows(&server, true, vec![row("alice", false)]).await;
    let response = app
        .oneshot(
            Request::get("/issues/acme/widget")
                .header("authorization", "Bearer session-alice")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["code"], "UPSTREAM_ERROR");
    assert_eq!(body["message"], "Not Found");
}
