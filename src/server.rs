//! # Server Configuration
//!
//! This module contains the server setup and configuration for the RepoLens API.

use std::sync::Arc;

use axum::{Router, extract::FromRef, middleware, routing::get};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::{SessionProvider, StaticSessionProvider};
use crate::config::AppConfig;
use crate::github::{GitHubFetcher, InstallationTokenProvider};
use crate::handlers;
use crate::proxy::DualAuthProxy;
use crate::registry::{InMemoryRegistry, RepoRegistry};
use crate::telemetry;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub registry: Arc<dyn RepoRegistry>,
    pub sessions: Arc<dyn SessionProvider>,
    pub proxy: DualAuthProxy,
}

impl AppState {
    /// Wire the default components from configuration: an in-memory registry,
    /// the static session provider, and the GitHub proxy stack.
    pub fn new(config: AppConfig) -> Self {
        let registry = Arc::new(InMemoryRegistry::new());
        let sessions = Arc::new(StaticSessionProvider::new(config.session_tokens.clone()));
        Self::with_parts(config, registry, sessions)
    }

    /// Wire explicit registry and session implementations (used by tests and
    /// deployments with real stores).
    pub fn with_parts(
        config: AppConfig,
        registry: Arc<dyn RepoRegistry>,
        sessions: Arc<dyn SessionProvider>,
    ) -> Self {
        let fetcher = GitHubFetcher::new(config.github_api_base.clone());
        let tokens = InstallationTokenProvider::new(fetcher.clone(), config.github_app());
        let proxy = DualAuthProxy::new(fetcher, tokens);

        Self {
            config: Arc::new(config),
            registry,
            sessions,
            proxy,
        }
    }
}

impl FromRef<AppState> for Arc<AppConfig> {
    fn from_ref(app_state: &AppState) -> Self {
        Arc::clone(&app_state.config)
    }
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let cors = match state
        .config
        .cors_allow_origin
        .as_deref()
        .and_then(|origin| origin.parse::<axum::http::HeaderValue>().ok())
    {
        Some(origin) => CorsLayer::new().allow_origin(origin),
        None => CorsLayer::permissive(),
    };

    Router::new()
        .route("/", get(handlers::root))
        .route("/commits/{owner}/{repo}", get(handlers::commits::latest_commit))
        .route(
            "/commits-over-time/{owner}/{repo}",
            get(handlers::commits::commits_over_time),
        )
        .route("/issues/{owner}/{repo}", get(handlers::issues::list_issues))
        .route(
            "/issues-over-time/{owner}/{repo}",
            get(handlers::issues::issues_over_time),
        )
        .route("/stars/{owner}/{repo}", get(handlers::stars::list_stargazers))
        .route(
            "/stats/contributors/{owner}/{repo}",
            get(handlers::stats::contributor_stats),
        )
        .route("/traffic/{owner}/{repo}", get(handlers::traffic::traffic_summary))
        .route(
            "/gh/{owner}/{repo}/{*path}",
            get(handlers::passthrough::proxy_repo_resource),
        )
        .layer(middleware::from_fn(telemetry::trace_context_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
}

/// Starts the server with the given configuration
pub async fn run_server(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    // Resolve the configured bind address
    let addr = config
        .bind_addr()
        .map_err(|e| format!("Invalid server address: {}", e))?;
    let profile = config.profile.clone();

    let state = AppState::new(config);
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, profile, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::commits::latest_commit,
        crate::handlers::commits::commits_over_time,
        crate::handlers::issues::list_issues,
        crate::handlers::issues::issues_over_time,
        crate::handlers::stars::list_stargazers,
        crate::handlers::stats::contributor_stats,
        crate::handlers::traffic::traffic_summary,
        crate::handlers::passthrough::proxy_repo_resource,
    ),
    components(
        schemas(
            crate::error::ApiError,
            crate::handlers::ServiceInfo,
            crate::handlers::traffic::TrafficSummary,
            crate::aggregate::WeeklyCommits,
            crate::aggregate::MonthlyIssues,
            crate::github::stats::ContributorTotals,
            crate::github::types::Commit,
            crate::github::types::Issue,
            crate::github::types::Stargazer,
            crate::registry::ConnectedRepository,
        )
    ),
    info(
        title = "RepoLens Sync API",
        description = "GitHub data-synchronization layer for the RepoLens dashboard",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
