use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::Settings;
use crate::infra::store::ContentStore;
use crate::routing::permalink::PermalinkGenerator;
use crate::routing::resolver::{Resolution, Resolver};
use crate::routing::rules::{QueryVars, RouteTable, RuleName};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ContentStore>,
    pub settings: Arc<Settings>,
    pub routes: Arc<RouteTable>,
}

impl AppState {
    pub fn new(store: ContentStore, settings: Settings, routes: RouteTable) -> Self {
        Self {
            store: Arc::new(store),
            settings: Arc::new(settings),
            routes: Arc::new(routes),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Post {0} not found")]
    PostNotFound(u64),
    #[error("Post {0} has no permalink")]
    NoPermalink(u64),
    #[error("Nothing found at {0}")]
    NotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (StatusCode::NOT_FOUND, body).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct PermalinkParams {
    pub id: u64,
}

#[derive(Debug, Serialize)]
pub struct PermalinkResponse {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct ResolveParams {
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub path: String,
    pub rule: Option<RuleName>,
    pub vars: Option<QueryVars>,
    pub canonical: Option<String>,
    pub resolution: Resolution,
}

#[derive(Debug, Serialize)]
pub struct RuleInfo {
    pub name: RuleName,
    pub pattern: String,
    pub example: String,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/permalink", get(get_permalink))
        .route("/api/resolve", get(resolve_path))
        .route("/api/rules", get(list_rules))
        .fallback(serve_path)
        .with_state(state)
}

pub async fn serve(state: AppState, addr: SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!("Starting server on {}", listener.local_addr()?);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Permalink for a post id, the JSON counterpart of a permalink lookup.
async fn get_permalink(
    State(state): State<AppState>,
    Query(params): Query<PermalinkParams>,
) -> Result<Json<PermalinkResponse>, ApiError> {
    if state.store.get(params.id).is_none() {
        return Err(ApiError::PostNotFound(params.id));
    }

    let links = PermalinkGenerator::new(&state.store, &state.settings);
    let url = links
        .permalink_by_id(params.id)
        .ok_or(ApiError::NoPermalink(params.id))?;
    Ok(Json(PermalinkResponse { url }))
}

async fn resolve_path(
    State(state): State<AppState>,
    Query(params): Query<ResolveParams>,
) -> Json<ResolveResponse> {
    Json(build_response(&state, &params.path))
}

async fn list_rules(State(state): State<AppState>) -> Json<Vec<RuleInfo>> {
    let rules = state
        .routes
        .rules()
        .iter()
        .map(|rule| RuleInfo {
            name: rule.name,
            pattern: rule.pattern.as_str().to_string(),
            example: rule.example.clone(),
        })
        .collect();
    Json(rules)
}

/// Every other request path goes through the route table. Single items requested
/// under a non-canonical spelling are redirected to their permalink.
async fn serve_path(State(state): State<AppState>, uri: Uri) -> Response {
    let path = uri.path();
    let response = build_response(&state, path);

    if !response.resolution.is_found() {
        tracing::info!(path, "not found");
        return ApiError::NotFound(path.to_string()).into_response();
    }

    if let Some(canonical) = response.canonical.as_deref() {
        let requested = urlencoding::decode(path).unwrap_or(Cow::Borrowed(path));
        if canonical != requested {
            let mut location = format!("{}{}", state.settings.home_url, encode_path(canonical));
            if let Some(query) = uri.query() {
                location.push('?');
                location.push_str(query);
            }
            tracing::info!(path, %location, "redirecting to canonical permalink");
            return (
                StatusCode::MOVED_PERMANENTLY,
                [(header::LOCATION, location)],
            )
                .into_response();
        }
    }

    tracing::info!(path, rule = ?response.rule, "resolved");
    Json(response).into_response()
}

fn encode_path(path: &str) -> String {
    path.split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/")
}

fn build_response(state: &AppState, path: &str) -> ResolveResponse {
    let resolver = Resolver::new(&state.store, &state.routes);
    let (route, resolution) = resolver.resolve(path);

    let links = PermalinkGenerator::new(&state.store, &state.settings);
    let canonical = resolution.item().and_then(|item| links.path(item));

    let (rule, vars) = match route {
        Some(route) => (Some(route.rule), Some(route.vars)),
        None => (None, None),
    };

    ResolveResponse {
        path: path.to_string(),
        rule,
        vars,
        canonical,
        resolution,
    }
}
