//! # API REST
//!
//! Development content server for the wiki viewer.
//!
//! Handles:
//! - The four content API endpoints with axum, answered from a [`ContentBundle`]
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS)
//!
//! The viewer's `HttpContentApi` is the intended client.

#![warn(rust_2018_idioms)]

use axum::{
    extract::{Path as AxumPath, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;
use wiki_core::ContentBundle;
use wiki_types::{Node, NodeId, SearchQuery, SearchReq, Variable};

/// Application state shared across REST API handlers.
#[derive(Clone)]
pub struct AppState {
    bundle: Arc<ContentBundle>,
}

impl AppState {
    pub fn new(bundle: ContentBundle) -> Self {
        Self {
            bundle: Arc::new(bundle),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(health, list_nodes, get_node, list_variables, search_nodes),
    components(schemas(HealthRes, Node, Variable, SearchReq))
)]
pub struct ApiDoc;

/// Builds the content server router with Swagger UI at `/swagger-ui`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/nodes", get(list_nodes))
        .route("/nodes/search", post(search_nodes))
        .route("/nodes/:id", get(get_node))
        .route("/variables", get(list_variables))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for monitoring.
async fn health() -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "wiki content server is alive".into(),
    })
}

#[utoipa::path(
    get,
    path = "/nodes",
    responses(
        (status = 200, description = "Every node in summary form", body = [Node])
    )
)]
async fn list_nodes(State(state): State<AppState>) -> Json<Vec<Node>> {
    Json(state.bundle.summaries())
}

#[utoipa::path(
    get,
    path = "/nodes/{id}",
    params(("id" = i64, Path, description = "Node id")),
    responses(
        (status = 200, description = "One-element array holding the hydrated node", body = [Node]),
        (status = 404, description = "Unknown node")
    )
)]
/// Returns the hydrated node wrapped in an array.
///
/// A bundle that repeats an id answers with every copy; the client rejects that response as
/// malformed.
async fn get_node(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<NodeId>,
) -> Result<Json<Vec<Node>>, (StatusCode, &'static str)> {
    let nodes = state.bundle.detail(id);
    if nodes.is_empty() {
        tracing::warn!(id, "node not found");
        return Err((StatusCode::NOT_FOUND, "Node not found"));
    }
    if nodes.len() > 1 {
        tracing::warn!(id, count = nodes.len(), "bundle repeats node id");
    }
    Ok(Json(nodes))
}

#[utoipa::path(
    get,
    path = "/variables",
    responses(
        (status = 200, description = "Every variable", body = [Variable])
    )
)]
async fn list_variables(State(state): State<AppState>) -> Json<Vec<Variable>> {
    Json(state.bundle.variables.clone())
}

#[utoipa::path(
    post,
    path = "/nodes/search",
    request_body = SearchReq,
    responses(
        (status = 200, description = "Matching nodes with content", body = [Node]),
        (status = 400, description = "Blank query")
    )
)]
async fn search_nodes(
    State(state): State<AppState>,
    Json(req): Json<SearchReq>,
) -> Result<Json<Vec<Node>>, (StatusCode, &'static str)> {
    let query = match SearchQuery::new(&req.query) {
        Ok(query) => query,
        Err(e) => {
            tracing::error!("Search error: {:?}", e);
            return Err((StatusCode::BAD_REQUEST, "Query cannot be empty"));
        }
    };
    let results = state.bundle.search(query.as_str());
    tracing::debug!(query = %query, count = results.len(), "search served");
    Ok(Json(results))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use wiki_types::ContentBlock;

    fn app() -> Router {
        router(AppState::new(ContentBundle::new(
            vec![
                Node::summary(1, "Node 1 title")
                    .with_connections(vec![2])
                    .with_content(vec![ContentBlock::text("Node 1 content")]),
                Node::summary(2, "Node 2 title").with_connections(vec![]),
                Node::summary(3, "dup"),
                Node::summary(3, "dup again"),
            ],
            vec![Variable::new("v1", "Variable 1")],
        )))
    }

    async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn search(query: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/nodes/search")
            .header("content-type", "application/json")
            .body(Body::from(format!(r#"{{"query":"{query}"}}"#)))
            .unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let response = app().oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let health: HealthRes = body_json(response).await;
        assert!(health.ok);
    }

    #[tokio::test]
    async fn list_returns_summaries() {
        let response = app().oneshot(get("/nodes")).await.unwrap();
        let nodes: Vec<Node> = body_json(response).await;
        assert_eq!(nodes.len(), 4);
        assert!(nodes.iter().all(|n| !n.is_hydrated()));
    }

    #[tokio::test]
    async fn detail_is_wrapped_in_array() {
        let response = app().oneshot(get("/nodes/1")).await.unwrap();
        let nodes: Vec<Node> = body_json(response).await;
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].connections(), &[2]);

        let response = app().oneshot(get("/nodes/3")).await.unwrap();
        let nodes: Vec<Node> = body_json(response).await;
        assert_eq!(nodes.len(), 2);

        let response = app().oneshot(get("/nodes/9")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn variables_are_listed() {
        let response = app().oneshot(get("/variables")).await.unwrap();
        let variables: Vec<Variable> = body_json(response).await;
        assert_eq!(variables, vec![Variable::new("v1", "Variable 1")]);
    }

    #[tokio::test]
    async fn search_matches_content() {
        let response = app().oneshot(search("ent")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let nodes: Vec<Node> = body_json(response).await;
        assert_eq!(nodes.iter().map(|n| n.id).collect::<Vec<_>>(), vec![1]);

        let response = app().oneshot(search("  ")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
