use anyhow::Result;
use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{
    services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};
use tracing::info;

use crate::{
    controller::ScanController,
    render::{self, Screen},
    types::{ScanRequest, ScanSnapshot},
};

#[derive(Clone)]
pub struct AppState {
    controller: ScanController,
}

#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub snapshot: ScanSnapshot,
    pub screen: Screen,
}

impl StateResponse {
    fn from_snapshot(snapshot: ScanSnapshot) -> Self {
        let screen = render::screen(&snapshot);
        Self { snapshot, screen }
    }
}

#[derive(Debug, Serialize)]
struct Detail {
    detail: &'static str,
}

/// Router for the embedded UI: JSON API under `/api`, static files from `ui/` otherwise.
pub fn router(controller: ScanController) -> Router {
    let state = AppState { controller };

    let api = Router::new()
        .route("/state", get(get_state))
        .route("/scan", post(post_scan))
        .route("/reset", post(post_reset))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .with_state(state);

    let static_svc = ServeDir::new("ui").append_index_html_on_directories(true);

    Router::new()
        .nest("/api", api)
        .route("/health", get(health))
        .fallback_service(static_svc)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

pub async fn spawn_server(bind: &str, controller: ScanController) -> Result<()> {
    let app = router(controller);
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(%bind, "serving UI");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

async fn get_state(State(app): State<AppState>) -> impl IntoResponse {
    let snapshot = app.controller.snapshot().await;
    (StatusCode::OK, Json(StateResponse::from_snapshot(snapshot)))
}

async fn post_scan(State(app): State<AppState>, Json(req): Json<ScanRequest>) -> impl IntoResponse {
    if app.controller.submit(req).await.is_none() {
        return (
            StatusCode::BAD_REQUEST,
            Json(Detail {
                detail: "At least one of githubUsername, email, socialHandles or fullName must be provided",
            }),
        )
            .into_response();
    }
    let snapshot = app.controller.snapshot().await;
    (StatusCode::ACCEPTED, Json(StateResponse::from_snapshot(snapshot))).into_response()
}

async fn post_reset(State(app): State<AppState>) -> impl IntoResponse {
    app.controller.reset().await;
    let snapshot = app.controller.snapshot().await;
    (StatusCode::OK, Json(StateResponse::from_snapshot(snapshot)))
}
