use crate::config::HttpServerConfig;
use crate::error::{Result, SchemeError};
use crate::server::service::SchemeService;
use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Build the axum router
///
/// - `GET /classes`: the in-memory scheme document
/// - `GET /health`: liveness
/// - anything else: the static front-end, when `static_dir` is configured
pub fn create_router(service: Arc<SchemeService>, config: &HttpServerConfig) -> Router {
    // No configured origins means local use: allow any
    let cors = if config.allowed_origins.is_empty() {
        CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let mut router = Router::new()
        .route("/classes", get(handle_classes))
        .route("/health", get(handle_health))
        .with_state(service);

    if let Some(dir) = &config.static_dir {
        if dir.is_dir() {
            router = router.fallback_service(ServeDir::new(dir));
        } else {
            log::warn!("static_dir {} is not a directory; front-end disabled", dir.display());
        }
    }

    router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    )
}

/// Bind and serve until the process is stopped
pub async fn run(service: Arc<SchemeService>, config: &HttpServerConfig) -> Result<()> {
    let app = create_router(service, config);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
        SchemeError::Io(std::io::Error::new(
            e.kind(),
            format!(
                "Failed to bind to {}: {}. Set http_server.port in config.toml to use another port.",
                addr, e
            ),
        ))
    })?;

    log::info!("Server listening on http://{}", addr);
    log::info!("Schema endpoint: http://{}/classes", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| SchemeError::Io(std::io::Error::new(std::io::ErrorKind::Other, format!("HTTP server error: {}", e))))?;

    Ok(())
}

async fn handle_classes(State(service): State<Arc<SchemeService>>) -> Response {
    match service.document().await {
        Some(document) => (StatusCode::OK, Json(document.as_ref().clone())).into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({"error": SchemeError::NotLoaded.to_string()})),
        )
            .into_response(),
    }
}

async fn handle_health() -> Response {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "service": "schemegraph",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
        .into_response()
}
