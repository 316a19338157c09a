use axum::http::{header, HeaderValue, Method};
use axum::{
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::api::handlers::{self, AppState};
use crate::config::Settings;
use crate::{Error, Result};

/// Create the router with the chat and health endpoints
pub fn create_router(state: AppState, settings: &Settings) -> Result<Router> {
    let origin = HeaderValue::from_str(&settings.server.cors_allowed_origin)
        .map_err(|e| Error::Config(format!("Invalid CORS_ALLOWED_ORIGIN: {e}")))?;

    let api_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/chat", post(handlers::chat))
        .with_state(state);

    let router = Router::new()
        .nest("/api", api_routes)
        .layer(
            // CORS - only the configured frontend origin
            CorsLayer::new()
                .allow_origin(origin)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
                .allow_credentials(true)
                .max_age(Duration::from_secs(3600)),
        )
        .layer(TraceLayer::new_for_http());

    Ok(router)
}
