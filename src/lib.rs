pub mod config;
pub mod error;
pub mod state;
pub mod db;
pub mod models;
pub mod routes;
pub mod views;
pub mod submission;
pub mod store;
pub mod relay;
pub mod ingest;
pub mod frontend;
pub mod supervisor;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::relay::RelayClient;
use crate::state::{AppState, SharedState};

/// Router for the front-end role.
pub fn build_app(config: &Config) -> Router {
    let state: SharedState = Arc::new(AppState {
        doc_root: config.doc_root.clone(),
        relay: RelayClient::from_config(&config.relay),
    });

    Router::new()
        .merge(routes::submit_routes())
        .merge(views::view_routes())
        .route("/health", axum::routing::get(health))
        .layer(DefaultBodyLimit::max(config.max_body_size))
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
