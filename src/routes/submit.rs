use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::state::SharedState;

/// Where the browser is sent after every submission.
pub const CONFIRMATION_PATH: &str = "/message.html";

/// Relay the raw form body to the ingestion role and redirect.
///
/// The redirect is sent whether or not the relay succeeded. A refused
/// relay means the submission is lost; it is only logged.
pub async fn submit(State(state): State<SharedState>, body: Bytes) -> Response {
    tracing::info!("Form submission received ({} bytes)", body.len());

    if let Err(e) = state.relay.forward(&body).await {
        tracing::error!(
            "Unable to relay submission to {}, dropping it: {e}",
            state.relay.addr()
        );
    }

    (StatusCode::FOUND, [(header::LOCATION, CONFIRMATION_PATH)]).into_response()
}
