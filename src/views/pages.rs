use std::path::{Component, Path, PathBuf};

use askama::Template;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{Method, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use percent_encoding::percent_decode_str;
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::state::SharedState;

pub const INDEX_PAGE: &str = "index.html";
pub const MESSAGE_PAGE: &str = "message.html";
pub const ERROR_PAGE: &str = "error.html";

/// Served when the document root has no `error.html`.
#[derive(Template)]
#[template(path = "not_found.html")]
struct NotFoundTemplate {
    title: &'static str,
}

pub async fn index(State(state): State<SharedState>) -> Response {
    send_page(&state.doc_root, INDEX_PAGE).await
}

pub async fn message(State(state): State<SharedState>) -> Response {
    send_page(&state.doc_root, MESSAGE_PAGE).await
}

/// Anything not routed explicitly: a static file under the document root, or 404.
pub async fn static_file(State(state): State<SharedState>, req: Request) -> Response {
    if req.method() != Method::GET && req.method() != Method::HEAD {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let Some(path) = resolve_static(&state.doc_root, req.uri().path()).await else {
        tracing::debug!("No static file for {}", req.uri().path());
        return not_found(&state.doc_root).await;
    };

    match ServeFile::new(path).oneshot(req).await {
        Ok(resp) => resp.map(Body::new),
        Err(e) => match e {},
    }
}

async fn send_page(doc_root: &Path, name: &str) -> Response {
    match tokio::fs::read(doc_root.join(name)).await {
        Ok(body) => (StatusCode::OK, Html(body)).into_response(),
        Err(e) => {
            tracing::warn!("Page {name} unavailable: {e}");
            not_found(doc_root).await
        }
    }
}

pub async fn not_found(doc_root: &Path) -> Response {
    if let Ok(body) = tokio::fs::read(doc_root.join(ERROR_PAGE)).await {
        return (StatusCode::NOT_FOUND, Html(body)).into_response();
    }

    let template = NotFoundTemplate {
        title: "404 Not Found",
    };
    (
        StatusCode::NOT_FOUND,
        Html(template.render().unwrap_or_default()),
    )
        .into_response()
}

/// Map a request path onto a regular file beneath `doc_root`.
///
/// Every decoded segment must be a plain file name, and the canonical
/// result must still lie under the canonical root, so neither `..` nor a
/// symlink can reach outside it.
pub async fn resolve_static(doc_root: &Path, uri_path: &str) -> Option<PathBuf> {
    let decoded = percent_decode_str(uri_path).decode_utf8().ok()?;

    let mut relative = PathBuf::new();
    for segment in decoded.split('/').filter(|s| !s.is_empty()) {
        let mut components = Path::new(segment).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) => relative.push(name),
            _ => return None,
        }
    }

    if relative.as_os_str().is_empty() {
        return None;
    }

    let root = tokio::fs::canonicalize(doc_root).await.ok()?;
    let candidate = tokio::fs::canonicalize(root.join(&relative)).await.ok()?;
    if !candidate.starts_with(&root) {
        tracing::warn!("Rejected path outside document root: {uri_path}");
        return None;
    }

    let metadata = tokio::fs::metadata(&candidate).await.ok()?;
    metadata.is_file().then_some(candidate)
}
