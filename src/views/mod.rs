pub mod pages;

use axum::routing::get;
use axum::Router;

use crate::state::SharedState;

pub fn view_routes() -> Router<SharedState> {
    Router::new()
        .route("/", get(pages::index))
        .route("/message.html", get(pages::message))
        .fallback(pages::static_file)
}
