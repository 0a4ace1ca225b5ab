use super::controller;
use crate::app::AppState;
use axum::Router;
use axum::routing::{get, post};

pub fn register_routes(state: AppState) -> Router {
    // Method fallbacks keep the original any-other-method/path -> 404
    // contract instead of axum's default 405.
    Router::new()
        .route("/", get(controller::health).fallback(controller::not_found))
        .route(
            "/verify",
            post(controller::verify_license).fallback(controller::not_found),
        )
        .fallback(controller::not_found)
        .with_state(state)
}
