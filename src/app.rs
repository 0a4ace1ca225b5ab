use crate::config::environment::AppConfig;
use crate::module::license::route::register_routes;
use axum::Router;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use std::any::Any;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tracing::error;

#[derive(Debug, Clone)]
pub struct AppState {
    pub config: AppConfig,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }
}

pub fn build_router(state: AppState) -> Router {
    // Verification is called from arbitrary client contexts, so the CORS
    // policy is open rather than pinned to known origins.
    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(AnyOrigin);

    let debug_errors = state.config.debug_errors;
    let panic_layer = CatchPanicLayer::custom(move |err: Box<dyn Any + Send + 'static>| {
        internal_error_response(err, debug_errors)
    });

    register_routes(state).layer(cors).layer(panic_layer)
}

fn internal_error_response(err: Box<dyn Any + Send + 'static>, debug_errors: bool) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic".to_string()
    };
    error!(reason = %detail, "request handler panicked");

    let body = if debug_errors {
        format!("Internal Error: {detail}")
    } else {
        "Internal Error".to_string()
    };
    (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
}
