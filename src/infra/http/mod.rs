//! HTTP boundary: two JSON endpoints plus pre-flight and verb policing.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;

use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

use crate::application::toasts::ToastService;

#[derive(Clone)]
pub struct AppState {
    pub toasts: Arc<ToastService>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/load",
            get(handlers::load_toasts)
                .options(handlers::preflight)
                .fallback(handlers::method_not_allowed),
        )
        .route(
            "/api/save",
            post(handlers::save_toasts)
                .options(handlers::preflight)
                .fallback(handlers::method_not_allowed),
        )
        .with_state(state)
        .layer(axum_middleware::from_fn(middleware::permissive_cors))
        .layer(axum_middleware::from_fn(middleware::log_responses))
}
