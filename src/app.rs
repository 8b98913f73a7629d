use axum::{extract::DefaultBodyLimit, middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{api, health_check, metrics_handler, request_size_middleware};
use crate::observability::{observability_middleware, Metrics};
use crate::services::FoodService;

/// Build the public API router.
///
/// `/foods` and `/health/status` are static routes, so they win over the
/// `/:key` catch-all for food names and ids. Writes to `/foods` still address
/// the record with id `foods`.
pub fn create_app(
    food_service: Arc<FoodService>,
    metrics: Arc<Metrics>,
    max_request_size: usize,
) -> Router {
    let state = api::ApiState {
        food_service,
        metrics: metrics.clone(),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(api::root).post(api::create_food))
        .route(
            "/foods",
            get(api::list_foods)
                .put(api::update_foods_segment)
                .delete(api::delete_foods_segment),
        )
        .route("/health/status", get(health_check))
        .route(
            "/:key",
            get(api::get_food)
                .put(api::update_food)
                .delete(api::delete_food),
        )
        .fallback(api::not_found)
        .with_state(state)
        // Add middleware layers (order matters - inner to outer)
        .layer(DefaultBodyLimit::max(max_request_size))
        .layer(middleware::from_fn(move |req, next| {
            request_size_middleware(max_request_size, req, next)
        }))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(move |req, next| {
            observability_middleware(metrics.clone(), req, next)
        }))
}

/// Router for the separate metrics listener
pub fn create_metrics_app(metrics: Arc<Metrics>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics)
}
