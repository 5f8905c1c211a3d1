use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

pub fn build_router(app_state: AppState) -> Router {
    let gated_routes = Router::new()
        .route(
            "/api/v1/roles/{role}/credentials",
            post(handlers::credentials::issue_credentials_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_step_up_and_role,
        ));

    Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(gated_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
