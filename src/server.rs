use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::SharedState;

pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Daemon health
        .route("/health", get(crate::routes::health::health))
        // View state
        .route("/dashboard/state", get(crate::routes::view::snapshot))
        .route("/dashboard/clients", get(crate::routes::view::clients))
        .route("/dashboard/agents", get(crate::routes::view::agents))
        .route("/dashboard/call-logs", get(crate::routes::view::call_logs))
        .route(
            "/dashboard/call-logs/{id}/details",
            get(crate::routes::view::call_details),
        )
        .route(
            "/dashboard/active-calls",
            get(crate::routes::view::active_calls),
        )
        .route(
            "/dashboard/system-health",
            get(crate::routes::view::system_health),
        )
        .route("/dashboard/stats", get(crate::routes::view::stats))
        .route(
            "/dashboard/terminal-statuses",
            get(crate::routes::view::terminal_statuses),
        )
        // Actions
        .route("/dashboard/refresh", post(crate::routes::actions::refresh))
        .route(
            "/dashboard/clients",
            post(crate::routes::actions::create_client),
        )
        .route(
            "/dashboard/clients/{id}",
            delete(crate::routes::actions::delete_client),
        )
        .route(
            "/dashboard/agents",
            post(crate::routes::actions::create_agent),
        )
        .route(
            "/dashboard/test-call",
            post(crate::routes::actions::start_test_call),
        )
        .route(
            "/dashboard/test-call/{sid}/stop",
            post(crate::routes::actions::stop_monitoring),
        )
        // Notices
        .route("/notices/history", get(crate::routes::notices::history))
        .route("/notices/stream", get(crate::routes::notices::stream))
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
