//! Route configuration.

use crate::handlers;
use crate::metrics::metrics_handler;
use crate::state::AppState;
use axum::Router;
use axum::routing::{delete, get};
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/v1/health", get(handlers::health_check))
        // Aggregators (maintained elsewhere, read-only here)
        .route("/v1/admin/aggregators", get(handlers::list_aggregators))
        .route(
            "/v1/admin/aggregators/{aggregator_id}",
            get(handlers::get_aggregator),
        )
        // Certificate assignments
        .route(
            "/v1/admin/aggregators/{aggregator_id}/certificates",
            get(handlers::list_aggregator_certificates)
                .post(handlers::add_aggregator_certificates),
        )
        .route(
            "/v1/admin/aggregators/{aggregator_id}/certificates/{certificate_id}",
            delete(handlers::unassign_aggregator_certificate),
        )
        // Certificate catalogue
        .route(
            "/v1/admin/certificates",
            get(handlers::list_certificates).post(handlers::create_certificate),
        )
        .route(
            "/v1/admin/certificates/{certificate_id}",
            get(handlers::get_certificate),
        );

    let mut router = Router::new().merge(api_routes);

    // The metrics endpoint is unauthenticated; see crate::metrics.
    if state.config.server.metrics_enabled {
        let metrics_routes = Router::new().route("/metrics", get(metrics_handler));
        router = router.merge(metrics_routes);
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
