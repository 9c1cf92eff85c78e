use axum::{Router, middleware, routing::get};
use tower_http::trace::TraceLayer;

use crate::{
    api::{access_log::record_request, handlers, limit::rate_limit},
    app::AppState,
};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/locations",
            get(handlers::list_locations).post(handlers::create_location),
        )
        .route(
            "/locations/{id}",
            get(handlers::get_location)
                .put(handlers::update_location)
                .delete(handlers::delete_location),
        )
        .route("/weather/{id}", get(handlers::weather))
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit))
        // outside the limiter so throttled requests are logged too
        .layer(middleware::from_fn_with_state(state.clone(), record_request))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
