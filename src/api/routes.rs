use axum::{
    routing::{get, post},
    Router,
};

use crate::api::handlers::{self, AppState};
use crate::api::measure_handlers;
use crate::store::traits::ModelServer;

pub fn create_router<M: ModelServer + 'static>() -> Router<AppState<M>> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Model browsing
        .route("/databases/:name", get(handlers::get_database::<M>))
        .route(
            "/databases/:name/measures",
            get(measure_handlers::list_measures::<M>),
        )
        // Measure updates
        .route(
            "/databases/:name/measures",
            post(measure_handlers::update_measures::<M>),
        )
}
