// Route definitions for the Gradeline API

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::{handlers, AppState};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/submissions", post(handlers::submit_solution))
        .route("/submissions/:id", get(handlers::get_submission))
        .route("/run", post(handlers::run_code))
        .route("/reference/validate", post(handlers::validate_reference))
        .route("/users/:user_id/solved", get(handlers::solved_problems))
        .route("/languages", get(handlers::list_languages))
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_handler))
}
