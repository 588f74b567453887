pub mod auth;
pub mod protocol;
pub mod rest;
pub mod state;
pub mod ws_handler;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use state::AppState;

// Re-export the handlers so the binary and the router below can reach them
// without spelling out every module.
pub use auth::{login_handler, logout_handler, me_handler, register_handler};
pub use rest::{
    adherence_handler, create_log_handler, create_medication_handler, dashboard_handler,
    delete_medication_handler, frequencies_handler, get_medication_handler, get_state_handler,
    list_logs_handler, list_medications_handler, update_medication_handler,
};
pub use ws_handler::ws_handler;

/// Builds the API router over the shared state.
pub fn router(app_state: Arc<AppState>) -> Router {
    let auth_routes = Router::new()
        .route("/auth/login", post(login_handler))
        .route("/auth/register", post(register_handler))
        .route("/auth/logout", post(logout_handler))
        .route("/auth/me", get(me_handler));

    let store_routes = Router::new()
        .route("/state", get(get_state_handler))
        .route(
            "/medications",
            get(list_medications_handler).post(create_medication_handler),
        )
        .route(
            "/medications/{id}",
            get(get_medication_handler)
                .patch(update_medication_handler)
                .delete(delete_medication_handler),
        )
        .route("/logs", get(list_logs_handler).post(create_log_handler))
        .route("/adherence", get(adherence_handler))
        .route("/dashboard", get(dashboard_handler))
        .route("/frequencies", get(frequencies_handler))
        .route("/events", get(ws_handler));

    Router::new()
        .merge(auth_routes)
        .merge(store_routes)
        .with_state(app_state)
}
