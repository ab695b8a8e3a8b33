//! Route Configuration
//!
//! Wires every handler into the axum router. Public auth endpoints sit
//! alongside a protected group guarded by the `authenticate` middleware;
//! rate limiting for the sensitive public endpoints is enforced inside
//! the handlers themselves, keyed by client IP.

use axum::{
    http::StatusCode,
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::handlers;
use crate::middleware::authenticate;
use crate::server::init::health;
use crate::server::state::AppState;

/// Build the application router
pub fn create_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/refresh-token", post(handlers::refresh_token))
        .route("/forgot-password", post(handlers::forgot_password))
        .route("/reset-password", post(handlers::reset_password))
        .route("/verify-email", post(handlers::verify_email));

    let protected = Router::new()
        .route("/logout", post(handlers::logout))
        .route("/logout-all", post(handlers::logout_all))
        .route("/me", get(handlers::get_me))
        .route(
            "/profile",
            get(handlers::get_profile).put(handlers::update_profile),
        )
        .route("/change-password", put(handlers::change_password))
        .route("/resend-verification", post(handlers::resend_verification))
        .route("/delete-account", delete(handlers::delete_account))
        .route("/admin/users", get(handlers::list_users))
        .route("/admin/users/{user_id}", delete(handlers::admin_delete_user))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            authenticate,
        ));

    Router::new()
        .nest("/api/auth", public.merge(protected))
        .route("/health", get(health))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "success": false, "message": "Route not found" })),
    )
}
