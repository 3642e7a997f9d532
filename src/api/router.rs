//! Router construction.

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_mw,
    routing::{delete, get, post, put},
    Extension, Router,
};
use tower_http::cors::CorsLayer;

use super::handlers;
use super::state::AppState;
use crate::auth::jwt_auth;

/// Build the full router. Callers add tracing and CORS layers.
pub fn build_router(state: AppState) -> Router {
    // Routes that require a bearer token
    let users = Router::new()
        .route("/view-data", get(handlers::users::list_users))
        .route("/", post(handlers::users::create_user))
        .route("/update", post(handlers::users::update_user))
        .route("/:id", delete(handlers::users::delete_user))
        .route("/toggle-status/:id", put(handlers::users::toggle_user_status));

    let notifications = Router::new()
        .route("/fetch", get(handlers::notifications::fetch_notifications))
        .route("/read-all", put(handlers::notifications::mark_all_read))
        .route(
            "/:notification_id/read",
            put(handlers::notifications::mark_read),
        )
        .route(
            "/:notification_id/archive",
            put(handlers::notifications::archive),
        );

    let protected = Router::new()
        .nest("/users", users)
        .nest("/notifications", notifications)
        .layer(axum_mw::from_fn(jwt_auth))
        .layer(Extension(state.jwt.clone()));

    // Public routes (no auth)
    let public = Router::new()
        .route(
            "/calculate-emissions",
            post(handlers::calculate::calculate_emissions),
        )
        .route(
            "/calculate/emissions",
            post(handlers::calculate::calculate_emissions),
        )
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/emissions/monthly", get(handlers::emissions::monthly))
        .route("/emissions/total", get(handlers::emissions::total))
        .route("/health", get(handlers::health::health))
        .route("/health/db", get(handlers::health::database_health));

    Router::new()
        .nest("/api", public.merge(protected))
        .layer(Extension(state))
}

/// CORS for the single frontend origin, with credentials.
pub fn cors_layer(origin: HeaderValue) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}
