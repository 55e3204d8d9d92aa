//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! The whole surface is one implicit route: an auth-gated dashboard. Auth
//! endpoints open and close sessions, `/api/items` carries the dashboard
//! operations, and `/media` serves signed object URLs back.

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub mod auth;
pub mod items;
pub mod media;

/// Build the application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        .route("/api/items", get(items::list_items).post(items::create_item))
        .route("/api/items/{id}", delete(items::delete_item))
        .route("/media/{owner}/{filename}", get(media::serve_media))
        .route("/healthz", get(healthz))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
