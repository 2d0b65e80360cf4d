pub mod invites;
pub mod organizations;
pub mod session;

use axum::{
    extract::FromRequest,
    routing::{get, post},
    Router,
};

use crate::{error::AppError, AppState};

/// `Json` whose rejections (malformed body, unknown role, ...) surface as 400
/// with the usual `{"error": ...}` body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

pub fn router(state: AppState) -> Router {
    Router::new()
        // Session
        .route("/api/session", get(session::current))
        // Organizations
        .route("/api/organizations", get(organizations::list).post(organizations::create))
        .route("/api/organizations/:id", get(organizations::get))
        // Invites (admin side)
        .route("/api/organizations/:id/invites", get(invites::list).post(invites::create))
        .with_state(state)
}

/// Routes that take an invite token. Public or nearly so, which is why main.rs
/// mounts them behind a rate limiter.
pub fn token_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/organizations/invites/:token/validate", get(invites::validate))
        .route("/api/organizations/invites/:token", post(invites::accept_unscoped))
        .route("/api/organizations/:id/invites/:token", post(invites::accept))
        .with_state(state)
}
