pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod mail;
pub mod models;
pub mod onboarding;
pub mod org_guard;
pub mod services;
pub mod store;

use std::sync::Arc;

use mail::Mailer;
use store::Store;

/// Shared application state available to all handlers via axum's State extractor.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub mailer: Arc<dyn Mailer>,
    pub jwt_secret: String,
}
