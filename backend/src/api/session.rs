use axum::Json;

use crate::auth::Session;

/// `{ "user": { "id", "email" } | null }` for whoever is calling.
pub async fn current(session: Session) -> Json<Session> {
    Json(session)
}
