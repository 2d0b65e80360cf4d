//! Session resolution.
//!
//! Users and sign-in live in the external auth service; it hands the browser
//! a bearer JWT that this service only verifies. An absent or invalid token
//! resolves to an anonymous session rather than an error, so public routes can
//! decide for themselves when identity is required.

use std::convert::Infallible;

use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid, // user id
    pub email: String,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
}

/// The session as seen by a handler: `{ "user": { id, email } | null }`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Session {
    pub user: Option<SessionUser>,
}

/// Extractor for routes that require a signed-in user. Rejects with 401.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
}

impl From<AuthUser> for SessionUser {
    fn from(user: AuthUser) -> Self {
        SessionUser {
            id: user.id,
            email: user.email,
        }
    }
}

pub fn resolve_session(headers: &HeaderMap, secret: &str) -> Session {
    let Some(token) = extract_bearer_token(headers) else {
        return Session::default();
    };

    let key = DecodingKey::from_secret(secret.as_bytes());
    match decode::<Claims>(&token, &key, &Validation::new(Algorithm::HS256)) {
        Ok(data) => Session {
            user: Some(SessionUser {
                id: data.claims.sub,
                email: data.claims.email,
            }),
        },
        Err(e) => {
            tracing::warn!("JWT decode failed: {}", e);
            Session::default()
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        Ok(resolve_session(&parts.headers, &app_state.jwt_secret))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let user = resolve_session(&parts.headers, &app_state.jwt_secret)
            .user
            .ok_or(AppError::Unauthorized)?;

        Ok(AuthUser {
            id: user.id,
            email: user.email,
        })
    }
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth = headers.get("Authorization")?.to_str().ok()?;
    let token = auth.strip_prefix("Bearer ")?;
    Some(token.to_string())
}

/// Mint a session token the same way the auth service does. Used by tests
/// and local tooling.
pub fn create_token(
    user_id: Uuid,
    email: &str,
    secret: &str,
    expiry_hours: u64,
) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let now = OffsetDateTime::now_utc();
    let exp = now + time::Duration::hours(expiry_hours as i64);

    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        exp: exp.unix_timestamp(),
        iat: now.unix_timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
