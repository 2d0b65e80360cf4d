use axum::{
    extract::{Path, State},
    Json,
};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    api::AppJson,
    auth::{AuthUser, Session},
    error::{AppError, Result},
    models::invite::{
        AcceptInviteResponse, CreateInviteRequest, CreatedInvite, InviteValidation,
        OrganizationInvite,
    },
    org_guard, services, AppState,
};

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    AppJson(req): AppJson<CreateInviteRequest>,
) -> Result<Json<CreatedInvite>> {
    let org_id = org_guard::parse_org_id(&id)?;

    let invite = services::invites::issue(
        state.store.as_ref(),
        state.mailer.as_ref(),
        &auth.into(),
        org_id,
        req,
        OffsetDateTime::now_utc(),
    )
    .await?;

    Ok(Json(invite))
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<OrganizationInvite>>> {
    let org_id = org_guard::parse_org_id(&id)?;
    let invites = services::invites::list(state.store.as_ref(), &auth.into(), org_id).await?;
    Ok(Json(invites))
}

pub async fn validate(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<InviteValidation>> {
    let validation =
        services::invites::validate(state.store.as_ref(), &token, OffsetDateTime::now_utc())
            .await?;
    Ok(Json(validation))
}

/// Organization-scoped acceptance: the token must belong to the organization
/// in the path.
pub async fn accept(
    State(state): State<AppState>,
    session: Session,
    Path((id, token)): Path<(String, String)>,
) -> Result<Json<AcceptInviteResponse>> {
    let org_id =
        Uuid::parse_str(&id).map_err(|_| AppError::NotFound("Invalid invite".into()))?;

    let response = services::invites::accept(
        state.store.as_ref(),
        &token,
        Some(org_id),
        &session,
        OffsetDateTime::now_utc(),
    )
    .await?;

    Ok(Json(response))
}

pub async fn accept_unscoped(
    State(state): State<AppState>,
    session: Session,
    Path(token): Path<String>,
) -> Result<Json<AcceptInviteResponse>> {
    let response = services::invites::accept(
        state.store.as_ref(),
        &token,
        None,
        &session,
        OffsetDateTime::now_utc(),
    )
    .await?;

    Ok(Json(response))
}
