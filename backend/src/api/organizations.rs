use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    api::AppJson,
    auth::AuthUser,
    error::Result,
    models::organization::{CreateOrganizationRequest, Organization, OrganizationWithMembers},
    org_guard, services, AppState,
};

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<Organization>>> {
    let orgs = services::organizations::list_for_user(state.store.as_ref(), &auth.into()).await?;
    Ok(Json(orgs))
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(req): AppJson<CreateOrganizationRequest>,
) -> Result<Json<OrganizationWithMembers>> {
    let org = services::organizations::create(state.store.as_ref(), &auth.into(), req).await?;
    Ok(Json(org))
}

pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<OrganizationWithMembers>> {
    let org_id = org_guard::parse_org_id(&id)?;
    let org = services::organizations::get(state.store.as_ref(), &auth.into(), org_id).await?;
    Ok(Json(org))
}
