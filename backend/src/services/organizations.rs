use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::SessionUser,
    error::Result,
    models::organization::{CreateOrganizationRequest, Organization, OrganizationWithMembers},
    org_guard,
    store::Store,
};

/// Create an organization owned by `owner`, who becomes its first ADMIN.
pub async fn create(
    store: &dyn Store,
    owner: &SessionUser,
    req: CreateOrganizationRequest,
) -> Result<OrganizationWithMembers> {
    req.validate()?;

    let created = store.create_organization(req.into_new(owner.id)).await?;

    tracing::info!(
        organization_id = %created.organization.id,
        owner_id = %owner.id,
        "Organization created"
    );

    Ok(created)
}

pub async fn list_for_user(store: &dyn Store, user: &SessionUser) -> Result<Vec<Organization>> {
    Ok(store.list_organizations_for_user(user.id).await?)
}

pub async fn get(
    store: &dyn Store,
    user: &SessionUser,
    org_id: Uuid,
) -> Result<OrganizationWithMembers> {
    let (organization, _) = org_guard::require_member(store, org_id, user.id).await?;
    let members = store.list_members(org_id).await?;

    Ok(OrganizationWithMembers {
        organization,
        members,
    })
}
