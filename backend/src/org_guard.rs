//! Org-boundary checks.
//!
//! Every function answers `AppError::NotFound` when the caller has no business
//! seeing the organization, so we never reveal that it exists.

use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{member::OrganizationMember, organization::Organization};
use crate::store::Store;

/// Parse an organization id taken from a path segment. Anything that is not a
/// UUID cannot name an organization.
pub fn parse_org_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound("Organization not found".into()))
}

pub async fn require_member(
    store: &dyn Store,
    org_id: Uuid,
    user_id: Uuid,
) -> Result<(Organization, OrganizationMember)> {
    let not_found = || AppError::NotFound("Organization not found".into());

    let member = store
        .find_membership(org_id, user_id)
        .await?
        .ok_or_else(not_found)?;
    let org = store.find_organization(org_id).await?.ok_or_else(not_found)?;

    Ok((org, member))
}

pub async fn require_admin(store: &dyn Store, org_id: Uuid, user_id: Uuid) -> Result<Organization> {
    let not_found = || AppError::NotFound("Organization not found or unauthorized".into());

    let org = store.find_organization(org_id).await?.ok_or_else(not_found)?;
    let member = store
        .find_membership(org_id, user_id)
        .await?
        .ok_or_else(not_found)?;

    if !member.role.is_admin() {
        return Err(not_found());
    }
    Ok(org)
}
