//! Persistence seam.
//!
//! Handlers and services only see [`Store`]. Every compound write (organization
//! plus owner membership, invite redemption) is a single call so that the
//! implementation can run it as one unit of work.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::models::{
    invite::{InviteWithOrganization, NewInvite, OrganizationInvite},
    member::OrganizationMember,
    organization::{NewOrganization, Organization, OrganizationWithMembers},
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("a pending invite already exists for this email")]
    DuplicateInvite,

    #[error("user is already a member of this organization")]
    DuplicateMembership,

    /// The invite disappeared between lookup and redemption.
    #[error("invite has already been consumed")]
    InviteConsumed,

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    /// Create the organization and its owner's ADMIN membership atomically.
    async fn create_organization(
        &self,
        new: NewOrganization,
    ) -> StoreResult<OrganizationWithMembers>;

    async fn find_organization(&self, id: Uuid) -> StoreResult<Option<Organization>>;

    async fn list_organizations_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Organization>>;

    async fn find_membership(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<OrganizationMember>>;

    async fn list_members(&self, organization_id: Uuid) -> StoreResult<Vec<OrganizationMember>>;

    /// Unexpired invite for `(organization_id, email)`, if any.
    async fn find_pending_invite(
        &self,
        organization_id: Uuid,
        email: &str,
        now: OffsetDateTime,
    ) -> StoreResult<Option<OrganizationInvite>>;

    /// Insert an invite, replacing an expired one for the same
    /// `(organization_id, email)`. A live duplicate yields
    /// [`StoreError::DuplicateInvite`].
    async fn create_invite(
        &self,
        new: NewInvite,
        now: OffsetDateTime,
    ) -> StoreResult<OrganizationInvite>;

    async fn find_invite_by_token_hash(
        &self,
        token_hash: &str,
    ) -> StoreResult<Option<InviteWithOrganization>>;

    /// Pending invites for an organization, newest first.
    async fn list_invites(&self, organization_id: Uuid) -> StoreResult<Vec<OrganizationInvite>>;

    /// Returns whether a row was removed.
    async fn delete_invite(&self, invite_id: Uuid) -> StoreResult<bool>;

    /// Consume the invite and create the membership it grants, all or nothing.
    ///
    /// Fails with [`StoreError::InviteConsumed`] when the invite is already
    /// gone, and with [`StoreError::DuplicateMembership`] (leaving the invite
    /// in place) when the user already belongs to the organization.
    async fn redeem_invite(
        &self,
        invite_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<OrganizationMember>;
}
