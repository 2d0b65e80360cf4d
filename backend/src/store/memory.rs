use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::models::{
    invite::{InviteWithOrganization, NewInvite, OrganizationInvite},
    member::{MemberRole, OrganizationMember},
    organization::{NewOrganization, Organization, OrganizationWithMembers},
};

/// In-process store for tests and local runs without Postgres.
///
/// One lock guards all tables, and every trait method holds it for its whole
/// body, which gives compound writes the same all-or-nothing behavior as a
/// database transaction.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Tables>>,
}

#[derive(Default)]
struct Tables {
    organizations: HashMap<Uuid, Organization>,
    members: HashMap<(Uuid, Uuid), OrganizationMember>,
    invites: HashMap<Uuid, OrganizationInvite>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite an invite's expiry. Lets tests age invites without a clock.
    pub async fn set_invite_expiry(&self, invite_id: Uuid, expires_at: OffsetDateTime) -> bool {
        let mut tables = self.inner.lock().await;
        match tables.invites.get_mut(&invite_id) {
            Some(invite) => {
                invite.expires_at = expires_at;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_organization(
        &self,
        new: NewOrganization,
    ) -> StoreResult<OrganizationWithMembers> {
        let mut tables = self.inner.lock().await;
        let now = OffsetDateTime::now_utc();

        let organization = Organization {
            id: Uuid::new_v4(),
            name: new.name,
            description: new.description,
            website: new.website,
            logo: new.logo,
            owner_id: new.owner_id,
            created_at: now,
            updated_at: now,
        };
        let owner = OrganizationMember {
            organization_id: organization.id,
            user_id: new.owner_id,
            role: MemberRole::Admin,
            created_at: now,
        };

        tables
            .organizations
            .insert(organization.id, organization.clone());
        tables
            .members
            .insert((organization.id, owner.user_id), owner.clone());

        Ok(OrganizationWithMembers {
            organization,
            members: vec![owner],
        })
    }

    async fn find_organization(&self, id: Uuid) -> StoreResult<Option<Organization>> {
        let tables = self.inner.lock().await;
        Ok(tables.organizations.get(&id).cloned())
    }

    async fn list_organizations_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Organization>> {
        let tables = self.inner.lock().await;
        let mut orgs: Vec<Organization> = tables
            .members
            .values()
            .filter(|m| m.user_id == user_id)
            .filter_map(|m| tables.organizations.get(&m.organization_id).cloned())
            .collect();
        orgs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(orgs)
    }

    async fn find_membership(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<OrganizationMember>> {
        let tables = self.inner.lock().await;
        Ok(tables.members.get(&(organization_id, user_id)).cloned())
    }

    async fn list_members(&self, organization_id: Uuid) -> StoreResult<Vec<OrganizationMember>> {
        let tables = self.inner.lock().await;
        let mut members: Vec<OrganizationMember> = tables
            .members
            .values()
            .filter(|m| m.organization_id == organization_id)
            .cloned()
            .collect();
        members.sort_by_key(|m| m.created_at);
        Ok(members)
    }

    async fn find_pending_invite(
        &self,
        organization_id: Uuid,
        email: &str,
        now: OffsetDateTime,
    ) -> StoreResult<Option<OrganizationInvite>> {
        let tables = self.inner.lock().await;
        Ok(tables
            .invites
            .values()
            .find(|i| {
                i.organization_id == organization_id && i.email == email && !i.is_expired(now)
            })
            .cloned())
    }

    async fn create_invite(
        &self,
        new: NewInvite,
        now: OffsetDateTime,
    ) -> StoreResult<OrganizationInvite> {
        let mut tables = self.inner.lock().await;

        tables.invites.retain(|_, i| {
            !(i.organization_id == new.organization_id && i.email == new.email && i.is_expired(now))
        });

        let duplicate = tables.invites.values().any(|i| {
            i.token_hash == new.token_hash
                || (i.organization_id == new.organization_id && i.email == new.email)
        });
        if duplicate {
            return Err(StoreError::DuplicateInvite);
        }

        let invite = OrganizationInvite {
            id: Uuid::new_v4(),
            token_hash: new.token_hash,
            organization_id: new.organization_id,
            email: new.email,
            role: new.role,
            expires_at: new.expires_at,
            invited_by_id: new.invited_by_id,
            created_at: now,
        };
        tables.invites.insert(invite.id, invite.clone());

        Ok(invite)
    }

    async fn find_invite_by_token_hash(
        &self,
        token_hash: &str,
    ) -> StoreResult<Option<InviteWithOrganization>> {
        let tables = self.inner.lock().await;
        let found = tables
            .invites
            .values()
            .find(|i| i.token_hash == token_hash)
            .and_then(|invite| {
                tables
                    .organizations
                    .get(&invite.organization_id)
                    .map(|org| InviteWithOrganization {
                        invite: invite.clone(),
                        organization_name: org.name.clone(),
                    })
            });
        Ok(found)
    }

    async fn list_invites(&self, organization_id: Uuid) -> StoreResult<Vec<OrganizationInvite>> {
        let tables = self.inner.lock().await;
        let mut invites: Vec<OrganizationInvite> = tables
            .invites
            .values()
            .filter(|i| i.organization_id == organization_id)
            .cloned()
            .collect();
        invites.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(invites)
    }

    async fn delete_invite(&self, invite_id: Uuid) -> StoreResult<bool> {
        let mut tables = self.inner.lock().await;
        Ok(tables.invites.remove(&invite_id).is_some())
    }

    async fn redeem_invite(
        &self,
        invite_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<OrganizationMember> {
        let mut tables = self.inner.lock().await;

        let (organization_id, role) = match tables.invites.get(&invite_id) {
            Some(invite) => (invite.organization_id, invite.role),
            None => return Err(StoreError::InviteConsumed),
        };

        if tables.members.contains_key(&(organization_id, user_id)) {
            return Err(StoreError::DuplicateMembership);
        }

        let member = OrganizationMember {
            organization_id,
            user_id,
            role,
            created_at: OffsetDateTime::now_utc(),
        };
        tables.invites.remove(&invite_id);
        tables
            .members
            .insert((organization_id, user_id), member.clone());

        Ok(member)
    }
}
