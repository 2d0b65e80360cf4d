use std::time::Duration;

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::models::{
    invite::{InviteWithOrganization, NewInvite, OrganizationInvite},
    member::{MemberRole, OrganizationMember},
    organization::{NewOrganization, Organization, OrganizationWithMembers},
};

const ORGANIZATION_COLUMNS: &str =
    "id, name, description, website, logo, owner_id, created_at, updated_at";
const MEMBER_COLUMNS: &str = "organization_id, user_id, role, created_at";
const INVITE_COLUMNS: &str =
    "id, token_hash, organization_id, email, role, expires_at, invited_by_id, created_at";

/// Postgres-backed store. Compound writes run inside a single transaction.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect and bring the schema up to date.
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

#[async_trait]
impl Store for PgStore {
    async fn create_organization(
        &self,
        new: NewOrganization,
    ) -> StoreResult<OrganizationWithMembers> {
        let mut tx = self.pool.begin().await?;

        let organization = sqlx::query_as::<_, Organization>(&format!(
            "INSERT INTO organizations (id, name, description, website, logo, owner_id) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {ORGANIZATION_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&new.name)
        .bind(&new.description)
        .bind(&new.website)
        .bind(&new.logo)
        .bind(new.owner_id)
        .fetch_one(&mut *tx)
        .await?;

        let owner = sqlx::query_as::<_, OrganizationMember>(&format!(
            "INSERT INTO organization_members (organization_id, user_id, role) \
             VALUES ($1, $2, $3) \
             RETURNING {MEMBER_COLUMNS}"
        ))
        .bind(organization.id)
        .bind(new.owner_id)
        .bind(MemberRole::Admin)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(OrganizationWithMembers {
            organization,
            members: vec![owner],
        })
    }

    async fn find_organization(&self, id: Uuid) -> StoreResult<Option<Organization>> {
        let org = sqlx::query_as::<_, Organization>(&format!(
            "SELECT {ORGANIZATION_COLUMNS} FROM organizations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(org)
    }

    async fn list_organizations_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Organization>> {
        let orgs = sqlx::query_as::<_, Organization>(
            r#"
            SELECT o.id, o.name, o.description, o.website, o.logo, o.owner_id,
                   o.created_at, o.updated_at
            FROM organizations o
            JOIN organization_members m ON m.organization_id = o.id
            WHERE m.user_id = $1
            ORDER BY o.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(orgs)
    }

    async fn find_membership(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<OrganizationMember>> {
        let member = sqlx::query_as::<_, OrganizationMember>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM organization_members \
             WHERE organization_id = $1 AND user_id = $2"
        ))
        .bind(organization_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }

    async fn list_members(&self, organization_id: Uuid) -> StoreResult<Vec<OrganizationMember>> {
        let members = sqlx::query_as::<_, OrganizationMember>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM organization_members \
             WHERE organization_id = $1 ORDER BY created_at"
        ))
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    async fn find_pending_invite(
        &self,
        organization_id: Uuid,
        email: &str,
        now: OffsetDateTime,
    ) -> StoreResult<Option<OrganizationInvite>> {
        let invite = sqlx::query_as::<_, OrganizationInvite>(&format!(
            "SELECT {INVITE_COLUMNS} FROM organization_invites \
             WHERE organization_id = $1 AND email = $2 AND expires_at >= $3"
        ))
        .bind(organization_id)
        .bind(email)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(invite)
    }

    async fn create_invite(
        &self,
        new: NewInvite,
        now: OffsetDateTime,
    ) -> StoreResult<OrganizationInvite> {
        let mut tx = self.pool.begin().await?;

        let purged = sqlx::query(
            "DELETE FROM organization_invites \
             WHERE organization_id = $1 AND email = $2 AND expires_at < $3",
        )
        .bind(new.organization_id)
        .bind(&new.email)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if purged > 0 {
            tracing::debug!(organization_id = %new.organization_id, "Replaced expired invite");
        }

        let invite = sqlx::query_as::<_, OrganizationInvite>(&format!(
            "INSERT INTO organization_invites \
                 (id, token_hash, organization_id, email, role, expires_at, invited_by_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {INVITE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&new.token_hash)
        .bind(new.organization_id)
        .bind(&new.email)
        .bind(new.role)
        .bind(new.expires_at)
        .bind(new.invited_by_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::DuplicateInvite
            } else {
                StoreError::Database(e)
            }
        })?;

        tx.commit().await?;

        Ok(invite)
    }

    async fn find_invite_by_token_hash(
        &self,
        token_hash: &str,
    ) -> StoreResult<Option<InviteWithOrganization>> {
        let invite = sqlx::query_as::<_, InviteWithOrganization>(
            r#"
            SELECT i.id, i.token_hash, i.organization_id, i.email, i.role,
                   i.expires_at, i.invited_by_id, i.created_at,
                   o.name AS organization_name
            FROM organization_invites i
            JOIN organizations o ON o.id = i.organization_id
            WHERE i.token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(invite)
    }

    async fn list_invites(&self, organization_id: Uuid) -> StoreResult<Vec<OrganizationInvite>> {
        let invites = sqlx::query_as::<_, OrganizationInvite>(&format!(
            "SELECT {INVITE_COLUMNS} FROM organization_invites \
             WHERE organization_id = $1 ORDER BY created_at DESC"
        ))
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(invites)
    }

    async fn delete_invite(&self, invite_id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM organization_invites WHERE id = $1")
            .bind(invite_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn redeem_invite(
        &self,
        invite_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<OrganizationMember> {
        let mut tx = self.pool.begin().await?;

        // Row lock: a concurrent redemption of the same invite blocks here and
        // then sees zero rows.
        let consumed: Option<(Uuid, MemberRole)> = sqlx::query_as(
            "DELETE FROM organization_invites WHERE id = $1 RETURNING organization_id, role",
        )
        .bind(invite_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((organization_id, role)) = consumed else {
            return Err(StoreError::InviteConsumed);
        };

        let member = sqlx::query_as::<_, OrganizationMember>(&format!(
            "INSERT INTO organization_members (organization_id, user_id, role) \
             VALUES ($1, $2, $3) \
             RETURNING {MEMBER_COLUMNS}"
        ))
        .bind(organization_id)
        .bind(user_id)
        .bind(role)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::DuplicateMembership
            } else {
                StoreError::Database(e)
            }
        })?;

        tx.commit().await?;

        Ok(member)
    }
}
