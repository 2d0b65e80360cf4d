use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;
use validator::Validate;

use super::member::MemberRole;

/// A pending invite as stored. The plaintext token is never persisted, only
/// its digest.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationInvite {
    pub id: Uuid,
    #[serde(skip)]
    pub token_hash: String,
    pub organization_id: Uuid,
    pub email: String,
    pub role: MemberRole,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
    pub invited_by_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl OrganizationInvite {
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at < now
    }
}

/// Invite joined with the name of the organization it grants access to.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InviteWithOrganization {
    #[sqlx(flatten)]
    pub invite: OrganizationInvite,
    pub organization_name: String,
}

/// Store input for a new invite.
#[derive(Debug, Clone)]
pub struct NewInvite {
    pub token_hash: String,
    pub organization_id: Uuid,
    pub email: String,
    pub role: MemberRole,
    pub expires_at: OffsetDateTime,
    pub invited_by_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateInviteRequest {
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    pub role: MemberRole,
}

/// Issuance response: the stored invite plus the one-time plaintext token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedInvite {
    #[serde(flatten)]
    pub invite: OrganizationInvite,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InviteValidation {
    pub organization_id: Uuid,
    pub organization_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AcceptInviteResponse {
    pub success: bool,
    pub message: String,
}
