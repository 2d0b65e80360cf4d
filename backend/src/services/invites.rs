//! Invite lifecycle: issue, validate, accept.
//!
//! Callers pass `now` explicitly so expiry is decided against one instant per
//! request.

use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::{Session, SessionUser},
    error::{AppError, Result},
    mail::{InviteEmail, Mailer},
    models::invite::{
        AcceptInviteResponse, CreateInviteRequest, CreatedInvite, InviteValidation, NewInvite,
        OrganizationInvite,
    },
    org_guard,
    store::Store,
};

/// How long an invite stays redeemable.
pub const INVITE_TTL: Duration = Duration::days(7);

const INVALID_INVITE: &str = "Invalid invite";

/// 32 bytes from the OS RNG, hex encoded.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Invites are looked up by this digest; the plaintext token is never stored.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

pub async fn issue(
    store: &dyn Store,
    mailer: &dyn Mailer,
    inviter: &SessionUser,
    org_id: Uuid,
    req: CreateInviteRequest,
    now: OffsetDateTime,
) -> Result<CreatedInvite> {
    let req = CreateInviteRequest {
        email: req.email.trim().to_lowercase(),
        ..req
    };
    req.validate()?;

    let org = org_guard::require_admin(store, org_id, inviter.id).await?;

    if store
        .find_pending_invite(org_id, &req.email, now)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(
            "Invite already exists for this email".into(),
        ));
    }

    let token = generate_token();
    let invite = store
        .create_invite(
            NewInvite {
                token_hash: hash_token(&token),
                organization_id: org_id,
                email: req.email.clone(),
                role: req.role,
                expires_at: now + INVITE_TTL,
                invited_by_id: inviter.id,
            },
            now,
        )
        .await?;

    let email = InviteEmail {
        to_email: req.email,
        organization_name: org.name,
        organization_logo: org.logo,
        sender_name: inviter.email.clone(),
        sender_email: inviter.email.clone(),
        invite_token: token.clone(),
    };

    if let Err(e) = mailer.send_invite(&email).await {
        // An invite nobody was told about would only block a retry.
        match store.delete_invite(invite.id).await {
            Ok(_) => {
                tracing::warn!(invite_id = %invite.id, "Invite rolled back after mail failure")
            }
            Err(del) => tracing::error!(
                invite_id = %invite.id,
                "Failed to roll back invite after mail failure: {:?}",
                del
            ),
        }
        return Err(e.into());
    }

    tracing::info!(
        organization_id = %org_id,
        invite_id = %invite.id,
        role = ?invite.role,
        "Invite issued"
    );

    Ok(CreatedInvite { invite, token })
}

/// Read-only check used by the acceptance page before the user signs in.
pub async fn validate(
    store: &dyn Store,
    token: &str,
    now: OffsetDateTime,
) -> Result<InviteValidation> {
    let found = store
        .find_invite_by_token_hash(&hash_token(token))
        .await?
        .ok_or_else(|| AppError::NotFound(INVALID_INVITE.into()))?;

    if found.invite.is_expired(now) {
        return Err(AppError::Expired);
    }

    Ok(InviteValidation {
        organization_id: found.invite.organization_id,
        organization_name: found.organization_name,
    })
}

/// Turn an invite into a membership.
///
/// `scope` is the organization named in the route, if any; a token issued for
/// another organization is reported as not found.
pub async fn accept(
    store: &dyn Store,
    token: &str,
    scope: Option<Uuid>,
    session: &Session,
    now: OffsetDateTime,
) -> Result<AcceptInviteResponse> {
    let found = store
        .find_invite_by_token_hash(&hash_token(token))
        .await?
        .ok_or_else(|| AppError::NotFound(INVALID_INVITE.into()))?;
    let invite = &found.invite;

    if scope.is_some_and(|org_id| org_id != invite.organization_id) {
        return Err(AppError::NotFound(INVALID_INVITE.into()));
    }

    // Expired rows stay until a new invite for the same address replaces them.
    if invite.is_expired(now) {
        return Err(AppError::Expired);
    }

    let user = session.user.as_ref().ok_or(AppError::Unauthorized)?;

    if store
        .find_membership(invite.organization_id, user.id)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(
            "You are already a member of this organization".into(),
        ));
    }

    let member = store.redeem_invite(invite.id, user.id).await?;

    tracing::info!(
        organization_id = %member.organization_id,
        user_id = %member.user_id,
        role = ?member.role,
        "Invite accepted"
    );

    Ok(AcceptInviteResponse {
        success: true,
        message: format!("Successfully joined {}", found.organization_name),
    })
}

/// Pending invites of an organization; admins only.
pub async fn list(
    store: &dyn Store,
    user: &SessionUser,
    org_id: Uuid,
) -> Result<Vec<OrganizationInvite>> {
    org_guard::require_admin(store, org_id, user.id).await?;
    Ok(store.list_invites(org_id).await?)
}
