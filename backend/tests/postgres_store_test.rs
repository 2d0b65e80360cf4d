//! Store tests against a real database. Run with
//! `TEST_DATABASE_URL=... cargo test -- --ignored`.

use palour_backend::{
    models::{invite::NewInvite, member::MemberRole, organization::NewOrganization},
    services::invites::hash_token,
    store::{PgStore, Store, StoreError},
};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

async fn connect() -> PgStore {
    let url = std::env::var("TEST_DATABASE_URL")
        .expect("TEST_DATABASE_URL must be set for Postgres store tests");
    PgStore::connect(&url, 5)
        .await
        .expect("Failed to connect to TEST_DATABASE_URL")
}

async fn seed_org(store: &PgStore, owner_id: Uuid) -> Uuid {
    store
        .create_organization(NewOrganization {
            name: format!("Org {}", Uuid::new_v4()),
            description: "Store integration test organization".into(),
            website: None,
            logo: None,
            owner_id,
        })
        .await
        .unwrap()
        .organization
        .id
}

fn new_invite(org_id: Uuid, email: &str, inviter: Uuid, expires_at: OffsetDateTime) -> NewInvite {
    NewInvite {
        token_hash: hash_token(&Uuid::new_v4().to_string()),
        organization_id: org_id,
        email: email.into(),
        role: MemberRole::Member,
        expires_at,
        invited_by_id: inviter,
    }
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn redeem_consumes_invite_once() {
    let store = connect().await;
    let owner = Uuid::new_v4();
    let org_id = seed_org(&store, owner).await;
    let now = OffsetDateTime::now_utc();

    let invite = store
        .create_invite(new_invite(org_id, "alice@x.com", owner, now + Duration::days(7)), now)
        .await
        .unwrap();

    let alice = Uuid::new_v4();
    let member = store.redeem_invite(invite.id, alice).await.unwrap();
    assert_eq!(member.organization_id, org_id);
    assert_eq!(member.role, MemberRole::Member);

    let again = store.redeem_invite(invite.id, Uuid::new_v4()).await;
    assert!(matches!(again, Err(StoreError::InviteConsumed)));
    assert!(store.list_invites(org_id).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn duplicate_membership_keeps_invite() {
    let store = connect().await;
    let owner = Uuid::new_v4();
    let org_id = seed_org(&store, owner).await;
    let now = OffsetDateTime::now_utc();

    let invite = store
        .create_invite(new_invite(org_id, "again@x.com", owner, now + Duration::days(7)), now)
        .await
        .unwrap();

    let result = store.redeem_invite(invite.id, owner).await;
    assert!(matches!(result, Err(StoreError::DuplicateMembership)));
    assert_eq!(store.list_invites(org_id).await.unwrap().len(), 1);
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn live_duplicate_rejected_expired_replaced() {
    let store = connect().await;
    let owner = Uuid::new_v4();
    let org_id = seed_org(&store, owner).await;
    let now = OffsetDateTime::now_utc();

    store
        .create_invite(new_invite(org_id, "bob@x.com", owner, now + Duration::days(7)), now)
        .await
        .unwrap();
    let dup = store
        .create_invite(new_invite(org_id, "bob@x.com", owner, now + Duration::days(7)), now)
        .await;
    assert!(matches!(dup, Err(StoreError::DuplicateInvite)));

    store
        .create_invite(new_invite(org_id, "carol@x.com", owner, now - Duration::seconds(1)), now)
        .await
        .unwrap();
    assert!(store
        .find_pending_invite(org_id, "carol@x.com", now)
        .await
        .unwrap()
        .is_none());
    store
        .create_invite(new_invite(org_id, "carol@x.com", owner, now + Duration::days(7)), now)
        .await
        .expect("Expired invite should be replaced");
    assert_eq!(store.list_invites(org_id).await.unwrap().len(), 2);
}
