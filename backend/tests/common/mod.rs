#![allow(dead_code)]
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use uuid::Uuid;

use palour_backend::{
    api,
    auth::create_token,
    mail::{InviteEmail, MailError, Mailer},
    store::MemoryStore,
    AppState,
};

pub const JWT_SECRET: &str = "test-secret-that-is-at-least-32-chars-long!!";

/// Mailer that keeps every invite it was asked to send, and can be told to
/// reject particular recipients.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<InviteEmail>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingMailer {
    pub fn fail_for(&self, email: &str) {
        self.failing.lock().unwrap().insert(email.to_string());
    }

    pub fn sent(&self) -> Vec<InviteEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_invite(&self, email: &InviteEmail) -> Result<(), MailError> {
        if self.failing.lock().unwrap().contains(&email.to_email) {
            return Err(MailError::Rejected(format!("550 {} unavailable", email.to_email)));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

pub struct TestApp {
    pub addr: SocketAddr,
    pub store: MemoryStore,
    pub mailer: Arc<RecordingMailer>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

/// Spin up a real Axum server on a random port backed by the in-process store.
/// Each test gets its own store, so tests never see each other's data.
pub async fn setup_test_app() -> TestApp {
    let store = MemoryStore::new();
    let mailer = Arc::new(RecordingMailer::default());

    let state = AppState {
        store: Arc::new(store.clone()),
        mailer: mailer.clone(),
        jwt_secret: JWT_SECRET.to_string(),
    };

    // main.rs mounts the token routes behind a rate limiter; tests add them
    // without it.
    let app = api::router(state.clone()).merge(api::token_routes(state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        addr,
        store,
        mailer,
    }
}

/// A signed-in user as the auth service would issue it. Returns (user_id, bearer token).
pub fn test_user(email: &str) -> (Uuid, String) {
    let id = Uuid::new_v4();
    let token = create_token(id, email, JWT_SECRET, 12).expect("Failed to create token");
    (id, token)
}

/// Build a reqwest client (reusable across requests in a test).
pub fn http_client() -> reqwest::Client {
    reqwest::Client::new()
}

/// Create an organization through the API. Returns its id.
pub async fn create_test_org(app: &TestApp, token: &str, name: &str) -> Uuid {
    let resp = http_client()
        .post(app.url("/api/organizations"))
        .bearer_auth(token)
        .json(&json!({
            "name": name,
            "description": "Test organization for integration tests",
            "website": "",
        }))
        .send()
        .await
        .expect("Create organization request failed");

    assert_eq!(resp.status(), 200, "Organization creation should return 200");

    let body: serde_json::Value = resp.json().await.unwrap();
    body["id"]
        .as_str()
        .and_then(|id| Uuid::parse_str(id).ok())
        .expect("Response should contain organization id")
}

/// Issue an invite through the API and return the response.
pub async fn invite(
    app: &TestApp,
    token: &str,
    org_id: Uuid,
    email: &str,
    role: &str,
) -> reqwest::Response {
    http_client()
        .post(app.url(&format!("/api/organizations/{}/invites", org_id)))
        .bearer_auth(token)
        .json(&json!({ "email": email, "role": role }))
        .send()
        .await
        .expect("Create invite request failed")
}

/// Issue an invite that must succeed. Returns (invite_id, invite token).
pub async fn issue_invite(app: &TestApp, token: &str, org_id: Uuid, email: &str) -> (Uuid, String) {
    let resp = invite(app, token, org_id, email, "MEMBER").await;
    assert_eq!(resp.status(), 200, "Invite creation should return 200");

    let body: serde_json::Value = resp.json().await.unwrap();
    let id = Uuid::parse_str(body["id"].as_str().unwrap()).unwrap();
    (id, body["token"].as_str().unwrap().to_string())
}

pub async fn accept(
    app: &TestApp,
    bearer: Option<&str>,
    org_id: Uuid,
    invite_token: &str,
) -> reqwest::Response {
    let mut req = http_client().post(app.url(&format!(
        "/api/organizations/{}/invites/{}",
        org_id, invite_token
    )));
    if let Some(bearer) = bearer {
        req = req.bearer_auth(bearer);
    }
    req.send().await.expect("Accept invite request failed")
}

pub async fn validate(app: &TestApp, invite_token: &str) -> reqwest::Response {
    http_client()
        .get(app.url(&format!("/api/organizations/invites/{}/validate", invite_token)))
        .send()
        .await
        .expect("Validate invite request failed")
}
