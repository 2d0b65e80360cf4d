mod common;

use serde_json::json;

#[tokio::test]
async fn create_organization_makes_owner_admin() {
    let app = common::setup_test_app().await;
    let (owner_id, owner) = common::test_user("owner@acme.com");

    let resp = common::http_client()
        .post(app.url("/api/organizations"))
        .bearer_auth(&owner)
        .json(&json!({
            "name": "Acme",
            "description": "Concerts, conferences and everything in between",
            "website": "https://acme.example.com",
            "logo": "data:image/png;base64,iVBORw0KGgo=",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["name"], "Acme");
    assert_eq!(body["website"], "https://acme.example.com");
    assert_eq!(body["ownerId"], owner_id.to_string());
    assert_eq!(body["members"].as_array().unwrap().len(), 1);
    assert_eq!(body["members"][0]["userId"], owner_id.to_string());
    assert_eq!(body["members"][0]["role"], "ADMIN");
}

#[tokio::test]
async fn onboarding_form_field_name_is_accepted() {
    let app = common::setup_test_app().await;
    let (_, owner) = common::test_user("owner@acme.com");

    let resp = common::http_client()
        .post(app.url("/api/organizations"))
        .bearer_auth(&owner)
        .json(&json!({
            "orgName": "Acme",
            "description": "Concerts, conferences and everything in between",
            "website": "",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["name"], "Acme");
}

#[tokio::test]
async fn empty_website_is_stored_as_null() {
    let app = common::setup_test_app().await;
    let (_, owner) = common::test_user("owner@acme.com");
    let org_id = common::create_test_org(&app, &owner, "Acme").await;

    let resp = common::http_client()
        .get(app.url(&format!("/api/organizations/{}", org_id)))
        .bearer_auth(&owner)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["website"].is_null());
    assert!(body["logo"].is_null());
}

#[tokio::test]
async fn create_organization_requires_session() {
    let app = common::setup_test_app().await;

    let resp = common::http_client()
        .post(app.url("/api/organizations"))
        .json(&json!({
            "name": "Acme",
            "description": "Concerts, conferences and everything in between",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn create_organization_validates_input() {
    let app = common::setup_test_app().await;
    let (_, owner) = common::test_user("owner@acme.com");

    let resp = common::http_client()
        .post(app.url("/api/organizations"))
        .bearer_auth(&owner)
        .json(&json!({
            "name": "A",
            "description": "too short",
            "website": "nope",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("name"));
    assert!(error.contains("description"));
    assert!(error.contains("website"));

    let resp = common::http_client()
        .post(app.url("/api/organizations"))
        .bearer_auth(&owner)
        .json(&json!({
            "name": "Acme",
            "description": "Concerts, conferences and everything in between",
            "logo": "data:application/pdf;base64,JVBERi0=",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400, "Non-image logo should be rejected");
}

#[tokio::test]
async fn organization_is_hidden_from_outsiders() {
    let app = common::setup_test_app().await;
    let (_, owner) = common::test_user("owner@acme.com");
    let (_, outsider) = common::test_user("eve@x.com");
    let org_id = common::create_test_org(&app, &owner, "Acme").await;

    let resp = common::http_client()
        .get(app.url(&format!("/api/organizations/{}", org_id)))
        .bearer_auth(&outsider)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn list_returns_only_my_organizations() {
    let app = common::setup_test_app().await;
    let (_, owner) = common::test_user("owner@acme.com");
    let (_, other) = common::test_user("other@globex.com");
    common::create_test_org(&app, &owner, "Acme").await;
    common::create_test_org(&app, &owner, "Bravo").await;
    common::create_test_org(&app, &other, "Globex").await;

    let resp = common::http_client()
        .get(app.url("/api/organizations"))
        .bearer_auth(&owner)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Acme", "Bravo"]);
}

#[tokio::test]
async fn session_endpoint_reflects_bearer() {
    let app = common::setup_test_app().await;
    let (user_id, token) = common::test_user("alice@x.com");

    let resp = common::http_client()
        .get(app.url("/api/session"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["user"].is_null());

    let resp = common::http_client()
        .get(app.url("/api/session"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["user"]["id"], user_id.to_string());
    assert_eq!(body["user"]["email"], "alice@x.com");
}
