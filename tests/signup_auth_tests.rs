//! Integration tests for signup, login and the authenticated profile.

use anyhow::Result;
use axum::http::{Method, StatusCode};
use sea_orm::{ActiveModelTrait, ActiveValue::Set};
use serde_json::json;
use stockroom::models::user;

#[path = "test_utils/mod.rs"]
mod test_utils;
use test_utils::{TEST_PASSWORD, TestApp, signup_body};

#[tokio::test]
async fn signup_creates_company_owner_and_token() -> Result<()> {
    let app = TestApp::new().await?;

    let mut body = signup_body("Acme Ltda", 1);
    body["tax_id"] = json!("11.222.333/0001-01");
    let response = app
        .request(Method::POST, "/api/v1/signup", None, Some(body))
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["company"]["name"], "Acme Ltda");
    assert_eq!(response.body["company"]["tax_id"], "11222333000101");
    assert_eq!(response.body["user"]["username"], "owner1");
    assert_eq!(response.body["token"]["token_type"], "Bearer");
    assert!(response.body["user"].get("password_hash").is_none());

    let token = response.body["token"]["access_token"].as_str().unwrap();
    let me = app.get("/api/v1/me", token).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["company"]["name"], "Acme Ltda");

    let permissions: Vec<&str> = me.body["permissions"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|p| p.as_str())
        .collect();
    assert!(permissions.contains(&"companies.manage_company_features"));
    assert!(permissions.contains(&"companies.add_employee"));
    assert!(permissions.contains(&"warehouse.view_financial_dashboard"));
    assert!(!permissions.contains(&"companies.delete_employee"));
    Ok(())
}

#[tokio::test]
async fn signup_rejects_mismatched_passwords_without_side_effects() -> Result<()> {
    let app = TestApp::new().await?;

    let mut body = signup_body("Acme Ltda", 1);
    body["password2"] = json!("Different1Password");
    let response = app
        .request(Method::POST, "/api/v1/signup", None, Some(body))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["code"], "VALIDATION_FAILED");
    assert_eq!(
        response.body["details"]["non_field_errors"][0],
        "Passwords must be equal"
    );

    // Same identity can still sign up afterwards.
    app.signup("Acme Ltda", 1).await?;
    Ok(())
}

#[tokio::test]
async fn signup_validates_tax_id_and_unique_identity() -> Result<()> {
    let app = TestApp::new().await?;
    app.signup("First", 1).await?;

    let mut bad_tax_id = signup_body("Second", 2);
    bad_tax_id["tax_id"] = json!("123");
    let response = app
        .request(Method::POST, "/api/v1/signup", None, Some(bad_tax_id))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["details"]["tax_id"].is_array());

    let mut same_username = signup_body("Third", 3);
    same_username["username"] = json!("owner1");
    let response = app
        .request(Method::POST, "/api/v1/signup", None, Some(same_username))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["details"]["username"].is_array());

    let mut weak = signup_body("Fourth", 4);
    weak["password"] = json!("short");
    weak["password2"] = json!("short");
    let response = app
        .request(Method::POST, "/api/v1/signup", None, Some(weak))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["details"]["password"].is_array());
    Ok(())
}

#[tokio::test]
async fn login_issues_token_for_valid_credentials_only() -> Result<()> {
    let app = TestApp::new().await?;
    app.signup("Acme", 1).await?;

    let ok = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "username": "owner1", "password": TEST_PASSWORD })),
        )
        .await;
    assert_eq!(ok.status, StatusCode::OK);
    let token = ok.body["access_token"].as_str().unwrap();
    assert_eq!(app.get("/api/v1/me", token).await.status, StatusCode::OK);

    let wrong = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "username": "owner1", "password": "Wrong1Password" })),
        )
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        wrong.body["message"],
        "Please enter a correct username and password."
    );

    let unknown = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "username": "nobody", "password": TEST_PASSWORD })),
        )
        .await;
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn inactive_and_unknown_users_get_the_same_rejection() -> Result<()> {
    let app = TestApp::new().await?;
    let tenant = app.signup("Acme", 1).await?;

    user::ActiveModel {
        id: Set(tenant.owner_id),
        is_active: Set(false),
        ..Default::default()
    }
    .update(&app.db)
    .await?;

    let inactive = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "username": "owner1", "password": TEST_PASSWORD })),
        )
        .await;
    let unknown = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "username": "nobody", "password": TEST_PASSWORD })),
        )
        .await;

    assert_eq!(inactive.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
    assert_eq!(inactive.body, unknown.body);
    Ok(())
}

#[tokio::test]
async fn protected_routes_require_bearer_token() -> Result<()> {
    let app = TestApp::new().await?;

    let missing = app.request(Method::GET, "/api/v1/me", None, None).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
    assert_eq!(missing.body["code"], "UNAUTHORIZED");

    let garbage = app.get("/api/v1/company", "not-a-jwt").await;
    assert_eq!(garbage.status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn sidebar_lists_enabled_routed_features() -> Result<()> {
    let app = TestApp::new().await?;
    let tenant = app.signup("Acme", 1).await?;

    let sidebar = app.get("/api/v1/sidebar", &tenant.token).await;
    assert_eq!(sidebar.status, StatusCode::OK);
    assert_eq!(sidebar.body["data"].as_array().unwrap().len(), 1);
    assert_eq!(sidebar.body["data"][0]["code"], "companies");
    assert_eq!(sidebar.body["data"][0]["url"], "/api/v1/company");

    app.grant_feature(tenant.company_id, "warehouse", true).await?;
    app.grant_feature(tenant.company_id, "users", true).await?;
    let sidebar = app.get("/api/v1/sidebar", &tenant.token).await;
    let codes: Vec<&str> = sidebar.body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|f| f["code"].as_str())
        .collect();
    assert_eq!(codes, vec!["companies", "warehouse"]);

    let superuser = app.superuser("root").await?;
    let empty = app.get("/api/v1/sidebar", &superuser).await;
    assert_eq!(empty.status, StatusCode::OK);
    assert!(empty.body["data"].as_array().unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn public_endpoints_respond() -> Result<()> {
    let app = TestApp::new().await?;

    let root = app.request(Method::GET, "/", None, None).await;
    assert_eq!(root.status, StatusCode::OK);
    assert_eq!(root.body["service"], "stockroom");

    let health = app.request(Method::GET, "/healthz", None, None).await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.body["status"], "ok");

    let openapi = app.request(Method::GET, "/openapi.json", None, None).await;
    assert_eq!(openapi.status, StatusCode::OK);
    assert!(openapi.body["paths"]["/api/v1/warehouse/items"].is_object());
    Ok(())
}
