//! Integration tests for the feature catalog, grants and superuser administration.

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::{Value, json};
use stockroom::repositories::EmployeeRepository;
use uuid::Uuid;

#[path = "test_utils/mod.rs"]
mod test_utils;
use test_utils::{TestApp, uuid_at};

fn status_of(overview: &Value, code: &str) -> Value {
    overview["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|entry| entry["code"] == code)
        .map(|entry| entry["status"].clone())
        .unwrap_or(Value::Null)
}

#[tokio::test]
async fn overview_reports_grant_status() -> Result<()> {
    let app = TestApp::new().await?;
    let tenant = app.signup("Acme", 1).await?;
    app.grant_feature(tenant.company_id, "warehouse", false).await?;
    let other = app.signup("Other", 2).await?;
    app.grant_feature(other.company_id, "users", true).await?;

    let overview = app.get("/api/v1/company/features", &tenant.token).await;
    assert_eq!(overview.status, StatusCode::OK);
    assert_eq!(status_of(&overview.body, "companies"), "enabled");
    assert_eq!(status_of(&overview.body, "warehouse"), "disabled");
    assert_eq!(status_of(&overview.body, "users"), "not_granted");

    let companies = overview.body["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|entry| entry["code"] == "companies")
        .unwrap();
    assert_eq!(companies["url"], "/api/v1/company");
    Ok(())
}

#[tokio::test]
async fn owner_enables_but_never_disables() -> Result<()> {
    let app = TestApp::new().await?;
    let tenant = app.signup("Acme", 1).await?;
    let grant_id = app
        .grant_feature(tenant.company_id, "warehouse", false)
        .await?;

    let response = app
        .post(
            "/api/v1/company/features/enable",
            &tenant.token,
            json!({ "grant_ids": [grant_id] }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    assert_eq!(status_of(&response.body, "warehouse"), "enabled");

    // An empty selection leaves enabled grants alone.
    let response = app
        .post(
            "/api/v1/company/features/enable",
            &tenant.token,
            json!({ "grant_ids": [] }),
        )
        .await;
    assert_eq!(status_of(&response.body, "warehouse"), "enabled");
    assert_eq!(status_of(&response.body, "companies"), "enabled");
    Ok(())
}

#[tokio::test]
async fn enabling_requires_manage_permission() -> Result<()> {
    let app = TestApp::new().await?;
    let tenant = app.signup("Acme", 1).await?;
    let grant_id = app
        .grant_feature(tenant.company_id, "warehouse", false)
        .await?;
    let (_, clerk) = app.add_employee(&tenant.token, "clerk").await?;

    let response = app
        .post(
            "/api/v1/company/features/enable",
            &clerk,
            json!({ "grant_ids": [grant_id] }),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(
        response.body["message"],
        "You do not have permission to manage company features."
    );
    Ok(())
}

#[tokio::test]
async fn foreign_grant_ids_are_not_found_and_change_nothing() -> Result<()> {
    let app = TestApp::new().await?;
    let a = app.signup("A", 1).await?;
    let b = app.signup("B", 2).await?;
    let own = app.grant_feature(a.company_id, "warehouse", false).await?;
    let foreign = app.grant_feature(b.company_id, "warehouse", false).await?;

    let response = app
        .post(
            "/api/v1/company/features/enable",
            &a.token,
            json!({ "grant_ids": [own, foreign] }),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let overview = app.get("/api/v1/company/features", &a.token).await;
    assert_eq!(status_of(&overview.body, "warehouse"), "disabled");
    Ok(())
}

#[tokio::test]
async fn superuser_sets_exact_toggles() -> Result<()> {
    let app = TestApp::new().await?;
    let tenant = app.signup("Acme", 1).await?;
    let warehouse = app
        .grant_feature(tenant.company_id, "warehouse", false)
        .await?;

    let forbidden = app
        .put(
            "/api/v1/company/features",
            &tenant.token,
            json!({ "grant_ids": [warehouse] }),
        )
        .await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

    let root = app.superuser("root").await?;
    let root_id = app
        .get("/api/v1/me", &root)
        .await
        .body
        .pointer("/user/id")
        .and_then(Value::as_str)
        .unwrap()
        .parse::<Uuid>()?;
    EmployeeRepository::new(&app.db)
        .create(root_id, tenant.company_id)
        .await?;

    let response = app
        .put(
            "/api/v1/company/features",
            &root,
            json!({ "grant_ids": [warehouse] }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    assert_eq!(status_of(&response.body, "warehouse"), "enabled");
    assert_eq!(status_of(&response.body, "companies"), "disabled");
    Ok(())
}

#[tokio::test]
async fn admin_endpoints_require_superuser() -> Result<()> {
    let app = TestApp::new().await?;
    let tenant = app.signup("Acme", 1).await?;

    for path in ["/api/v1/admin/features", "/api/v1/admin/companies"] {
        let response = app.get(path, &tenant.token).await;
        assert_eq!(response.status, StatusCode::FORBIDDEN, "{path}");
        assert_eq!(response.body["message"], "Superuser access required.");
    }
    Ok(())
}

#[tokio::test]
async fn superuser_manages_catalog_and_grants() -> Result<()> {
    let app = TestApp::new().await?;
    let root = app.superuser("root").await?;

    let not_installed = app
        .post(
            "/api/v1/admin/features",
            &root,
            json!({ "code": "billing", "name": "Billing" }),
        )
        .await;
    assert_eq!(not_installed.status, StatusCode::BAD_REQUEST);
    assert!(not_installed.body["details"]["code"].is_array());

    let feature = app
        .post(
            "/api/v1/admin/features",
            &root,
            json!({ "code": "warehouse", "name": "Warehouse" }),
        )
        .await;
    assert_eq!(feature.status, StatusCode::CREATED, "{}", feature.body);
    let feature_id = uuid_at(&feature.body, "/id")?;

    let duplicate = app
        .post(
            "/api/v1/admin/features",
            &root,
            json!({ "code": "warehouse", "name": "Again" }),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    let company = app
        .post(
            "/api/v1/admin/companies",
            &root,
            json!({ "name": "Managed", "tax_id": "99.888.777/0001-66" }),
        )
        .await;
    assert_eq!(company.status, StatusCode::CREATED);
    let company_id = uuid_at(&company.body, "/id")?;

    let grants_path = format!("/api/v1/admin/companies/{company_id}/grants");
    let grants = app.get(&grants_path, &root).await;
    let codes: Vec<&str> = grants.body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|g| g["feature_code"].as_str())
        .collect();
    assert_eq!(codes, vec!["companies"]);

    let granted = app
        .put(&format!("{grants_path}/{feature_id}"), &root, json!({}))
        .await;
    assert_eq!(granted.status, StatusCode::OK);
    assert_eq!(granted.body["enabled"], true);

    let toggled = app
        .put(
            &format!("{grants_path}/{feature_id}"),
            &root,
            json!({ "enabled": false }),
        )
        .await;
    assert_eq!(toggled.body["enabled"], false);
    assert_eq!(toggled.body["id"], granted.body["id"]);

    let revoked = app
        .delete(&format!("{grants_path}/{feature_id}"), &root)
        .await;
    assert_eq!(revoked.status, StatusCode::NO_CONTENT);
    let revoked_again = app
        .delete(&format!("{grants_path}/{feature_id}"), &root)
        .await;
    assert_eq!(revoked_again.status, StatusCode::NOT_FOUND);

    let deleted = app
        .delete(&format!("/api/v1/admin/companies/{company_id}"), &root)
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    Ok(())
}

#[tokio::test]
async fn deactivated_feature_disappears_from_sidebar() -> Result<()> {
    let app = TestApp::new().await?;
    let root = app.superuser("root").await?;
    let tenant = app.warehouse_tenant("Acme", 1).await?;

    let features = app.get("/api/v1/admin/features", &root).await;
    let warehouse_id = features.body["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|f| f["code"] == "warehouse")
        .and_then(|f| f["id"].as_str())
        .unwrap()
        .to_string();

    let response = app
        .patch(
            &format!("/api/v1/admin/features/{warehouse_id}"),
            &root,
            json!({ "is_active": false }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let sidebar = app.get("/api/v1/sidebar", &tenant.token).await;
    let codes: Vec<&str> = sidebar.body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|f| f["code"].as_str())
        .collect();
    assert_eq!(codes, vec!["companies"]);
    Ok(())
}
