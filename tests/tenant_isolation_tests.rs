//! Tests ensuring records of one company behave as missing for another.

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

#[path = "test_utils/mod.rs"]
mod test_utils;
use test_utils::{TestApp, uuid_at};

#[tokio::test]
async fn warehouse_records_are_invisible_across_companies() -> Result<()> {
    let app = TestApp::new().await?;
    let a = app.warehouse_tenant("A", 1).await?;
    let b = app.warehouse_tenant("B", 2).await?;

    let item_type = app
        .post("/api/v1/warehouse/item-types", &a.token, json!({ "name": "PLC" }))
        .await;
    let item_type_id = uuid_at(&item_type.body, "/id")?;
    let manufacturer = app
        .post(
            "/api/v1/warehouse/manufacturers",
            &a.token,
            json!({ "name": "WEG" }),
        )
        .await;
    let manufacturer_id = uuid_at(&manufacturer.body, "/id")?;
    let item = app
        .post(
            "/api/v1/warehouse/items",
            &a.token,
            json!({
                "name": "Drive",
                "item_type_id": item_type_id,
                "manufacturer_id": manufacturer_id,
                "model": "CFW500",
                "quantity": 2,
                "market_value": "800.00",
            }),
        )
        .await;
    assert_eq!(item.status, StatusCode::CREATED, "{}", item.body);
    let item_id = uuid_at(&item.body, "/id")?;

    let listed = app.get("/api/v1/warehouse/items", &b.token).await;
    assert!(listed.body["data"].as_array().unwrap().is_empty());

    let item_path = format!("/api/v1/warehouse/items/{item_id}");
    assert_eq!(app.get(&item_path, &b.token).await.status, StatusCode::NOT_FOUND);
    assert_eq!(
        app.delete(&item_path, &b.token).await.status,
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        app.get(&format!("{item_path}/units"), &b.token).await.status,
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        app.patch(
            &format!("/api/v1/warehouse/item-types/{item_type_id}"),
            &b.token,
            json!({ "name": "Stolen" }),
        )
        .await
        .status,
        StatusCode::NOT_FOUND
    );

    // Another company's catalog entries are not valid choices.
    let own_type = app
        .post("/api/v1/warehouse/item-types", &b.token, json!({ "name": "HMI" }))
        .await;
    let borrowed = app
        .post(
            "/api/v1/warehouse/items",
            &b.token,
            json!({
                "name": "Panel",
                "item_type_id": uuid_at(&own_type.body, "/id")?,
                "manufacturer_id": manufacturer_id,
                "model": "X",
                "quantity": 1,
                "market_value": "1.00",
            }),
        )
        .await;
    assert_eq!(borrowed.status, StatusCode::BAD_REQUEST);
    assert!(borrowed.body["details"]["manufacturer_id"].is_array());

    let dashboard = app.get("/api/v1/warehouse", &b.token).await;
    assert_eq!(dashboard.body["item_count"], 0);
    assert_eq!(dashboard.body["total_stock_value"], "0.00");

    assert_eq!(app.get(&item_path, &a.token).await.status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn employees_are_scoped_to_their_company() -> Result<()> {
    let app = TestApp::new().await?;
    let a = app.signup("A", 1).await?;
    let b = app.signup("B", 2).await?;
    let (employee_id, _) = app.add_employee(&a.token, "clerk").await?;

    let path = format!("/api/v1/company/employees/{employee_id}");
    assert_eq!(app.get(&path, &b.token).await.status, StatusCode::NOT_FOUND);
    assert_eq!(
        app.patch(&path, &b.token, json!({ "first_name": "X" }))
            .await
            .status,
        StatusCode::NOT_FOUND
    );

    let listed = app.get("/api/v1/company/employees", &b.token).await;
    let usernames: Vec<&str> = listed.body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|e| e["username"].as_str())
        .collect();
    assert_eq!(usernames, vec!["owner2"]);
    Ok(())
}

#[tokio::test]
async fn users_without_company_are_forbidden_from_tenant_routes() -> Result<()> {
    let app = TestApp::new().await?;
    let root = app.superuser("root").await?;

    for path in [
        "/api/v1/company",
        "/api/v1/company/employees",
        "/api/v1/warehouse/items",
    ] {
        let response = app.get(path, &root).await;
        assert_eq!(response.status, StatusCode::FORBIDDEN, "{path}");
        assert_eq!(
            response.body["message"],
            "User is not associated with a company."
        );
    }
    Ok(())
}

#[tokio::test]
async fn inactive_company_does_not_resolve() -> Result<()> {
    let app = TestApp::new().await?;
    let tenant = app.signup("Acme", 1).await?;
    let root = app.superuser("root").await?;

    let response = app
        .patch(
            &format!("/api/v1/admin/companies/{}", tenant.company_id),
            &root,
            json!({ "is_active": false }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let company = app.get("/api/v1/company", &tenant.token).await;
    assert_eq!(company.status, StatusCode::FORBIDDEN);

    let me = app.get("/api/v1/me", &tenant.token).await;
    assert_eq!(me.status, StatusCode::OK);
    assert!(me.body["company"].is_null());
    Ok(())
}
