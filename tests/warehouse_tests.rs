//! Integration tests for the warehouse: catalog, items, units and dashboard.

use std::collections::HashSet;

use anyhow::Result;
use axum::http::{StatusCode, header::LOCATION};
use serde_json::{Value, json};
use uuid::Uuid;

#[path = "test_utils/mod.rs"]
mod test_utils;
use test_utils::{TestApp, uuid_at};

struct Catalog {
    plc: Uuid,
    sensor: Uuid,
    siemens: Uuid,
}

async fn catalog(app: &TestApp, token: &str) -> Result<Catalog> {
    let mut ids = Vec::new();
    for name in ["PLC", "Sensor"] {
        let response = app
            .post("/api/v1/warehouse/item-types", token, json!({ "name": name }))
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        ids.push(uuid_at(&response.body, "/id")?);
    }
    let response = app
        .post(
            "/api/v1/warehouse/manufacturers",
            token,
            json!({ "name": "Siemens" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);

    Ok(Catalog {
        plc: ids[0],
        sensor: ids[1],
        siemens: uuid_at(&response.body, "/id")?,
    })
}

fn item_body(name: &str, item_type_id: Uuid, manufacturer_id: Uuid, quantity: i32, value: &str) -> Value {
    json!({
        "name": name,
        "item_type_id": item_type_id,
        "manufacturer_id": manufacturer_id,
        "model": format!("{name}-M"),
        "quantity": quantity,
        "market_value": value,
        "description": "",
    })
}

#[tokio::test]
async fn warehouse_requires_feature_grant() -> Result<()> {
    let app = TestApp::new().await?;
    let tenant = app.signup("Acme", 1).await?;

    let response = app.get("/api/v1/warehouse/items", &tenant.token).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["code"], "FEATURE_DISABLED");

    app.grant_feature(tenant.company_id, "warehouse", false).await?;
    let response = app.get("/api/v1/warehouse", &tenant.token).await;
    assert_eq!(response.body["code"], "FEATURE_DISABLED");

    app.grant_feature(tenant.company_id, "warehouse", true).await?;
    let response = app.get("/api/v1/warehouse/items", &tenant.token).await;
    assert_eq!(response.status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn catalog_names_are_unique_per_company() -> Result<()> {
    let app = TestApp::new().await?;
    let a = app.warehouse_tenant("A", 1).await?;
    let b = app.warehouse_tenant("B", 2).await?;

    let first = app
        .post("/api/v1/warehouse/item-types", &a.token, json!({ "name": "PLC" }))
        .await;
    assert_eq!(first.status, StatusCode::CREATED);

    let duplicate = app
        .post("/api/v1/warehouse/item-types", &a.token, json!({ "name": "PLC" }))
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    let other_company = app
        .post("/api/v1/warehouse/item-types", &b.token, json!({ "name": "PLC" }))
        .await;
    assert_eq!(other_company.status, StatusCode::CREATED);

    let blank = app
        .post("/api/v1/warehouse/manufacturers", &a.token, json!({ "name": "  " }))
        .await;
    assert_eq!(blank.status, StatusCode::BAD_REQUEST);
    assert!(blank.body["details"]["name"].is_array());

    let id = uuid_at(&first.body, "/id")?;
    let renamed = app
        .patch(
            &format!("/api/v1/warehouse/item-types/{id}"),
            &a.token,
            json!({ "name": "Controller" }),
        )
        .await;
    assert_eq!(renamed.status, StatusCode::OK);
    assert_eq!(renamed.body["name"], "Controller");

    let listed = app.get("/api/v1/warehouse/item-types", &a.token).await;
    assert_eq!(listed.body["data"].as_array().unwrap().len(), 1);
    Ok(())
}

#[tokio::test]
async fn item_crud_computes_stock_value() -> Result<()> {
    let app = TestApp::new().await?;
    let tenant = app.warehouse_tenant("Acme", 1).await?;
    let catalog = catalog(&app, &tenant.token).await?;

    let created = app
        .post(
            "/api/v1/warehouse/items",
            &tenant.token,
            item_body("S7-200", catalog.plc, catalog.siemens, 4, "500.00"),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.body);
    assert_eq!(created.body["item_type"]["name"], "PLC");
    assert_eq!(created.body["manufacturer"]["name"], "Siemens");
    assert_eq!(created.body["market_value"], "500.00");
    assert_eq!(created.body["stock_value"], "2000.00");

    let id = uuid_at(&created.body, "/id")?;
    let updated = app
        .put(
            &format!("/api/v1/warehouse/items/{id}"),
            &tenant.token,
            item_body("S7-200", catalog.sensor, catalog.siemens, 2, "10.50"),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["item_type"]["name"], "Sensor");
    assert_eq!(updated.body["stock_value"], "21.00");

    let deleted = app
        .delete(&format!("/api/v1/warehouse/items/{id}"), &tenant.token)
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    let missing = app
        .get(&format!("/api/v1/warehouse/items/{id}"), &tenant.token)
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn item_values_are_validated() -> Result<()> {
    let app = TestApp::new().await?;
    let tenant = app.warehouse_tenant("Acme", 1).await?;
    let catalog = catalog(&app, &tenant.token).await?;

    for (quantity, value, field) in [
        (1, "-1.00", "market_value"),
        (1, "1.005", "market_value"),
        (1, "100000000.00", "market_value"),
        (-1, "1.00", "quantity"),
    ] {
        let response = app
            .post(
                "/api/v1/warehouse/items",
                &tenant.token,
                item_body("Bad", catalog.plc, catalog.siemens, quantity, value),
            )
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{value}");
        assert!(response.body["details"][field].is_array(), "{}", response.body);
    }

    let max = app
        .post(
            "/api/v1/warehouse/items",
            &tenant.token,
            item_body("Max", catalog.plc, catalog.siemens, 0, "99999999.99"),
        )
        .await;
    assert_eq!(max.status, StatusCode::CREATED);
    Ok(())
}

#[tokio::test]
async fn items_page_with_cursor() -> Result<()> {
    let app = TestApp::new().await?;
    let tenant = app.warehouse_tenant("Acme", 1).await?;
    let catalog = catalog(&app, &tenant.token).await?;

    let mut created = HashSet::new();
    for name in ["One", "Two", "Three"] {
        let response = app
            .post(
                "/api/v1/warehouse/items",
                &tenant.token,
                item_body(name, catalog.plc, catalog.siemens, 1, "1.00"),
            )
            .await;
        created.insert(uuid_at(&response.body, "/id")?);
    }

    let first = app
        .get("/api/v1/warehouse/items?limit=2", &tenant.token)
        .await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["data"].as_array().unwrap().len(), 2);
    assert_eq!(first.body["has_more"], true);
    assert_eq!(first.body["can_add"], true);
    assert_eq!(first.body["can_delete"], true);

    let cursor = first.body["next_cursor"].as_str().unwrap();
    let second = app
        .get(
            &format!("/api/v1/warehouse/items?limit=2&cursor={cursor}"),
            &tenant.token,
        )
        .await;
    assert_eq!(second.body["data"].as_array().unwrap().len(), 1);
    assert_eq!(second.body["has_more"], false);
    assert!(second.body["next_cursor"].is_null());

    let seen: HashSet<Uuid> = first.body["data"]
        .as_array()
        .unwrap()
        .iter()
        .chain(second.body["data"].as_array().unwrap())
        .map(|item| item["id"].as_str().unwrap().parse().unwrap())
        .collect();
    assert_eq!(seen, created);

    let bad = app
        .get("/api/v1/warehouse/items?cursor=!!!", &tenant.token)
        .await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn item_units_follow_their_item() -> Result<()> {
    let app = TestApp::new().await?;
    let tenant = app.warehouse_tenant("Acme", 1).await?;
    let catalog = catalog(&app, &tenant.token).await?;

    let item = app
        .post(
            "/api/v1/warehouse/items",
            &tenant.token,
            item_body("HMI", catalog.plc, catalog.siemens, 1, "1.00"),
        )
        .await;
    let item_id = uuid_at(&item.body, "/id")?;
    let units_path = format!("/api/v1/warehouse/items/{item_id}/units");

    let unit = app
        .post(&units_path, &tenant.token, json!({ "remark": "shelf 3" }))
        .await;
    assert_eq!(unit.status, StatusCode::CREATED);
    assert_eq!(unit.body["state"], "new");
    let unit_id = uuid_at(&unit.body, "/id")?;

    let changed = app
        .patch(
            &format!("{units_path}/{unit_id}"),
            &tenant.token,
            json!({ "state": "damaged" }),
        )
        .await;
    assert_eq!(changed.status, StatusCode::OK);
    assert_eq!(changed.body["state"], "damaged");
    assert_eq!(changed.body["remark"], "shelf 3");

    let listed = app.get(&units_path, &tenant.token).await;
    assert_eq!(listed.body["data"].as_array().unwrap().len(), 1);

    let unknown_item = app
        .get(
            &format!("/api/v1/warehouse/items/{}/units", Uuid::new_v4()),
            &tenant.token,
        )
        .await;
    assert_eq!(unknown_item.status, StatusCode::NOT_FOUND);

    let deleted = app
        .delete(&format!("{units_path}/{unit_id}"), &tenant.token)
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    Ok(())
}

#[tokio::test]
async fn deleting_item_type_removes_its_items() -> Result<()> {
    let app = TestApp::new().await?;
    let tenant = app.warehouse_tenant("Acme", 1).await?;
    let catalog = catalog(&app, &tenant.token).await?;

    let item = app
        .post(
            "/api/v1/warehouse/items",
            &tenant.token,
            item_body("Sensor Head", catalog.sensor, catalog.siemens, 1, "1.00"),
        )
        .await;
    let item_id = uuid_at(&item.body, "/id")?;
    app.post(
        &format!("/api/v1/warehouse/items/{item_id}/units"),
        &tenant.token,
        json!({}),
    )
    .await;

    let deleted = app
        .delete(
            &format!("/api/v1/warehouse/item-types/{}", catalog.sensor),
            &tenant.token,
        )
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let missing = app
        .get(&format!("/api/v1/warehouse/items/{item_id}"), &tenant.token)
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn dashboard_totals_and_redirect() -> Result<()> {
    let app = TestApp::new().await?;
    let tenant = app.warehouse_tenant("Acme", 1).await?;
    let catalog = catalog(&app, &tenant.token).await?;

    for (name, item_type, quantity, value) in [
        ("A", catalog.plc, 4, "500.00"),
        ("B", catalog.plc, 1, "100.00"),
        ("C", catalog.sensor, 10, "2.50"),
    ] {
        app.post(
            "/api/v1/warehouse/items",
            &tenant.token,
            item_body(name, item_type, catalog.siemens, quantity, value),
        )
        .await;
    }

    let dashboard = app.get("/api/v1/warehouse", &tenant.token).await;
    assert_eq!(dashboard.status, StatusCode::OK);
    assert_eq!(dashboard.body["item_count"], 3);
    assert_eq!(dashboard.body["total_quantity"], 15);
    assert_eq!(dashboard.body["total_stock_value"], "2125.00");
    assert_eq!(dashboard.body["by_type"][0]["name"], "PLC");
    assert_eq!(dashboard.body["by_type"][0]["stock_value"], "2100.00");
    assert_eq!(dashboard.body["by_type"][1]["name"], "Sensor");
    assert_eq!(dashboard.body["by_type"][1]["total_quantity"], 10);

    let (_, clerk_token) = app.add_employee(&tenant.token, "clerk").await?;
    let redirected = app.get("/api/v1/warehouse", &clerk_token).await;
    assert_eq!(redirected.status, StatusCode::SEE_OTHER);
    assert_eq!(
        redirected.headers.get(LOCATION).unwrap(),
        "/api/v1/warehouse/items"
    );

    let forbidden = app.get("/api/v1/warehouse/items", &clerk_token).await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);
    assert_eq!(forbidden.body["code"], "FORBIDDEN");
    Ok(())
}

#[tokio::test]
async fn dashboard_handles_largest_stock_values() -> Result<()> {
    let app = TestApp::new().await?;
    let tenant = app.warehouse_tenant("Acme", 1).await?;
    let catalog = catalog(&app, &tenant.token).await?;

    for name in ["A", "B"] {
        let created = app
            .post(
                "/api/v1/warehouse/items",
                &tenant.token,
                item_body(name, catalog.plc, catalog.siemens, i32::MAX, "99999999.99"),
            )
            .await;
        assert_eq!(created.status, StatusCode::CREATED, "{}", created.body);
        assert_eq!(created.body["stock_value"], "214748364678525163.53");
    }

    let dashboard = app.get("/api/v1/warehouse", &tenant.token).await;
    assert_eq!(dashboard.status, StatusCode::OK);
    assert_eq!(dashboard.body["total_quantity"], 2 * i64::from(i32::MAX));
    assert_eq!(dashboard.body["total_stock_value"], "429496729357050327.06");
    assert_eq!(
        dashboard.body["by_type"][0]["stock_value"],
        "429496729357050327.06"
    );
    Ok(())
}
