//! # Tests for Handlers
//!
//! Handler-level tests that call the functions directly without a router.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{StatusCode, header::LOCATION},
    response::IntoResponse,
};
use chrono::Utc;
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

use crate::access::PermissionSet;
use crate::auth::{Principal, TenantScope};
use crate::config::AppConfig;
use crate::handlers::{healthz, root, warehouse};
use crate::models::{company, user};
use crate::server::AppState;

fn state(db: DatabaseConnection) -> AppState {
    AppState {
        config: Arc::new(AppConfig::default()),
        db,
    }
}

fn scope(permissions: PermissionSet) -> TenantScope {
    let company = company::Model {
        id: Uuid::new_v4(),
        name: "Acme".to_string(),
        tax_id: None,
        is_active: true,
        created_at: Utc::now().into(),
    };
    let user = user::Model {
        id: Uuid::new_v4(),
        username: "clerk".to_string(),
        email: "clerk@example.com".to_string(),
        first_name: "Clerk".to_string(),
        last_name: "Person".to_string(),
        password_hash: String::new(),
        is_active: true,
        is_superuser: false,
        created_at: Utc::now().into(),
    };
    TenantScope {
        principal: Principal {
            user,
            company: Some(company.clone()),
            permissions,
        },
        company,
    }
}

#[tokio::test]
async fn test_root_handler_returns_expected_service_info() {
    let info = root().await.0;

    assert_eq!(info.service, "stockroom");
    assert_eq!(info.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_healthz_reports_ok_with_database() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();

    let response = healthz(State(state(db))).await.unwrap();
    assert_eq!(response.0.status, "ok");
}

#[tokio::test]
async fn test_healthz_unavailable_without_database() {
    let error = healthz(State(state(DatabaseConnection::default())))
        .await
        .unwrap_err();

    assert_eq!(error.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(&*error.code, "SERVICE_UNAVAILABLE");
}

#[tokio::test]
async fn test_dashboard_redirects_without_financial_permission() {
    let response = warehouse::dashboard(
        State(state(DatabaseConnection::default())),
        scope(PermissionSet::empty()),
    )
    .await
    .unwrap()
    .into_response();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(LOCATION).unwrap(),
        warehouse::ITEMS_PATH
    );
}
