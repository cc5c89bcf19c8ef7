//! Test utilities for database and router testing.
//!
//! Sets up in-memory SQLite databases with migrations applied and drives the
//! application router in-process with `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use serde_json::{Value, json};
use stockroom::{
    auth::issue_access_token,
    config::AppConfig,
    repositories::{
        FeatureGrantRepository, FeatureRepository, UserRepository, user::{NewUser, hash_password},
    },
    seeds::sync_standard_groups,
    server::{AppState, create_app},
};
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "test-secret-test-secret-test-secret";
pub const TEST_PASSWORD: &str = "Str0ngPassword";

/// Sets up an in-memory SQLite database with all migrations applied.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

pub fn test_config() -> AppConfig {
    AppConfig {
        profile: "test".to_string(),
        jwt_secret: Some(TEST_JWT_SECRET.to_string()),
        ..Default::default()
    }
}

/// Response of one in-process request
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// A signed-up company and its owner
pub struct Tenant {
    pub company_id: Uuid,
    pub owner_id: Uuid,
    pub token: String,
}

/// Router plus the database behind it
pub struct TestApp {
    pub router: Router,
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
}

impl TestApp {
    /// Fresh database with the standard groups synchronised
    pub async fn new() -> Result<Self> {
        let db = setup_test_db().await?;
        sync_standard_groups(&db).await?;

        let config = Arc::new(test_config());
        let router = create_app(AppState {
            config: config.clone(),
            db: db.clone(),
        });
        Ok(Self { router, db, config })
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: &str) -> TestResponse {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.request(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.request(Method::PATCH, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> TestResponse {
        self.request(Method::DELETE, uri, Some(token), None).await
    }

    pub fn token_for(&self, user_id: Uuid) -> String {
        issue_access_token(&self.config, user_id).unwrap().0
    }

    /// Sign up a company through the public endpoint.
    ///
    /// `seq` keeps tax id, username and email unique within one test.
    pub async fn signup(&self, company_name: &str, seq: u32) -> Result<Tenant> {
        let response = self
            .request(
                Method::POST,
                "/api/v1/signup",
                None,
                Some(signup_body(company_name, seq)),
            )
            .await;
        anyhow::ensure!(
            response.status == StatusCode::CREATED,
            "signup failed: {} {}",
            response.status,
            response.body
        );

        let body = &response.body;
        Ok(Tenant {
            company_id: uuid_at(body, "/company/id")?,
            owner_id: uuid_at(body, "/user/id")?,
            token: body["token"]["access_token"]
                .as_str()
                .context("token missing")?
                .to_string(),
        })
    }

    /// Sign up a company and enable the `warehouse` feature for it
    pub async fn warehouse_tenant(&self, company_name: &str, seq: u32) -> Result<Tenant> {
        let tenant = self.signup(company_name, seq).await?;
        self.grant_feature(tenant.company_id, "warehouse", true).await?;
        Ok(tenant)
    }

    pub async fn grant_feature(&self, company_id: Uuid, code: &str, enabled: bool) -> Result<Uuid> {
        let feature = FeatureRepository::new(&self.db)
            .get_or_create(code, code)
            .await?;
        let grant = FeatureGrantRepository::new(&self.db)
            .grant(company_id, feature.id, enabled, None)
            .await?;
        Ok(grant.id)
    }

    /// Create an active superuser without a company and return its token
    pub async fn superuser(&self, username: &str) -> Result<String> {
        let user = UserRepository::new(&self.db)
            .create(NewUser {
                username: username.to_string(),
                email: format!("{username}@example.com"),
                first_name: "Super".to_string(),
                last_name: "User".to_string(),
                password_hash: hash_password(TEST_PASSWORD).await?,
                is_superuser: true,
            })
            .await?;
        Ok(self.token_for(user.id))
    }

    /// Create an employee through the API using the owner's token
    pub async fn add_employee(&self, owner_token: &str, username: &str) -> Result<(Uuid, String)> {
        let response = self
            .post(
                "/api/v1/company/employees",
                owner_token,
                json!({
                    "first_name": "Staff",
                    "last_name": "Member",
                    "username": username,
                    "email": format!("{username}@example.com"),
                    "password": TEST_PASSWORD,
                    "password2": TEST_PASSWORD,
                }),
            )
            .await;
        anyhow::ensure!(
            response.status == StatusCode::CREATED,
            "employee creation failed: {} {}",
            response.status,
            response.body
        );

        let employee_id = uuid_at(&response.body, "/id")?;
        let user_id = uuid_at(&response.body, "/user_id")?;
        Ok((employee_id, self.token_for(user_id)))
    }
}

pub fn signup_body(company_name: &str, seq: u32) -> Value {
    json!({
        "company_name": company_name,
        "tax_id": format!("{:014}", 11_222_333_000_100u64 + u64::from(seq)),
        "first_name": "Owner",
        "last_name": "Person",
        "username": format!("owner{seq}"),
        "email": format!("owner{seq}@example.com"),
        "password": TEST_PASSWORD,
        "password2": TEST_PASSWORD,
    })
}

pub fn uuid_at(body: &Value, pointer: &str) -> Result<Uuid> {
    body.pointer(pointer)
        .and_then(Value::as_str)
        .with_context(|| format!("{pointer} missing in {body}"))?
        .parse()
        .context("invalid uuid")
}
