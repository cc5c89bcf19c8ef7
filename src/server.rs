//! # Server Configuration
//!
//! This module contains the router, shared state and OpenAPI document for
//! the Stockroom API.

use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
};
use sea_orm::DatabaseConnection;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::{auth_middleware, require_warehouse_feature};
use crate::config::AppConfig;
use crate::handlers::{self, admin, company, employees, groups, item_types, item_units, items, manufacturers, signup, warehouse};
use crate::telemetry::{TRACE_ID_HEADER, trace_context_middleware};

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
}

fn warehouse_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/warehouse", get(warehouse::dashboard))
        .route(
            "/api/v1/warehouse/items",
            get(items::list_items).post(items::create_item),
        )
        .route(
            "/api/v1/warehouse/items/{id}",
            get(items::get_item)
                .put(items::update_item)
                .delete(items::delete_item),
        )
        .route(
            "/api/v1/warehouse/items/{id}/units",
            get(item_units::list_units).post(item_units::create_unit),
        )
        .route(
            "/api/v1/warehouse/items/{id}/units/{unit_id}",
            axum::routing::patch(item_units::update_unit).delete(item_units::delete_unit),
        )
        .route(
            "/api/v1/warehouse/item-types",
            get(item_types::list_item_types).post(item_types::create_item_type),
        )
        .route(
            "/api/v1/warehouse/item-types/{id}",
            axum::routing::patch(item_types::rename_item_type)
                .delete(item_types::delete_item_type),
        )
        .route(
            "/api/v1/warehouse/manufacturers",
            get(manufacturers::list_manufacturers).post(manufacturers::create_manufacturer),
        )
        .route(
            "/api/v1/warehouse/manufacturers/{id}",
            axum::routing::patch(manufacturers::rename_manufacturer)
                .delete(manufacturers::delete_manufacturer),
        )
        .route_layer(from_fn_with_state(state.clone(), require_warehouse_feature))
}

fn authenticated_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/me", get(handlers::auth::me))
        .route("/api/v1/sidebar", get(handlers::auth::sidebar))
        .route(
            "/api/v1/company",
            get(company::get_company).patch(company::update_company),
        )
        .route(
            "/api/v1/company/features",
            get(company::feature_overview).put(company::set_features),
        )
        .route(
            "/api/v1/company/features/enable",
            post(company::enable_features),
        )
        .route(
            "/api/v1/company/employees",
            get(employees::list_employees).post(employees::create_employee),
        )
        .route(
            "/api/v1/company/employees/{id}",
            get(employees::get_employee)
                .patch(employees::update_employee)
                .delete(employees::delete_employee),
        )
        .route(
            "/api/v1/company/employees/{id}/groups",
            put(employees::set_employee_groups),
        )
        .route("/api/v1/groups", get(groups::list_groups))
        .route(
            "/api/v1/admin/features",
            get(admin::list_features).post(admin::create_feature),
        )
        .route(
            "/api/v1/admin/features/{id}",
            axum::routing::patch(admin::update_feature),
        )
        .route(
            "/api/v1/admin/companies",
            get(admin::list_companies).post(admin::create_company),
        )
        .route(
            "/api/v1/admin/companies/{id}",
            axum::routing::patch(admin::update_company).delete(admin::delete_company),
        )
        .route("/api/v1/admin/companies/{id}/grants", get(admin::list_grants))
        .route(
            "/api/v1/admin/companies/{id}/grants/{feature_id}",
            put(admin::grant_feature).delete(admin::revoke_feature),
        )
        .merge(warehouse_routes(state))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware))
}

fn cors_layer(config: &AppConfig) -> Option<CorsLayer> {
    if config.cors_allowed_origins.is_empty() {
        return None;
    }

    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    Some(
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, TRACE_ID_HEADER])
            .expose_headers([TRACE_ID_HEADER]),
    )
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    let router = Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route("/api/v1/auth/login", post(handlers::auth::login))
        .route("/api/v1/signup", post(signup::signup))
        .merge(authenticated_routes(&state))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(from_fn(trace_context_middleware))
        .layer(TraceLayer::new_for_http());

    match cors {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

/// Starts the server with the given configuration
pub async fn run_server(config: AppConfig, db: DatabaseConnection) -> anyhow::Result<()> {
    let addr = config
        .bind_addr()
        .with_context(|| format!("Invalid server address: {}", config.api_bind_addr))?;

    let state = AppState {
        config: Arc::new(config),
        db,
    };
    let profile = state.config.profile.clone();
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(%addr, %profile, "Server listening");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz,
        crate::handlers::auth::login,
        crate::handlers::auth::me,
        crate::handlers::auth::sidebar,
        crate::handlers::signup::signup,
        crate::handlers::company::get_company,
        crate::handlers::company::update_company,
        crate::handlers::company::feature_overview,
        crate::handlers::company::enable_features,
        crate::handlers::company::set_features,
        crate::handlers::employees::list_employees,
        crate::handlers::employees::create_employee,
        crate::handlers::employees::get_employee,
        crate::handlers::employees::update_employee,
        crate::handlers::employees::delete_employee,
        crate::handlers::employees::set_employee_groups,
        crate::handlers::groups::list_groups,
        crate::handlers::admin::list_features,
        crate::handlers::admin::create_feature,
        crate::handlers::admin::update_feature,
        crate::handlers::admin::list_companies,
        crate::handlers::admin::create_company,
        crate::handlers::admin::update_company,
        crate::handlers::admin::delete_company,
        crate::handlers::admin::list_grants,
        crate::handlers::admin::grant_feature,
        crate::handlers::admin::revoke_feature,
        crate::handlers::warehouse::dashboard,
        crate::handlers::items::list_items,
        crate::handlers::items::get_item,
        crate::handlers::items::create_item,
        crate::handlers::items::update_item,
        crate::handlers::items::delete_item,
        crate::handlers::item_units::list_units,
        crate::handlers::item_units::create_unit,
        crate::handlers::item_units::update_unit,
        crate::handlers::item_units::delete_unit,
        crate::handlers::item_types::list_item_types,
        crate::handlers::item_types::create_item_type,
        crate::handlers::item_types::rename_item_type,
        crate::handlers::item_types::delete_item_type,
        crate::handlers::manufacturers::list_manufacturers,
        crate::handlers::manufacturers::create_manufacturer,
        crate::handlers::manufacturers::rename_manufacturer,
        crate::handlers::manufacturers::delete_manufacturer,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::error::ApiError,
            crate::handlers::HealthResponse,
            crate::handlers::types::CompanyResponse,
            crate::handlers::types::UserResponse,
            crate::handlers::types::SidebarResponse,
            crate::features::SidebarFeature,
            crate::features::FeatureStatus,
            crate::features::FeatureOverviewEntry,
            crate::handlers::auth::LoginRequest,
            crate::handlers::auth::TokenResponse,
            crate::handlers::auth::MeResponse,
            crate::handlers::signup::SignupRequestDto,
            crate::handlers::signup::SignupResponse,
            crate::handlers::company::UpdateCompanyDto,
            crate::handlers::company::GrantSelectionDto,
            crate::handlers::company::FeatureOverviewResponse,
            crate::handlers::employees::EmployeeResponse,
            crate::handlers::employees::CreateEmployeeDto,
            crate::handlers::employees::UpdateEmployeeDto,
            crate::handlers::employees::EmployeeGroupsDto,
            crate::handlers::groups::GroupResponse,
            crate::handlers::admin::FeatureResponse,
            crate::handlers::admin::CreateFeatureDto,
            crate::handlers::admin::UpdateFeatureDto,
            crate::handlers::admin::CreateCompanyDto,
            crate::handlers::admin::AdminUpdateCompanyDto,
            crate::handlers::admin::GrantResponse,
            crate::handlers::admin::GrantDto,
            crate::repositories::item::WarehouseDashboard,
            crate::repositories::item::TypeBreakdown,
            crate::handlers::items::ItemResponse,
            crate::handlers::items::ItemListResponse,
            crate::handlers::items::ItemDto,
            crate::handlers::item_types::NamedResponse,
            crate::handlers::item_types::NameDto,
            crate::handlers::item_units::ItemUnitResponse,
            crate::handlers::item_units::CreateUnitDto,
            crate::handlers::item_units::UpdateUnitDto,
            crate::models::item_unit::UnitState,
        )
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Stockroom API",
        description = "Multi-tenant company, feature and warehouse management",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
