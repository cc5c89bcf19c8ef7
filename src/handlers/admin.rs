//! # Administration API Handlers
//!
//! Superuser-only management of the feature catalog, companies and
//! per-company feature grants.

use axum::{
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::Principal;
use crate::error::{ApiError, not_found};
use crate::handlers::types::{CompanyResponse, ListResponse};
use crate::models::{company_feature, feature};
use crate::repositories::company::{CreateCompanyRequest, UpdateCompanyRequest};
use crate::repositories::feature::{CreateFeatureRequest, UpdateFeatureRequest};
use crate::repositories::{CompanyRepository, FeatureGrantRepository, FeatureRepository};
use crate::server::AppState;
use crate::tenancy;

/// Catalog feature
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FeatureResponse {
    #[schema(value_type = String)]
    pub id: Uuid,
    #[schema(example = "warehouse")]
    pub code: String,
    #[schema(example = "Warehouse")]
    pub name: String,
    pub is_active: bool,
    pub created_at: String,
}

impl From<feature::Model> for FeatureResponse {
    fn from(model: feature::Model) -> Self {
        Self {
            id: model.id,
            code: model.code,
            name: model.name,
            is_active: model.is_active,
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateFeatureDto {
    /// Must name an installed application
    #[schema(example = "warehouse")]
    pub code: String,
    pub name: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateFeatureDto {
    pub name: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateCompanyDto {
    pub name: String,
    pub tax_id: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct AdminUpdateCompanyDto {
    pub name: Option<String>,
    /// Empty string clears the tax id
    pub tax_id: Option<String>,
    pub is_active: Option<bool>,
}

/// Grant of a feature to a company
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GrantResponse {
    #[schema(value_type = String)]
    pub id: Uuid,
    #[schema(value_type = String)]
    pub company_id: Uuid,
    #[schema(value_type = String)]
    pub feature_id: Uuid,
    /// Present on grant listings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_code: Option<String>,
    pub enabled: bool,
    #[schema(value_type = Option<String>)]
    pub granted_by: Option<Uuid>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<company_feature::Model> for GrantResponse {
    fn from(model: company_feature::Model) -> Self {
        Self {
            id: model.id,
            company_id: model.company_id,
            feature_id: model.feature_id,
            feature_code: None,
            enabled: model.enabled,
            granted_by: model.granted_by,
            created_at: model.created_at.to_rfc3339(),
            updated_at: model.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GrantDto {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// List the feature catalog
#[utoipa::path(
    get,
    path = "/api/v1/admin/features",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Features ordered by code", body = ListResponse<FeatureResponse>),
        (status = 403, description = "Superuser access required", body = ApiError)
    ),
    tag = "admin"
)]
pub async fn list_features(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<ListResponse<FeatureResponse>>, ApiError> {
    principal.require_superuser()?;
    let features = FeatureRepository::new(&state.db).list().await?;
    Ok(Json(ListResponse::new(
        features.into_iter().map(FeatureResponse::from).collect(),
    )))
}

/// Add a feature to the catalog
#[utoipa::path(
    post,
    path = "/api/v1/admin/features",
    security(("bearer_auth" = [])),
    request_body = CreateFeatureDto,
    responses(
        (status = 201, description = "Feature created", body = FeatureResponse),
        (status = 400, description = "Code is not an installed application", body = ApiError),
        (status = 403, description = "Superuser access required", body = ApiError),
        (status = 409, description = "Duplicate code", body = ApiError)
    ),
    tag = "admin"
)]
pub async fn create_feature(
    State(state): State<AppState>,
    principal: Principal,
    payload: Result<Json<CreateFeatureDto>, JsonRejection>,
) -> Result<(StatusCode, Json<FeatureResponse>), ApiError> {
    principal.require_superuser()?;
    let Json(request) = payload?;

    let feature = FeatureRepository::new(&state.db)
        .create(
            CreateFeatureRequest {
                code: request.code,
                name: request.name,
                is_active: request.is_active,
            },
            &state.config.installed_apps,
        )
        .await?;

    tracing::info!(feature = %feature.code, "Catalog feature created");
    Ok((StatusCode::CREATED, Json(feature.into())))
}

/// Rename or (de)activate a catalog feature
#[utoipa::path(
    patch,
    path = "/api/v1/admin/features/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Feature UUID")),
    request_body = UpdateFeatureDto,
    responses(
        (status = 200, description = "Feature updated", body = FeatureResponse),
        (status = 403, description = "Superuser access required", body = ApiError),
        (status = 404, description = "Feature not found", body = ApiError)
    ),
    tag = "admin"
)]
pub async fn update_feature(
    State(state): State<AppState>,
    principal: Principal,
    Path(feature_id): Path<Uuid>,
    payload: Result<Json<UpdateFeatureDto>, JsonRejection>,
) -> Result<Json<FeatureResponse>, ApiError> {
    principal.require_superuser()?;
    let Json(request) = payload?;

    let feature = FeatureRepository::new(&state.db)
        .update(
            feature_id,
            UpdateFeatureRequest {
                name: request.name,
                is_active: request.is_active,
            },
        )
        .await?;
    Ok(Json(feature.into()))
}

/// List every company
#[utoipa::path(
    get,
    path = "/api/v1/admin/companies",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Companies ordered by name", body = ListResponse<CompanyResponse>),
        (status = 403, description = "Superuser access required", body = ApiError)
    ),
    tag = "admin"
)]
pub async fn list_companies(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<ListResponse<CompanyResponse>>, ApiError> {
    principal.require_superuser()?;
    let companies = CompanyRepository::new(&state.db).list().await?;
    Ok(Json(ListResponse::new(
        companies.into_iter().map(CompanyResponse::from).collect(),
    )))
}

/// Create a company with its default feature grants
#[utoipa::path(
    post,
    path = "/api/v1/admin/companies",
    security(("bearer_auth" = [])),
    request_body = CreateCompanyDto,
    responses(
        (status = 201, description = "Company created", body = CompanyResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 403, description = "Superuser access required", body = ApiError)
    ),
    tag = "admin"
)]
pub async fn create_company(
    State(state): State<AppState>,
    principal: Principal,
    payload: Result<Json<CreateCompanyDto>, JsonRejection>,
) -> Result<(StatusCode, Json<CompanyResponse>), ApiError> {
    principal.require_superuser()?;
    let Json(request) = payload?;

    let company = tenancy::create_company(
        &state.db,
        CreateCompanyRequest {
            name: request.name,
            tax_id: request.tax_id,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(company.into())))
}

/// Update any company, including its active flag
#[utoipa::path(
    patch,
    path = "/api/v1/admin/companies/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Company UUID")),
    request_body = AdminUpdateCompanyDto,
    responses(
        (status = 200, description = "Company updated", body = CompanyResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 403, description = "Superuser access required", body = ApiError),
        (status = 404, description = "Company not found", body = ApiError)
    ),
    tag = "admin"
)]
pub async fn update_company(
    State(state): State<AppState>,
    principal: Principal,
    Path(company_id): Path<Uuid>,
    payload: Result<Json<AdminUpdateCompanyDto>, JsonRejection>,
) -> Result<Json<CompanyResponse>, ApiError> {
    principal.require_superuser()?;
    let Json(request) = payload?;

    let company = CompanyRepository::new(&state.db)
        .update(
            company_id,
            UpdateCompanyRequest {
                name: request.name,
                tax_id: request.tax_id,
                is_active: request.is_active,
            },
        )
        .await?;
    Ok(Json(company.into()))
}

/// Delete a company without employees
#[utoipa::path(
    delete,
    path = "/api/v1/admin/companies/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Company UUID")),
    responses(
        (status = 204, description = "Company deleted"),
        (status = 403, description = "Superuser access required", body = ApiError),
        (status = 404, description = "Company not found", body = ApiError),
        (status = 409, description = "Employees still reference the company", body = ApiError)
    ),
    tag = "admin"
)]
pub async fn delete_company(
    State(state): State<AppState>,
    principal: Principal,
    Path(company_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    principal.require_superuser()?;
    tenancy::delete_company(&state.db, company_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List the feature grants of a company
#[utoipa::path(
    get,
    path = "/api/v1/admin/companies/{id}/grants",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Company UUID")),
    responses(
        (status = 200, description = "Grants ordered by feature code", body = ListResponse<GrantResponse>),
        (status = 403, description = "Superuser access required", body = ApiError),
        (status = 404, description = "Company not found", body = ApiError)
    ),
    tag = "admin"
)]
pub async fn list_grants(
    State(state): State<AppState>,
    principal: Principal,
    Path(company_id): Path<Uuid>,
) -> Result<Json<ListResponse<GrantResponse>>, ApiError> {
    principal.require_superuser()?;
    CompanyRepository::new(&state.db)
        .find_by_id(company_id)
        .await?
        .ok_or_else(|| not_found("Company not found"))?;

    let grants = FeatureGrantRepository::new(&state.db)
        .list_for_company(company_id)
        .await?;
    Ok(Json(ListResponse::new(
        grants
            .into_iter()
            .map(|(grant, feature)| GrantResponse {
                feature_code: Some(feature.code),
                ..grant.into()
            })
            .collect(),
    )))
}

/// Grant a feature to a company, or change the grant's enabled flag
#[utoipa::path(
    put,
    path = "/api/v1/admin/companies/{id}/grants/{feature_id}",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Company UUID"),
        ("feature_id" = Uuid, Path, description = "Feature UUID")
    ),
    request_body = GrantDto,
    responses(
        (status = 200, description = "Grant stored", body = GrantResponse),
        (status = 403, description = "Superuser access required", body = ApiError),
        (status = 404, description = "Company or feature not found", body = ApiError)
    ),
    tag = "admin"
)]
pub async fn grant_feature(
    State(state): State<AppState>,
    principal: Principal,
    Path((company_id, feature_id)): Path<(Uuid, Uuid)>,
    payload: Result<Json<GrantDto>, JsonRejection>,
) -> Result<Json<GrantResponse>, ApiError> {
    principal.require_superuser()?;
    let Json(request) = payload?;

    let grant = FeatureGrantRepository::new(&state.db)
        .grant(company_id, feature_id, request.enabled, Some(principal.user.id))
        .await?;

    tracing::info!(
        company_id = %company_id,
        feature_id = %feature_id,
        enabled = grant.enabled,
        granted_by = %principal.user.id,
        "Feature grant stored"
    );
    Ok(Json(grant.into()))
}

/// Remove a company's grant for a feature
#[utoipa::path(
    delete,
    path = "/api/v1/admin/companies/{id}/grants/{feature_id}",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Company UUID"),
        ("feature_id" = Uuid, Path, description = "Feature UUID")
    ),
    responses(
        (status = 204, description = "Grant removed"),
        (status = 403, description = "Superuser access required", body = ApiError),
        (status = 404, description = "Grant not found", body = ApiError)
    ),
    tag = "admin"
)]
pub async fn revoke_feature(
    State(state): State<AppState>,
    principal: Principal,
    Path((company_id, feature_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    principal.require_superuser()?;

    FeatureGrantRepository::new(&state.db)
        .revoke(company_id, feature_id)
        .await?;

    tracing::info!(company_id = %company_id, feature_id = %feature_id, "Feature grant revoked");
    Ok(StatusCode::NO_CONTENT)
}
