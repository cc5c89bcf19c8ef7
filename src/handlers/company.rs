//! # Company API Handlers
//!
//! The caller's own company: configuration and feature toggles.

use axum::{
    extract::{State, rejection::JsonRejection},
    response::Json,
};
use sea_orm::TransactionTrait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::access::{Action, Permission, Resource};
use crate::auth::TenantScope;
use crate::error::ApiError;
use crate::features::FeatureOverviewEntry;
use crate::handlers::types::CompanyResponse;
use crate::repositories::company::UpdateCompanyRequest;
use crate::repositories::{CompanyRepository, FeatureGrantRepository};
use crate::server::AppState;

/// Company configuration changes; omitted fields are left unchanged
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateCompanyDto {
    #[schema(example = "Acme Ltda")]
    pub name: Option<String>,
    /// Empty string clears the tax id
    #[schema(example = "12.345.678/0001-99")]
    pub tax_id: Option<String>,
}

/// Grant selection for the feature toggles
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GrantSelectionDto {
    #[schema(value_type = Vec<String>)]
    pub grant_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FeatureOverviewResponse {
    pub data: Vec<FeatureOverviewEntry>,
}

async fn overview(state: &AppState, company_id: Uuid) -> Result<Json<FeatureOverviewResponse>, ApiError> {
    let data = FeatureGrantRepository::new(&state.db)
        .feature_overview(company_id)
        .await?;
    Ok(Json(FeatureOverviewResponse { data }))
}

/// Get the caller's company
#[utoipa::path(
    get,
    path = "/api/v1/company",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Caller's company", body = CompanyResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 403, description = "User is not associated with a company", body = ApiError)
    ),
    tag = "company"
)]
pub async fn get_company(scope: TenantScope) -> Json<CompanyResponse> {
    Json(scope.company.into())
}

/// Update the caller's company
#[utoipa::path(
    patch,
    path = "/api/v1/company",
    security(("bearer_auth" = [])),
    request_body = UpdateCompanyDto,
    responses(
        (status = 200, description = "Company updated", body = CompanyResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 403, description = "Missing companies.change_company", body = ApiError)
    ),
    tag = "company"
)]
pub async fn update_company(
    State(state): State<AppState>,
    scope: TenantScope,
    payload: Result<Json<UpdateCompanyDto>, JsonRejection>,
) -> Result<Json<CompanyResponse>, ApiError> {
    scope.require(Permission::model(Resource::Company, Action::Change))?;
    let Json(request) = payload?;

    let company = CompanyRepository::new(&state.db)
        .update(
            scope.company_id(),
            UpdateCompanyRequest {
                name: request.name,
                tax_id: request.tax_id,
                is_active: None,
            },
        )
        .await?;

    tracing::info!(
        company_id = %company.id,
        user_id = %scope.principal.user.id,
        "Company configuration updated"
    );
    Ok(Json(company.into()))
}

/// Status of every active catalog feature for the caller's company
#[utoipa::path(
    get,
    path = "/api/v1/company/features",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Feature overview", body = FeatureOverviewResponse),
        (status = 403, description = "User is not associated with a company", body = ApiError)
    ),
    tag = "company"
)]
pub async fn feature_overview(
    State(state): State<AppState>,
    scope: TenantScope,
) -> Result<Json<FeatureOverviewResponse>, ApiError> {
    overview(&state, scope.company_id()).await
}

/// Enable granted features of the caller's company
///
/// Never disables a grant.
#[utoipa::path(
    post,
    path = "/api/v1/company/features/enable",
    security(("bearer_auth" = [])),
    request_body = GrantSelectionDto,
    responses(
        (status = 200, description = "Updated feature overview", body = FeatureOverviewResponse),
        (status = 403, description = "Missing companies.manage_company_features", body = ApiError),
        (status = 404, description = "A grant does not belong to the company", body = ApiError)
    ),
    tag = "company"
)]
pub async fn enable_features(
    State(state): State<AppState>,
    scope: TenantScope,
    payload: Result<Json<GrantSelectionDto>, JsonRejection>,
) -> Result<Json<FeatureOverviewResponse>, ApiError> {
    scope.require(Permission::ManageCompanyFeatures)?;
    let Json(request) = payload?;

    let txn = state.db.begin().await?;
    FeatureGrantRepository::new(&txn)
        .enable_grants(scope.company_id(), &request.grant_ids, scope.principal.user.id)
        .await?;
    txn.commit().await?;

    tracing::info!(
        company_id = %scope.company_id(),
        user_id = %scope.principal.user.id,
        grants = request.grant_ids.len(),
        "Company features enabled"
    );
    overview(&state, scope.company_id()).await
}

/// Set exactly which grants of the caller's company are enabled
#[utoipa::path(
    put,
    path = "/api/v1/company/features",
    security(("bearer_auth" = [])),
    request_body = GrantSelectionDto,
    responses(
        (status = 200, description = "Updated feature overview", body = FeatureOverviewResponse),
        (status = 403, description = "Superuser access required", body = ApiError),
        (status = 404, description = "A grant does not belong to the company", body = ApiError)
    ),
    tag = "company"
)]
pub async fn set_features(
    State(state): State<AppState>,
    scope: TenantScope,
    payload: Result<Json<GrantSelectionDto>, JsonRejection>,
) -> Result<Json<FeatureOverviewResponse>, ApiError> {
    scope.principal.require_superuser()?;
    let Json(request) = payload?;

    let txn = state.db.begin().await?;
    FeatureGrantRepository::new(&txn)
        .set_enabled_grants(scope.company_id(), &request.grant_ids, scope.principal.user.id)
        .await?;
    txn.commit().await?;

    tracing::info!(
        company_id = %scope.company_id(),
        user_id = %scope.principal.user.id,
        "Company feature toggles replaced"
    );
    overview(&state, scope.company_id()).await
}
