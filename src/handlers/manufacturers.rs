//! # Manufacturer API Handlers

use axum::{
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use sea_orm::TransactionTrait;
use uuid::Uuid;

use crate::access::{Action, Permission, Resource};
use crate::auth::TenantScope;
use crate::error::ApiError;
use crate::handlers::item_types::{NameDto, NamedResponse};
use crate::handlers::types::ListResponse;
use crate::repositories::ManufacturerRepository;
use crate::server::AppState;

/// List manufacturers of the caller's company
#[utoipa::path(
    get,
    path = "/api/v1/warehouse/manufacturers",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Manufacturers ordered by name", body = ListResponse<NamedResponse>),
        (status = 403, description = "Missing warehouse.view_manufacturer", body = ApiError)
    ),
    tag = "warehouse"
)]
pub async fn list_manufacturers(
    State(state): State<AppState>,
    scope: TenantScope,
) -> Result<Json<ListResponse<NamedResponse>>, ApiError> {
    scope.require(Permission::model(Resource::Manufacturer, Action::View))?;
    let manufacturers = ManufacturerRepository::new(&state.db)
        .list(scope.company_id())
        .await?;
    Ok(Json(ListResponse::new(
        manufacturers.into_iter().map(NamedResponse::from).collect(),
    )))
}

/// Create a manufacturer
#[utoipa::path(
    post,
    path = "/api/v1/warehouse/manufacturers",
    security(("bearer_auth" = [])),
    request_body = NameDto,
    responses(
        (status = 201, description = "Manufacturer created", body = NamedResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 403, description = "Missing warehouse.add_manufacturer", body = ApiError),
        (status = 409, description = "Duplicate name", body = ApiError)
    ),
    tag = "warehouse"
)]
pub async fn create_manufacturer(
    State(state): State<AppState>,
    scope: TenantScope,
    payload: Result<Json<NameDto>, JsonRejection>,
) -> Result<(StatusCode, Json<NamedResponse>), ApiError> {
    scope.require(Permission::model(Resource::Manufacturer, Action::Add))?;
    let Json(request) = payload?;

    let manufacturer = ManufacturerRepository::new(&state.db)
        .create(scope.company_id(), &request.name)
        .await?;
    Ok((StatusCode::CREATED, Json(manufacturer.into())))
}

/// Rename a manufacturer
#[utoipa::path(
    patch,
    path = "/api/v1/warehouse/manufacturers/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Manufacturer UUID")),
    request_body = NameDto,
    responses(
        (status = 200, description = "Manufacturer renamed", body = NamedResponse),
        (status = 403, description = "Missing warehouse.change_manufacturer", body = ApiError),
        (status = 404, description = "Manufacturer not found", body = ApiError),
        (status = 409, description = "Duplicate name", body = ApiError)
    ),
    tag = "warehouse"
)]
pub async fn rename_manufacturer(
    State(state): State<AppState>,
    scope: TenantScope,
    Path(id): Path<Uuid>,
    payload: Result<Json<NameDto>, JsonRejection>,
) -> Result<Json<NamedResponse>, ApiError> {
    scope.require(Permission::model(Resource::Manufacturer, Action::Change))?;
    let Json(request) = payload?;

    let manufacturer = ManufacturerRepository::new(&state.db)
        .rename(scope.company_id(), id, &request.name)
        .await?;
    Ok(Json(manufacturer.into()))
}

/// Delete a manufacturer with its items
#[utoipa::path(
    delete,
    path = "/api/v1/warehouse/manufacturers/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Manufacturer UUID")),
    responses(
        (status = 204, description = "Manufacturer deleted"),
        (status = 403, description = "Missing warehouse.delete_manufacturer", body = ApiError),
        (status = 404, description = "Manufacturer not found", body = ApiError)
    ),
    tag = "warehouse"
)]
pub async fn delete_manufacturer(
    State(state): State<AppState>,
    scope: TenantScope,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    scope.require(Permission::model(Resource::Manufacturer, Action::Delete))?;

    let txn = state.db.begin().await?;
    ManufacturerRepository::new(&txn)
        .delete(scope.company_id(), id)
        .await?;
    txn.commit().await?;

    tracing::info!(company_id = %scope.company_id(), manufacturer_id = %id, "Manufacturer deleted");
    Ok(StatusCode::NO_CONTENT)
}
