//! # Item Type API Handlers

use axum::{
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use sea_orm::TransactionTrait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::access::{Action, Permission, Resource};
use crate::auth::TenantScope;
use crate::error::ApiError;
use crate::handlers::types::ListResponse;
use crate::models::{item_type, manufacturer};
use crate::repositories::ItemTypeRepository;
use crate::server::AppState;

/// Named catalog entry (item type or manufacturer)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NamedResponse {
    #[schema(value_type = String)]
    pub id: Uuid,
    pub name: String,
}

impl From<item_type::Model> for NamedResponse {
    fn from(model: item_type::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
        }
    }
}

impl From<manufacturer::Model> for NamedResponse {
    fn from(model: manufacturer::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NameDto {
    #[schema(example = "PLC")]
    pub name: String,
}

/// List item types of the caller's company
#[utoipa::path(
    get,
    path = "/api/v1/warehouse/item-types",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Item types ordered by name", body = ListResponse<NamedResponse>),
        (status = 403, description = "Missing warehouse.view_itemtype", body = ApiError)
    ),
    tag = "warehouse"
)]
pub async fn list_item_types(
    State(state): State<AppState>,
    scope: TenantScope,
) -> Result<Json<ListResponse<NamedResponse>>, ApiError> {
    scope.require(Permission::model(Resource::ItemType, Action::View))?;
    let types = ItemTypeRepository::new(&state.db)
        .list(scope.company_id())
        .await?;
    Ok(Json(ListResponse::new(
        types.into_iter().map(NamedResponse::from).collect(),
    )))
}

/// Create an item type
#[utoipa::path(
    post,
    path = "/api/v1/warehouse/item-types",
    security(("bearer_auth" = [])),
    request_body = NameDto,
    responses(
        (status = 201, description = "Item type created", body = NamedResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 403, description = "Missing warehouse.add_itemtype", body = ApiError),
        (status = 409, description = "Duplicate name", body = ApiError)
    ),
    tag = "warehouse"
)]
pub async fn create_item_type(
    State(state): State<AppState>,
    scope: TenantScope,
    payload: Result<Json<NameDto>, JsonRejection>,
) -> Result<(StatusCode, Json<NamedResponse>), ApiError> {
    scope.require(Permission::model(Resource::ItemType, Action::Add))?;
    let Json(request) = payload?;

    let item_type = ItemTypeRepository::new(&state.db)
        .create(scope.company_id(), &request.name)
        .await?;
    Ok((StatusCode::CREATED, Json(item_type.into())))
}

/// Rename an item type
#[utoipa::path(
    patch,
    path = "/api/v1/warehouse/item-types/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Item type UUID")),
    request_body = NameDto,
    responses(
        (status = 200, description = "Item type renamed", body = NamedResponse),
        (status = 403, description = "Missing warehouse.change_itemtype", body = ApiError),
        (status = 404, description = "Item type not found", body = ApiError),
        (status = 409, description = "Duplicate name", body = ApiError)
    ),
    tag = "warehouse"
)]
pub async fn rename_item_type(
    State(state): State<AppState>,
    scope: TenantScope,
    Path(id): Path<Uuid>,
    payload: Result<Json<NameDto>, JsonRejection>,
) -> Result<Json<NamedResponse>, ApiError> {
    scope.require(Permission::model(Resource::ItemType, Action::Change))?;
    let Json(request) = payload?;

    let item_type = ItemTypeRepository::new(&state.db)
        .rename(scope.company_id(), id, &request.name)
        .await?;
    Ok(Json(item_type.into()))
}

/// Delete an item type with its items
#[utoipa::path(
    delete,
    path = "/api/v1/warehouse/item-types/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Item type UUID")),
    responses(
        (status = 204, description = "Item type deleted"),
        (status = 403, description = "Missing warehouse.delete_itemtype", body = ApiError),
        (status = 404, description = "Item type not found", body = ApiError)
    ),
    tag = "warehouse"
)]
pub async fn delete_item_type(
    State(state): State<AppState>,
    scope: TenantScope,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    scope.require(Permission::model(Resource::ItemType, Action::Delete))?;

    let txn = state.db.begin().await?;
    ItemTypeRepository::new(&txn)
        .delete(scope.company_id(), id)
        .await?;
    txn.commit().await?;

    tracing::info!(company_id = %scope.company_id(), item_type_id = %id, "Item type deleted");
    Ok(StatusCode::NO_CONTENT)
}
