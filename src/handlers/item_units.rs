//! # Item Unit API Handlers

use axum::{
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::access::{Action, Permission, Resource};
use crate::auth::TenantScope;
use crate::error::ApiError;
use crate::handlers::types::ListResponse;
use crate::models::item_unit::{self, UnitState};
use crate::repositories::ItemUnitRepository;
use crate::repositories::item_unit::UpdateUnitRequest;
use crate::server::AppState;

fn unit_permission(action: Action) -> Permission {
    Permission::model(Resource::ItemUnit, action)
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ItemUnitResponse {
    #[schema(value_type = String)]
    pub id: Uuid,
    #[schema(value_type = String)]
    pub item_id: Uuid,
    pub state: UnitState,
    pub remark: Option<String>,
    pub created_at: String,
}

impl From<item_unit::Model> for ItemUnitResponse {
    fn from(model: item_unit::Model) -> Self {
        Self {
            id: model.id,
            item_id: model.item_id,
            // Column only ever holds values written from UnitState
            state: UnitState::parse(&model.state).unwrap_or(UnitState::New),
            remark: model.remark,
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateUnitDto {
    #[serde(default = "default_state")]
    pub state: UnitState,
    pub remark: Option<String>,
}

fn default_state() -> UnitState {
    UnitState::New
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateUnitDto {
    pub state: Option<UnitState>,
    /// Empty string clears the remark
    pub remark: Option<String>,
}

/// List the units of an item
#[utoipa::path(
    get,
    path = "/api/v1/warehouse/items/{id}/units",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Item UUID")),
    responses(
        (status = 200, description = "Units in creation order", body = ListResponse<ItemUnitResponse>),
        (status = 403, description = "Missing warehouse.view_itemunit", body = ApiError),
        (status = 404, description = "Item not found", body = ApiError)
    ),
    tag = "warehouse"
)]
pub async fn list_units(
    State(state): State<AppState>,
    scope: TenantScope,
    Path(item_id): Path<Uuid>,
) -> Result<Json<ListResponse<ItemUnitResponse>>, ApiError> {
    scope.require(unit_permission(Action::View))?;

    let units = ItemUnitRepository::new(&state.db)
        .list_for_item(scope.company_id(), item_id)
        .await?;
    Ok(Json(ListResponse::new(
        units.into_iter().map(ItemUnitResponse::from).collect(),
    )))
}

/// Add a unit to an item
#[utoipa::path(
    post,
    path = "/api/v1/warehouse/items/{id}/units",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Item UUID")),
    request_body = CreateUnitDto,
    responses(
        (status = 201, description = "Unit created", body = ItemUnitResponse),
        (status = 403, description = "Missing warehouse.add_itemunit", body = ApiError),
        (status = 404, description = "Item not found", body = ApiError)
    ),
    tag = "warehouse"
)]
pub async fn create_unit(
    State(state): State<AppState>,
    scope: TenantScope,
    Path(item_id): Path<Uuid>,
    payload: Result<Json<CreateUnitDto>, JsonRejection>,
) -> Result<(StatusCode, Json<ItemUnitResponse>), ApiError> {
    scope.require(unit_permission(Action::Add))?;
    let Json(request) = payload?;

    let unit = ItemUnitRepository::new(&state.db)
        .create(scope.company_id(), item_id, request.state, request.remark)
        .await?;
    Ok((StatusCode::CREATED, Json(unit.into())))
}

/// Change a unit's state or remark
#[utoipa::path(
    patch,
    path = "/api/v1/warehouse/items/{id}/units/{unit_id}",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Item UUID"),
        ("unit_id" = Uuid, Path, description = "Unit UUID")
    ),
    request_body = UpdateUnitDto,
    responses(
        (status = 200, description = "Unit updated", body = ItemUnitResponse),
        (status = 403, description = "Missing warehouse.change_itemunit", body = ApiError),
        (status = 404, description = "Item or unit not found", body = ApiError)
    ),
    tag = "warehouse"
)]
pub async fn update_unit(
    State(state): State<AppState>,
    scope: TenantScope,
    Path((item_id, unit_id)): Path<(Uuid, Uuid)>,
    payload: Result<Json<UpdateUnitDto>, JsonRejection>,
) -> Result<Json<ItemUnitResponse>, ApiError> {
    scope.require(unit_permission(Action::Change))?;
    let Json(request) = payload?;

    let unit = ItemUnitRepository::new(&state.db)
        .update(
            scope.company_id(),
            item_id,
            unit_id,
            UpdateUnitRequest {
                state: request.state,
                remark: request.remark,
            },
        )
        .await?;
    Ok(Json(unit.into()))
}

/// Delete a unit
#[utoipa::path(
    delete,
    path = "/api/v1/warehouse/items/{id}/units/{unit_id}",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Item UUID"),
        ("unit_id" = Uuid, Path, description = "Unit UUID")
    ),
    responses(
        (status = 204, description = "Unit deleted"),
        (status = 403, description = "Missing warehouse.delete_itemunit", body = ApiError),
        (status = 404, description = "Item or unit not found", body = ApiError)
    ),
    tag = "warehouse"
)]
pub async fn delete_unit(
    State(state): State<AppState>,
    scope: TenantScope,
    Path((item_id, unit_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    scope.require(unit_permission(Action::Delete))?;

    ItemUnitRepository::new(&state.db)
        .delete(scope.company_id(), item_id, unit_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
