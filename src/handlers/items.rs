//! # Item API Handlers
//!
//! Tenant-scoped item CRUD. The list is cursor paginated in creation order
//! and carries the caller's add/change/delete capabilities.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::TransactionTrait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::access::{Action, Permission, Resource};
use crate::auth::TenantScope;
use crate::cursor::{decode_cursor, encode_cursor, page_size};
use crate::error::{ApiError, not_found};
use crate::handlers::item_types::NamedResponse;
use crate::handlers::types::PageQuery;
use crate::models::item;
use crate::repositories::item::ItemInput;
use crate::repositories::{ItemRepository, ItemTypeRepository, ManufacturerRepository};
use crate::server::AppState;

fn item_permission(action: Action) -> Permission {
    Permission::model(Resource::Item, action)
}

/// Item as returned by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ItemResponse {
    #[schema(value_type = String)]
    pub id: Uuid,
    pub name: String,
    pub item_type: NamedResponse,
    pub manufacturer: NamedResponse,
    pub model: String,
    pub quantity: i32,
    /// Per-unit market value with two decimal places
    #[schema(value_type = String, example = "1250.00")]
    pub market_value: Decimal,
    /// Quantity times market value
    #[schema(value_type = String, example = "5000.00")]
    pub stock_value: Decimal,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Names of the company's item types and manufacturers
struct CatalogNames {
    types: HashMap<Uuid, String>,
    manufacturers: HashMap<Uuid, String>,
}

impl CatalogNames {
    async fn load(state: &AppState, company_id: Uuid) -> Result<Self, ApiError> {
        let types = ItemTypeRepository::new(&state.db)
            .list(company_id)
            .await?
            .into_iter()
            .map(|t| (t.id, t.name))
            .collect();
        let manufacturers = ManufacturerRepository::new(&state.db)
            .list(company_id)
            .await?
            .into_iter()
            .map(|m| (m.id, m.name))
            .collect();
        Ok(Self {
            types,
            manufacturers,
        })
    }

    fn response(&self, model: item::Model) -> ItemResponse {
        ItemResponse {
            id: model.id,
            item_type: NamedResponse {
                id: model.item_type_id,
                name: self.types.get(&model.item_type_id).cloned().unwrap_or_default(),
            },
            manufacturer: NamedResponse {
                id: model.manufacturer_id,
                name: self
                    .manufacturers
                    .get(&model.manufacturer_id)
                    .cloned()
                    .unwrap_or_default(),
            },
            market_value: model.market_value(),
            stock_value: model.stock_value(),
            name: model.name,
            model: model.model,
            quantity: model.quantity,
            description: model.description,
            created_at: model.created_at.to_rfc3339(),
            updated_at: model.updated_at.to_rfc3339(),
        }
    }
}

/// One page of items with the caller's capabilities
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ItemListResponse {
    pub data: Vec<ItemResponse>,
    /// Opaque cursor for the next page (null on the last page)
    pub next_cursor: Option<String>,
    pub has_more: bool,
    pub can_add: bool,
    pub can_change: bool,
    pub can_delete: bool,
}

/// Item form
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ItemDto {
    #[schema(example = "CLP S7-1200")]
    pub name: String,
    #[schema(value_type = String)]
    pub item_type_id: Uuid,
    #[schema(value_type = String)]
    pub manufacturer_id: Uuid,
    #[schema(example = "6ES7214-1AG40-0XB0")]
    pub model: String,
    pub quantity: i32,
    /// Non-negative, at most two decimal places and ten digits
    #[schema(value_type = String, example = "1250.00")]
    pub market_value: Decimal,
    pub description: Option<String>,
}

impl From<ItemDto> for ItemInput {
    fn from(dto: ItemDto) -> Self {
        Self {
            name: dto.name,
            item_type_id: dto.item_type_id,
            manufacturer_id: dto.manufacturer_id,
            model: dto.model,
            quantity: dto.quantity,
            market_value: dto.market_value,
            description: dto.description,
        }
    }
}

/// List items of the caller's company
#[utoipa::path(
    get,
    path = "/api/v1/warehouse/items",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "Items in creation order", body = ItemListResponse),
        (status = 400, description = "Invalid cursor", body = ApiError),
        (status = 403, description = "Missing warehouse.view_item or feature disabled", body = ApiError)
    ),
    tag = "warehouse"
)]
pub async fn list_items(
    State(state): State<AppState>,
    scope: TenantScope,
    Query(query): Query<PageQuery>,
) -> Result<Json<ItemListResponse>, ApiError> {
    scope.require(item_permission(Action::View))?;

    let after = query.cursor.as_deref().map(decode_cursor).transpose()?;
    let limit = page_size(query.limit);
    let page = ItemRepository::new(&state.db)
        .list_page(scope.company_id(), after, limit)
        .await?;

    let next_cursor = if page.has_more {
        page.items
            .last()
            .map(|last| encode_cursor(&last.created_at.with_timezone(&Utc), &last.id))
    } else {
        None
    };

    let names = CatalogNames::load(&state, scope.company_id()).await?;
    let principal = &scope.principal;
    Ok(Json(ItemListResponse {
        data: page.items.into_iter().map(|i| names.response(i)).collect(),
        has_more: next_cursor.is_some(),
        next_cursor,
        can_add: principal.has(item_permission(Action::Add)),
        can_change: principal.has(item_permission(Action::Change)),
        can_delete: principal.has(item_permission(Action::Delete)),
    }))
}

/// Get one item
#[utoipa::path(
    get,
    path = "/api/v1/warehouse/items/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Item UUID")),
    responses(
        (status = 200, description = "Item", body = ItemResponse),
        (status = 403, description = "Missing warehouse.view_item", body = ApiError),
        (status = 404, description = "Item not found", body = ApiError)
    ),
    tag = "warehouse"
)]
pub async fn get_item(
    State(state): State<AppState>,
    scope: TenantScope,
    Path(id): Path<Uuid>,
) -> Result<Json<ItemResponse>, ApiError> {
    scope.require(item_permission(Action::View))?;

    let item = ItemRepository::new(&state.db)
        .find(scope.company_id(), id)
        .await?
        .ok_or_else(|| not_found("Item not found"))?;
    let names = CatalogNames::load(&state, scope.company_id()).await?;
    Ok(Json(names.response(item)))
}

/// Create an item in the caller's company
#[utoipa::path(
    post,
    path = "/api/v1/warehouse/items",
    security(("bearer_auth" = [])),
    request_body = ItemDto,
    responses(
        (status = 201, description = "Item created", body = ItemResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 403, description = "Missing warehouse.add_item", body = ApiError)
    ),
    tag = "warehouse"
)]
pub async fn create_item(
    State(state): State<AppState>,
    scope: TenantScope,
    payload: Result<Json<ItemDto>, JsonRejection>,
) -> Result<(StatusCode, Json<ItemResponse>), ApiError> {
    scope.require(item_permission(Action::Add))?;
    let Json(request) = payload?;

    let item = ItemRepository::new(&state.db)
        .create(scope.company_id(), request.into())
        .await?;

    tracing::info!(company_id = %scope.company_id(), item_id = %item.id, "Item created");
    let names = CatalogNames::load(&state, scope.company_id()).await?;
    Ok((StatusCode::CREATED, Json(names.response(item))))
}

/// Replace an item's fields
#[utoipa::path(
    put,
    path = "/api/v1/warehouse/items/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Item UUID")),
    request_body = ItemDto,
    responses(
        (status = 200, description = "Item updated", body = ItemResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 403, description = "Missing warehouse.change_item", body = ApiError),
        (status = 404, description = "Item not found", body = ApiError)
    ),
    tag = "warehouse"
)]
pub async fn update_item(
    State(state): State<AppState>,
    scope: TenantScope,
    Path(id): Path<Uuid>,
    payload: Result<Json<ItemDto>, JsonRejection>,
) -> Result<Json<ItemResponse>, ApiError> {
    scope.require(item_permission(Action::Change))?;
    let Json(request) = payload?;

    let item = ItemRepository::new(&state.db)
        .update(scope.company_id(), id, request.into())
        .await?;
    let names = CatalogNames::load(&state, scope.company_id()).await?;
    Ok(Json(names.response(item)))
}

/// Delete an item and its units
#[utoipa::path(
    delete,
    path = "/api/v1/warehouse/items/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Item UUID")),
    responses(
        (status = 204, description = "Item deleted"),
        (status = 403, description = "Missing warehouse.delete_item", body = ApiError),
        (status = 404, description = "Item not found", body = ApiError)
    ),
    tag = "warehouse"
)]
pub async fn delete_item(
    State(state): State<AppState>,
    scope: TenantScope,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    scope.require(item_permission(Action::Delete))?;

    let txn = state.db.begin().await?;
    ItemRepository::new(&txn).delete(scope.company_id(), id).await?;
    txn.commit().await?;

    tracing::info!(company_id = %scope.company_id(), item_id = %id, "Item deleted");
    Ok(StatusCode::NO_CONTENT)
}
