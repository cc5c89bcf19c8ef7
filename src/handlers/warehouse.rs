//! # Warehouse Dashboard Handler

use axum::{
    extract::State,
    response::{IntoResponse, Json, Redirect, Response},
};

use crate::access::Permission;
use crate::auth::TenantScope;
use crate::error::ApiError;
use crate::repositories::ItemRepository;
use crate::repositories::item::WarehouseDashboard;
use crate::server::AppState;

pub const ITEMS_PATH: &str = "/api/v1/warehouse/items";

/// Financial dashboard of the caller's warehouse
///
/// Callers without `warehouse.view_financial_dashboard` are redirected to the
/// item list.
#[utoipa::path(
    get,
    path = "/api/v1/warehouse",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Warehouse totals", body = WarehouseDashboard),
        (status = 303, description = "Redirect to the item list"),
        (status = 403, description = "Warehouse feature disabled", body = ApiError)
    ),
    tag = "warehouse"
)]
pub async fn dashboard(
    State(state): State<AppState>,
    scope: TenantScope,
) -> Result<Response, ApiError> {
    if !scope.principal.has(Permission::ViewFinancialDashboard) {
        return Ok(Redirect::to(ITEMS_PATH).into_response());
    }

    let dashboard = ItemRepository::new(&state.db)
        .dashboard(scope.company_id())
        .await?;
    Ok(Json(dashboard).into_response())
}
