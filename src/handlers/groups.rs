//! # Group API Handlers

use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::access::{Action, Permission, Resource};
use crate::auth::Principal;
use crate::error::ApiError;
use crate::handlers::types::ListResponse;
use crate::models::group;
use crate::repositories::GroupRepository;
use crate::server::AppState;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GroupResponse {
    #[schema(value_type = String)]
    pub id: Uuid,
    #[schema(example = "warehouse_editor")]
    pub name: String,
}

impl From<group::Model> for GroupResponse {
    fn from(model: group::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
        }
    }
}

/// List role groups
#[utoipa::path(
    get,
    path = "/api/v1/groups",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Groups ordered by name", body = ListResponse<GroupResponse>),
        (status = 403, description = "Missing auth.view_group", body = ApiError)
    ),
    tag = "employees"
)]
pub async fn list_groups(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<ListResponse<GroupResponse>>, ApiError> {
    principal.require(Permission::model(Resource::Group, Action::View))?;

    let groups = GroupRepository::new(&state.db).list().await?;
    Ok(Json(ListResponse::new(
        groups.into_iter().map(GroupResponse::from).collect(),
    )))
}
