//! # Employee API Handlers
//!
//! Employee management within the caller's company. Employees of other
//! companies are answered as not found.

use axum::{
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use sea_orm::TransactionTrait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::access::{Action, Permission, Resource};
use crate::auth::TenantScope;
use crate::error::{ApiError, validation_error};
use crate::handlers::groups::GroupResponse;
use crate::handlers::types::ListResponse;
use crate::models::{employee, group, user};
use crate::repositories::user::{NewUser, UpdateUserRequest, hash_password};
use crate::repositories::{EmployeeRepository, GroupRepository, UserRepository};
use crate::server::AppState;

/// Employee with their user profile
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EmployeeResponse {
    #[schema(value_type = String)]
    pub id: Uuid,
    #[schema(value_type = String)]
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    /// Present on single-employee responses
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<GroupResponse>>,
}

impl EmployeeResponse {
    fn new(employee: employee::Model, user: user::Model) -> Self {
        Self {
            id: employee.id,
            user_id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            is_active: user.is_active,
            groups: None,
        }
    }

    fn with_groups(mut self, groups: Vec<group::Model>) -> Self {
        self.groups = Some(groups.into_iter().map(GroupResponse::from).collect());
        self
    }
}

/// New employee form
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateEmployeeDto {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub password2: String,
}

/// Profile changes; omitted fields are left unchanged
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateEmployeeDto {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
}

/// Replacement group set
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EmployeeGroupsDto {
    #[schema(value_type = Vec<String>)]
    pub group_ids: Vec<Uuid>,
}

async fn load_employee(
    state: &AppState,
    scope: &TenantScope,
    employee_id: Uuid,
) -> Result<(employee::Model, user::Model), ApiError> {
    EmployeeRepository::new(&state.db)
        .find_in_company(scope.company_id(), employee_id)
        .await?
        .ok_or_else(|| crate::error::not_found("Employee not found"))
}

/// List employees of the caller's company
#[utoipa::path(
    get,
    path = "/api/v1/company/employees",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Employees ordered by username", body = ListResponse<EmployeeResponse>),
        (status = 403, description = "User is not associated with a company", body = ApiError)
    ),
    tag = "employees"
)]
pub async fn list_employees(
    State(state): State<AppState>,
    scope: TenantScope,
) -> Result<Json<ListResponse<EmployeeResponse>>, ApiError> {
    let rows = EmployeeRepository::new(&state.db)
        .list_for_company(scope.company_id())
        .await?;

    Ok(Json(ListResponse::new(
        rows.into_iter()
            .map(|(employee, user)| EmployeeResponse::new(employee, user))
            .collect(),
    )))
}

/// Register a new employee in the caller's company
#[utoipa::path(
    post,
    path = "/api/v1/company/employees",
    security(("bearer_auth" = [])),
    request_body = CreateEmployeeDto,
    responses(
        (status = 201, description = "Employee created", body = EmployeeResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 403, description = "Missing companies.add_employee", body = ApiError)
    ),
    tag = "employees"
)]
pub async fn create_employee(
    State(state): State<AppState>,
    scope: TenantScope,
    payload: Result<Json<CreateEmployeeDto>, JsonRejection>,
) -> Result<(StatusCode, Json<EmployeeResponse>), ApiError> {
    scope.require(Permission::model(Resource::Employee, Action::Add))?;
    let Json(request) = payload?;

    if request.password != request.password2 {
        return Err(validation_error(
            "Passwords must be equal",
            json!({
                "password": ["Passwords must be equal"],
                "password2": ["Passwords must be equal"],
            }),
        ));
    }

    let password_hash = hash_password(&request.password).await?;

    let txn = state.db.begin().await?;
    let user = UserRepository::new(&txn)
        .create(NewUser {
            username: request.username,
            email: request.email,
            first_name: request.first_name,
            last_name: request.last_name,
            password_hash,
            is_superuser: false,
        })
        .await?;
    let employee = EmployeeRepository::new(&txn)
        .create(user.id, scope.company_id())
        .await?;
    txn.commit().await?;

    tracing::info!(
        company_id = %scope.company_id(),
        employee_id = %employee.id,
        created_by = %scope.principal.user.id,
        "Employee registered"
    );
    Ok((StatusCode::CREATED, Json(EmployeeResponse::new(employee, user))))
}

/// Get one employee of the caller's company with their groups
#[utoipa::path(
    get,
    path = "/api/v1/company/employees/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Employee UUID")),
    responses(
        (status = 200, description = "Employee", body = EmployeeResponse),
        (status = 404, description = "Employee not found", body = ApiError)
    ),
    tag = "employees"
)]
pub async fn get_employee(
    State(state): State<AppState>,
    scope: TenantScope,
    Path(employee_id): Path<Uuid>,
) -> Result<Json<EmployeeResponse>, ApiError> {
    let (employee, user) = load_employee(&state, &scope, employee_id).await?;
    let groups = GroupRepository::new(&state.db).groups_for_user(user.id).await?;
    Ok(Json(EmployeeResponse::new(employee, user).with_groups(groups)))
}

/// Update an employee's profile
#[utoipa::path(
    patch,
    path = "/api/v1/company/employees/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Employee UUID")),
    request_body = UpdateEmployeeDto,
    responses(
        (status = 200, description = "Employee updated", body = EmployeeResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 403, description = "Missing companies.change_employee", body = ApiError),
        (status = 404, description = "Employee not found", body = ApiError)
    ),
    tag = "employees"
)]
pub async fn update_employee(
    State(state): State<AppState>,
    scope: TenantScope,
    Path(employee_id): Path<Uuid>,
    payload: Result<Json<UpdateEmployeeDto>, JsonRejection>,
) -> Result<Json<EmployeeResponse>, ApiError> {
    scope.require(Permission::model(Resource::Employee, Action::Change))?;
    let Json(request) = payload?;
    let (employee, user) = load_employee(&state, &scope, employee_id).await?;

    let user = UserRepository::new(&state.db)
        .update_profile(
            user.id,
            UpdateUserRequest {
                username: request.username,
                email: request.email,
                first_name: request.first_name,
                last_name: request.last_name,
            },
        )
        .await?;

    Ok(Json(EmployeeResponse::new(employee, user)))
}

/// Delete an employee and their user account
#[utoipa::path(
    delete,
    path = "/api/v1/company/employees/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Employee UUID")),
    responses(
        (status = 204, description = "Employee deleted"),
        (status = 400, description = "Cannot delete own account", body = ApiError),
        (status = 403, description = "Missing companies.delete_employee", body = ApiError),
        (status = 404, description = "Employee not found", body = ApiError)
    ),
    tag = "employees"
)]
pub async fn delete_employee(
    State(state): State<AppState>,
    scope: TenantScope,
    Path(employee_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    scope.require(Permission::model(Resource::Employee, Action::Delete))?;

    let txn = state.db.begin().await?;
    EmployeeRepository::new(&txn)
        .delete_with_user(scope.company_id(), employee_id, scope.principal.user.id)
        .await?;
    txn.commit().await?;

    tracing::info!(
        company_id = %scope.company_id(),
        employee_id = %employee_id,
        deleted_by = %scope.principal.user.id,
        "Employee deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}

/// Replace an employee's role groups
#[utoipa::path(
    put,
    path = "/api/v1/company/employees/{id}/groups",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Employee UUID")),
    request_body = EmployeeGroupsDto,
    responses(
        (status = 200, description = "Employee with updated groups", body = EmployeeResponse),
        (status = 400, description = "Unknown group", body = ApiError),
        (status = 403, description = "Missing auth.change_user or auth.view_group", body = ApiError),
        (status = 404, description = "Employee not found", body = ApiError)
    ),
    tag = "employees"
)]
pub async fn set_employee_groups(
    State(state): State<AppState>,
    scope: TenantScope,
    Path(employee_id): Path<Uuid>,
    payload: Result<Json<EmployeeGroupsDto>, JsonRejection>,
) -> Result<Json<EmployeeResponse>, ApiError> {
    scope.principal.require_all(&[
        Permission::model(Resource::User, Action::Change),
        Permission::model(Resource::Group, Action::View),
    ])?;
    let Json(request) = payload?;
    let (employee, user) = load_employee(&state, &scope, employee_id).await?;

    let txn = state.db.begin().await?;
    let groups = GroupRepository::new(&txn)
        .set_user_groups(user.id, &request.group_ids)
        .await?;
    txn.commit().await?;

    tracing::info!(
        company_id = %scope.company_id(),
        employee_id = %employee.id,
        groups = groups.len(),
        "Employee groups replaced"
    );
    Ok(Json(EmployeeResponse::new(employee, user).with_groups(groups)))
}
