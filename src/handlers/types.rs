//! # Common API Types
//!
//! Response shapes shared by several handlers.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::features::SidebarFeature;
use crate::models::{company, user};

/// Plain list wrapper
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
}

impl<T> ListResponse<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self { data }
    }
}

/// Query parameters for cursor-paginated listings
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct PageQuery {
    /// Maximum number of rows to return (default: 50, max: 200)
    pub limit: Option<u64>,
    /// Opaque cursor from a previous page
    pub cursor: Option<String>,
}

/// Company as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CompanyResponse {
    #[schema(value_type = String)]
    pub id: Uuid,
    #[schema(example = "Acme Ltda")]
    pub name: String,
    /// Fourteen digits without punctuation
    #[schema(example = "12345678000199")]
    pub tax_id: Option<String>,
    pub is_active: bool,
    #[schema(example = "2026-01-15T10:30:00+00:00")]
    pub created_at: String,
}

impl From<company::Model> for CompanyResponse {
    fn from(model: company::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            tax_id: model.tax_id,
            is_active: model.is_active,
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

/// User profile as returned by the API; never includes the password hash
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    #[schema(value_type = String)]
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub is_superuser: bool,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
            is_active: model.is_active,
            is_superuser: model.is_superuser,
        }
    }
}

/// Sidebar entries for the current user
#[derive(Debug, Serialize, ToSchema)]
pub struct SidebarResponse {
    pub data: Vec<SidebarFeature>,
}
