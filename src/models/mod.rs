//! # Data Models
//!
//! This module contains all the SeaORM entities used throughout the
//! Stockroom API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod company;
pub mod company_feature;
pub mod employee;
pub mod feature;
pub mod group;
pub mod group_permission;
pub mod item;
pub mod item_type;
pub mod item_unit;
pub mod manufacturer;
pub mod user;
pub mod user_group;
pub mod user_permission;

pub use company::Entity as Company;
pub use company_feature::Entity as CompanyFeature;
pub use employee::Entity as Employee;
pub use feature::Entity as Feature;
pub use group::Entity as Group;
pub use group_permission::Entity as GroupPermission;
pub use item::Entity as Item;
pub use item_type::Entity as ItemType;
pub use item_unit::Entity as ItemUnit;
pub use manufacturer::Entity as Manufacturer;
pub use user::Entity as User;
pub use user_group::Entity as UserGroup;
pub use user_permission::Entity as UserPermission;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "stockroom".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
