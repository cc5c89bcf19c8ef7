//! Company entity model
//!
//! Companies are the tenants of the system. Every tenant-scoped record
//! (employees, feature grants, warehouse data) references a company.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

/// Company entity representing a tenant
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "companies")]
pub struct Model {
    /// Unique identifier for the company (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Display name, trimmed
    pub name: String,

    /// Fourteen-digit tax id, stored without punctuation
    #[sea_orm(unique)]
    pub tax_id: Option<String>,

    /// Inactive companies do not resolve for their employees
    pub is_active: bool,

    /// Timestamp when the company was created
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
