//! User entity model
//!
//! Login identities. A user belongs to at most one company through an
//! employee record.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Login name, unique case-insensitively
    #[sea_orm(unique)]
    pub username: String,

    /// Email address, stored lowercase
    pub email: String,

    pub first_name: String,

    pub last_name: String,

    /// Argon2 PHC string
    pub password_hash: String,

    pub is_active: bool,

    pub is_superuser: bool,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
