//! Company feature grant entity model
//!
//! Per-company enable/disable state for a catalog feature. Unique on
//! (company_id, feature_id).

use super::company::Entity as Company;
use super::feature::Entity as Feature;
use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

/// Feature grant linking a company to a catalog feature
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "company_features")]
pub struct Model {
    /// Unique identifier for the grant (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Company holding the grant
    pub company_id: Uuid,

    /// Granted catalog feature
    pub feature_id: Uuid,

    /// Whether the feature is switched on for the company
    pub enabled: bool,

    /// User who last wrote the grant, if known
    pub granted_by: Option<Uuid>,

    /// Timestamp when the grant was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the grant was last updated
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Company",
        from = "Column::CompanyId",
        to = "super::company::Column::Id"
    )]
    Company,
    #[sea_orm(
        belongs_to = "Feature",
        from = "Column::FeatureId",
        to = "super::feature::Column::Id"
    )]
    Feature,
}

impl Related<Company> for Entity {
    fn to() -> RelationDef {
        Relation::Company.def()
    }
}

impl Related<Feature> for Entity {
    fn to() -> RelationDef {
        Relation::Feature.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
