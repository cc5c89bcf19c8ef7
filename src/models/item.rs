//! Item entity model
//!
//! A stocked product belonging to one company. Its type and manufacturer
//! must belong to the same company; the repository enforces this.

use super::company::Entity as Company;
use super::item_type::Entity as ItemType;
use super::manufacturer::Entity as Manufacturer;
use rust_decimal::Decimal;
use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

/// Item entity representing a tenant's stocked product
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "items")]
pub struct Model {
    /// Unique identifier for the item (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Owning company
    pub company_id: Uuid,

    pub item_type_id: Uuid,

    pub manufacturer_id: Uuid,

    pub name: String,

    pub model: String,

    /// Units in stock, never negative
    pub quantity: i32,

    /// Market value per unit in cents
    pub market_value_cents: i64,

    pub description: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Market value per unit with two decimal places
    pub fn market_value(&self) -> Decimal {
        Decimal::new(self.market_value_cents, 2)
    }

    /// Quantity multiplied by market value
    ///
    /// Computed in `Decimal`: the largest product exceeds `i64` cents.
    pub fn stock_value(&self) -> Decimal {
        let mut value = self.market_value() * Decimal::from(self.quantity);
        value.rescale(2);
        value
    }
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
        belongs_to = "ItemType",
        from = "Column::ItemTypeId",
        to = "super::item_type::Column::Id"
    )]
    ItemType,
    #[sea_orm(
        belongs_to = "Manufacturer",
        from = "Column::ManufacturerId",
        to = "super::manufacturer::Column::Id"
    )]
    Manufacturer,
}

impl Related<Company> for Entity {
    fn to() -> RelationDef {
        Relation::Company.def()
    }
}

impl Related<ItemType> for Entity {
    fn to() -> RelationDef {
        Relation::ItemType.def()
    }
}

impl Related<Manufacturer> for Entity {
    fn to() -> RelationDef {
        Relation::Manufacturer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
