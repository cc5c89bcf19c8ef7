//! Item unit entity model
//!
//! A single physical unit of an item with its condition.

use super::item::Entity as Item;
use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "item_units")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub item_id: Uuid,

    /// One of `new`, `used`, `damaged`, `sold`
    pub state: String,

    pub remark: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

/// Condition of a physical unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UnitState {
    New,
    Used,
    Damaged,
    Sold,
}

impl UnitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitState::New => "new",
            UnitState::Used => "used",
            UnitState::Damaged => "damaged",
            UnitState::Sold => "sold",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "new" => Some(UnitState::New),
            "used" => Some(UnitState::Used),
            "damaged" => Some(UnitState::Damaged),
            "sold" => Some(UnitState::Sold),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Item",
        from = "Column::ItemId",
        to = "super::item::Column::Id"
    )]
    Item,
}

impl Related<Item> for Entity {
    fn to() -> RelationDef {
        Relation::Item.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
