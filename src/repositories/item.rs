//! # Item Repository
//!
//! Tenant-scoped items. Items are listed in creation order with keyset
//! pagination over `(created_at, id)`, and their type and manufacturer
//! must belong to the same company as the item.

use std::collections::BTreeMap;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::cursor::CursorData;
use crate::error::RepositoryError;
use crate::models::item::{self, Entity as Item};
use crate::models::item_type::{self, Entity as ItemType};
use crate::models::item_unit::{self, Entity as ItemUnit};
use crate::models::manufacturer::{self, Entity as Manufacturer};
use crate::validation::required_name;

pub const ITEM_NAME_MAX_LEN: usize = 100;
pub const ITEM_MODEL_MAX_LEN: usize = 100;

/// Exclusive upper bound of a market value: ten digits, two of them decimals.
const MAX_MARKET_VALUE_CENTS: i64 = 10_000_000_000;

/// Input for creating or fully updating an item
#[derive(Debug, Clone)]
pub struct ItemInput {
    pub name: String,
    pub item_type_id: Uuid,
    pub manufacturer_id: Uuid,
    pub model: String,
    pub quantity: i32,
    pub market_value: Decimal,
    pub description: Option<String>,
}

/// One page of items plus whether more rows follow
#[derive(Debug, Clone)]
pub struct ItemPage {
    pub items: Vec<item::Model>,
    pub has_more: bool,
}

/// Totals for one item type on the financial dashboard
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TypeBreakdown {
    pub item_type_id: Uuid,
    pub name: String,
    pub item_count: u64,
    pub total_quantity: i64,
    #[schema(value_type = String, example = "1250.00")]
    pub stock_value: Decimal,
}

/// Financial dashboard of a company's warehouse
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct WarehouseDashboard {
    pub item_count: u64,
    pub total_quantity: i64,
    /// Sum of quantity times market value
    #[schema(value_type = String, example = "15000.00")]
    pub total_stock_value: Decimal,
    /// Ordered by type name
    pub by_type: Vec<TypeBreakdown>,
}

/// Convert a market value to cents: non-negative, at most two decimal
/// places and ten digits in total.
pub fn market_value_cents(value: Decimal) -> Result<i64, RepositoryError> {
    let value = value.normalize();
    if value.is_sign_negative() && !value.is_zero() {
        return Err(RepositoryError::field_error(
            "market_value",
            "Ensure this value is greater than or equal to 0.",
        ));
    }
    if value.scale() > 2 {
        return Err(RepositoryError::field_error(
            "market_value",
            "Ensure that there are no more than 2 decimal places.",
        ));
    }

    let mut cents = value;
    cents.rescale(2);
    let cents = i64::try_from(cents.mantissa()).unwrap_or(i64::MAX);
    if cents >= MAX_MARKET_VALUE_CENTS {
        return Err(RepositoryError::field_error(
            "market_value",
            "Ensure that there are no more than 10 digits in total.",
        ));
    }
    Ok(cents)
}

fn add_stock_value(total: Decimal, value: Decimal) -> Result<Decimal, RepositoryError> {
    total
        .checked_add(value)
        .ok_or_else(|| RepositoryError::validation_error("Total stock value is out of range."))
}

pub struct ItemRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> ItemRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// Items of the company starting strictly after `after`, oldest first.
    pub async fn list_page(
        &self,
        company_id: Uuid,
        after: Option<CursorData>,
        limit: u64,
    ) -> Result<ItemPage, RepositoryError> {
        let mut query = Item::find().filter(item::Column::CompanyId.eq(company_id));

        if let Some(cursor) = after {
            let created_at = cursor.created_at.fixed_offset();
            query = query.filter(
                Condition::any()
                    .add(item::Column::CreatedAt.gt(created_at))
                    .add(
                        Condition::all()
                            .add(item::Column::CreatedAt.eq(created_at))
                            .add(item::Column::Id.gt(cursor.id)),
                    ),
            );
        }

        let mut items = query
            .order_by_asc(item::Column::CreatedAt)
            .order_by_asc(item::Column::Id)
            .limit(limit + 1)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        let has_more = items.len() as u64 > limit;
        items.truncate(limit as usize);
        Ok(ItemPage { items, has_more })
    }

    pub async fn find(
        &self,
        company_id: Uuid,
        id: Uuid,
    ) -> Result<Option<item::Model>, RepositoryError> {
        Item::find_by_id(id)
            .filter(item::Column::CompanyId.eq(company_id))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn find_by_name_and_model(
        &self,
        company_id: Uuid,
        name: &str,
        model: &str,
    ) -> Result<Option<item::Model>, RepositoryError> {
        Item::find()
            .filter(item::Column::CompanyId.eq(company_id))
            .filter(item::Column::Name.eq(name))
            .filter(item::Column::Model.eq(model))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    async fn validate(
        &self,
        company_id: Uuid,
        input: ItemInput,
    ) -> Result<ValidatedItem, RepositoryError> {
        let name = required_name("name", &input.name, ITEM_NAME_MAX_LEN)?;
        let model = required_name("model", &input.model, ITEM_MODEL_MAX_LEN)?;
        if input.quantity < 0 {
            return Err(RepositoryError::field_error(
                "quantity",
                "Ensure this value is greater than or equal to 0.",
            ));
        }
        let market_value_cents = market_value_cents(input.market_value)?;

        let type_owned = ItemType::find_by_id(input.item_type_id)
            .filter(item_type::Column::CompanyId.eq(company_id))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?
            .is_some();
        if !type_owned {
            return Err(RepositoryError::field_error(
                "item_type_id",
                "Select a valid choice. That choice is not one of the available choices.",
            ));
        }

        let manufacturer_owned = Manufacturer::find_by_id(input.manufacturer_id)
            .filter(manufacturer::Column::CompanyId.eq(company_id))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?
            .is_some();
        if !manufacturer_owned {
            return Err(RepositoryError::field_error(
                "manufacturer_id",
                "Select a valid choice. That choice is not one of the available choices.",
            ));
        }

        let description = input
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        Ok(ValidatedItem {
            name,
            model,
            item_type_id: input.item_type_id,
            manufacturer_id: input.manufacturer_id,
            quantity: input.quantity,
            market_value_cents,
            description,
        })
    }

    /// Create an item owned by `company_id`.
    pub async fn create(
        &self,
        company_id: Uuid,
        input: ItemInput,
    ) -> Result<item::Model, RepositoryError> {
        let valid = self.validate(company_id, input).await?;
        let now = Utc::now();

        item::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(company_id),
            item_type_id: Set(valid.item_type_id),
            manufacturer_id: Set(valid.manufacturer_id),
            name: Set(valid.name),
            model: Set(valid.model),
            quantity: Set(valid.quantity),
            market_value_cents: Set(valid.market_value_cents),
            description: Set(valid.description),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(self.db)
        .await
        .map_err(RepositoryError::database_error)
    }

    pub async fn update(
        &self,
        company_id: Uuid,
        id: Uuid,
        input: ItemInput,
    ) -> Result<item::Model, RepositoryError> {
        let existing = self
            .find(company_id, id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Item"))?;
        let valid = self.validate(company_id, input).await?;

        let mut active = existing.into_active_model();
        active.item_type_id = Set(valid.item_type_id);
        active.manufacturer_id = Set(valid.manufacturer_id);
        active.name = Set(valid.name);
        active.model = Set(valid.model);
        active.quantity = Set(valid.quantity);
        active.market_value_cents = Set(valid.market_value_cents);
        active.description = Set(valid.description);
        active.updated_at = Set(Utc::now().into());

        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Delete the item and its units.
    pub async fn delete(&self, company_id: Uuid, id: Uuid) -> Result<(), RepositoryError> {
        self.find(company_id, id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Item"))?;
        self.delete_many(&[id]).await
    }

    /// Delete items by id with their units. Callers check ownership.
    pub(crate) async fn delete_many(&self, ids: &[Uuid]) -> Result<(), RepositoryError> {
        if ids.is_empty() {
            return Ok(());
        }

        ItemUnit::delete_many()
            .filter(item_unit::Column::ItemId.is_in(ids.iter().copied()))
            .exec(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        Item::delete_many()
            .filter(item::Column::Id.is_in(ids.iter().copied()))
            .exec(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        Ok(())
    }

    /// Totals over every item of the company.
    pub async fn dashboard(&self, company_id: Uuid) -> Result<WarehouseDashboard, RepositoryError> {
        let types: BTreeMap<Uuid, String> = ItemType::find()
            .filter(item_type::Column::CompanyId.eq(company_id))
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?
            .into_iter()
            .map(|t| (t.id, t.name))
            .collect();
        let items = Item::find()
            .filter(item::Column::CompanyId.eq(company_id))
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        let mut by_type: BTreeMap<Uuid, (u64, i64, Decimal)> = BTreeMap::new();
        let mut total_quantity = 0i64;
        let mut total_stock_value = Decimal::new(0, 2);
        for item in &items {
            let stock_value = item.stock_value();
            let entry = by_type
                .entry(item.item_type_id)
                .or_insert((0, 0, Decimal::new(0, 2)));
            entry.0 += 1;
            entry.1 += i64::from(item.quantity);
            entry.2 = add_stock_value(entry.2, stock_value)?;
            total_quantity += i64::from(item.quantity);
            total_stock_value = add_stock_value(total_stock_value, stock_value)?;
        }

        let mut breakdown: Vec<TypeBreakdown> = by_type
            .into_iter()
            .map(|(item_type_id, (item_count, total_quantity, stock_value))| TypeBreakdown {
                item_type_id,
                name: types.get(&item_type_id).cloned().unwrap_or_default(),
                item_count,
                total_quantity,
                stock_value,
            })
            .collect();
        breakdown.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(WarehouseDashboard {
            item_count: items.len() as u64,
            total_quantity,
            total_stock_value,
            by_type: breakdown,
        })
    }
}

struct ValidatedItem {
    name: String,
    model: String,
    item_type_id: Uuid,
    manufacturer_id: Uuid,
    quantity: i32,
    market_value_cents: i64,
    description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn market_value_is_stored_in_cents() {
        assert_eq!(market_value_cents(Decimal::from_str("1234.5").unwrap()).unwrap(), 123_450);
        assert_eq!(market_value_cents(Decimal::from_str("0").unwrap()).unwrap(), 0);
        assert_eq!(market_value_cents(Decimal::from_str("10.500").unwrap()).unwrap(), 1_050);
    }

    #[test]
    fn market_value_bounds() {
        assert!(market_value_cents(Decimal::from_str("-0.01").unwrap()).is_err());
        assert!(market_value_cents(Decimal::from_str("1.001").unwrap()).is_err());
        assert!(market_value_cents(Decimal::from_str("99999999.99").unwrap()).is_ok());
        assert!(market_value_cents(Decimal::from_str("100000000.00").unwrap()).is_err());
    }

    fn stocked(quantity: i32, market_value_cents: i64) -> item::Model {
        let now = Utc::now();
        item::Model {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            item_type_id: Uuid::new_v4(),
            manufacturer_id: Uuid::new_v4(),
            name: "Drive".to_string(),
            model: "CFW500".to_string(),
            quantity,
            market_value_cents,
            description: None,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[test]
    fn stock_value_of_largest_item_is_exact() {
        let item = stocked(i32::MAX, MAX_MARKET_VALUE_CENTS - 1);
        assert_eq!(
            item.stock_value(),
            Decimal::from_str("214748364678525163.53").unwrap()
        );
        assert_eq!(stocked(0, 125_000).stock_value().to_string(), "0.00");
    }

    #[test]
    fn stock_value_sum_reports_overflow() {
        assert_eq!(
            add_stock_value(Decimal::new(100, 2), Decimal::new(25, 2)).unwrap(),
            Decimal::new(125, 2)
        );
        assert!(add_stock_value(Decimal::MAX, Decimal::ONE).is_err());
    }
}
