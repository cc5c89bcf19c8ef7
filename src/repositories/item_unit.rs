//! # Item Unit Repository
//!
//! Physical units of an item. Ownership is checked through the parent item.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use super::item::ItemRepository;
use crate::error::RepositoryError;
use crate::models::item;
use crate::models::item_unit::{self, Entity as ItemUnit, UnitState};

/// Partial update of a unit
#[derive(Debug, Clone, Default)]
pub struct UpdateUnitRequest {
    pub state: Option<UnitState>,
    /// `Some("")` clears the remark
    pub remark: Option<String>,
}

fn clean_remark(remark: Option<String>) -> Option<String> {
    remark
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
}

pub struct ItemUnitRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> ItemUnitRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    async fn owned_item(&self, company_id: Uuid, item_id: Uuid) -> Result<item::Model, RepositoryError> {
        ItemRepository::new(self.db)
            .find(company_id, item_id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Item"))
    }

    /// Units of an item in creation order
    pub async fn list_for_item(
        &self,
        company_id: Uuid,
        item_id: Uuid,
    ) -> Result<Vec<item_unit::Model>, RepositoryError> {
        self.owned_item(company_id, item_id).await?;

        ItemUnit::find()
            .filter(item_unit::Column::ItemId.eq(item_id))
            .order_by_asc(item_unit::Column::CreatedAt)
            .order_by_asc(item_unit::Column::Id)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn find(
        &self,
        company_id: Uuid,
        item_id: Uuid,
        unit_id: Uuid,
    ) -> Result<item_unit::Model, RepositoryError> {
        self.owned_item(company_id, item_id).await?;

        ItemUnit::find_by_id(unit_id)
            .filter(item_unit::Column::ItemId.eq(item_id))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?
            .ok_or_else(|| RepositoryError::not_found("Item unit"))
    }

    pub async fn create(
        &self,
        company_id: Uuid,
        item_id: Uuid,
        state: UnitState,
        remark: Option<String>,
    ) -> Result<item_unit::Model, RepositoryError> {
        self.owned_item(company_id, item_id).await?;

        item_unit::ActiveModel {
            id: Set(Uuid::new_v4()),
            item_id: Set(item_id),
            state: Set(state.as_str().to_string()),
            remark: Set(clean_remark(remark)),
            created_at: Set(Utc::now().into()),
        }
        .insert(self.db)
        .await
        .map_err(RepositoryError::database_error)
    }

    pub async fn update(
        &self,
        company_id: Uuid,
        item_id: Uuid,
        unit_id: Uuid,
        request: UpdateUnitRequest,
    ) -> Result<item_unit::Model, RepositoryError> {
        let unit = self.find(company_id, item_id, unit_id).await?;

        let mut active = unit.into_active_model();
        if let Some(state) = request.state {
            active.state = Set(state.as_str().to_string());
        }
        if request.remark.is_some() {
            active.remark = Set(clean_remark(request.remark));
        }

        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn delete(
        &self,
        company_id: Uuid,
        item_id: Uuid,
        unit_id: Uuid,
    ) -> Result<(), RepositoryError> {
        self.find(company_id, item_id, unit_id).await?;

        ItemUnit::delete_by_id(unit_id)
            .exec(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        Ok(())
    }
}
