//! # Item Type Repository
//!
//! Tenant-scoped item types. Every call takes the owning company id; types
//! of other companies behave as missing.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::item::ItemRepository;
use crate::error::RepositoryError;
use crate::models::item::{self, Entity as Item};
use crate::models::item_type::{self, Entity as ItemType};
use crate::validation::required_name;

pub const ITEM_TYPE_NAME_MAX_LEN: usize = 50;

pub struct ItemTypeRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> ItemTypeRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn list(&self, company_id: Uuid) -> Result<Vec<item_type::Model>, RepositoryError> {
        ItemType::find()
            .filter(item_type::Column::CompanyId.eq(company_id))
            .order_by_asc(item_type::Column::Name)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn find(
        &self,
        company_id: Uuid,
        id: Uuid,
    ) -> Result<Option<item_type::Model>, RepositoryError> {
        ItemType::find_by_id(id)
            .filter(item_type::Column::CompanyId.eq(company_id))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    async fn ensure_name_available(
        &self,
        company_id: Uuid,
        name: &str,
        exclude: Option<Uuid>,
    ) -> Result<(), RepositoryError> {
        let mut query = ItemType::find()
            .filter(item_type::Column::CompanyId.eq(company_id))
            .filter(item_type::Column::Name.eq(name));
        if let Some(id) = exclude {
            query = query.filter(item_type::Column::Id.ne(id));
        }
        let taken = query
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)?
            > 0;

        if taken {
            return Err(RepositoryError::Conflict(
                "An item type with this name already exists.".to_string(),
            ));
        }
        Ok(())
    }

    pub async fn create(
        &self,
        company_id: Uuid,
        name: &str,
    ) -> Result<item_type::Model, RepositoryError> {
        let name = required_name("name", name, ITEM_TYPE_NAME_MAX_LEN)?;
        self.ensure_name_available(company_id, &name, None).await?;

        item_type::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(company_id),
            name: Set(name),
        }
        .insert(self.db)
        .await
        .map_err(RepositoryError::database_error)
    }

    pub async fn rename(
        &self,
        company_id: Uuid,
        id: Uuid,
        name: &str,
    ) -> Result<item_type::Model, RepositoryError> {
        let existing = self
            .find(company_id, id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Item type"))?;
        let name = required_name("name", name, ITEM_TYPE_NAME_MAX_LEN)?;
        self.ensure_name_available(company_id, &name, Some(id)).await?;

        let mut active = existing.into_active_model();
        active.name = Set(name);
        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Delete the type together with the items of that type and their units.
    pub async fn delete(&self, company_id: Uuid, id: Uuid) -> Result<(), RepositoryError> {
        self.find(company_id, id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Item type"))?;

        let item_ids: Vec<Uuid> = Item::find()
            .filter(item::Column::CompanyId.eq(company_id))
            .filter(item::Column::ItemTypeId.eq(id))
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?
            .into_iter()
            .map(|item| item.id)
            .collect();
        ItemRepository::new(self.db).delete_many(&item_ids).await?;

        ItemType::delete_by_id(id)
            .exec(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        Ok(())
    }
}
