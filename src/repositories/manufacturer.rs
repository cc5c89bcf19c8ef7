//! # Manufacturer Repository
//!
//! Tenant-scoped manufacturers. Every call takes the owning company id;
//! manufacturers of other companies behave as missing.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::item::ItemRepository;
use crate::error::RepositoryError;
use crate::models::item::{self, Entity as Item};
use crate::models::manufacturer::{self, Entity as Manufacturer};
use crate::validation::required_name;

pub const MANUFACTURER_NAME_MAX_LEN: usize = 100;

pub struct ManufacturerRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> ManufacturerRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn list(&self, company_id: Uuid) -> Result<Vec<manufacturer::Model>, RepositoryError> {
        Manufacturer::find()
            .filter(manufacturer::Column::CompanyId.eq(company_id))
            .order_by_asc(manufacturer::Column::Name)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn find(
        &self,
        company_id: Uuid,
        id: Uuid,
    ) -> Result<Option<manufacturer::Model>, RepositoryError> {
        Manufacturer::find_by_id(id)
            .filter(manufacturer::Column::CompanyId.eq(company_id))
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
        let mut query = Manufacturer::find()
            .filter(manufacturer::Column::CompanyId.eq(company_id))
            .filter(manufacturer::Column::Name.eq(name));
        if let Some(id) = exclude {
            query = query.filter(manufacturer::Column::Id.ne(id));
        }
        let taken = query
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)?
            > 0;

        if taken {
            return Err(RepositoryError::Conflict(
                "A manufacturer with this name already exists.".to_string(),
            ));
        }
        Ok(())
    }

    pub async fn create(
        &self,
        company_id: Uuid,
        name: &str,
    ) -> Result<manufacturer::Model, RepositoryError> {
        let name = required_name("name", name, MANUFACTURER_NAME_MAX_LEN)?;
        self.ensure_name_available(company_id, &name, None).await?;

        manufacturer::ActiveModel {
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
    ) -> Result<manufacturer::Model, RepositoryError> {
        let existing = self
            .find(company_id, id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Manufacturer"))?;
        let name = required_name("name", name, MANUFACTURER_NAME_MAX_LEN)?;
        self.ensure_name_available(company_id, &name, Some(id)).await?;

        let mut active = existing.into_active_model();
        active.name = Set(name);
        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Delete the manufacturer together with its items and their units.
    pub async fn delete(&self, company_id: Uuid, id: Uuid) -> Result<(), RepositoryError> {
        self.find(company_id, id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Manufacturer"))?;

        let item_ids: Vec<Uuid> = Item::find()
            .filter(item::Column::CompanyId.eq(company_id))
            .filter(item::Column::ManufacturerId.eq(id))
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?
            .into_iter()
            .map(|item| item.id)
            .collect();
        ItemRepository::new(self.db).delete_many(&item_ids).await?;

        Manufacturer::delete_by_id(id)
            .exec(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        Ok(())
    }
}
