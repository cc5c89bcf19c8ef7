//! # Company Repository
//!
//! CRUD operations for companies. Creating a company here does not grant
//! any features; use [`crate::tenancy::create_company_with_defaults`] for that.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::company::{self, Entity as Company};
use crate::models::{
    company_feature, employee, item, item_type, item_unit, manufacturer, CompanyFeature,
    Employee, Item, ItemType, ItemUnit, Manufacturer,
};
use crate::validation::{normalize_optional_tax_id, required_name};

pub const COMPANY_NAME_MAX_LEN: usize = 120;

/// Request data for creating a company
#[derive(Debug, Clone)]
pub struct CreateCompanyRequest {
    pub name: String,
    /// Raw tax id; punctuation is stripped
    pub tax_id: Option<String>,
}

/// Partial update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct UpdateCompanyRequest {
    pub name: Option<String>,
    /// `Some("")` clears the tax id
    pub tax_id: Option<String>,
    pub is_active: Option<bool>,
}

/// Repository for Company database operations
pub struct CompanyRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> CompanyRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<company::Model>, RepositoryError> {
        Company::find_by_id(id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Lookup by normalized tax id
    pub async fn find_by_tax_id(
        &self,
        tax_id: &str,
    ) -> Result<Option<company::Model>, RepositoryError> {
        Company::find()
            .filter(company::Column::TaxId.eq(tax_id))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// All companies ordered by name
    pub async fn list(&self) -> Result<Vec<company::Model>, RepositoryError> {
        Company::find()
            .order_by_asc(company::Column::Name)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    async fn ensure_tax_id_available(
        &self,
        tax_id: &str,
        exclude: Option<Uuid>,
    ) -> Result<(), RepositoryError> {
        let mut query = Company::find().filter(company::Column::TaxId.eq(tax_id));
        if let Some(id) = exclude {
            query = query.filter(company::Column::Id.ne(id));
        }
        let taken = query
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)?
            > 0;

        if taken {
            return Err(RepositoryError::field_error(
                "tax_id",
                "A company with this tax id already exists.",
            ));
        }
        Ok(())
    }

    pub async fn create(
        &self,
        request: CreateCompanyRequest,
    ) -> Result<company::Model, RepositoryError> {
        let name = required_name("name", &request.name, COMPANY_NAME_MAX_LEN)?;
        let tax_id = normalize_optional_tax_id(request.tax_id.as_deref())?;
        if let Some(tax_id) = &tax_id {
            self.ensure_tax_id_available(tax_id, None).await?;
        }

        let company = company::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            tax_id: Set(tax_id),
            is_active: Set(true),
            created_at: Set(Utc::now().into()),
        };

        company
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateCompanyRequest,
    ) -> Result<company::Model, RepositoryError> {
        let company = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Company"))?;

        let mut active = company.into_active_model();
        if let Some(name) = request.name {
            active.name = Set(required_name("name", &name, COMPANY_NAME_MAX_LEN)?);
        }
        if let Some(raw) = request.tax_id {
            let tax_id = normalize_optional_tax_id(Some(&raw))?;
            if let Some(tax_id) = &tax_id {
                self.ensure_tax_id_available(tax_id, Some(id)).await?;
            }
            active.tax_id = Set(tax_id);
        }
        if let Some(is_active) = request.is_active {
            active.is_active = Set(is_active);
        }

        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Delete a company and its tenant-scoped records.
    ///
    /// Rejected with a conflict while any employee references the company.
    pub async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Company"))?;

        let employees = Employee::find()
            .filter(employee::Column::CompanyId.eq(id))
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        if employees > 0 {
            return Err(RepositoryError::Conflict(format!(
                "Cannot delete company: {} employee(s) still reference it.",
                employees
            )));
        }

        let item_ids: Vec<Uuid> = Item::find()
            .filter(item::Column::CompanyId.eq(id))
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?
            .into_iter()
            .map(|item| item.id)
            .collect();

        if !item_ids.is_empty() {
            ItemUnit::delete_many()
                .filter(item_unit::Column::ItemId.is_in(item_ids))
                .exec(self.db)
                .await
                .map_err(RepositoryError::database_error)?;
        }
        Item::delete_many()
            .filter(item::Column::CompanyId.eq(id))
            .exec(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        ItemType::delete_many()
            .filter(item_type::Column::CompanyId.eq(id))
            .exec(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        Manufacturer::delete_many()
            .filter(manufacturer::Column::CompanyId.eq(id))
            .exec(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        CompanyFeature::delete_many()
            .filter(company_feature::Column::CompanyId.eq(id))
            .exec(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        Company::delete_by_id(id)
            .exec(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(())
    }
}
