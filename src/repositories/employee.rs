//! # Employee Repository
//!
//! Employees link a user to their company. Lookups by employee id are
//! always scoped to a company.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use super::user::UserRepository;
use crate::error::RepositoryError;
use crate::models::employee::{self, Entity as Employee};
use crate::models::user::{self, Entity as User};

pub struct EmployeeRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> EmployeeRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// Employee record of a user, if any
    pub async fn find_by_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<employee::Model>, RepositoryError> {
        Employee::find()
            .filter(employee::Column::UserId.eq(user_id))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Employees of a company with their users, ordered by username
    pub async fn list_for_company(
        &self,
        company_id: Uuid,
    ) -> Result<Vec<(employee::Model, user::Model)>, RepositoryError> {
        let rows = Employee::find()
            .filter(employee::Column::CompanyId.eq(company_id))
            .find_also_related(User)
            .order_by_asc(user::Column::Username)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(rows
            .into_iter()
            .filter_map(|(employee, user)| user.map(|user| (employee, user)))
            .collect())
    }

    /// Employee of `company_id` with the given id; other companies' employees are not found
    pub async fn find_in_company(
        &self,
        company_id: Uuid,
        employee_id: Uuid,
    ) -> Result<Option<(employee::Model, user::Model)>, RepositoryError> {
        let row = Employee::find_by_id(employee_id)
            .filter(employee::Column::CompanyId.eq(company_id))
            .find_also_related(User)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(row.and_then(|(employee, user)| user.map(|user| (employee, user))))
    }

    pub async fn count_for_company(&self, company_id: Uuid) -> Result<u64, RepositoryError> {
        Employee::find()
            .filter(employee::Column::CompanyId.eq(company_id))
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        company_id: Uuid,
    ) -> Result<employee::Model, RepositoryError> {
        if self.find_by_user(user_id).await?.is_some() {
            return Err(RepositoryError::Conflict(
                "User is already associated with a company.".to_string(),
            ));
        }

        let employee = employee::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            company_id: Set(company_id),
            created_at: Set(Utc::now().into()),
        };

        employee
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Remove an employee and its user identity.
    ///
    /// `acting_user_id` may not delete their own account.
    pub async fn delete_with_user(
        &self,
        company_id: Uuid,
        employee_id: Uuid,
        acting_user_id: Uuid,
    ) -> Result<(), RepositoryError> {
        let (employee, user) = self
            .find_in_company(company_id, employee_id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Employee"))?;

        if user.id == acting_user_id {
            return Err(RepositoryError::validation_error(
                "You cannot delete your own account.",
            ));
        }

        Employee::delete_by_id(employee.id)
            .exec(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        UserRepository::new(self.db).delete(user.id).await
    }
}
