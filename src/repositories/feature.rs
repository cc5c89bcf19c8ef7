//! # Feature Repository
//!
//! The global feature catalog. Feature codes must name an installed
//! application and are unique.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::feature::{self, Entity as Feature};
use crate::validation::required_name;

pub const FEATURE_NAME_MAX_LEN: usize = 120;

/// Request data for creating a catalog feature
#[derive(Debug, Clone)]
pub struct CreateFeatureRequest {
    pub code: String,
    pub name: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateFeatureRequest {
    pub name: Option<String>,
    pub is_active: Option<bool>,
}

pub struct FeatureRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> FeatureRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// Catalog ordered by code
    pub async fn list(&self) -> Result<Vec<feature::Model>, RepositoryError> {
        Feature::find()
            .order_by_asc(feature::Column::Code)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Globally active features ordered by code
    pub async fn list_active(&self) -> Result<Vec<feature::Model>, RepositoryError> {
        Feature::find()
            .filter(feature::Column::IsActive.eq(true))
            .order_by_asc(feature::Column::Code)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<feature::Model>, RepositoryError> {
        Feature::find_by_id(id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn find_by_code(&self, code: &str) -> Result<Option<feature::Model>, RepositoryError> {
        Feature::find()
            .filter(feature::Column::Code.eq(code))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Create a catalog feature whose code must appear in `installed_apps`
    pub async fn create(
        &self,
        request: CreateFeatureRequest,
        installed_apps: &[String],
    ) -> Result<feature::Model, RepositoryError> {
        let code = request.code.trim().to_string();
        if !installed_apps.iter().any(|app| *app == code) {
            return Err(RepositoryError::field_error(
                "code",
                format!("Select a valid choice. '{code}' is not an installed application."),
            ));
        }
        let name = required_name("name", &request.name, FEATURE_NAME_MAX_LEN)?;

        if self.find_by_code(&code).await?.is_some() {
            return Err(RepositoryError::Conflict(
                "A feature with this code already exists.".to_string(),
            ));
        }

        self.insert(code, name, request.is_active).await
    }

    async fn insert(
        &self,
        code: String,
        name: String,
        is_active: bool,
    ) -> Result<feature::Model, RepositoryError> {
        let feature = feature::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(code),
            name: Set(name),
            is_active: Set(is_active),
            created_at: Set(Utc::now().into()),
        };

        feature
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateFeatureRequest,
    ) -> Result<feature::Model, RepositoryError> {
        let feature = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Feature"))?;

        let mut active = feature.into_active_model();
        if let Some(name) = request.name {
            active.name = Set(required_name("name", &name, FEATURE_NAME_MAX_LEN)?);
        }
        if let Some(is_active) = request.is_active {
            active.is_active = Set(is_active);
        }

        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Fetch a feature by code, creating it active when missing. An existing
    /// feature is returned unchanged.
    pub async fn get_or_create(
        &self,
        code: &str,
        name: &str,
    ) -> Result<feature::Model, RepositoryError> {
        if let Some(feature) = self.find_by_code(code).await? {
            return Ok(feature);
        }
        self.insert(code.to_string(), name.to_string(), true).await
    }
}
