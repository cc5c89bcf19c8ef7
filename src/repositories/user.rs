//! # User Repository
//!
//! Login identities. Usernames and emails are unique case-insensitively;
//! emails are stored lowercase.

use chrono::Utc;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, PaginatorTrait,
    QueryFilter, Set,
};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::user::{self, Entity as User};
use crate::models::{UserGroup, UserPermission, user_group, user_permission};
use crate::password::{PasswordError, PasswordService};
use crate::validation::{normalize_email, normalize_username, person_name};

/// Request data for creating a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// Output of [`hash_password`]
    pub password_hash: String,
    pub is_superuser: bool,
}

/// Profile fields an employee manager may change; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

pub(crate) fn password_field_error(error: PasswordError) -> RepositoryError {
    match error {
        PasswordError::TooWeak(message) => RepositoryError::field_error("password", message),
        PasswordError::HashError(message) => {
            tracing::error!(error = %message, "Password hashing failed");
            RepositoryError::validation_error("Password could not be processed.")
        }
    }
}

/// Check strength and hash a password off the async executor.
///
/// Callers hash before opening a transaction so Argon2 never runs while one
/// is held.
pub async fn hash_password(password: &str) -> Result<String, RepositoryError> {
    PasswordService::validate_strength(password).map_err(password_field_error)?;
    PasswordService::hash_blocking(password)
        .await
        .map_err(password_field_error)
}

pub struct UserRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> UserRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<user::Model>, RepositoryError> {
        User::find_by_id(id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Exact username lookup used by login
    pub async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<user::Model>, RepositoryError> {
        User::find()
            .filter(user::Column::Username.eq(username))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn username_in_use(
        &self,
        username: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, RepositoryError> {
        let mut query = User::find().filter(
            Expr::expr(Func::lower(Expr::col(user::Column::Username)))
                .eq(username.to_lowercase()),
        );
        if let Some(id) = exclude {
            query = query.filter(user::Column::Id.ne(id));
        }
        Ok(query
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)?
            > 0)
    }

    pub async fn email_in_use(
        &self,
        email: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, RepositoryError> {
        let mut query = User::find().filter(
            Expr::expr(Func::lower(Expr::col(user::Column::Email))).eq(email.to_lowercase()),
        );
        if let Some(id) = exclude {
            query = query.filter(user::Column::Id.ne(id));
        }
        Ok(query
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)?
            > 0)
    }

    async fn checked_username(
        &self,
        raw: &str,
        exclude: Option<Uuid>,
    ) -> Result<String, RepositoryError> {
        let username = normalize_username(raw)?;
        if self.username_in_use(&username, exclude).await? {
            return Err(RepositoryError::field_error(
                "username",
                "This username is already in use.",
            ));
        }
        Ok(username)
    }

    async fn checked_email(&self, raw: &str, exclude: Option<Uuid>) -> Result<String, RepositoryError> {
        let email = normalize_email(raw)?;
        if self.email_in_use(&email, exclude).await? {
            return Err(RepositoryError::field_error(
                "email",
                "This email is already in use.",
            ));
        }
        Ok(email)
    }

    /// Validate and insert a user with an already hashed password.
    pub async fn create(&self, request: NewUser) -> Result<user::Model, RepositoryError> {
        let username = self.checked_username(&request.username, None).await?;
        let email = self.checked_email(&request.email, None).await?;
        let first_name = person_name("first_name", &request.first_name)?;
        let last_name = person_name("last_name", &request.last_name)?;

        let user = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(username),
            email: Set(email),
            first_name: Set(first_name),
            last_name: Set(last_name),
            password_hash: Set(request.password_hash),
            is_active: Set(true),
            is_superuser: Set(request.is_superuser),
            created_at: Set(Utc::now().into()),
        };

        user.insert(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn update_profile(
        &self,
        id: Uuid,
        request: UpdateUserRequest,
    ) -> Result<user::Model, RepositoryError> {
        let user = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("User"))?;

        let mut active = user.into_active_model();
        if let Some(username) = request.username {
            active.username = Set(self.checked_username(&username, Some(id)).await?);
        }
        if let Some(email) = request.email {
            active.email = Set(self.checked_email(&email, Some(id)).await?);
        }
        if let Some(first_name) = request.first_name {
            active.first_name = Set(person_name("first_name", &first_name)?);
        }
        if let Some(last_name) = request.last_name {
            active.last_name = Set(person_name("last_name", &last_name)?);
        }

        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Replace the password hash after checking strength
    pub async fn set_password(&self, id: Uuid, password: &str) -> Result<(), RepositoryError> {
        let user = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("User"))?;
        let hash = hash_password(password).await?;

        let mut active = user.into_active_model();
        active.password_hash = Set(hash);
        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        Ok(())
    }

    /// Remove a user together with group memberships and direct permissions.
    pub async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        UserGroup::delete_many()
            .filter(user_group::Column::UserId.eq(id))
            .exec(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        UserPermission::delete_many()
            .filter(user_permission::Column::UserId.eq(id))
            .exec(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        let result = User::delete_by_id(id)
            .exec(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        if result.rows_affected == 0 {
            return Err(RepositoryError::not_found("User"));
        }
        Ok(())
    }
}
