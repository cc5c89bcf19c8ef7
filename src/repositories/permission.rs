//! # Permission Repository
//!
//! Resolves effective permission sets and stores direct user permissions.

use std::collections::HashSet;

use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect, RelationTrait, Set,
};
use sea_orm::sea_query::JoinType;
use uuid::Uuid;

use crate::access::{Permission, PermissionSet};
use crate::error::RepositoryError;
use crate::models::group_permission::{self, Entity as GroupPermission};
use crate::models::user;
use crate::models::user_group;
use crate::models::user_permission::{self, Entity as UserPermission};

pub struct PermissionRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> PermissionRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// Effective permissions of `user`.
    ///
    /// Inactive users hold nothing and active superusers hold everything.
    /// Everyone else gets the union of direct and group permissions.
    pub async fn effective_permissions(
        &self,
        user: &user::Model,
    ) -> Result<PermissionSet, RepositoryError> {
        if !user.is_active {
            return Ok(PermissionSet::empty());
        }
        if user.is_superuser {
            return Ok(PermissionSet::superuser());
        }

        let direct = self.direct_codes(user.id).await?;
        let via_groups: Vec<String> = GroupPermission::find()
            .join(JoinType::InnerJoin, group_permission::Relation::Group.def())
            .join_rev(JoinType::InnerJoin, user_group::Relation::Group.def())
            .filter(user_group::Column::UserId.eq(user.id))
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?
            .into_iter()
            .map(|row| row.permission)
            .collect();

        Ok(PermissionSet::from_codes(direct.iter().chain(via_groups.iter())))
    }

    async fn direct_codes(&self, user_id: Uuid) -> Result<Vec<String>, RepositoryError> {
        Ok(UserPermission::find()
            .filter(user_permission::Column::UserId.eq(user_id))
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?
            .into_iter()
            .map(|row| row.permission)
            .collect())
    }

    pub async fn direct_permissions(&self, user_id: Uuid) -> Result<PermissionSet, RepositoryError> {
        Ok(PermissionSet::from_codes(self.direct_codes(user_id).await?))
    }

    /// Grant direct permissions, skipping those already held.
    pub async fn grant_user_permissions(
        &self,
        user_id: Uuid,
        permissions: &[Permission],
    ) -> Result<(), RepositoryError> {
        let held: HashSet<String> = self.direct_codes(user_id).await?.into_iter().collect();
        let missing: HashSet<String> = permissions
            .iter()
            .map(Permission::to_string)
            .filter(|code| !held.contains(code))
            .collect();
        if missing.is_empty() {
            return Ok(());
        }

        let rows = missing.into_iter().map(|permission| user_permission::ActiveModel {
            user_id: Set(user_id),
            permission: Set(permission),
        });
        UserPermission::insert_many(rows)
            .exec_without_returning(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        Ok(())
    }
}
