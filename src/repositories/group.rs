//! # Group Repository
//!
//! Role groups, their permissions and user membership.

use std::collections::HashSet;

use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait, Set,
};
use sea_orm::sea_query::JoinType;
use uuid::Uuid;

use crate::access::{Permission, PermissionSet};
use crate::error::RepositoryError;
use crate::models::group::{self, Entity as Group};
use crate::models::group_permission::{self, Entity as GroupPermission};
use crate::models::user_group::{self, Entity as UserGroup};

pub struct GroupRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> GroupRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// All groups ordered by name
    pub async fn list(&self) -> Result<Vec<group::Model>, RepositoryError> {
        Group::find()
            .order_by_asc(group::Column::Name)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<group::Model>, RepositoryError> {
        Group::find()
            .filter(group::Column::Name.eq(name))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Returns the group and whether it was created by this call.
    pub async fn get_or_create(&self, name: &str) -> Result<(group::Model, bool), RepositoryError> {
        if let Some(existing) = self.find_by_name(name).await? {
            return Ok((existing, false));
        }

        let model = group::Model {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };
        Group::insert(group::ActiveModel {
            id: Set(model.id),
            name: Set(model.name.clone()),
        })
        .exec_without_returning(self.db)
        .await
        .map_err(RepositoryError::database_error)?;

        Ok((model, true))
    }

    /// Replace the group's permissions with exactly `permissions`.
    pub async fn set_permissions(
        &self,
        group_id: Uuid,
        permissions: &[Permission],
    ) -> Result<(), RepositoryError> {
        GroupPermission::delete_many()
            .filter(group_permission::Column::GroupId.eq(group_id))
            .exec(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        let codes: HashSet<String> = permissions.iter().map(Permission::to_string).collect();
        if codes.is_empty() {
            return Ok(());
        }

        let rows = codes.into_iter().map(|permission| group_permission::ActiveModel {
            group_id: Set(group_id),
            permission: Set(permission),
        });
        GroupPermission::insert_many(rows)
            .exec_without_returning(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        Ok(())
    }

    pub async fn permissions_of(&self, group_id: Uuid) -> Result<PermissionSet, RepositoryError> {
        let rows = GroupPermission::find()
            .filter(group_permission::Column::GroupId.eq(group_id))
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        Ok(PermissionSet::from_codes(rows.iter().map(|r| r.permission.as_str())))
    }

    /// Groups the user belongs to, ordered by name
    pub async fn groups_for_user(&self, user_id: Uuid) -> Result<Vec<group::Model>, RepositoryError> {
        Group::find()
            .join_rev(JoinType::InnerJoin, user_group::Relation::Group.def())
            .filter(user_group::Column::UserId.eq(user_id))
            .order_by_asc(group::Column::Name)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Add the user to the group; a no-op when already a member.
    pub async fn add_user(&self, group_id: Uuid, user_id: Uuid) -> Result<(), RepositoryError> {
        let existing = UserGroup::find_by_id((user_id, group_id))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        if existing.is_some() {
            return Ok(());
        }

        UserGroup::insert(user_group::ActiveModel {
            user_id: Set(user_id),
            group_id: Set(group_id),
        })
        .exec_without_returning(self.db)
        .await
        .map_err(RepositoryError::database_error)?;
        Ok(())
    }

    /// Replace the user's groups with `group_ids`.
    ///
    /// Unknown ids fail with a validation error on `groups` before anything
    /// is written.
    pub async fn set_user_groups(
        &self,
        user_id: Uuid,
        group_ids: &[Uuid],
    ) -> Result<Vec<group::Model>, RepositoryError> {
        let wanted: HashSet<Uuid> = group_ids.iter().copied().collect();
        let found = if wanted.is_empty() {
            Vec::new()
        } else {
            Group::find()
                .filter(group::Column::Id.is_in(wanted.iter().copied()))
                .all(self.db)
                .await
                .map_err(RepositoryError::database_error)?
        };

        if found.len() != wanted.len() {
            let known: HashSet<Uuid> = found.iter().map(|g| g.id).collect();
            let missing = wanted
                .difference(&known)
                .next()
                .map(Uuid::to_string)
                .unwrap_or_default();
            return Err(RepositoryError::field_error(
                "groups",
                format!("Select a valid choice. {missing} is not one of the available choices."),
            ));
        }

        UserGroup::delete_many()
            .filter(user_group::Column::UserId.eq(user_id))
            .exec(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        if !wanted.is_empty() {
            let rows = wanted.iter().map(|group_id| user_group::ActiveModel {
                user_id: Set(user_id),
                group_id: Set(*group_id),
            });
            UserGroup::insert_many(rows)
                .exec_without_returning(self.db)
                .await
                .map_err(RepositoryError::database_error)?;
        }

        self.groups_for_user(user_id).await
    }
}
