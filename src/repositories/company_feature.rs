//! # Feature Grant Repository
//!
//! Per-company enable/disable state for catalog features. A company has a
//! feature only when a grant exists, the grant is enabled and the feature
//! is globally active.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};
use sea_orm::sea_query::JoinType;
use uuid::Uuid;

use super::feature::FeatureRepository;
use crate::error::RepositoryError;
use crate::features::{feature_route, FeatureOverviewEntry, FeatureStatus, SidebarFeature};
use crate::models::company_feature::{self, Entity as CompanyFeature};
use crate::models::feature::{self, Entity as Feature};
use crate::models::Company;

pub struct FeatureGrantRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> FeatureGrantRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// Whether the company effectively has the feature with `code`
    pub async fn company_has_feature(
        &self,
        company_id: Uuid,
        code: &str,
    ) -> Result<bool, RepositoryError> {
        let count = CompanyFeature::find()
            .join(JoinType::InnerJoin, company_feature::Relation::Feature.def())
            .filter(company_feature::Column::CompanyId.eq(company_id))
            .filter(company_feature::Column::Enabled.eq(true))
            .filter(feature::Column::IsActive.eq(true))
            .filter(feature::Column::Code.eq(code))
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        Ok(count > 0)
    }

    /// Every grant of the company with its feature, ordered by feature code
    pub async fn list_for_company(
        &self,
        company_id: Uuid,
    ) -> Result<Vec<(company_feature::Model, feature::Model)>, RepositoryError> {
        let rows = CompanyFeature::find()
            .filter(company_feature::Column::CompanyId.eq(company_id))
            .find_also_related(Feature)
            .order_by_asc(feature::Column::Code)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(rows
            .into_iter()
            .filter_map(|(grant, feature)| feature.map(|feature| (grant, feature)))
            .collect())
    }

    pub async fn find(
        &self,
        company_id: Uuid,
        feature_id: Uuid,
    ) -> Result<Option<company_feature::Model>, RepositoryError> {
        CompanyFeature::find()
            .filter(company_feature::Column::CompanyId.eq(company_id))
            .filter(company_feature::Column::FeatureId.eq(feature_id))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Create or update the grant for (company, feature).
    pub async fn grant(
        &self,
        company_id: Uuid,
        feature_id: Uuid,
        enabled: bool,
        granted_by: Option<Uuid>,
    ) -> Result<company_feature::Model, RepositoryError> {
        if Company::find_by_id(company_id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?
            .is_none()
        {
            return Err(RepositoryError::not_found("Company"));
        }
        if FeatureRepository::new(self.db)
            .find_by_id(feature_id)
            .await?
            .is_none()
        {
            return Err(RepositoryError::not_found("Feature"));
        }

        let now = Utc::now();
        match self.find(company_id, feature_id).await? {
            Some(existing) => {
                let mut active = existing.into_active_model();
                active.enabled = Set(enabled);
                active.granted_by = Set(granted_by);
                active.updated_at = Set(now.into());
                active
                    .update(self.db)
                    .await
                    .map_err(RepositoryError::database_error)
            }
            None => {
                let grant = company_feature::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    company_id: Set(company_id),
                    feature_id: Set(feature_id),
                    enabled: Set(enabled),
                    granted_by: Set(granted_by),
                    created_at: Set(now.into()),
                    updated_at: Set(now.into()),
                };
                grant
                    .insert(self.db)
                    .await
                    .map_err(RepositoryError::database_error)
            }
        }
    }

    /// Insert the grant only when the company does not hold one yet
    pub async fn ensure_grant(
        &self,
        company_id: Uuid,
        feature_id: Uuid,
        enabled: bool,
    ) -> Result<company_feature::Model, RepositoryError> {
        match self.find(company_id, feature_id).await? {
            Some(existing) => Ok(existing),
            None => self.grant(company_id, feature_id, enabled, None).await,
        }
    }

    pub async fn revoke(&self, company_id: Uuid, feature_id: Uuid) -> Result<(), RepositoryError> {
        let result = CompanyFeature::delete_many()
            .filter(company_feature::Column::CompanyId.eq(company_id))
            .filter(company_feature::Column::FeatureId.eq(feature_id))
            .exec(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::not_found("Feature grant"));
        }
        Ok(())
    }

    /// Load the company's grants, rejecting ids that are not among them.
    async fn owned_grants(
        &self,
        company_id: Uuid,
        grant_ids: &HashSet<Uuid>,
    ) -> Result<Vec<company_feature::Model>, RepositoryError> {
        let grants = CompanyFeature::find()
            .filter(company_feature::Column::CompanyId.eq(company_id))
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        let owned: HashSet<Uuid> = grants.iter().map(|g| g.id).collect();
        if !grant_ids.is_subset(&owned) {
            return Err(RepositoryError::not_found("Feature grant"));
        }
        Ok(grants)
    }

    async fn write_enabled(
        &self,
        grant: company_feature::Model,
        enabled: bool,
        by: Uuid,
    ) -> Result<company_feature::Model, RepositoryError> {
        if grant.enabled == enabled {
            return Ok(grant);
        }
        let mut active = grant.into_active_model();
        active.enabled = Set(enabled);
        active.granted_by = Set(Some(by));
        active.updated_at = Set(Utc::now().into());
        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Set every grant of the company to `enabled = grant_ids ∋ id`.
    ///
    /// Foreign ids fail the whole call before anything is written.
    pub async fn set_enabled_grants(
        &self,
        company_id: Uuid,
        grant_ids: &[Uuid],
        by: Uuid,
    ) -> Result<Vec<company_feature::Model>, RepositoryError> {
        let wanted: HashSet<Uuid> = grant_ids.iter().copied().collect();
        let grants = self.owned_grants(company_id, &wanted).await?;

        let mut updated = Vec::with_capacity(grants.len());
        for grant in grants {
            let enabled = wanted.contains(&grant.id);
            updated.push(self.write_enabled(grant, enabled, by).await?);
        }
        Ok(updated)
    }

    /// Enable the listed grants of the company. Never disables anything.
    pub async fn enable_grants(
        &self,
        company_id: Uuid,
        grant_ids: &[Uuid],
        by: Uuid,
    ) -> Result<Vec<company_feature::Model>, RepositoryError> {
        let wanted: HashSet<Uuid> = grant_ids.iter().copied().collect();
        let grants = self.owned_grants(company_id, &wanted).await?;

        let mut updated = Vec::with_capacity(wanted.len());
        for grant in grants.into_iter().filter(|g| wanted.contains(&g.id)) {
            updated.push(self.write_enabled(grant, true, by).await?);
        }
        Ok(updated)
    }

    /// Enabled, globally active, routed grants ordered by feature code
    pub async fn sidebar_features(
        &self,
        company_id: Uuid,
    ) -> Result<Vec<SidebarFeature>, RepositoryError> {
        let grants = self.list_for_company(company_id).await?;

        Ok(grants
            .into_iter()
            .filter(|(grant, feature)| grant.enabled && feature.is_active)
            .filter_map(|(_, feature)| {
                feature_route(&feature.code).map(|url| SidebarFeature {
                    code: feature.code,
                    name: feature.name,
                    url: url.to_string(),
                })
            })
            .collect())
    }

    /// Status of every globally active feature for the company
    pub async fn feature_overview(
        &self,
        company_id: Uuid,
    ) -> Result<Vec<FeatureOverviewEntry>, RepositoryError> {
        let features = FeatureRepository::new(self.db).list_active().await?;
        let grants: HashMap<Uuid, company_feature::Model> = CompanyFeature::find()
            .filter(company_feature::Column::CompanyId.eq(company_id))
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?
            .into_iter()
            .map(|grant| (grant.feature_id, grant))
            .collect();

        Ok(features
            .into_iter()
            .map(|feature| {
                let grant = grants.get(&feature.id);
                let status = match grant {
                    Some(g) if g.enabled => FeatureStatus::Enabled,
                    Some(_) => FeatureStatus::Disabled,
                    None => FeatureStatus::NotGranted,
                };
                let url = match status {
                    FeatureStatus::Enabled => feature_route(&feature.code).map(str::to_string),
                    _ => None,
                };
                FeatureOverviewEntry {
                    feature_id: feature.id,
                    code: feature.code,
                    name: feature.name,
                    status,
                    grant_id: grant.map(|g| g.id),
                    url,
                }
            })
            .collect())
    }
}
