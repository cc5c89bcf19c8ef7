//! Database seeding functionality
//!
//! Startup synchronisation of the standard role groups and the default
//! `companies` feature, plus the sample tenant used by the
//! `seed_base_data` binary. Every function here is idempotent.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use uuid::Uuid;

use crate::access::{
    Action, Permission, Resource, WAREHOUSE_ASSISTANT_GROUP, company_owner_permissions,
    standard_groups, warehouse_assistant_permissions,
};
use crate::features::{COMPANIES_FEATURE, WAREHOUSE_FEATURE};
use crate::models::company;
use crate::repositories::company::{CreateCompanyRequest, UpdateCompanyRequest};
use crate::repositories::item::ItemInput;
use crate::repositories::user::{NewUser, hash_password};
use crate::repositories::{
    CompanyRepository, EmployeeRepository, FeatureGrantRepository, FeatureRepository,
    GroupRepository, ItemRepository, ItemTypeRepository, ManufacturerRepository,
    PermissionRepository, UserRepository,
};
use crate::tenancy::{COMPANIES_FEATURE_NAME, create_company_with_defaults};
use crate::validation::normalize_tax_id;

/// Overwrite the standard groups with their exact permission sets.
///
/// `warehouse_assistant` only receives its permissions when it is created,
/// so edits made to it afterwards survive restarts.
pub async fn sync_standard_groups<C: ConnectionTrait>(db: &C) -> Result<()> {
    let groups = GroupRepository::new(db);

    for (name, permissions) in standard_groups() {
        let (group, created) = groups.get_or_create(name).await?;
        groups.set_permissions(group.id, &permissions).await?;
        log::info!(
            "{} group '{}' with {} permission(s)",
            if created { "Created" } else { "Synchronised" },
            name,
            permissions.len()
        );
    }

    let (assistant, created) = groups.get_or_create(WAREHOUSE_ASSISTANT_GROUP).await?;
    if created {
        groups
            .set_permissions(assistant.id, &warehouse_assistant_permissions())
            .await?;
        log::info!("Created group '{}'", WAREHOUSE_ASSISTANT_GROUP);
    }

    Ok(())
}

/// Ensure the `companies` feature exists and every company holds a grant for it.
///
/// Returns the number of grants created. Existing grants keep their state.
pub async fn backfill_companies_feature<C: ConnectionTrait>(db: &C) -> Result<usize> {
    let feature = FeatureRepository::new(db)
        .get_or_create(COMPANIES_FEATURE, COMPANIES_FEATURE_NAME)
        .await?;
    let grants = FeatureGrantRepository::new(db);

    let mut created = 0;
    for company in CompanyRepository::new(db).list().await? {
        if grants.find(company.id, feature.id).await?.is_none() {
            grants.ensure_grant(company.id, feature.id, true).await?;
            created += 1;
        }
    }

    if created > 0 {
        log::info!("Backfilled '{}' grant for {} company(ies)", COMPANIES_FEATURE, created);
    }
    Ok(created)
}

struct SeedItem {
    name: &'static str,
    type_name: &'static str,
    manufacturer_name: &'static str,
    model: &'static str,
    quantity: i32,
    market_value_cents: i64,
    description: &'static str,
}

struct SeedCompany {
    name: &'static str,
    tax_id: &'static str,
    owner_username: &'static str,
    owner_email: &'static str,
    owner_password: &'static str,
    item_types: &'static [&'static str],
    manufacturers: &'static [&'static str],
    enabled_features: &'static [(&'static str, &'static str)],
    items: &'static [SeedItem],
}

const SEED_DATA: &[SeedCompany] = &[SeedCompany {
    name: "Avante Industrial",
    tax_id: "12345678000199",
    owner_username: "avante_admin",
    owner_email: "avante_admin@example.com",
    owner_password: "Avante_admin1",
    item_types: &["PLC", "HMI", "Sensor", "Inversor"],
    manufacturers: &["Siemens", "Schneider", "WEG"],
    enabled_features: &[
        (COMPANIES_FEATURE, COMPANIES_FEATURE_NAME),
        (WAREHOUSE_FEATURE, "Warehouse"),
    ],
    items: &[SeedItem {
        name: "S7-200",
        type_name: "PLC",
        manufacturer_name: "Siemens",
        model: "S7-200",
        quantity: 4,
        market_value_cents: 50_000,
        description: "",
    }],
}];

/// What one run of [`seed_base_data`] touched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub companies_created: usize,
    pub owners_created: usize,
    pub items_created: usize,
}

/// Create or refresh the sample tenant in one transaction.
///
/// `owner_password` replaces the default owner password, also for owners
/// that already exist.
pub async fn seed_base_data(
    db: &DatabaseConnection,
    owner_password: Option<&str>,
) -> Result<SeedSummary> {
    let txn = db.begin().await.context("Failed to start seeding transaction")?;
    let mut summary = SeedSummary::default();

    for seed in SEED_DATA {
        let company = seed_company(&txn, seed, &mut summary).await?;
        seed_owner(&txn, seed, &company, owner_password, &mut summary).await?;
        seed_warehouse(&txn, seed, &company, &mut summary).await?;
    }

    txn.commit().await.context("Failed to commit seed data")?;
    log::info!("Base data populated successfully: {:?}", summary);
    Ok(summary)
}

async fn seed_company<C: ConnectionTrait>(
    db: &C,
    seed: &SeedCompany,
    summary: &mut SeedSummary,
) -> Result<company::Model> {
    let companies = CompanyRepository::new(db);
    let tax_id = normalize_tax_id(seed.tax_id)?;

    let company = match companies.find_by_tax_id(&tax_id).await? {
        Some(existing) if existing.name != seed.name => {
            companies
                .update(
                    existing.id,
                    UpdateCompanyRequest {
                        name: Some(seed.name.to_string()),
                        ..Default::default()
                    },
                )
                .await?
        }
        Some(existing) => existing,
        None => {
            log::info!("Creating company '{}'", seed.name);
            summary.companies_created += 1;
            create_company_with_defaults(
                db,
                CreateCompanyRequest {
                    name: seed.name.to_string(),
                    tax_id: Some(tax_id),
                },
            )
            .await?
        }
    };
    Ok(company)
}

async fn seed_owner<C: ConnectionTrait>(
    db: &C,
    seed: &SeedCompany,
    company: &company::Model,
    override_password: Option<&str>,
    summary: &mut SeedSummary,
) -> Result<()> {
    let users = UserRepository::new(db);
    let password = override_password.unwrap_or(seed.owner_password);

    let owner = match users.find_by_username(seed.owner_username).await? {
        Some(existing) => {
            if override_password.is_some() {
                users.set_password(existing.id, password).await?;
                log::info!("Reset password of '{}'", seed.owner_username);
            }
            existing
        }
        None => {
            summary.owners_created += 1;
            users
                .create(NewUser {
                    username: seed.owner_username.to_string(),
                    email: seed.owner_email.to_string(),
                    first_name: "Tenant".to_string(),
                    last_name: "Admin".to_string(),
                    password_hash: hash_password(password).await?,
                    is_superuser: false,
                })
                .await?
        }
    };

    let employees = EmployeeRepository::new(db);
    match employees.find_by_user(owner.id).await? {
        Some(employee) if employee.company_id != company.id => anyhow::bail!(
            "User '{}' already belongs to another company",
            seed.owner_username
        ),
        Some(_) => {}
        None => {
            employees.create(owner.id, company.id).await?;
        }
    }

    let features = FeatureRepository::new(db);
    let grants = FeatureGrantRepository::new(db);
    for (code, name) in seed.enabled_features {
        let feature = features.get_or_create(code, name).await?;
        grants
            .grant(company.id, feature.id, true, Some(owner.id))
            .await?;
    }

    let mut permissions = company_owner_permissions();
    permissions.push(Permission::model(Resource::Employee, Action::Add));
    PermissionRepository::new(db)
        .grant_user_permissions(owner.id, &permissions)
        .await?;

    Ok(())
}

async fn seed_warehouse<C: ConnectionTrait>(
    db: &C,
    seed: &SeedCompany,
    company: &company::Model,
    summary: &mut SeedSummary,
) -> Result<()> {
    let types = ItemTypeRepository::new(db);
    let existing_types = types.list(company.id).await?;
    let mut type_ids = Vec::with_capacity(seed.item_types.len());
    for name in seed.item_types {
        let id = match existing_types.iter().find(|t| t.name == *name) {
            Some(existing) => existing.id,
            None => types.create(company.id, name).await?.id,
        };
        type_ids.push((*name, id));
    }

    let manufacturers = ManufacturerRepository::new(db);
    let existing_manufacturers = manufacturers.list(company.id).await?;
    let mut manufacturer_ids = Vec::with_capacity(seed.manufacturers.len());
    for name in seed.manufacturers {
        let id = match existing_manufacturers.iter().find(|m| m.name == *name) {
            Some(existing) => existing.id,
            None => manufacturers.create(company.id, name).await?.id,
        };
        manufacturer_ids.push((*name, id));
    }

    let items = ItemRepository::new(db);
    for item in seed.items {
        let input = ItemInput {
            name: item.name.to_string(),
            item_type_id: seeded_id(&type_ids, item.type_name)?,
            manufacturer_id: seeded_id(&manufacturer_ids, item.manufacturer_name)?,
            model: item.model.to_string(),
            quantity: item.quantity,
            market_value: Decimal::new(item.market_value_cents, 2),
            description: Some(item.description.to_string()),
        };

        match items
            .find_by_name_and_model(company.id, item.name, item.model)
            .await?
        {
            Some(existing) => {
                items.update(company.id, existing.id, input).await?;
            }
            None => {
                items.create(company.id, input).await?;
                summary.items_created += 1;
            }
        }
    }

    Ok(())
}

fn seeded_id(ids: &[(&str, Uuid)], name: &str) -> Result<Uuid> {
    ids.iter()
        .find(|(seeded, _)| *seeded == name)
        .map(|(_, id)| *id)
        .with_context(|| format!("Seed data references unknown name '{name}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::Database;

    async fn db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        db
    }

    #[tokio::test]
    async fn standard_groups_are_overwritten_but_assistant_is_kept() {
        let db = db().await;
        sync_standard_groups(&db).await.unwrap();

        let groups = GroupRepository::new(&db);
        let viewer = groups.find_by_name("warehouse_viewer").await.unwrap().unwrap();
        let assistant = groups
            .find_by_name(WAREHOUSE_ASSISTANT_GROUP)
            .await
            .unwrap()
            .unwrap();

        groups.set_permissions(viewer.id, &[]).await.unwrap();
        groups
            .set_permissions(assistant.id, &[Permission::ViewFinancialDashboard])
            .await
            .unwrap();
        sync_standard_groups(&db).await.unwrap();

        assert_eq!(groups.permissions_of(viewer.id).await.unwrap().len(), 4);
        let assistant_permissions = groups.permissions_of(assistant.id).await.unwrap();
        assert_eq!(assistant_permissions.len(), 1);
        assert!(assistant_permissions.has(Permission::ViewFinancialDashboard));
    }

    #[tokio::test]
    async fn backfill_grants_companies_feature_once() {
        let db = db().await;
        let company = CompanyRepository::new(&db)
            .create(CreateCompanyRequest {
                name: "Legacy".to_string(),
                tax_id: None,
            })
            .await
            .unwrap();

        assert_eq!(backfill_companies_feature(&db).await.unwrap(), 1);
        assert_eq!(backfill_companies_feature(&db).await.unwrap(), 0);
        assert!(
            FeatureGrantRepository::new(&db)
                .company_has_feature(company.id, COMPANIES_FEATURE)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn base_data_is_idempotent() {
        let db = db().await;

        let first = seed_base_data(&db, None).await.unwrap();
        assert_eq!(
            first,
            SeedSummary {
                companies_created: 1,
                owners_created: 1,
                items_created: 1,
            }
        );
        let second = seed_base_data(&db, Some("Another_pass9")).await.unwrap();
        assert_eq!(second, SeedSummary::default());

        let owner = UserRepository::new(&db)
            .find_by_username("avante_admin")
            .await
            .unwrap()
            .unwrap();
        assert!(crate::password::PasswordService::verify("Another_pass9", &owner.password_hash).unwrap());

        let company = CompanyRepository::new(&db)
            .find_by_tax_id("12345678000199")
            .await
            .unwrap()
            .unwrap();
        let grants = FeatureGrantRepository::new(&db);
        assert!(grants.company_has_feature(company.id, WAREHOUSE_FEATURE).await.unwrap());
        assert_eq!(ItemTypeRepository::new(&db).list(company.id).await.unwrap().len(), 4);

        let permissions = PermissionRepository::new(&db)
            .effective_permissions(&owner)
            .await
            .unwrap();
        assert!(permissions.has(Permission::ManageCompanyFeatures));
        assert!(permissions.has(Permission::model(Resource::Employee, Action::Add)));
    }
}
