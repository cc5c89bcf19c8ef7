//! Database migrations for the Stockroom API.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2026_02_01_000001_create_companies;
mod m2026_02_01_000002_create_users;
mod m2026_02_01_000003_create_employees;
mod m2026_02_01_000004_create_features;
mod m2026_02_01_000005_create_groups;
mod m2026_02_10_000001_create_warehouse;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2026_02_01_000001_create_companies::Migration),
            Box::new(m2026_02_01_000002_create_users::Migration),
            Box::new(m2026_02_01_000003_create_employees::Migration),
            Box::new(m2026_02_01_000004_create_features::Migration),
            Box::new(m2026_02_01_000005_create_groups::Migration),
            Box::new(m2026_02_10_000001_create_warehouse::Migration),
        ]
    }
}
