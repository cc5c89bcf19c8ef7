//! Migration to create the feature catalog and per-company grants.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Features::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Features::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Features::Code)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Features::Name).string_len(120).not_null())
                    .col(
                        ColumnDef::new(Features::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Features::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CompanyFeatures::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CompanyFeatures::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CompanyFeatures::CompanyId).uuid().not_null())
                    .col(ColumnDef::new(CompanyFeatures::FeatureId).uuid().not_null())
                    .col(
                        ColumnDef::new(CompanyFeatures::Enabled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(CompanyFeatures::GrantedBy).uuid().null())
                    .col(
                        ColumnDef::new(CompanyFeatures::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(CompanyFeatures::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_company_features_company_id")
                            .from(CompanyFeatures::Table, CompanyFeatures::CompanyId)
                            .to(Companies::Table, Companies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_company_features_feature_id")
                            .from(CompanyFeatures::Table, CompanyFeatures::FeatureId)
                            .to(Features::Table, Features::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_company_features_granted_by")
                            .from(CompanyFeatures::Table, CompanyFeatures::GrantedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // One grant per (company, feature)
        manager
            .create_index(
                Index::create()
                    .name("idx_company_features_company_feature")
                    .table(CompanyFeatures::Table)
                    .col(CompanyFeatures::CompanyId)
                    .col(CompanyFeatures::FeatureId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_company_features_company_feature")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(CompanyFeatures::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Features::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Features {
    Table,
    Id,
    Code,
    Name,
    IsActive,
    CreatedAt,
}

#[derive(DeriveIden)]
enum CompanyFeatures {
    Table,
    Id,
    CompanyId,
    FeatureId,
    Enabled,
    GrantedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Companies {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}
