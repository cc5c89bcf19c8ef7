//! Migration to create the warehouse tables.
//!
//! Item types and manufacturers are unique per company by name. Items
//! reference both; units reference an item. Monetary values are stored
//! as integer cents.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ItemTypes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ItemTypes::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(ItemTypes::CompanyId).uuid().not_null())
                    .col(ColumnDef::new(ItemTypes::Name).string_len(50).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_item_types_company_id")
                            .from(ItemTypes::Table, ItemTypes::CompanyId)
                            .to(Companies::Table, Companies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_item_types_company_name")
                    .table(ItemTypes::Table)
                    .col(ItemTypes::CompanyId)
                    .col(ItemTypes::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Manufacturers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Manufacturers::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Manufacturers::CompanyId).uuid().not_null())
                    .col(
                        ColumnDef::new(Manufacturers::Name)
                            .string_len(100)
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_manufacturers_company_id")
                            .from(Manufacturers::Table, Manufacturers::CompanyId)
                            .to(Companies::Table, Companies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_manufacturers_company_name")
                    .table(Manufacturers::Table)
                    .col(Manufacturers::CompanyId)
                    .col(Manufacturers::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Items::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Items::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Items::CompanyId).uuid().not_null())
                    .col(ColumnDef::new(Items::ItemTypeId).uuid().not_null())
                    .col(ColumnDef::new(Items::ManufacturerId).uuid().not_null())
                    .col(ColumnDef::new(Items::Name).string_len(100).not_null())
                    .col(ColumnDef::new(Items::Model).string_len(100).not_null())
                    .col(
                        ColumnDef::new(Items::Quantity)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Items::MarketValueCents)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Items::Description).text().null())
                    .col(
                        ColumnDef::new(Items::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Items::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_items_company_id")
                            .from(Items::Table, Items::CompanyId)
                            .to(Companies::Table, Companies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_items_item_type_id")
                            .from(Items::Table, Items::ItemTypeId)
                            .to(ItemTypes::Table, ItemTypes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_items_manufacturer_id")
                            .from(Items::Table, Items::ManufacturerId)
                            .to(Manufacturers::Table, Manufacturers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Keyset pagination over (company_id, created_at, id)
        manager
            .create_index(
                Index::create()
                    .name("idx_items_company_created")
                    .table(Items::Table)
                    .col(Items::CompanyId)
                    .col(Items::CreatedAt)
                    .col(Items::Id)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ItemUnits::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ItemUnits::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(ItemUnits::ItemId).uuid().not_null())
                    .col(
                        ColumnDef::new(ItemUnits::State)
                            .string_len(20)
                            .not_null()
                            .default("new"),
                    )
                    .col(ColumnDef::new(ItemUnits::Remark).text().null())
                    .col(
                        ColumnDef::new(ItemUnits::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_item_units_item_id")
                            .from(ItemUnits::Table, ItemUnits::ItemId)
                            .to(Items::Table, Items::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ItemUnits::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_items_company_created").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Items::Table).to_owned())
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_manufacturers_company_name")
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(Manufacturers::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_item_types_company_name").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ItemTypes::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ItemTypes {
    Table,
    Id,
    CompanyId,
    Name,
}

#[derive(DeriveIden)]
enum Manufacturers {
    Table,
    Id,
    CompanyId,
    Name,
}

#[derive(DeriveIden)]
enum Items {
    Table,
    Id,
    CompanyId,
    ItemTypeId,
    ManufacturerId,
    Name,
    Model,
    Quantity,
    MarketValueCents,
    Description,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ItemUnits {
    Table,
    Id,
    ItemId,
    State,
    Remark,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Companies {
    Table,
    Id,
}
