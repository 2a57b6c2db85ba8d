//! Initial schema migration - creates all tables from scratch.
//!
//! - `categories`: spending categories, unique per `(owner_user_id, name)`
//! - `limits`: monthly limits, unique per `(category_id, owner_user_id,
//!   month, year)` so that setting a limit twice replaces the first
//! - `expenses`: append-only expense rows

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Categories {
    Table,
    Id,
    OwnerUserId,
    Name,
    CreatedAt,
}

#[derive(Iden)]
enum Limits {
    Table,
    Id,
    CategoryId,
    OwnerUserId,
    Amount,
    Month,
    Year,
    CreatedAt,
}

#[derive(Iden)]
enum Expenses {
    Table,
    Id,
    CategoryId,
    OwnerUserId,
    Amount,
    Date,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Categories::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Categories::OwnerUserId).string().not_null())
                    .col(ColumnDef::new(Categories::Name).string().not_null())
                    .col(
                        ColumnDef::new(Categories::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-categories-owner_user_id-name-unique")
                    .table(Categories::Table)
                    .col(Categories::OwnerUserId)
                    .col(Categories::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Limits::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Limits::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Limits::CategoryId).string().not_null())
                    .col(ColumnDef::new(Limits::OwnerUserId).string().not_null())
                    .col(ColumnDef::new(Limits::Amount).double().not_null())
                    .col(ColumnDef::new(Limits::Month).integer().not_null())
                    .col(ColumnDef::new(Limits::Year).integer().not_null())
                    .col(
                        ColumnDef::new(Limits::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-limits-category_id")
                            .from(Limits::Table, Limits::CategoryId)
                            .to(Categories::Table, Categories::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-limits-period-unique")
                    .table(Limits::Table)
                    .col(Limits::CategoryId)
                    .col(Limits::OwnerUserId)
                    .col(Limits::Month)
                    .col(Limits::Year)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Expenses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Expenses::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Expenses::CategoryId).string().not_null())
                    .col(ColumnDef::new(Expenses::OwnerUserId).string().not_null())
                    .col(ColumnDef::new(Expenses::Amount).double().not_null())
                    .col(ColumnDef::new(Expenses::Date).date().not_null())
                    .col(
                        ColumnDef::new(Expenses::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expenses-category_id")
                            .from(Expenses::Table, Expenses::CategoryId)
                            .to(Categories::Table, Categories::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expenses-category_id-date")
                    .table(Expenses::Table)
                    .col(Expenses::CategoryId)
                    .col(Expenses::Date)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Expenses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Limits::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await
    }
}
