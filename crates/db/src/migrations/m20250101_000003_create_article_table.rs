//! Create article table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Article::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Article::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Article::Title).string_len(255).not_null())
                    .col(ColumnDef::new(Article::Slug).string_len(255).not_null())
                    .col(ColumnDef::new(Article::Description).text().not_null())
                    .col(ColumnDef::new(Article::Text).text().not_null())
                    .col(
                        ColumnDef::new(Article::Thumbnail)
                            .string_len(1024)
                            .not_null()
                            .default("default.jpg"),
                    )
                    .col(
                        ColumnDef::new(Article::Status)
                            .string_len(16)
                            .not_null()
                            .default("published"),
                    )
                    .col(ColumnDef::new(Article::CategoryId).string_len(32).not_null())
                    .col(ColumnDef::new(Article::AuthorId).string_len(32).not_null())
                    .col(ColumnDef::new(Article::UpdaterId).string_len(32))
                    .col(
                        ColumnDef::new(Article::Fixed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Article::Views)
                            .big_integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(Article::Views).gte(0)),
                    )
                    .col(
                        ColumnDef::new(Article::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Article::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_article_category")
                            .from(Article::Table, Article::CategoryId)
                            .to(Category::Table, Category::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_article_author")
                            .from(Article::Table, Article::AuthorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_article_updater")
                            .from(Article::Table, Article::UpdaterId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: slug
        manager
            .create_index(
                Index::create()
                    .name("idx_article_slug")
                    .table(Article::Table)
                    .col(Article::Slug)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: default listing order (pinned first, newest first) within a status
        manager
            .create_index(
                Index::create()
                    .name("idx_article_fixed_created_status")
                    .table(Article::Table)
                    .col((Article::Fixed, IndexOrder::Desc))
                    .col((Article::CreatedAt, IndexOrder::Desc))
                    .col(Article::Status)
                    .to_owned(),
            )
            .await?;

        // Index: category_id (category listings)
        manager
            .create_index(
                Index::create()
                    .name("idx_article_category_id")
                    .table(Article::Table)
                    .col(Article::CategoryId)
                    .to_owned(),
            )
            .await?;

        // Index: author_id (author listings)
        manager
            .create_index(
                Index::create()
                    .name("idx_article_author_id")
                    .table(Article::Table)
                    .col(Article::AuthorId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Article::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Article {
    Table,
    Id,
    Title,
    Slug,
    Description,
    Text,
    Thumbnail,
    Status,
    CategoryId,
    AuthorId,
    UpdaterId,
    Fixed,
    Views,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Category {
    Table,
    Id,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
