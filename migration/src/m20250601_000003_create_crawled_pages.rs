use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CrawledPages::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CrawledPages::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CrawledPages::OrgId).integer().not_null())
                    .col(ColumnDef::new(CrawledPages::BatchId).integer())
                    .col(ColumnDef::new(CrawledPages::Url).text().not_null())
                    .col(ColumnDef::new(CrawledPages::StatusCode).integer())
                    .col(ColumnDef::new(CrawledPages::Content).text().not_null())
                    .col(
                        ColumnDef::new(CrawledPages::ContentSnippet)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CrawledPages::FetchedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_crawled_pages_org")
                            .from(CrawledPages::Table, CrawledPages::OrgId)
                            .to(Orgs::Table, Orgs::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_crawled_pages_batch")
                            .from(CrawledPages::Table, CrawledPages::BatchId)
                            .to(CrawlBatches::Table, CrawlBatches::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_crawled_pages_org")
                    .table(CrawledPages::Table)
                    .col(CrawledPages::OrgId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CrawledPages::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CrawledPages {
    Table,
    Id,
    OrgId,
    BatchId,
    Url,
    StatusCode,
    Content,
    ContentSnippet,
    FetchedAt,
}

#[derive(DeriveIden)]
enum CrawlBatches {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Orgs {
    Table,
    Id,
}
