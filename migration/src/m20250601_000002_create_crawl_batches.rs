use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CrawlBatches::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CrawlBatches::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CrawlBatches::OrgId).integer().not_null())
                    .col(ColumnDef::new(CrawlBatches::Label).text())
                    .col(
                        ColumnDef::new(CrawlBatches::Status)
                            .string_len(50)
                            .not_null()
                            .default("created"),
                    )
                    .col(
                        ColumnDef::new(CrawlBatches::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_crawl_batches_org")
                            .from(CrawlBatches::Table, CrawlBatches::OrgId)
                            .to(Orgs::Table, Orgs::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_crawl_batches_org")
                    .table(CrawlBatches::Table)
                    .col(CrawlBatches::OrgId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CrawlBatches::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CrawlBatches {
    Table,
    Id,
    OrgId,
    Label,
    Status,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Orgs {
    Table,
    Id,
}
