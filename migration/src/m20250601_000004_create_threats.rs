use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Threats::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Threats::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Threats::OrgId).integer().not_null())
                    .col(ColumnDef::new(Threats::CrawledPageId).integer())
                    .col(
                        ColumnDef::new(Threats::IndicatorType)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Threats::Indicator).text().not_null())
                    .col(
                        ColumnDef::new(Threats::Severity)
                            .string_len(20)
                            .not_null()
                            .default("low"),
                    )
                    .col(ColumnDef::new(Threats::Evidence).text().not_null())
                    .col(
                        ColumnDef::new(Threats::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_threats_org")
                            .from(Threats::Table, Threats::OrgId)
                            .to(Orgs::Table, Orgs::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_threats_page")
                            .from(Threats::Table, Threats::CrawledPageId)
                            .to(CrawledPages::Table, CrawledPages::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_threats_org")
                    .table(Threats::Table)
                    .col(Threats::OrgId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_threats_page")
                    .table(Threats::Table)
                    .col(Threats::CrawledPageId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Threats::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Threats {
    Table,
    Id,
    OrgId,
    CrawledPageId,
    IndicatorType,
    Indicator,
    Severity,
    Evidence,
    CreatedAt,
}

#[derive(DeriveIden)]
enum CrawledPages {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Orgs {
    Table,
    Id,
}
