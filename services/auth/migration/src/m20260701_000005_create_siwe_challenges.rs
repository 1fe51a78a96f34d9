use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SiweChallenges::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SiweChallenges::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SiweChallenges::Address).string().not_null())
                    .col(
                        ColumnDef::new(SiweChallenges::Nonce)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(SiweChallenges::Message).text().not_null())
                    .col(
                        ColumnDef::new(SiweChallenges::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SiweChallenges::Verified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(SiweChallenges::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(SiweChallenges::Table)
                    .col(SiweChallenges::Address)
                    .col(SiweChallenges::Nonce)
                    .name("idx_siwe_challenges_address_nonce")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SiweChallenges::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum SiweChallenges {
    Table,
    Id,
    Address,
    Nonce,
    Message,
    ExpiresAt,
    Verified,
    CreatedAt,
}
