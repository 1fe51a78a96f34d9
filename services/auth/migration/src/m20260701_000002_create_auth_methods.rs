use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AuthMethods::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AuthMethods::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AuthMethods::UserId).uuid().not_null())
                    .col(ColumnDef::new(AuthMethods::Kind).string().not_null())
                    .col(ColumnDef::new(AuthMethods::Provider).string())
                    .col(ColumnDef::new(AuthMethods::Identifier).string().not_null())
                    .col(
                        ColumnDef::new(AuthMethods::Verified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(AuthMethods::IsPrimary)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(AuthMethods::LastUsedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(AuthMethods::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(AuthMethods::Table, AuthMethods::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(AuthMethods::Table)
                    .col(AuthMethods::Identifier)
                    .col(AuthMethods::Kind)
                    .unique()
                    .name("idx_auth_methods_identifier_kind")
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(AuthMethods::Table)
                    .col(AuthMethods::UserId)
                    .name("idx_auth_methods_user_id")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AuthMethods::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum AuthMethods {
    Table,
    Id,
    UserId,
    Kind,
    Provider,
    Identifier,
    Verified,
    IsPrimary,
    LastUsedAt,
    CreatedAt,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}
