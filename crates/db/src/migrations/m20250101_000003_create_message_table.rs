//! Create `message` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Message::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Message::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Message::FromAccount).string_len(64).not_null())
                    .col(ColumnDef::new(Message::ToAccount).string_len(64).not_null())
                    .col(ColumnDef::new(Message::Content).text().not_null())
                    .col(
                        ColumnDef::new(Message::ContentType)
                            .small_integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(Message::MessageType).small_integer().not_null())
                    .col(ColumnDef::new(Message::Url).string_len(1024))
                    .col(
                        ColumnDef::new(Message::IsRead)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Message::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Composite index for direct conversation lookup and mark-as-read
        manager
            .create_index(
                Index::create()
                    .name("idx_message_conversation")
                    .table(Message::Table)
                    .col(Message::FromAccount)
                    .col(Message::ToAccount)
                    .col(Message::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Index: group history by recipient
        manager
            .create_index(
                Index::create()
                    .name("idx_message_recipient_type")
                    .table(Message::Table)
                    .col(Message::ToAccount)
                    .col(Message::MessageType)
                    .col(Message::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Message::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Message {
    Table,
    Id,
    FromAccount,
    ToAccount,
    Content,
    ContentType,
    MessageType,
    Url,
    IsRead,
    CreatedAt,
}
