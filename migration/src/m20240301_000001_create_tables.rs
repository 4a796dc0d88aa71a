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
                            .integer()
                            .not_null()
                            .primary_key()
                            .auto_increment(),
                    )
                    .col(ColumnDef::new(Message::Payload).text().not_null())
                    .col(
                        ColumnDef::new(Message::WhenAdded)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Message::Priority)
                            .small_integer()
                            .not_null()
                            .default(2),
                    )
                    .col(
                        ColumnDef::new(Message::RetryCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .clone(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_message_priority")
                    .if_not_exists()
                    .table(Message::Table)
                    .col(Message::Priority)
                    .clone(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DontSendEntry::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DontSendEntry::Id)
                            .integer()
                            .not_null()
                            .primary_key()
                            .auto_increment(),
                    )
                    .col(
                        ColumnDef::new(DontSendEntry::ToAddress)
                            .string_len(254)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DontSendEntry::WhenAdded)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .clone(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MessageLog::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MessageLog::Id)
                            .integer()
                            .not_null()
                            .primary_key()
                            .auto_increment(),
                    )
                    .col(ColumnDef::new(MessageLog::Payload).text())
                    .col(ColumnDef::new(MessageLog::MessageId).text())
                    .col(
                        ColumnDef::new(MessageLog::WhenAdded)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(MessageLog::Priority).small_integer().not_null())
                    .col(
                        ColumnDef::new(MessageLog::WhenAttempted)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(MessageLog::Result).string_len(1).not_null())
                    .col(ColumnDef::new(MessageLog::LogMessage).text().not_null())
                    .clone(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_message_log_when_added")
                    .if_not_exists()
                    .table(MessageLog::Table)
                    .col(MessageLog::WhenAdded)
                    .clone(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_message_log_priority")
                    .if_not_exists()
                    .table(MessageLog::Table)
                    .col(MessageLog::Priority)
                    .clone(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MessageLog::Table).clone())
            .await?;

        manager
            .drop_table(Table::drop().table(DontSendEntry::Table).clone())
            .await?;

        manager
            .drop_table(Table::drop().table(Message::Table).clone())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Message {
    Table,
    Id,
    Payload,
    WhenAdded,
    Priority,
    RetryCount,
}

#[derive(DeriveIden)]
enum DontSendEntry {
    Table,
    Id,
    ToAddress,
    WhenAdded,
}

#[derive(DeriveIden)]
enum MessageLog {
    Table,
    Id,
    Payload,
    MessageId,
    WhenAdded,
    Priority,
    WhenAttempted,
    Result,
    LogMessage,
}
