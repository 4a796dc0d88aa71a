use sea_orm::entity::prelude::*;

use super::{priority::Priority, result_code::ResultCode};

/// Snapshot of a message taken when a delivery was attempted. There is no
/// foreign key to `message`: the log outlives the queued row.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "message_log")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(column_type = "Text", nullable)]
    pub payload: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub message_id: Option<String>,
    pub when_added: DateTimeUtc,
    pub priority: Priority,
    pub when_attempted: DateTimeUtc,
    pub result: ResultCode,
    #[sea_orm(column_type = "Text")]
    pub log_message: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
