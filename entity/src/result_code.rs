use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::Deserialize;

/// Outcome of one delivery attempt.
#[derive(Clone, Copy, PartialEq, Eq, Debug, EnumIter, DeriveActiveEnum, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(1))")]
#[serde(rename_all = "snake_case")]
pub enum ResultCode {
    #[sea_orm(string_value = "1")]
    Success,
    #[sea_orm(string_value = "2")]
    DontSend,
    #[sea_orm(string_value = "3")]
    Failure,
}

