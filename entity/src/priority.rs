use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::Deserialize;

/// Delivery tier of a queued message. Lower values are sent first.
#[derive(
    Clone, Copy, Default, PartialEq, Eq, Debug, EnumIter, DeriveActiveEnum, Deserialize,
)]
#[sea_orm(rs_type = "i16", db_type = "SmallInteger")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High = 1,
    #[default]
    Medium = 2,
    Low = 3,
    Deferred = 4,
}

impl Priority {
    /// Tiers a delivery run pulls from, in the order it should pull them.
    pub const ACTIVE: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    pub fn label(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
            Priority::Deferred => "deferred",
        }
    }
}
