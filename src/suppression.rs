//! The don't-send list: addresses that must never be queued as recipients.

use std::collections::HashSet;

use chrono::Utc;
use entity::{dont_send_entry, prelude::DontSendEntry};
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, EntityTrait, QuerySelect, Set};
use tracing::info;

/// Snapshot of the don't-send list, keyed by lower-cased address.
#[derive(Clone, Debug, Default)]
pub struct SuppressionList {
    addresses: HashSet<String>,
}

impl SuppressionList {
    pub async fn load<C: ConnectionTrait>(db: &C) -> Result<Self, DbErr> {
        let addresses: Vec<String> = DontSendEntry::find()
            .select_only()
            .column(dont_send_entry::Column::ToAddress)
            .into_tuple::<String>()
            .all(db)
            .await?;

        Ok(addresses.into_iter().collect())
    }

    pub fn is_suppressed(&self, address: &str) -> bool {
        self.addresses.contains(&address.to_lowercase())
    }

    /// Drops suppressed addresses, keeping order and duplicates of the rest.
    ///
    /// `None` stays `None` so callers can tell a missing list from an empty one.
    pub fn filter_recipients(&self, recipients: Option<Vec<String>>) -> Option<Vec<String>> {
        recipients.map(|list| {
            list.into_iter()
                .filter(|address| {
                    let suppressed = self.is_suppressed(address);
                    if suppressed {
                        info!("skipping email to {} as on don't send list", address);
                    }
                    !suppressed
                })
                .collect()
        })
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    /// Store a new entry. Duplicates are not rejected.
    pub async fn add<C: ConnectionTrait>(
        db: &C,
        address: &str,
    ) -> Result<dont_send_entry::Model, DbErr> {
        dont_send_entry::ActiveModel {
            to_address: Set(address.to_owned()),
            when_added: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    /// Membership check against the current store contents, folded the
    /// same way as [`SuppressionList::is_suppressed`].
    pub async fn has_address<C: ConnectionTrait>(db: &C, address: &str) -> Result<bool, DbErr> {
        Ok(Self::load(db).await?.is_suppressed(address))
    }
}

impl<S: AsRef<str>> FromIterator<S> for SuppressionList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            addresses: iter
                .into_iter()
                .map(|address| address.as_ref().to_lowercase())
                .collect(),
        }
    }
}
