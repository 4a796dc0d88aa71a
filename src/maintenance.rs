//! One pass of queue upkeep driven by the `[maintenance]` settings.

use sea_orm::DatabaseConnection;
use tracing::info;

use crate::{delivery_log::DeliveryLog, error::Result, queue::Queue, settings::Settings};

/// What a maintenance pass did. Steps that were not configured stay `None`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    pub retried: Option<u64>,
    pub purged_deferred: Option<u64>,
    pub purged_log_entries: Option<u64>,
}

pub async fn run(settings: &Settings, db: &DatabaseConnection) -> Result<MaintenanceReport> {
    let maintenance = settings.get_maintenance();
    let queue = Queue::new(db.clone(), settings.get_max_retries());
    let log = DeliveryLog::new(db.clone(), settings.get_log_message_data());
    let mut report = MaintenanceReport::default();

    if maintenance.retry_deferred {
        let count = queue.retry_deferred(maintenance.retry_priority).await?;
        info!("{} message(s) retried", count);
        report.retried = Some(count);
    }

    if maintenance.purge_deferred {
        let count = queue.purge_deferred().await?;
        info!("{} message(s) purged", count);
        report.purged_deferred = Some(count);
    }

    if let Some(days) = maintenance.log_retention_days {
        let count = log
            .purge_old_entries(days, maintenance.purge_result_codes.as_deref())
            .await?;
        info!("{} log entries deleted", count);
        report.purged_log_entries = Some(count);
    }

    Ok(report)
}
