//! Audit trail of delivery attempts.

use std::{fmt, sync::OnceLock};

use chrono::{DateTime, Duration, Utc};
use entity::{message_log, prelude::MessageLog, result_code::ResultCode};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use tracing::{debug, warn};

use crate::{codec, email::Email, queue::QueuedMessage};

/// A stored log entry together with its lazily decoded email.
#[derive(Clone, Debug)]
pub struct LoggedMessage {
    model: message_log::Model,
    email: OnceLock<Option<Email>>,
}

impl LoggedMessage {
    pub fn new(model: message_log::Model) -> Self {
        Self {
            model,
            email: OnceLock::new(),
        }
    }

    pub fn model(&self) -> &message_log::Model {
        &self.model
    }

    pub fn message_id(&self) -> Option<&str> {
        self.model.message_id.as_deref()
    }

    pub fn result(&self) -> ResultCode {
        self.model.result
    }

    /// `None` when no payload was kept or it cannot be read.
    pub fn email(&self) -> Option<&Email> {
        self.email
            .get_or_init(|| self.model.payload.as_deref().and_then(codec::decode))
            .as_ref()
    }

    pub fn subject(&self) -> Option<&str> {
        self.email().map(|email| email.subject.as_str())
    }

    pub fn to_addresses(&self) -> Option<&[String]> {
        self.email().map(|email| email.to.as_slice())
    }
}

impl From<message_log::Model> for LoggedMessage {
    fn from(model: message_log::Model) -> Self {
        Self::new(model)
    }
}

impl fmt::Display for LoggedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.email() {
            Some(email) => write!(
                f,
                "On {}, \"{}\" to {}",
                self.model.when_attempted,
                email.subject,
                email.to.join(", ")
            ),
            None => write!(
                f,
                "On {}, \"{}\"",
                self.model.when_attempted,
                self.model.message_id.as_deref().unwrap_or_default()
            ),
        }
    }
}

/// Writes and prunes `message_log` rows.
#[derive(Clone, Debug)]
pub struct DeliveryLog {
    db: DatabaseConnection,
    log_message_data: bool,
}

impl DeliveryLog {
    /// With `log_message_data` off, entries keep only metadata and the
    /// payload column stays empty.
    pub fn new(db: DatabaseConnection, log_message_data: bool) -> Self {
        Self {
            db,
            log_message_data,
        }
    }

    /// Records one delivery attempt of `message`.
    pub async fn log(
        &self,
        message: &QueuedMessage,
        result: ResultCode,
        log_message: &str,
    ) -> Result<LoggedMessage, DbErr> {
        let message_id = message
            .email()
            .and_then(|email| email.headers.message_id())
            .map(str::to_owned);
        let payload = self
            .log_message_data
            .then(|| message.payload().to_owned());

        let model = message_log::ActiveModel {
            payload: Set(payload),
            message_id: Set(message_id),
            when_added: Set(message.when_added()),
            priority: Set(message.priority()),
            when_attempted: Set(Utc::now()),
            result: Set(result),
            log_message: Set(log_message.to_owned()),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        Ok(LoggedMessage::new(model))
    }

    /// Deletes entries attempted more than `days` ago whose result is in
    /// `result_codes`. Without explicit codes only successes are purged.
    ///
    /// A cut-off too far back to represent matches no entry.
    pub async fn purge_old_entries(
        &self,
        days: i64,
        result_codes: Option<&[ResultCode]>,
    ) -> Result<u64, DbErr> {
        let limit = Duration::try_days(days).and_then(|age| Utc::now().checked_sub_signed(age));

        match limit {
            Some(limit) => self.purge_entries_attempted_before(limit, result_codes).await,
            None => {
                warn!("log retention of {} days is out of range, nothing purged", days);
                Ok(0)
            }
        }
    }

    pub async fn purge_entries_attempted_before(
        &self,
        limit: DateTime<Utc>,
        result_codes: Option<&[ResultCode]>,
    ) -> Result<u64, DbErr> {
        let result_codes = result_codes.unwrap_or(&[ResultCode::Success]);

        let deleted = MessageLog::delete_many()
            .filter(message_log::Column::WhenAttempted.lt(limit))
            .filter(message_log::Column::Result.is_in(result_codes.iter().copied()))
            .exec(&self.db)
            .await?
            .rows_affected;
        debug!("{} log entries attempted before {} purged", deleted, limit);

        Ok(deleted)
    }

    pub async fn count(&self) -> Result<u64, DbErr> {
        MessageLog::find().count(&self.db).await
    }

    pub async fn entries(&self) -> Result<Vec<LoggedMessage>, DbErr> {
        let models = MessageLog::find()
            .order_by_asc(message_log::Column::Id)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(LoggedMessage::new).collect())
    }
}
