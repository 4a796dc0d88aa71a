//! The outbound queue.
//!
//! Tier changes are single set-based statements so that overlapping delivery
//! runs never lose each other's updates. Nothing here takes a lock; keeping
//! two runs off the same message is the caller's job.

use std::{fmt, sync::OnceLock};

use entity::{message, prelude::Message, priority::Priority};
use futures::{stream, Stream, StreamExt, TryStreamExt};
use sea_orm::{
    sea_query::Expr, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Select, TransactionTrait,
};
use tracing::{debug, warn};

use crate::{codec, email::Email};

/// A stored message together with its lazily decoded email.
#[derive(Clone, Debug)]
pub struct QueuedMessage {
    model: message::Model,
    email: OnceLock<Option<Email>>,
}

impl QueuedMessage {
    pub fn new(model: message::Model) -> Self {
        Self {
            model,
            email: OnceLock::new(),
        }
    }

    pub(crate) fn with_email(model: message::Model, email: Email) -> Self {
        Self {
            model,
            email: OnceLock::from(Some(email)),
        }
    }

    pub fn id(&self) -> i32 {
        self.model.id
    }

    pub fn priority(&self) -> Priority {
        self.model.priority
    }

    pub fn retry_count(&self) -> i32 {
        self.model.retry_count
    }

    pub fn when_added(&self) -> chrono::DateTime<chrono::Utc> {
        self.model.when_added
    }

    pub fn payload(&self) -> &str {
        &self.model.payload
    }

    pub fn model(&self) -> &message::Model {
        &self.model
    }

    /// The decoded email, or `None` if the payload is unreadable.
    pub fn email(&self) -> Option<&Email> {
        self.email
            .get_or_init(|| {
                let email = codec::decode(&self.model.payload);
                if email.is_none() {
                    warn!("message {} has an unreadable payload", self.model.id);
                }
                email
            })
            .as_ref()
    }

    /// Replaces the email in memory. The row itself is not touched.
    pub fn set_email(&mut self, email: Email) {
        self.model.payload = codec::encode(&email);
        self.email = OnceLock::from(Some(email));
    }

    pub fn subject(&self) -> &str {
        self.email().map_or("", |email| email.subject.as_str())
    }

    pub fn to_addresses(&self) -> &[String] {
        self.email()
            .map(|email| email.to.as_slice())
            .unwrap_or_default()
    }
}

impl From<message::Model> for QueuedMessage {
    fn from(model: message::Model) -> Self {
        Self::new(model)
    }
}

impl fmt::Display for QueuedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.email() {
            Some(email) => write!(
                f,
                "On {}, \"{}\" to {}",
                self.model.when_added,
                email.subject,
                email.to.join(", ")
            ),
            None => f.write_str("<Message repr unavailable>"),
        }
    }
}

/// Queue operations over the `message` table.
#[derive(Clone, Debug)]
pub struct Queue {
    db: DatabaseConnection,
    max_retries: Option<i32>,
}

impl Queue {
    /// `max_retries` caps how often [`Queue::retry_deferred`] picks a message
    /// up again; `None` means no cap.
    pub fn new(db: DatabaseConnection, max_retries: Option<i32>) -> Self {
        Self { db, max_retries }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn max_retries(&self) -> Option<i32> {
        self.max_retries
    }

    pub fn high_priority(&self) -> Select<Message> {
        by_priority(Priority::High)
    }

    pub fn medium_priority(&self) -> Select<Message> {
        by_priority(Priority::Medium)
    }

    pub fn low_priority(&self) -> Select<Message> {
        by_priority(Priority::Low)
    }

    pub fn non_deferred(&self) -> Select<Message> {
        ordered(Message::find().filter(message::Column::Priority.ne(Priority::Deferred)))
    }

    pub fn deferred(&self) -> Select<Message> {
        by_priority(Priority::Deferred)
    }

    /// High, then medium, then low messages. A tier is only read from the
    /// store once the one before it has been consumed.
    pub fn prioritize(&self) -> impl Stream<Item = Result<QueuedMessage, DbErr>> + '_ {
        stream::iter(Priority::ACTIVE)
            .then(move |priority| async move { by_priority(priority).all(&self.db).await })
            .map_ok(|batch| stream::iter(batch.into_iter().map(Ok::<_, DbErr>)))
            .try_flatten()
            .map_ok(QueuedMessage::new)
    }

    pub async fn count(&self) -> Result<u64, DbErr> {
        Message::find().count(&self.db).await
    }

    pub async fn count_deferred(&self) -> Result<u64, DbErr> {
        self.deferred().count(&self.db).await
    }

    /// Moves deferred messages still under the retry cap back to
    /// `new_priority`, bumping their retry count. Returns how many moved.
    ///
    /// `new_priority` must be an active tier; asking for `Deferred` moves
    /// nothing and leaves every retry count alone.
    pub async fn retry_deferred(&self, new_priority: Priority) -> Result<u64, DbErr> {
        if new_priority == Priority::Deferred {
            warn!("refusing to retry deferred messages at deferred priority");
            return Ok(0);
        }

        let mut update = Message::update_many()
            .col_expr(message::Column::Priority, Expr::value(new_priority))
            .col_expr(
                message::Column::RetryCount,
                Expr::col(message::Column::RetryCount).add(1),
            )
            .filter(message::Column::Priority.eq(Priority::Deferred));

        if let Some(max_retries) = self.max_retries {
            update = update.filter(message::Column::RetryCount.lt(max_retries));
        }

        let result = update.exec(&self.db).await?;
        debug!(
            "{} deferred message(s) requeued at {} priority",
            result.rows_affected,
            new_priority.label()
        );

        Ok(result.rows_affected)
    }

    /// Deletes every deferred message regardless of its retry count.
    ///
    /// The returned number is what the delete removed. A message deferred
    /// between the count and the delete is removed too.
    pub async fn purge_deferred(&self) -> Result<u64, DbErr> {
        let txn = self.db.begin().await?;

        let counted = self.deferred().count(&txn).await?;
        let deleted = Message::delete_many()
            .filter(message::Column::Priority.eq(Priority::Deferred))
            .exec(&txn)
            .await?
            .rows_affected;

        txn.commit().await?;

        if deleted != counted {
            debug!("counted {} deferred message(s), deleted {}", counted, deleted);
        }

        Ok(deleted)
    }

    /// Marks one message deferred. A message that is already gone is left
    /// alone and `false` is returned.
    pub async fn defer(&self, msg: &mut QueuedMessage) -> Result<bool, DbErr> {
        let result = Message::update_many()
            .col_expr(message::Column::Priority, Expr::value(Priority::Deferred))
            .filter(message::Column::Id.eq(msg.id()))
            .exec(&self.db)
            .await?;
        msg.model.priority = Priority::Deferred;

        Ok(result.rows_affected > 0)
    }

    /// Removes a message once delivery is settled. Deleting an already
    /// removed message is not an error.
    pub async fn remove(&self, msg: &QueuedMessage) -> Result<bool, DbErr> {
        let result = Message::delete_by_id(msg.id()).exec(&self.db).await?;

        Ok(result.rows_affected > 0)
    }
}

fn by_priority(priority: Priority) -> Select<Message> {
    ordered(Message::find().filter(message::Column::Priority.eq(priority)))
}

fn ordered(select: Select<Message>) -> Select<Message> {
    select
        .order_by_asc(message::Column::Priority)
        .order_by_asc(message::Column::WhenAdded)
        .order_by_asc(message::Column::Id)
}
