//! Building messages for the queue.

use chrono::{DateTime, Utc};
use entity::{message, priority::Priority};
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, Set};

use crate::{
    codec,
    email::{Attachment, Email, Headers},
    queue::QueuedMessage,
    suppression::SuppressionList,
};

/// Fields of a simple mail. `to` and `bcc` are checked against the
/// don't-send list; `None` means the caller gave no list at all.
#[derive(Clone, Debug, Default)]
pub struct NewEmail {
    pub subject: String,
    pub body: String,
    pub from_email: Option<String>,
    pub to: Option<Vec<String>>,
    pub bcc: Option<Vec<String>>,
    pub attachments: Vec<Attachment>,
    pub headers: Headers,
}

/// A message that has been built but not queued yet.
///
/// Nothing is written until [`PendingMessage::save`] is called.
#[derive(Clone, Debug)]
pub struct PendingMessage {
    email: Email,
    priority: Priority,
    when_added: DateTime<Utc>,
}

/// Builds a message from `fields`, dropping suppressed recipients.
/// `priority` defaults to medium.
pub fn make_message(
    fields: NewEmail,
    priority: Option<Priority>,
    suppression: &SuppressionList,
) -> PendingMessage {
    let to = suppression.filter_recipients(fields.to);
    let bcc = suppression.filter_recipients(fields.bcc);

    let email = Email {
        subject: fields.subject,
        body: fields.body,
        from_email: fields.from_email,
        to: to.unwrap_or_default(),
        bcc: bcc.unwrap_or_default(),
        attachments: fields.attachments,
        headers: fields.headers,
        ..Default::default()
    };

    PendingMessage::from_email(email, priority)
}

impl PendingMessage {
    /// Queue an already built email as is. No recipient filtering is done.
    pub fn from_email(email: Email, priority: Option<Priority>) -> Self {
        Self {
            email,
            priority: priority.unwrap_or_default(),
            when_added: Utc::now(),
        }
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn when_added(&self) -> DateTime<Utc> {
        self.when_added
    }

    pub async fn save<C: ConnectionTrait>(self, db: &C) -> Result<QueuedMessage, DbErr> {
        let model = message::ActiveModel {
            payload: Set(codec::encode(&self.email)),
            when_added: Set(self.when_added),
            priority: Set(self.priority),
            retry_count: Set(0),
            ..Default::default()
        }
        .insert(db)
        .await?;

        Ok(QueuedMessage::with_email(model, self.email))
    }
}
