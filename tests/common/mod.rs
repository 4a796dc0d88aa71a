#![allow(dead_code)]

use chrono::{DateTime, Utc};
use entity::message_log;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use sql_mail_queue::{
    make_message, NewEmail, Priority, QueuedMessage, ResultCode, SuppressionList,
};
use tracing::Level;

pub async fn setup() -> DatabaseConnection {
    // Several tests in one binary call this; only the first subscriber sticks.
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::TRACE)
        .with_test_writer()
        .try_init();

    sql_mail_queue::connect("sqlite::memory:")
        .await
        .expect("unable to open test database")
}

pub async fn enqueue(
    db: &DatabaseConnection,
    subject: &str,
    to: &[&str],
    priority: Option<Priority>,
) -> QueuedMessage {
    let suppression = SuppressionList::load(db).await.unwrap();
    make_message(
        NewEmail {
            subject: subject.to_string(),
            body: "Body".to_string(),
            from_email: Some("sender@example.com".to_string()),
            to: Some(to.iter().map(|a| a.to_string()).collect()),
            ..Default::default()
        },
        priority,
        &suppression,
    )
    .save(db)
    .await
    .unwrap()
}

/// Inserts a log row directly so its attempt time can lie in the past.
pub async fn old_log_entry(
    db: &DatabaseConnection,
    result: ResultCode,
    when_attempted: DateTime<Utc>,
) -> message_log::Model {
    message_log::ActiveModel {
        payload: Set(None),
        message_id: Set(None),
        when_added: Set(when_attempted),
        priority: Set(Priority::Medium),
        when_attempted: Set(when_attempted),
        result: Set(result),
        log_message: Set(String::new()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}
