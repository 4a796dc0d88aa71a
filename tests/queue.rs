mod common;

use std::collections::HashSet;

use entity::message;
use futures::TryStreamExt;
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, Set};
use sql_mail_queue::{Priority, Queue, QueuedMessage, SuppressionList};

async fn reload(queue: &Queue, id: i32) -> Option<message::Model> {
    entity::prelude::Message::find_by_id(id)
        .one(queue.connection())
        .await
        .unwrap()
}

#[tokio::test]
async fn deferred_and_non_deferred_partition_the_queue() {
    let db = common::setup().await;
    let queue = Queue::new(db.clone(), None);

    common::enqueue(&db, "high", &["a@example.com"], Some(Priority::High)).await;
    common::enqueue(&db, "medium", &["a@example.com"], None).await;
    common::enqueue(&db, "low", &["a@example.com"], Some(Priority::Low)).await;
    let mut failed = common::enqueue(&db, "failed", &["a@example.com"], None).await;
    common::enqueue(&db, "parked", &["a@example.com"], Some(Priority::Deferred)).await;
    assert!(queue.defer(&mut failed).await.unwrap());

    let active: HashSet<i32> = queue
        .non_deferred()
        .all(&db)
        .await
        .unwrap()
        .iter()
        .map(|m| m.id)
        .collect();
    let deferred: HashSet<i32> = queue
        .deferred()
        .all(&db)
        .await
        .unwrap()
        .iter()
        .map(|m| m.id)
        .collect();

    assert_eq!(active.len(), 3);
    assert_eq!(deferred.len(), 2);
    assert!(active.is_disjoint(&deferred));
    assert!(deferred.contains(&failed.id()));
    assert_eq!(queue.count().await.unwrap(), 5);
    assert_eq!(queue.count_deferred().await.unwrap(), 2);

    assert_eq!(queue.high_priority().count(&db).await.unwrap(), 1);
    assert_eq!(queue.medium_priority().count(&db).await.unwrap(), 1);
    assert_eq!(queue.low_priority().count(&db).await.unwrap(), 1);
}

#[tokio::test]
async fn retry_without_limit_requeues_every_deferred_message() {
    let db = common::setup().await;
    let queue = Queue::new(db.clone(), None);

    let mut msg = common::enqueue(&db, "Subject", &["a@example.com"], None).await;
    assert_eq!(msg.retry_count(), 0);

    for attempt in 1..=5 {
        queue.defer(&mut msg).await.unwrap();
        assert_eq!(queue.retry_deferred(Priority::Medium).await.unwrap(), 1);

        let stored = reload(&queue, msg.id()).await.unwrap();
        assert_eq!(stored.retry_count, attempt);
        assert_eq!(stored.priority, Priority::Medium);
    }

    // Nothing deferred, nothing to do.
    assert_eq!(queue.retry_deferred(Priority::Medium).await.unwrap(), 0);
}

#[tokio::test]
async fn retry_stops_at_max_retries() {
    let db = common::setup().await;
    let queue = Queue::new(db.clone(), Some(2));

    let mut msg = common::enqueue(&db, "Subject", &["a@example.com"], None).await;
    queue.defer(&mut msg).await.unwrap();

    for n in 0..4 {
        let retried = queue.retry_deferred(Priority::Medium).await.unwrap();
        let stored = reload(&queue, msg.id()).await.unwrap();

        if n < 2 {
            assert_eq!(retried, 1);
            assert_eq!(stored.retry_count, n + 1);
            assert_eq!(stored.priority, Priority::Medium);
            queue.defer(&mut msg).await.unwrap();
        } else {
            assert_eq!(retried, 0);
            assert_eq!(stored.retry_count, 2);
            assert_eq!(stored.priority, Priority::Deferred);
        }
    }

    assert_eq!(queue.count_deferred().await.unwrap(), 1);
}

#[tokio::test]
async fn zero_max_retries_never_requeues() {
    let db = common::setup().await;
    let queue = Queue::new(db.clone(), Some(0));

    let mut msg = common::enqueue(&db, "Subject", &["a@example.com"], None).await;
    queue.defer(&mut msg).await.unwrap();

    assert_eq!(queue.retry_deferred(Priority::Medium).await.unwrap(), 0);

    let stored = reload(&queue, msg.id()).await.unwrap();
    assert_eq!(stored.retry_count, 0);
    assert_eq!(stored.priority, Priority::Deferred);
}

#[tokio::test]
async fn retry_moves_messages_to_the_requested_tier() {
    let db = common::setup().await;
    let queue = Queue::new(db.clone(), None);

    let mut msg = common::enqueue(&db, "Subject", &["a@example.com"], Some(Priority::Low)).await;
    queue.defer(&mut msg).await.unwrap();
    assert_eq!(msg.priority(), Priority::Deferred);

    queue.retry_deferred(Priority::High).await.unwrap();

    assert_eq!(queue.high_priority().count(&db).await.unwrap(), 1);
    assert_eq!(queue.low_priority().count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn purge_deferred_removes_only_deferred_messages() {
    let db = common::setup().await;
    let queue = Queue::new(db.clone(), Some(1));

    let mut exhausted = common::enqueue(&db, "exhausted", &["a@example.com"], None).await;
    queue.defer(&mut exhausted).await.unwrap();
    queue.retry_deferred(Priority::Medium).await.unwrap();
    queue.defer(&mut exhausted).await.unwrap();

    let mut fresh = common::enqueue(&db, "fresh", &["a@example.com"], None).await;
    queue.defer(&mut fresh).await.unwrap();

    let pending = common::enqueue(&db, "pending", &["a@example.com"], Some(Priority::High)).await;

    assert_eq!(queue.purge_deferred().await.unwrap(), 2);
    assert_eq!(queue.count().await.unwrap(), 1);
    assert!(reload(&queue, pending.id()).await.is_some());

    assert_eq!(queue.purge_deferred().await.unwrap(), 0);
}

#[tokio::test]
async fn deferring_a_removed_message_is_a_no_op() {
    let db = common::setup().await;
    let queue = Queue::new(db.clone(), None);

    let mut msg = common::enqueue(&db, "Subject", &["a@example.com"], None).await;

    assert!(queue.remove(&msg).await.unwrap());
    assert!(!queue.remove(&msg).await.unwrap());
    assert!(!queue.defer(&mut msg).await.unwrap());
    assert_eq!(queue.count().await.unwrap(), 0);
}

#[tokio::test]
async fn retrying_into_the_deferred_tier_changes_nothing() {
    let db = common::setup().await;
    let queue = Queue::new(db.clone(), Some(3));

    let mut msg = common::enqueue(&db, "Subject", &["a@example.com"], None).await;
    queue.defer(&mut msg).await.unwrap();

    for _ in 0..5 {
        assert_eq!(queue.retry_deferred(Priority::Deferred).await.unwrap(), 0);
    }

    let stored = reload(&queue, msg.id()).await.unwrap();
    assert_eq!(stored.priority, Priority::Deferred);
    assert_eq!(stored.retry_count, 0);

    assert_eq!(queue.retry_deferred(Priority::Medium).await.unwrap(), 1);
}

#[tokio::test]
async fn failed_defer_keeps_the_in_memory_priority() {
    let db = common::setup().await;
    let queue = Queue::new(db.clone(), None);

    let mut msg = common::enqueue(&db, "Subject", &["a@example.com"], None).await;
    db.clone().close().await.unwrap();

    assert!(queue.defer(&mut msg).await.is_err());
    assert_eq!(msg.priority(), Priority::Medium);
}

#[tokio::test]
async fn prioritize_yields_tiers_in_order() {
    let db = common::setup().await;
    let queue = Queue::new(db.clone(), None);

    common::enqueue(&db, "low", &["a@example.com"], Some(Priority::Low)).await;
    common::enqueue(&db, "parked", &["a@example.com"], Some(Priority::Deferred)).await;
    common::enqueue(&db, "medium 1", &["a@example.com"], None).await;
    common::enqueue(&db, "high", &["a@example.com"], Some(Priority::High)).await;
    common::enqueue(&db, "medium 2", &["a@example.com"], Some(Priority::Medium)).await;

    let messages: Vec<QueuedMessage> = queue.prioritize().try_collect().await.unwrap();
    let subjects: Vec<&str> = messages.iter().map(|m| m.subject()).collect();

    assert_eq!(subjects, ["high", "medium 1", "medium 2", "low"]);
}

#[tokio::test]
async fn suppressed_recipients_are_not_queued() {
    let db = common::setup().await;

    SuppressionList::add(&db, "BAD@x.com").await.unwrap();
    assert!(SuppressionList::has_address(&db, "bad@X.COM").await.unwrap());
    assert!(!SuppressionList::has_address(&db, "ok@x.com").await.unwrap());

    let saved = common::enqueue(&db, "Subject", &["ok@x.com", "bad@x.com"], None).await;
    let stored = QueuedMessage::new(
        entity::prelude::Message::find_by_id(saved.id())
            .one(&db)
            .await
            .unwrap()
            .unwrap(),
    );

    assert_eq!(stored.to_addresses(), ["ok@x.com"]);
    assert_eq!(stored.email().unwrap().from_email.as_deref(), Some("sender@example.com"));
    assert_eq!(stored.priority(), Priority::Medium);
    assert_eq!(stored.retry_count(), 0);
}

#[tokio::test]
async fn unreadable_payload_degrades_to_blank_fields() {
    let db = common::setup().await;

    let msg = common::enqueue(&db, "Subject Msg 中", &["rec1@example.com"], None).await;
    assert_eq!(
        msg.to_string(),
        format!("On {}, \"Subject Msg 中\" to rec1@example.com", msg.when_added())
    );

    let broken = message::ActiveModel {
        id: Set(msg.id()),
        payload: Set(String::new()),
        ..Default::default()
    }
    .update(&db)
    .await
    .unwrap();
    let broken = QueuedMessage::from(broken);

    assert!(broken.email().is_none());
    assert_eq!(broken.subject(), "");
    assert!(broken.to_addresses().is_empty());
    assert_eq!(broken.to_string(), "<Message repr unavailable>");
}

#[tokio::test]
async fn store_lookup_folds_case_like_the_snapshot() {
    let db = common::setup().await;

    SuppressionList::add(&db, "ÄDAM@x.com").await.unwrap();
    SuppressionList::add(&db, "Σωκράτης@x.gr").await.unwrap();
    let snapshot = SuppressionList::load(&db).await.unwrap();

    for address in ["ädam@x.com", "ÄDAM@X.COM", "σωκράτης@x.gr", "adam@x.com"] {
        assert_eq!(
            SuppressionList::has_address(&db, address).await.unwrap(),
            snapshot.is_suppressed(address),
            "{address}"
        );
    }
    assert!(SuppressionList::has_address(&db, "ädam@x.com").await.unwrap());
    assert!(!SuppressionList::has_address(&db, "adam@x.com").await.unwrap());
}
