// tests/claiming.rs
mod common;

use common::{memory_queue, memory_queue_with};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use taskflow::tasks::{boxed, HandlerFilter, HandlerRegistry, TaskStatus};

#[tokio::test]
async fn two_concurrent_polls_claim_the_task_exactly_once() {
    let calls = Arc::new(AtomicUsize::new(0));

    let mut registry = HandlerRegistry::new();
    let calls_in_handler = calls.clone();
    registry.register("count_me", move |process| {
        let calls = calls_in_handler.clone();
        boxed(async move {
            calls.fetch_add(1, Ordering::SeqCst);
            // stay in flight long enough for the other poller to race
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok(process.done(None))
        })
    });

    let queue = memory_queue_with(registry);
    let task = queue
        .push_now("count_me", serde_json::json!({}))
        .await
        .unwrap();

    let filter = HandlerFilter::any();
    let (a, b) = tokio::join!(queue.handle(&filter), queue.handle(&filter));
    let (a, b) = (a.unwrap(), b.unwrap());

    assert!(
        a ^ b,
        "expected exactly one poll cycle to win the claim, a={a}, b={b}"
    );
    assert_eq!(calls.load(Ordering::SeqCst), 1, "handler ran more than once");

    let stored = queue.get(task.id).await.unwrap().unwrap();
    assert_eq!(stored.status, TaskStatus::Done.as_str());
    assert_eq!(stored.retries, 1);
}

#[tokio::test]
async fn idle_poll_returns_false_and_writes_nothing() {
    let queue = memory_queue();
    let filter = HandlerFilter::any();

    // Empty store.
    assert!(!queue.handle(&filter).await.unwrap());

    // A task scheduled in the future is not eligible either.
    let future = queue
        .push_in("ok", serde_json::json!({}), 60)
        .await
        .unwrap();

    assert!(!queue.handle(&filter).await.unwrap());

    let stored = queue.get(future.id).await.unwrap().unwrap();
    assert_eq!(stored.status, TaskStatus::Pending.as_str());
    assert_eq!(stored.retries, 0);
    assert_eq!(stored.updated_at, future.updated_at, "idle cycle must not write");
}

#[tokio::test]
async fn earliest_start_at_is_selected_first() {
    let queue = memory_queue();
    let filter = HandlerFilter::any();

    let earlier = queue
        .push("ok", serde_json::json!({"n": 1}), None, Utc::now() - ChronoDuration::seconds(10))
        .await
        .unwrap();
    let later = queue
        .push("ok", serde_json::json!({"n": 2}), None, Utc::now() - ChronoDuration::seconds(5))
        .await
        .unwrap();

    assert!(queue.handle(&filter).await.unwrap());

    let first = queue.get(earlier.id).await.unwrap().unwrap();
    let second = queue.get(later.id).await.unwrap().unwrap();
    assert_eq!(first.status, TaskStatus::Done.as_str());
    assert_eq!(second.status, TaskStatus::Pending.as_str());
}

#[tokio::test]
async fn retries_count_every_claim_across_resets() {
    let queue = memory_queue();
    let filter = HandlerFilter::any();

    let task = queue.push_now("boom", serde_json::json!({})).await.unwrap();

    assert!(queue.handle(&filter).await.unwrap());
    let after_first = queue.get(task.id).await.unwrap().unwrap();
    assert_eq!(after_first.status, TaskStatus::Error.as_str());
    assert_eq!(after_first.retries, 1);

    let reset = queue.reset_and_restart(&after_first).await.unwrap();
    assert_eq!(reset.retries, 1, "reset must not touch retries");

    assert!(queue.handle(&filter).await.unwrap());
    let after_second = queue.get(task.id).await.unwrap().unwrap();
    assert_eq!(after_second.status, TaskStatus::Error.as_str());
    assert_eq!(after_second.retries, 2);
}
