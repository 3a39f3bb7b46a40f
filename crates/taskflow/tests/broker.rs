// tests/broker.rs
mod common;

use common::{memory_queue, memory_queue_with};

use std::time::Duration;

use tokio::time::Instant;

use taskflow::tasks::{boxed, BrokerOptions, HandlerFilter, HandlerRegistry, Queue, TaskStatus};

fn options(interval_ms: u64) -> BrokerOptions {
    BrokerOptions {
        interval: Duration::from_millis(interval_ms),
        filter: HandlerFilter::any(),
        name: "broker-test".to_string(),
    }
}

async fn wait_for_done(queue: &Queue, expected: i64) {
    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        if queue.counts().await.unwrap().done == expected {
            return;
        }
        if Instant::now() >= deadline {
            panic!("broker did not finish {expected} tasks in time");
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn broker_drains_ready_tasks() {
    let queue = memory_queue();

    for i in 0..3 {
        queue
            .push_now("ok", serde_json::json!({ "n": i }))
            .await
            .unwrap();
    }

    let mut broker = queue.broker(options(50)).unwrap();
    assert!(!broker.is_started());
    broker.start();
    assert!(broker.is_started());

    wait_for_done(&queue, 3).await;

    broker.stop_and_join().await;
    assert!(!broker.is_started());
}

#[tokio::test]
async fn stopped_broker_claims_nothing_new() {
    let queue = memory_queue();

    let mut broker = queue.broker(options(10)).unwrap();
    broker.start();

    queue.push_now("ok", serde_json::json!({})).await.unwrap();
    wait_for_done(&queue, 1).await;

    broker.stop_and_join().await;

    let task = queue.push_now("ok", serde_json::json!({})).await.unwrap();
    tokio::time::sleep(Duration::from_millis(250)).await;

    let stored = queue.get(task.id).await.unwrap().unwrap();
    assert_eq!(stored.status, TaskStatus::Pending.as_str());
    assert_eq!(stored.retries, 0);
}

#[tokio::test]
async fn stop_lets_the_in_flight_cycle_finish() {
    let mut registry = HandlerRegistry::new();
    registry.register("slow_done", |process| {
        boxed(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            Ok(process.done(Some("finished late".to_string())))
        })
    });
    let queue = memory_queue_with(registry);

    let task = queue
        .push_now("slow_done", serde_json::json!({}))
        .await
        .unwrap();

    let mut broker = queue.broker(options(10)).unwrap();
    broker.start();

    // Give the broker time to claim and enter the handler.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let mid_flight = queue.get(task.id).await.unwrap().unwrap();
    assert_eq!(mid_flight.status, TaskStatus::Process.as_str());

    // Cooperative stop: the running handler is not interrupted, its
    // outcome still lands.
    broker.stop_and_join().await;

    let stored = queue.get(task.id).await.unwrap().unwrap();
    assert_eq!(stored.status, TaskStatus::Done.as_str());
    assert_eq!(stored.info.as_deref(), Some("finished late"));
}
