// tests/filtering.rs
mod common;

use common::memory_queue;

use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use taskflow::tasks::{BrokerOptions, HandlerFilter, TaskStatus};

#[tokio::test]
async fn include_filter_never_selects_other_handlers() {
    let queue = memory_queue();

    // The excluded-handler task is older, so it would win on ordering alone.
    let boom = queue
        .push("boom", serde_json::json!({}), None, Utc::now() - ChronoDuration::seconds(10))
        .await
        .unwrap();
    let ok = queue.push_now("ok", serde_json::json!({})).await.unwrap();

    let filter = HandlerFilter::include(["ok"]);
    assert!(queue.handle(&filter).await.unwrap());

    assert_eq!(
        queue.get(ok.id).await.unwrap().unwrap().status,
        TaskStatus::Done.as_str()
    );
    assert_eq!(
        queue.get(boom.id).await.unwrap().unwrap().status,
        TaskStatus::Pending.as_str()
    );

    // Nothing else matches the include list.
    assert!(!queue.handle(&filter).await.unwrap());
}

#[tokio::test]
async fn exclude_filter_never_selects_excluded_handler() {
    let queue = memory_queue();

    let boom = queue.push_now("boom", serde_json::json!({})).await.unwrap();

    let filter = HandlerFilter::exclude(["boom"]);
    assert!(!queue.handle(&filter).await.unwrap());

    let stored = queue.get(boom.id).await.unwrap().unwrap();
    assert_eq!(stored.status, TaskStatus::Pending.as_str());
    assert_eq!(stored.retries, 0);
}

#[tokio::test]
async fn broker_construction_rejects_unregistered_names() {
    let queue = memory_queue();

    let include_typo = queue.broker(BrokerOptions {
        interval: Duration::from_millis(10),
        filter: HandlerFilter::include(["no_such_handler"]),
        name: "broker-test".to_string(),
    });
    assert!(include_typo.is_err());

    let exclude_typo = queue.broker(BrokerOptions {
        interval: Duration::from_millis(10),
        filter: HandlerFilter::exclude(["no_such_handler"]),
        name: "broker-test".to_string(),
    });
    assert!(exclude_typo.is_err());

    let valid = queue.broker(BrokerOptions {
        interval: Duration::from_millis(10),
        filter: HandlerFilter::include(["ok", "boom"]),
        name: "broker-test".to_string(),
    });
    assert!(valid.is_ok());
}
