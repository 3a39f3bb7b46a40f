use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use taskflow::tasks::{boxed, HandlerRegistry, Process, Task, TaskError};

#[derive(Deserialize)]
struct WebhookDeliverPayload {
    url: String,
    event: String,
}

#[derive(Deserialize)]
struct DomainLookupPayload {
    domain: String,
}

fn parse_payload<T: for<'de> Deserialize<'de>>(process: &Process) -> Result<T, TaskError> {
    serde_json::from_value(process.params().clone())
        .map_err(|e| TaskError::new("BAD_PAYLOAD", e.to_string()))
}

pub fn build_registry(verbose_task_logs: bool) -> Arc<HandlerRegistry> {
    let mut registry = HandlerRegistry::new();

    // Demo handlers. Replace these with your real handlers.
    registry.register("demo_ok", |process| {
        boxed(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            Ok(process.done(Some("demo finished".to_string())))
        })
    });

    registry.register("fail_me", |_process| {
        boxed(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            Err::<Task, _>(TaskError::new("SIMULATED", "simulated failure"))
        })
    });

    // Example delivery handler with payload validation. A real one would
    // look up the related records and post to the endpoint here.
    registry.register("webhook_deliver", move |process| {
        boxed(async move {
            let payload: WebhookDeliverPayload = parse_payload(process)?;
            if verbose_task_logs {
                println!(
                    "[webhook_deliver] id={} event={} url={}",
                    process.id(),
                    payload.event,
                    payload.url
                );
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(process.done(Some(format!(
                "delivered {} to {}",
                payload.event, payload.url
            ))))
        })
    });

    registry.register("domain_lookup", |process| {
        boxed(async move {
            let payload: DomainLookupPayload = parse_payload(process)?;
            if payload.domain.is_empty() {
                return Err(TaskError::new("BAD_PAYLOAD", "empty domain"));
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(process.done(Some(format!("resolved {}", payload.domain))))
        })
    });

    Arc::new(registry)
}
