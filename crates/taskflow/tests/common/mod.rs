use std::sync::Arc;
use std::time::Duration;

use taskflow::tasks::{boxed, HandlerRegistry, MemoryTaskStore, Queue, Task, TaskError};

/// Registry used by most suites:
/// - `ok` finishes immediately with an info annotation
/// - `boom` always fails
/// - `slow` sleeps long enough that any declared timeout wins
#[allow(dead_code)]
pub fn demo_registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();

    registry.register("ok", |process| {
        boxed(async move { Ok(process.done(Some("ok".to_string()))) })
    });

    registry.register("boom", |_process| {
        boxed(async move { Err::<Task, _>(TaskError::new("BOOM", "handler blew up")) })
    });

    registry.register("slow", |process| {
        boxed(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(process.done(None))
        })
    });

    registry
}

#[allow(dead_code)]
pub fn memory_queue() -> Queue {
    memory_queue_with(demo_registry())
}

#[allow(dead_code)]
pub fn memory_queue_with(registry: HandlerRegistry) -> Queue {
    Queue::new(Arc::new(MemoryTaskStore::new()), Arc::new(registry))
}
