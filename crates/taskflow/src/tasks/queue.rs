// crates/taskflow/src/tasks/queue.rs

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::tasks::broker::{Broker, BrokerOptions};
use crate::tasks::model::{NewTask, Task, TaskStatus};
use crate::tasks::process::Process;
use crate::tasks::registry::{HandlerRegistry, TaskError};
use crate::tasks::store::{HandlerFilter, StatusCounts, TaskStore};

/// Queue service: submission, selection, claiming, dispatch, outcome
/// persistence. Cheap to clone; brokers share one instance.
#[derive(Clone)]
pub struct Queue {
    store: Arc<dyn TaskStore>,
    registry: Arc<HandlerRegistry>,
}

impl Queue {
    pub fn new(store: Arc<dyn TaskStore>, registry: Arc<HandlerRegistry>) -> Self {
        Self { store, registry }
    }

    // ----------------------------
    // Submission
    // ----------------------------

    pub async fn push(
        &self,
        handler: &str,
        params: Value,
        timeout_ms: Option<i64>,
        start_at: DateTime<Utc>,
    ) -> anyhow::Result<Task> {
        let task = Task::new(NewTask {
            handler: handler.to_string(),
            params,
            timeout_ms,
            start_at,
        });
        self.store.insert(&task).await?;
        Ok(task)
    }

    pub async fn push_now(&self, handler: &str, params: Value) -> anyhow::Result<Task> {
        self.push(handler, params, None, Utc::now()).await
    }

    pub async fn push_in(
        &self,
        handler: &str,
        params: Value,
        delay_secs: i64,
    ) -> anyhow::Result<Task> {
        self.push(
            handler,
            params,
            None,
            Utc::now() + chrono::Duration::seconds(delay_secs),
        )
        .await
    }

    // ----------------------------
    // Reads
    // ----------------------------

    pub async fn get(&self, id: Uuid) -> anyhow::Result<Option<Task>> {
        self.store.get(id).await
    }

    pub async fn counts(&self) -> anyhow::Result<StatusCounts> {
        self.store.counts().await
    }

    // ----------------------------
    // One poll cycle
    // ----------------------------

    /// Select, claim, dispatch, persist. Returns whether work occurred:
    /// `Ok(false)` covers both "nothing eligible" and "lost the claim race"
    /// (benign idle signals, no dispatch either way). Store I/O failures
    /// propagate as `Err`: an outage is not idleness.
    pub async fn handle(&self, filter: &HandlerFilter) -> anyhow::Result<bool> {
        let Some(candidate) = self.store.next_ready(filter, Utc::now()).await? else {
            return Ok(false);
        };

        if self.store.claim(candidate.id).await? == 0 {
            return Ok(false);
        }

        // Working copy mirrors what the claim just wrote.
        let mut claimed = candidate;
        claimed.status = TaskStatus::Process.as_str().to_string();
        claimed.retries += 1;
        claimed.updated_at = Utc::now();

        let process = Process::new(claimed);
        let terminal = self.dispatch(&process).await;
        self.store.update(&terminal).await?;

        Ok(true)
    }

    /// Run the registered handler and normalize every way it can go wrong
    /// into a terminal record. Nothing in here is allowed to escape as an
    /// error: a bad task must never take the poll loop down with it.
    async fn dispatch(&self, process: &Process) -> Task {
        let Some(handler) = self.registry.handler_for(process.handler()) else {
            return process.fail(TaskError::new(
                "UNKNOWN_HANDLER",
                format!("no handler registered for {:?}", process.handler()),
            ));
        };

        let fut = handler(process);
        let result = match process.task().timeout_ms {
            Some(ms) if ms > 0 => {
                match tokio::time::timeout(Duration::from_millis(ms as u64), fut).await {
                    Ok(inner) => inner,
                    Err(_) => Err(TaskError::new(
                        "TIMEOUT",
                        format!("handler exceeded {ms}ms"),
                    )),
                }
            }
            _ => fut.await,
        };

        match result {
            Ok(task) => task,
            Err(err) => process.fail(err),
        }
    }

    // ----------------------------
    // Requeue
    // ----------------------------

    /// Return a terminal task to circulation: pending again, eligible now,
    /// failure annotation cleared. `retries` is deliberately preserved.
    pub async fn reset_and_restart(&self, task: &Task) -> anyhow::Result<Task> {
        let now = Utc::now();
        let mut reset = task.clone();
        reset.status = TaskStatus::Pending.as_str().to_string();
        reset.start_at = now;
        reset.error = None;
        reset.updated_at = now;

        self.store.update(&reset).await?;
        Ok(reset)
    }

    // ----------------------------
    // Broker construction
    // ----------------------------

    /// Fails on any filter name with no registered handler, so a typo
    /// surfaces here instead of as a broker that silently never matches.
    pub fn broker(&self, opts: BrokerOptions) -> anyhow::Result<Broker> {
        for name in opts.filter.names() {
            if !self.registry.contains(name) {
                anyhow::bail!("broker filter names unregistered handler {name:?}");
            }
        }
        Ok(Broker::new(self.clone(), opts))
    }
}
