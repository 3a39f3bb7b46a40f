//! In-memory [`TaskStore`] with the same observable semantics as the
//! Postgres store. Backs the test suite and embedded single-process use.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::tasks::model::{Task, TaskStatus};
use crate::tasks::store::{HandlerFilter, StatusCounts, TaskStore};

#[derive(Default)]
pub struct MemoryTaskStore {
    rows: Mutex<HashMap<Uuid, Task>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn insert(&self, task: &Task) -> anyhow::Result<()> {
        let mut rows = self.rows.lock().await;
        if rows.contains_key(&task.id) {
            anyhow::bail!("duplicate task id {}", task.id);
        }
        rows.insert(task.id, task.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Task>> {
        let rows = self.rows.lock().await;
        Ok(rows.get(&id).cloned())
    }

    async fn next_ready(
        &self,
        filter: &HandlerFilter,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Option<Task>> {
        let rows = self.rows.lock().await;
        let candidate = rows
            .values()
            .filter(|t| t.is_pending() && t.start_at <= now && filter.matches(&t.handler))
            // same tie-break as the SQL path: start_at, then created_at;
            // id keeps the order total for identical timestamps
            .min_by_key(|t| (t.start_at, t.created_at, t.id));
        Ok(candidate.cloned())
    }

    async fn claim(&self, id: Uuid) -> anyhow::Result<u64> {
        let mut rows = self.rows.lock().await;
        match rows.get_mut(&id) {
            Some(task) if task.is_pending() => {
                task.status = TaskStatus::Process.as_str().to_string();
                task.retries += 1;
                task.updated_at = Utc::now();
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn update(&self, task: &Task) -> anyhow::Result<()> {
        let mut rows = self.rows.lock().await;
        match rows.get_mut(&task.id) {
            Some(existing) => {
                *existing = task.clone();
                Ok(())
            }
            None => anyhow::bail!("update of unknown task id {}", task.id),
        }
    }

    async fn counts(&self) -> anyhow::Result<StatusCounts> {
        let rows = self.rows.lock().await;
        let mut counts = StatusCounts::default();
        for task in rows.values() {
            match task.status.as_str() {
                s if s == TaskStatus::Pending.as_str() => counts.pending += 1,
                s if s == TaskStatus::Process.as_str() => counts.process += 1,
                s if s == TaskStatus::Done.as_str() => counts.done += 1,
                s if s == TaskStatus::Error.as_str() => counts.error += 1,
                _ => {}
            }
        }
        Ok(counts)
    }
}
