use crate::tasks::model::Task;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Restricts which handler names a poll cycle may select.
///
/// `include` and `exclude` are both optional; an empty filter matches every
/// handler. `exclude` wins when a name appears in both lists.
#[derive(Debug, Clone, Default)]
pub struct HandlerFilter {
    pub include: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,
}

impl HandlerFilter {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn include<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            include: Some(names.into_iter().map(Into::into).collect()),
            exclude: None,
        }
    }

    pub fn exclude<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            include: None,
            exclude: Some(names.into_iter().map(Into::into).collect()),
        }
    }

    /// All names the filter mentions, include and exclude alike.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.include
            .iter()
            .flatten()
            .chain(self.exclude.iter().flatten())
            .map(String::as_str)
    }

    pub fn matches(&self, handler: &str) -> bool {
        if let Some(include) = &self.include {
            if !include.iter().any(|h| h == handler) {
                return false;
            }
        }
        if let Some(exclude) = &self.exclude {
            if exclude.iter().any(|h| h == handler) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub pending: i64,
    pub process: i64,
    pub done: i64,
    pub error: i64,
}

/// Persistence boundary of the queue.
///
/// `claim` is the only mutual-exclusion mechanism in the system: a
/// conditional update matched on `(id, status = pending)` that reports how
/// many rows actually changed. Everything else is plain ordered reads and
/// unconditional writes.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert(&self, task: &Task) -> anyhow::Result<()>;

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Task>>;

    /// First pending task with `start_at <= now` that passes `filter`,
    /// earliest `start_at` first. Performs no writes.
    async fn next_ready(
        &self,
        filter: &HandlerFilter,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Option<Task>>;

    /// Conditional `pending -> process` transition, bumping `retries` and
    /// `updated_at`. Returns the affected-row count: 0 means another poller
    /// already claimed the task (or it left pending by other means).
    async fn claim(&self, id: Uuid) -> anyhow::Result<u64>;

    /// Unconditional update by id. Outcome persistence and reset go
    /// through here.
    async fn update(&self, task: &Task) -> anyhow::Result<()>;

    async fn counts(&self) -> anyhow::Result<StatusCounts>;
}
