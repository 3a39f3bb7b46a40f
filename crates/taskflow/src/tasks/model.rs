use chrono::{DateTime, Utc};

use serde_json::Value;

use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,
    pub handler: String,
    pub params: Value,
    pub start_at: DateTime<Utc>,
    pub timeout_ms: Option<i64>,
    pub status: String,

    pub info: Option<String>,
    pub error: Option<String>,

    pub retries: i32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub handler: String,
    pub params: Value,
    pub timeout_ms: Option<i64>,
    pub start_at: DateTime<Utc>,
}

impl Task {
    /// Build a fresh pending record. `id` and the audit timestamps are
    /// assigned here and never reassigned afterwards.
    pub fn new(new: NewTask) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            handler: new.handler,
            params: new.params,
            start_at: new.start_at,
            timeout_ms: new.timeout_ms,
            status: TaskStatus::Pending.as_str().to_string(),
            info: None,
            error: None,
            retries: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == TaskStatus::Pending.as_str()
    }

    pub fn is_terminal(&self) -> bool {
        self.status == TaskStatus::Done.as_str() || self.status == TaskStatus::Error.as_str()
    }
}

pub enum TaskStatus {
    Pending,
    Process,
    Done,
    Error,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Process => "process",
            TaskStatus::Done => "done",
            TaskStatus::Error => "error",
        }
    }
}
