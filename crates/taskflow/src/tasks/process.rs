use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::tasks::model::{Task, TaskStatus};

/// Execution context over one claimed task.
///
/// Constructed fresh per claim, handed to the handler, discarded after the
/// outcome is persisted. `done` and `fail` are pure: they produce a new
/// terminal record and never touch the store. Persistence stays with the
/// queue service.
#[derive(Debug, Clone)]
pub struct Process {
    task: Task,
}

impl Process {
    pub fn new(task: Task) -> Self {
        Self { task }
    }

    pub fn id(&self) -> Uuid {
        self.task.id
    }

    pub fn handler(&self) -> &str {
        &self.task.handler
    }

    pub fn params(&self) -> &Value {
        &self.task.params
    }

    pub fn task(&self) -> &Task {
        &self.task
    }

    pub fn done(&self, info: Option<String>) -> Task {
        let mut task = self.task.clone();
        task.status = TaskStatus::Done.as_str().to_string();
        task.info = info;
        task.updated_at = Utc::now();
        task
    }

    pub fn fail(&self, err: impl std::fmt::Display) -> Task {
        let mut task = self.task.clone();
        task.status = TaskStatus::Error.as_str().to_string();
        task.error = Some(err.to_string());
        task.updated_at = Utc::now();
        task
    }
}
