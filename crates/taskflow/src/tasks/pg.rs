// crates/taskflow/src/tasks/pg.rs

use crate::tasks::model::{Task, TaskStatus};
use crate::tasks::store::{HandlerFilter, StatusCounts, TaskStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// Postgres-backed [`TaskStore`]. Schema lives in `migrations/`.
#[derive(Clone)]
pub struct PgTaskStore {
    pool: PgPool,
}

impl PgTaskStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn insert(&self, task: &Task) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tasks (
                id, handler, params, start_at, timeout_ms, status,
                info, error, retries, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(task.id)
        .bind(&task.handler)
        .bind(&task.params)
        .bind(task.start_at)
        .bind(task.timeout_ms)
        .bind(&task.status)
        .bind(&task.info)
        .bind(&task.error)
        .bind(task.retries)
        .bind(task.created_at)
        .bind(task.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Task>> {
        let task = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    async fn next_ready(
        &self,
        filter: &HandlerFilter,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Option<Task>> {
        let task = match (&filter.include, &filter.exclude) {
            (Some(inc), Some(exc)) => {
                sqlx::query_as::<_, Task>(
                    r#"
                    SELECT * FROM tasks
                    WHERE status = 'pending'
                      AND start_at <= $1
                      AND handler = ANY($2)
                      AND handler <> ALL($3)
                    ORDER BY start_at ASC, created_at ASC
                    LIMIT 1
                    "#,
                )
                .bind(now)
                .bind(inc)
                .bind(exc)
                .fetch_optional(&self.pool)
                .await?
            }
            (Some(inc), None) => {
                sqlx::query_as::<_, Task>(
                    r#"
                    SELECT * FROM tasks
                    WHERE status = 'pending'
                      AND start_at <= $1
                      AND handler = ANY($2)
                    ORDER BY start_at ASC, created_at ASC
                    LIMIT 1
                    "#,
                )
                .bind(now)
                .bind(inc)
                .fetch_optional(&self.pool)
                .await?
            }
            (None, Some(exc)) => {
                sqlx::query_as::<_, Task>(
                    r#"
                    SELECT * FROM tasks
                    WHERE status = 'pending'
                      AND start_at <= $1
                      AND handler <> ALL($2)
                    ORDER BY start_at ASC, created_at ASC
                    LIMIT 1
                    "#,
                )
                .bind(now)
                .bind(exc)
                .fetch_optional(&self.pool)
                .await?
            }
            (None, None) => {
                sqlx::query_as::<_, Task>(
                    r#"
                    SELECT * FROM tasks
                    WHERE status = 'pending'
                      AND start_at <= $1
                    ORDER BY start_at ASC, created_at ASC
                    LIMIT 1
                    "#,
                )
                .bind(now)
                .fetch_optional(&self.pool)
                .await?
            }
        };

        Ok(task)
    }

    async fn claim(&self, id: Uuid) -> anyhow::Result<u64> {
        // The matched-row count is the whole claim protocol: 0 means a
        // concurrent poller already moved the task out of pending.
        let res = sqlx::query(
            r#"
            UPDATE tasks
            SET status = 'process',
                retries = retries + 1,
                updated_at = now()
            WHERE id = $1
              AND status = 'pending'
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(res.rows_affected())
    }

    async fn update(&self, task: &Task) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE tasks
            SET start_at = $2,
                timeout_ms = $3,
                status = $4,
                info = $5,
                error = $6,
                retries = $7,
                updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(task.id)
        .bind(task.start_at)
        .bind(task.timeout_ms)
        .bind(&task.status)
        .bind(&task.info)
        .bind(&task.error)
        .bind(task.retries)
        .bind(task.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn counts(&self) -> anyhow::Result<StatusCounts> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT status, COUNT(*) FROM tasks GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut counts = StatusCounts::default();
        for (status, n) in rows {
            match status.as_str() {
                s if s == TaskStatus::Pending.as_str() => counts.pending = n,
                s if s == TaskStatus::Process.as_str() => counts.process = n,
                s if s == TaskStatus::Done.as_str() => counts.done = n,
                s if s == TaskStatus::Error.as_str() => counts.error = n,
                _ => {}
            }
        }
        Ok(counts)
    }
}
