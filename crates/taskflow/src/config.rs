/// Runtime configuration for the worker process, loaded from environment
/// variables. `TASKFLOW_*` names win; bare names are accepted as fallback.
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub broker_name: String,
    pub broker_count: usize,
    pub poll_interval_ms: u64,
    pub include: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,
    pub migrate_on_startup: bool,
    pub verbose_task_logs: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL is missing"))?;

        let broker_name = env_or_fallback("TASKFLOW_BROKER_NAME", "BROKER_NAME")
            .or_else(|| std::env::var("HOSTNAME").ok())
            .unwrap_or_else(|| "broker".to_string());

        let broker_count = env_or_fallback("TASKFLOW_BROKER_COUNT", "BROKER_COUNT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1)
            .clamp(1, 64);

        let poll_interval_ms = env_or_fallback("TASKFLOW_POLL_INTERVAL_MS", "POLL_INTERVAL_MS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(250);

        let include = env_list("TASKFLOW_INCLUDE_HANDLERS");
        let exclude = env_list("TASKFLOW_EXCLUDE_HANDLERS");

        let migrate_on_startup = env_bool("TASKFLOW_MIGRATE_ON_STARTUP").unwrap_or(false);
        let verbose_task_logs = env_bool("TASKFLOW_VERBOSE_TASK_LOGS").unwrap_or(false);

        Ok(Self {
            database_url,
            broker_name,
            broker_count,
            poll_interval_ms,
            include,
            exclude,
            migrate_on_startup,
            verbose_task_logs,
        })
    }
}

fn env_or_fallback(primary: &str, fallback: &str) -> Option<String> {
    std::env::var(primary)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .or_else(|| std::env::var(fallback).ok().filter(|s| !s.trim().is_empty()))
}

fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

/// Comma-separated list; empty entries are dropped, an all-empty value
/// counts as unset.
fn env_list(key: &str) -> Option<Vec<String>> {
    let raw = std::env::var(key).ok()?;
    let names: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if names.is_empty() {
        None
    } else {
        Some(names)
    }
}
