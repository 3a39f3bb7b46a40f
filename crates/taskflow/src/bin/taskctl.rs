use std::env;
use std::sync::Arc;

use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use taskflow::tasks::{HandlerRegistry, PgTaskStore, Queue, TaskStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!(
            "taskctl <command>\n\
             Commands:\n\
             - seed <n>\n\
             - counts\n\
             - show <task_id>\n\
             - requeue <task_id>\n\
             - wipe\n\
             \n\
             Uses DATABASE_URL or TEST_DATABASE_URL.\n"
        );
        std::process::exit(2);
    }

    let url = env::var("DATABASE_URL")
        .or_else(|_| env::var("TEST_DATABASE_URL"))
        .expect("DATABASE_URL or TEST_DATABASE_URL must be set");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await?;

    let store = Arc::new(PgTaskStore::new(pool.clone()));
    // No dispatch happens from taskctl, so an empty registry is enough.
    let queue = Queue::new(store.clone(), Arc::new(HandlerRegistry::new()));

    match args[1].as_str() {
        "seed" => {
            let n: i64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(10);
            seed(&queue, n).await?;
        }
        "counts" => show_counts(&queue).await?,
        "show" => {
            let id = args.get(2).expect("usage: taskctl show <task_id>");
            let task_id: Uuid = id.parse()?;
            show_task(store.as_ref(), task_id).await?;
        }
        "requeue" => {
            let id = args.get(2).expect("usage: taskctl requeue <task_id>");
            let task_id: Uuid = id.parse()?;
            requeue(&queue, store.as_ref(), task_id).await?;
        }
        "wipe" => wipe(&pool).await?,
        other => {
            eprintln!("Unknown command: {other}");
            std::process::exit(2);
        }
    }

    Ok(())
}

async fn seed(queue: &Queue, n: i64) -> anyhow::Result<()> {
    for i in 0..n {
        let handler = if i % 2 == 0 { "demo_ok" } else { "fail_me" };
        let task = queue
            .push_now(handler, serde_json::json!({ "seq": i }))
            .await?;
        println!("+ pushed task handler={handler} id={}", task.id);
    }
    Ok(())
}

async fn show_counts(queue: &Queue) -> anyhow::Result<()> {
    let c = queue.counts().await?;
    println!(
        "tasks: pending={} process={} done={} error={}",
        c.pending, c.process, c.done, c.error
    );
    Ok(())
}

async fn show_task(store: &PgTaskStore, task_id: Uuid) -> anyhow::Result<()> {
    let Some(task) = store.get(task_id).await? else {
        eprintln!("no task with id {task_id}");
        std::process::exit(1);
    };

    println!(
        "TASK: id={} handler={} status={} start_at={} retries={} timeout_ms={:?}",
        task.id, task.handler, task.status, task.start_at, task.retries, task.timeout_ms
    );
    println!(
        "      created_at={} updated_at={} info={:?} error={:?}",
        task.created_at, task.updated_at, task.info, task.error
    );
    println!("      params={}", task.params);
    Ok(())
}

async fn requeue(queue: &Queue, store: &PgTaskStore, task_id: Uuid) -> anyhow::Result<()> {
    let Some(task) = store.get(task_id).await? else {
        eprintln!("no task with id {task_id}");
        std::process::exit(1);
    };

    if !task.is_terminal() {
        anyhow::bail!(
            "task {} is {}; only done/error tasks can be requeued",
            task.id,
            task.status
        );
    }

    let reset = queue.reset_and_restart(&task).await?;
    println!(
        "requeued id={} status={} start_at={} retries={}",
        reset.id, reset.status, reset.start_at, reset.retries
    );
    Ok(())
}

async fn wipe(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::query("TRUNCATE TABLE tasks").execute(pool).await?;
    println!("wipe OK");
    Ok(())
}
