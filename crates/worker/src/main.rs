use std::sync::Arc;
use std::time::Duration;

use taskflow::config;
use taskflow::db;
use taskflow::tasks::{BrokerOptions, HandlerFilter, PgTaskStore, Queue};

mod handlers;
use handlers::build_registry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = config::Config::from_env()?;

    println!(
        "taskflow starting... broker_name={} broker_count={} poll_interval_ms={} include={:?} exclude={:?} migrate_on_startup={} verbose_task_logs={}",
        cfg.broker_name,
        cfg.broker_count,
        cfg.poll_interval_ms,
        cfg.include,
        cfg.exclude,
        cfg.migrate_on_startup,
        cfg.verbose_task_logs
    );

    let pool = db::make_pool(&cfg.database_url).await?;
    if cfg.migrate_on_startup {
        db::run_migrations(&pool).await?;
    }

    let store = Arc::new(PgTaskStore::new(pool));
    let registry = build_registry(cfg.verbose_task_logs);
    println!(
        "registered handlers: {:?}",
        registry.names().collect::<Vec<_>>()
    );
    let queue = Queue::new(store, registry);

    let filter = HandlerFilter {
        include: cfg.include.clone(),
        exclude: cfg.exclude.clone(),
    };

    // Brokers hold no lock; the store's conditional claim arbitrates, so
    // any number of them can poll the same table.
    let mut brokers = Vec::with_capacity(cfg.broker_count);
    for i in 1..=cfg.broker_count {
        let mut broker = queue.broker(BrokerOptions {
            interval: Duration::from_millis(cfg.poll_interval_ms),
            filter: filter.clone(),
            name: format!("{}-{}", cfg.broker_name, i),
        })?;
        broker.start();
        brokers.push(broker);
    }

    tokio::signal::ctrl_c().await?;
    println!("[{}] shutdown requested, draining...", cfg.broker_name);

    for broker in &mut brokers {
        broker.stop_and_join().await;
    }

    println!("[{}] stopped", cfg.broker_name);
    Ok(())
}
