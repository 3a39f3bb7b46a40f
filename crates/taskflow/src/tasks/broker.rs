use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::tasks::queue::Queue;
use crate::tasks::store::HandlerFilter;

#[derive(Debug, Clone)]
pub struct BrokerOptions {
    /// Backoff between poll cycles once `handle` reports no work.
    pub interval: Duration,
    pub filter: HandlerFilter,
    /// Tag used in log lines, useful when several brokers share a store.
    pub name: String,
}

impl Default for BrokerOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(250),
            filter: HandlerFilter::any(),
            name: "broker-1".to_string(),
        }
    }
}

/// Poll/backoff loop over one queue service.
///
/// The broker holds no lock of its own; any number of brokers may poll the
/// same store and the store's conditional claim arbitrates. One `handle`
/// call is in flight per broker at a time.
pub struct Broker {
    queue: Queue,
    interval: Duration,
    filter: HandlerFilter,
    name: String,
    shutdown_tx: watch::Sender<bool>,
    join: Option<JoinHandle<()>>,
}

impl Broker {
    pub(crate) fn new(queue: Queue, opts: BrokerOptions) -> Self {
        // Placeholder channel; start() installs a live one per run.
        let (shutdown_tx, _) = watch::channel(true);
        Self {
            queue,
            interval: opts.interval,
            filter: opts.filter,
            name: opts.name,
            shutdown_tx,
            join: None,
        }
    }

    pub fn is_started(&self) -> bool {
        self.join.as_ref().is_some_and(|j| !j.is_finished()) && !*self.shutdown_tx.borrow()
    }

    /// Begin the self-driving loop. A cycle that did work repeats
    /// immediately (drains a burst before backing off); an idle cycle
    /// sleeps `interval`. The stop flag is observed at the top of every
    /// iteration, and the backoff sleep is interruptible, so `stop()`
    /// never waits out a full interval. Only an in-flight `handle` call
    /// keeps it waiting, and that always runs to completion.
    pub fn start(&mut self) {
        if self.is_started() {
            return;
        }

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        self.shutdown_tx = shutdown_tx;

        let queue = self.queue.clone();
        let interval = self.interval;
        let filter = self.filter.clone();
        let name = self.name.clone();

        self.join = Some(tokio::spawn(async move {
            loop {
                if *shutdown_rx.borrow() {
                    break;
                }

                match queue.handle(&filter).await {
                    Ok(true) => continue,
                    Ok(false) => {}
                    Err(e) => {
                        // Store-level failure of one cycle. Back off and
                        // retry; the loop itself must outlive outages.
                        eprintln!("[{name}] poll cycle failed: {e:#}");
                    }
                }

                tokio::select! {
                    _ = shutdown_rx.changed() => {}
                    _ = tokio::time::sleep(interval) => {}
                }
            }
        }));
    }

    /// Request cooperative stop. Takes effect at the next loop check; an
    /// executing handler is never interrupted.
    pub fn stop(&self) {
        // ignore send error: the loop may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    pub async fn stop_and_join(&mut self) {
        self.stop();
        if let Some(join) = self.join.take() {
            let _ = join.await;
        }
    }
}
