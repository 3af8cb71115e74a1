//! Single-flight poller
//!
//! Each fetch runs as a task in the poller's own `JoinSet`, so at most one is
//! outstanding and aborting the poller aborts the fetch too. Ticks and
//! refresh requests that arrive while a fetch is running are skipped rather
//! than queued.

use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{Notify, mpsc};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{self, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Periodically fetches a full collection and forwards it to a view
pub struct Poller<F> {
    name: &'static str,
    interval: Duration,
    fetch: F,
}

impl<F, Fut, T> Poller<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    pub fn new(name: &'static str, interval: Duration, fetch: F) -> Self {
        Self {
            name,
            interval,
            fetch,
        }
    }

    /// Starts the polling loop; the first fetch happens immediately
    pub fn spawn(self, tx: mpsc::Sender<T>) -> PollerHandle {
        let refresh = Arc::new(Notify::new());
        let task = tokio::spawn(self.run(tx, Arc::clone(&refresh)));
        PollerHandle {
            task: Some(task),
            refresh,
        }
    }

    async fn run(self, tx: mpsc::Sender<T>, refresh: Arc<Notify>) {
        info!("Starting {} poller (interval: {:?})", self.name, self.interval);

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut in_flight = JoinSet::new();

        loop {
            tokio::select! {
                _ = ticker.tick() => self.start(&mut in_flight, "tick"),
                _ = refresh.notified() => self.start(&mut in_flight, "refresh"),
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => match joined {
                    Ok(Ok(value)) => {
                        if tx.send(value).await.is_err() {
                            debug!("{} view gone, stopping poller", self.name);
                            return;
                        }
                    }
                    Ok(Err(e)) => warn!("Error during {} poll: {:#}", self.name, e),
                    Err(e) => warn!("{} fetch task failed: {}", self.name, e),
                },
            }
        }
    }

    fn start(&self, in_flight: &mut JoinSet<Result<T>>, trigger: &str) {
        if !in_flight.is_empty() {
            debug!("Skipping {} {}: fetch still in flight", self.name, trigger);
            return;
        }
        debug!("Polling {} ({})", self.name, trigger);
        in_flight.spawn((self.fetch)());
    }
}

/// Handle to a running poller
///
/// Stopping (or dropping) the handle aborts the polling task together with
/// any fetch it is awaiting.
pub struct PollerHandle {
    task: Option<JoinHandle<()>>,
    refresh: Arc<Notify>,
}

impl PollerHandle {
    /// Requests a fetch without waiting for the next tick
    pub fn refresh(&self) {
        self.refresh.notify_one();
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.task.is_none()
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};

    type Fetch = Pin<Box<dyn Future<Output = Result<usize>> + Send>>;

    fn counting(
        calls: &Arc<AtomicUsize>,
        delay: Duration,
    ) -> impl Fn() -> Fetch + Send + Sync + 'static {
        let calls = Arc::clone(calls);
        move || -> Fetch {
            let calls = Arc::clone(&calls);
            Box::pin(async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                time::sleep(delay).await;
                Ok(n)
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetches_on_every_tick() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (tx, mut rx) = mpsc::channel(8);
        let _handle = Poller::new("test", Duration::from_secs(3), counting(&calls, Duration::ZERO))
            .spawn(tx);

        assert_eq!(rx.recv().await, Some(1));
        assert_eq!(rx.recv().await, Some(2));
        assert_eq!(rx.recv().await, Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_during_fetch_is_skipped() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (tx, mut rx) = mpsc::channel(8);
        let _handle = Poller::new(
            "test",
            Duration::from_secs(3),
            counting(&calls, Duration::from_secs(5)),
        )
        .spawn(tx);

        // Fetch from t=0 ends at t=5, so the t=3 tick is skipped
        time::sleep(Duration::from_millis(5500)).await;
        assert_eq!(rx.recv().await, Some(1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_fetches_immediately() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (tx, mut rx) = mpsc::channel(8);
        let handle = Poller::new("test", Duration::from_secs(60), counting(&calls, Duration::ZERO))
            .spawn(tx);

        assert_eq!(rx.recv().await, Some(1));
        handle.refresh();
        assert_eq!(rx.recv().await, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_fetch_keeps_polling() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let (tx, mut rx) = mpsc::channel(8);
        let _handle = Poller::new("test", Duration::from_secs(3), move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n == 1 {
                    anyhow::bail!("connection refused");
                }
                Ok(n)
            }
        })
        .spawn(tx);

        assert_eq!(rx.recv().await, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_ends_polling() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (tx, mut rx) = mpsc::channel(8);
        let mut handle =
            Poller::new("test", Duration::from_secs(3), counting(&calls, Duration::ZERO))
                .spawn(tx);

        assert_eq!(rx.recv().await, Some(1));
        handle.stop();
        assert!(handle.is_stopped());

        time::sleep(Duration::from_secs(30)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(rx.recv().await, None);
    }
}
