use rand::Rng;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::api::dsfm::FetchError;

/// Polling cadence for one controller instance
#[derive(Debug, Clone, Copy)]
pub struct RefreshConfig {
    pub interval: Duration,
    /// Upper bound of the uniform extra delay added before each fetch
    pub jitter: Duration,
}

impl RefreshConfig {
    pub fn every(interval: Duration) -> Self {
        RefreshConfig {
            interval,
            jitter: Duration::ZERO,
        }
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }
}

/// Drives one polling loop: fetch immediately, then on every interval tick,
/// pushing each snapshot (or failure) into the owner's callbacks.
///
/// Fetches are serialized - the next tick waits until the previous fetch has
/// resolved and its callback returned - so callbacks always fire in
/// fetch-start order and a stale response can never overwrite a fresh one.
/// No error class stops the schedule; every failure is retried on the next
/// tick.
pub struct RefreshController;

impl RefreshController {
    pub fn start<F, Fut, T, D, E>(
        name: &str,
        config: RefreshConfig,
        mut fetch: F,
        mut on_data: D,
        mut on_error: E,
    ) -> RefreshHandle
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
        T: Send + 'static,
        D: FnMut(T) + Send + 'static,
        E: FnMut(FetchError) + Send + 'static,
    {
        let cancelled = Arc::new(AtomicBool::new(false));
        let notify = Arc::new(Notify::new());
        let name = name.to_string();

        let task = tokio::spawn({
            let cancelled = Arc::clone(&cancelled);
            let notify = Arc::clone(&notify);
            async move {
                let mut ticker = tokio::time::interval(config.interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

                loop {
                    tokio::select! {
                        _ = ticker.tick() => {}
                        _ = notify.notified() => break,
                    }
                    if cancelled.load(Ordering::SeqCst) {
                        break;
                    }

                    if !config.jitter.is_zero() {
                        let jitter_ms = rand::thread_rng().gen_range(0..=config.jitter.as_millis() as u64);
                        tokio::time::sleep(Duration::from_millis(jitter_ms)).await;
                    }

                    let result = fetch().await;

                    // A cancel that lands while the fetch is in flight lets
                    // the request finish but suppresses its callback
                    if cancelled.load(Ordering::SeqCst) {
                        debug!("{}: dropping result fetched after cancel", name);
                        break;
                    }

                    match result {
                        Ok(data) => on_data(data),
                        Err(err) => {
                            warn!("{}: refresh tick failed: {}", name, err);
                            on_error(err);
                        }
                    }
                }
                debug!("{}: refresh loop stopped", name);
            }
        });

        RefreshHandle {
            cancelled,
            notify,
            task,
        }
    }
}

/// Cancellation handle for one polling loop. Dropping the handle does not
/// cancel; the loop keeps its own grip on the runtime until told to stop.
pub struct RefreshHandle {
    cancelled: Arc<AtomicBool>,
    notify: Arc<Notify>,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    /// Stop all future ticks immediately. An in-flight fetch completes but
    /// its callback never fires; the request itself is not aborted since
    /// all backend reads are idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Wait for the polling task to wind down
    pub async fn stopped(self) {
        let _ = self.task.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::mpsc;

    #[derive(Debug, PartialEq)]
    enum Event {
        Data(usize),
        Error(usize),
    }

    #[tokio::test(start_paused = true)]
    async fn alternating_ticks_fire_callbacks_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let tx_err = tx.clone();
        let tick = Arc::new(AtomicUsize::new(0));
        let fetch_tick = Arc::clone(&tick);
        let err_tick = Arc::clone(&tick);

        let handle = RefreshController::start(
            "alternating",
            RefreshConfig::every(Duration::from_secs(1)),
            move || {
                let n = fetch_tick.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n % 2 == 1 {
                        Ok(n)
                    } else {
                        Err(FetchError::Connection("backend down".to_string()))
                    }
                }
            },
            move |n| {
                tx.send(Event::Data(n)).unwrap();
            },
            move |_| {
                tx_err.send(Event::Error(err_tick.load(Ordering::SeqCst))).unwrap();
            },
        );

        let mut events = Vec::new();
        for _ in 0..5 {
            events.push(rx.recv().await.unwrap());
        }
        assert_eq!(
            events,
            vec![
                Event::Data(1),
                Event::Error(2),
                Event::Data(3),
                Event::Error(4),
                Event::Data(5),
            ]
        );

        handle.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_suppresses_every_later_callback() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let tick = Arc::new(AtomicUsize::new(0));
        let fetch_tick = Arc::clone(&tick);

        let handle = RefreshController::start(
            "cancel",
            RefreshConfig::every(Duration::from_secs(1)),
            move || {
                let n = fetch_tick.fetch_add(1, Ordering::SeqCst) + 1;
                async move { Ok(n) }
            },
            move |n| {
                tx.send(n).unwrap();
            },
            |_| {},
        );

        assert_eq!(rx.recv().await, Some(1));
        assert_eq!(rx.recv().await, Some(2));
        handle.cancel();
        assert!(handle.is_cancelled());

        // The loop drops its callbacks on exit, closing the channel; any
        // callback after cancel would arrive before the None
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_fetches_never_overlap() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let in_flight = Arc::new(AtomicBool::new(false));
        let fetch_flag = Arc::clone(&in_flight);
        let tick = Arc::new(AtomicUsize::new(0));
        let fetch_tick = Arc::clone(&tick);

        let handle = RefreshController::start(
            "slow",
            RefreshConfig::every(Duration::from_secs(1)),
            move || {
                let flag = Arc::clone(&fetch_flag);
                let n = fetch_tick.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    assert!(!flag.swap(true, Ordering::SeqCst), "overlapping fetch");
                    // Three times the polling interval
                    tokio::time::sleep(Duration::from_secs(3)).await;
                    flag.store(false, Ordering::SeqCst);
                    Ok(n)
                }
            },
            move |n| {
                tx.send(n).unwrap();
            },
            |_| {},
        );

        assert_eq!(rx.recv().await, Some(1));
        assert_eq!(rx.recv().await, Some(2));
        assert_eq!(rx.recv().await, Some(3));
        handle.cancel();
    }
}
