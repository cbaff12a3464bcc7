//! Running actors: stop signalling, live statistics and join handles.

use std::cell::Cell;
use std::sync::mpsc::{self, RecvTimeoutError, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use serde::Serialize;

use crate::error::ActorError;

/// Actor runtime statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActorStats {
    /// Marketplace calls made (publish, reserve or release).
    pub attempts: u64,
    /// Calls that returned `true`.
    pub accepted: u64,
    /// Calls that returned `false` and were retried.
    pub refused: u64,
    /// Carts finalized (consumers only).
    pub orders_placed: u64,
}

/// Shared, thread-safe view of an actor's [`ActorStats`].
#[derive(Debug, Clone, Default)]
pub struct StatsCell(Arc<Mutex<ActorStats>>);

impl StatsCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> ActorStats {
        self.0.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn record_attempt(&self, accepted: bool) {
        if let Ok(mut s) = self.0.lock() {
            s.attempts += 1;
            if accepted {
                s.accepted += 1;
            } else {
                s.refused += 1;
            }
        }
    }

    pub fn record_order(&self) {
        if let Ok(mut s) = self.0.lock() {
            s.orders_placed += 1;
        }
    }
}

/// Receiving end of an actor's stop request.
///
/// Doubles as an interruptible sleep: [`sleep`](Self::sleep) wakes early when
/// a stop is requested. Dropping the sending side also counts as a stop.
#[derive(Debug)]
pub struct StopSignal {
    rx: Option<mpsc::Receiver<()>>,
    raised: Cell<bool>,
}

impl StopSignal {
    /// A signal that is never raised. Used for synchronous runs.
    pub fn never() -> Self {
        Self {
            rx: None,
            raised: Cell::new(false),
        }
    }

    /// Create a connected sender/signal pair.
    pub fn channel() -> (mpsc::Sender<()>, Self) {
        let (tx, rx) = mpsc::channel();
        (
            tx,
            Self {
                rx: Some(rx),
                raised: Cell::new(false),
            },
        )
    }

    pub fn is_raised(&self) -> bool {
        if self.raised.get() {
            return true;
        }
        let Some(rx) = &self.rx else {
            return false;
        };
        match rx.try_recv() {
            Err(TryRecvError::Empty) => false,
            Ok(()) | Err(TryRecvError::Disconnected) => {
                self.raised.set(true);
                true
            }
        }
    }

    /// Sleep for `wait`, returning `true` if a stop was requested before or
    /// during the wait.
    pub fn sleep(&self, wait: Duration) -> bool {
        if self.is_raised() {
            return true;
        }
        let Some(rx) = &self.rx else {
            thread::sleep(wait);
            return false;
        };
        match rx.recv_timeout(wait) {
            Err(RecvTimeoutError::Timeout) => false,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                self.raised.set(true);
                true
            }
        }
    }
}

/// Handle to control a running actor.
#[derive(Debug)]
pub struct ActorHandle<T> {
    name: String,
    shutdown: mpsc::Sender<()>,
    join: thread::JoinHandle<Result<T, ActorError>>,
    stats: StatsCell,
}

impl<T: Send + 'static> ActorHandle<T> {
    /// Run `body` on a new thread called `name`.
    pub fn spawn<F>(name: impl Into<String>, body: F) -> Result<Self, ActorError>
    where
        F: FnOnce(StopSignal, StatsCell) -> Result<T, ActorError> + Send + 'static,
    {
        let name = name.into();
        let (shutdown, stop) = StopSignal::channel();
        let stats = StatsCell::new();
        let thread_stats = stats.clone();

        let join = thread::Builder::new()
            .name(name.clone())
            .spawn(move || body(stop, thread_stats))?;

        Ok(Self {
            name,
            shutdown,
            join,
            stats,
        })
    }
}

impl<T> ActorHandle<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current actor statistics.
    pub fn stats(&self) -> ActorStats {
        self.stats.get()
    }

    /// Live statistics that stay readable after the handle is consumed.
    pub fn stats_cell(&self) -> StatsCell {
        self.stats.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Request a graceful stop and wait for the actor to exit.
    pub fn shutdown(self) -> Result<T, ActorError> {
        let _ = self.shutdown.send(());
        self.join()
    }

    /// Wait for the actor to finish on its own.
    pub fn join(self) -> Result<T, ActorError> {
        let Self { shutdown, join, .. } = self;
        let result = join.join();
        // Keep the sender alive until the thread is gone so a plain join is
        // never mistaken for a stop request.
        drop(shutdown);
        result.map_err(|_| ActorError::Panicked)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn never_signal_is_never_raised() {
        let stop = StopSignal::never();
        assert!(!stop.sleep(Duration::from_millis(1)));
        assert!(!stop.is_raised());
    }

    #[test]
    fn stop_request_latches() {
        let (tx, stop) = StopSignal::channel();
        assert!(!stop.is_raised());
        tx.send(()).unwrap();
        assert!(stop.is_raised());
        assert!(stop.is_raised());
    }

    #[test]
    fn dropped_sender_counts_as_stop() {
        let (tx, stop) = StopSignal::channel();
        drop(tx);
        assert!(stop.sleep(Duration::from_secs(5)));
    }

    #[test]
    fn stop_interrupts_a_long_sleep() {
        let handle = ActorHandle::spawn("sleeper", |stop, _stats| {
            Ok(stop.sleep(Duration::from_secs(30)))
        })
        .unwrap();

        let started = Instant::now();
        let interrupted = handle.shutdown().unwrap();

        assert!(interrupted);
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn join_does_not_raise_stop() {
        let handle = ActorHandle::spawn("worker", |stop, stats| {
            stats.record_attempt(true);
            Ok(stop.sleep(Duration::from_millis(20)))
        })
        .unwrap();
        assert_eq!(handle.name(), "worker");

        assert!(!handle.join().unwrap());
    }

    #[test]
    fn panicking_actor_is_reported() {
        let handle: ActorHandle<()> =
            ActorHandle::spawn("boom", |_stop, _stats| panic!("boom")).unwrap();
        assert!(matches!(handle.join(), Err(ActorError::Panicked)));
    }

    #[test]
    fn stats_count_attempts_and_orders() {
        let stats = StatsCell::new();
        stats.record_attempt(false);
        stats.record_attempt(true);
        stats.record_order();

        assert_eq!(
            stats.get(),
            ActorStats {
                attempts: 2,
                accepted: 1,
                refused: 1,
                orders_placed: 1,
            }
        );
    }
}
