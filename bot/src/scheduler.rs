//! Cancelable one-shot timers.
//!
//! Every scheduled timer gets a fresh [`TimerToken`]. Tokens only ever grow, so
//! a timer that fires after being superseded is recognised as stale even if the
//! game has returned to the same position in the meantime.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(pub u64);

/// Sent by [`TokioScheduler`] when a timer elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerFired(pub TimerToken);

pub trait TimerHandle {
    fn token(&self) -> TimerToken;

    /// Stop the timer from firing. Harmless if it already has.
    fn cancel(self);
}

pub trait Scheduler {
    type Handle: TimerHandle;

    fn schedule(&mut self, delay: Duration) -> Self::Handle;
}

/// Timers as tokio sleep tasks reporting on a channel.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    next: Arc<AtomicU64>,
    fired_tx: mpsc::Sender<TimerFired>,
}

impl TokioScheduler {
    /// The receiver yields a [`TimerFired`] for every timer that was not cancelled.
    pub fn new() -> (Self, mpsc::Receiver<TimerFired>) {
        let (fired_tx, fired_rx) = mpsc::channel(16);
        let scheduler = Self {
            next: Arc::new(AtomicU64::new(1)),
            fired_tx,
        };
        (scheduler, fired_rx)
    }
}

#[derive(Debug)]
pub struct TokioTimer {
    token: TimerToken,
    task: JoinHandle<()>,
}

impl TimerHandle for TokioTimer {
    fn token(&self) -> TimerToken {
        self.token
    }

    fn cancel(self) {
        self.task.abort();
    }
}

impl Drop for TokioTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl Scheduler for TokioScheduler {
    type Handle = TokioTimer;

    fn schedule(&mut self, delay: Duration) -> TokioTimer {
        let token = TimerToken(self.next.fetch_add(1, Ordering::Relaxed));
        let fired_tx = self.fired_tx.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if fired_tx.send(TimerFired(token)).await.is_err() {
                tracing::trace!("Timer {:?} fired with nobody listening", token);
            }
        });
        TokioTimer { token, task }
    }
}

#[cfg(test)]
pub(crate) use manual::ManualScheduler;

/// Deterministic timers for unit tests.
#[cfg(test)]
mod manual {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    use super::{Scheduler, TimerHandle, TimerToken};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ManualTimer {
        pub token: TimerToken,
        pub delay: Duration,
        pub cancelled: bool,
    }

    /// Records timers without running them. Clones share the same record, so a
    /// test can keep one clone and hand the other to a controller.
    #[derive(Debug, Clone, Default)]
    pub struct ManualScheduler {
        timers: Rc<RefCell<Vec<ManualTimer>>>,
    }

    impl ManualScheduler {
        pub fn new() -> Self {
            Self::default()
        }

        /// Every timer scheduled so far, cancelled ones included.
        pub fn timers(&self) -> Vec<ManualTimer> {
            self.timers.borrow().clone()
        }

        /// Tokens of timers still waiting to fire.
        pub fn pending(&self) -> Vec<TimerToken> {
            self.timers
                .borrow()
                .iter()
                .filter(|t| !t.cancelled)
                .map(|t| t.token)
                .collect()
        }

        /// Mark `token` as fired so it no longer shows as pending.
        pub fn fire(&self, token: TimerToken) -> TimerToken {
            self.mark_cancelled(token);
            token
        }

        fn mark_cancelled(&self, token: TimerToken) {
            if let Some(timer) = self.timers.borrow_mut().iter_mut().find(|t| t.token == token) {
                timer.cancelled = true;
            }
        }
    }

    #[derive(Debug)]
    pub struct ManualHandle {
        token: TimerToken,
        scheduler: ManualScheduler,
    }

    impl TimerHandle for ManualHandle {
        fn token(&self) -> TimerToken {
            self.token
        }

        fn cancel(self) {
            self.scheduler.mark_cancelled(self.token);
        }
    }

    impl Scheduler for ManualScheduler {
        type Handle = ManualHandle;

        fn schedule(&mut self, delay: Duration) -> ManualHandle {
            let token = {
                let mut timers = self.timers.borrow_mut();
                let token = TimerToken(timers.len() as u64 + 1);
                timers.push(ManualTimer {
                    token,
                    delay,
                    cancelled: false,
                });
                token
            };
            ManualHandle {
                token,
                scheduler: self.clone(),
            }
        }
    }
}
