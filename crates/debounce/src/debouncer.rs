//! Trailing-edge debouncer
//!
//! A `Debouncer` exposes a *settled* value that only follows its input once
//! the input has stopped changing for the configured delay. Every change
//! cancels the pending timer and arms a new one; teardown cancels it for good.
//!
//! The timer facility is the tokio runtime of the calling thread. Each armed
//! timer carries a generation number, and a timer only commits while its
//! generation is still current, so a canceled timer can never commit even if
//! it already woke up.

use crate::{DebounceError, Result};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace};

/// Debouncer lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No timer armed; the settled value is current
    Idle,
    /// A timer is armed for the last observed input
    Pending,
    /// Torn down; no further transitions
    Disposed,
}

/// Mutable state guarded by a single lock
struct State<T> {
    /// Last observed input
    last_input: T,
    /// Delay the last input was observed with
    delay: Duration,
    /// Bumped on every re-arm and on dispose
    generation: u64,
    phase: Phase,
    /// Pending timer task, if any
    timer: Option<JoinHandle<()>>,
}

struct Shared<T> {
    state: Mutex<State<T>>,
    settled: watch::Sender<T>,
    /// Commit counter, bumped even when the settled value is unchanged
    commits: watch::Sender<u64>,
}

impl<T> Shared<T>
where
    T: Clone + PartialEq,
{
    /// Commit `value` if the timer that carries `generation` is still current
    fn commit(&self, generation: u64, value: T) {
        let mut state = self.state.lock();
        if state.generation != generation || state.phase != Phase::Pending {
            trace!(generation, current = state.generation, "Dropping stale debounce commit");
            return;
        }

        state.phase = Phase::Idle;
        state.timer = None;

        let changed = self.settled.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
        self.commits.send_modify(|n| *n += 1);
        debug!(generation, changed, "Debounced value settled");
    }
}

/// Trailing-edge debouncer over a value of type `T`
///
/// Dropping the debouncer tears it down.
pub struct Debouncer<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Debouncer<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Create a debouncer whose settled value starts at `initial`
    pub fn new(initial: T, delay: Duration) -> Self {
        let (settled, _) = watch::channel(initial.clone());
        let (commits, _) = watch::channel(0u64);
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    last_input: initial,
                    delay,
                    generation: 0,
                    phase: Phase::Idle,
                    timer: None,
                }),
                settled,
                commits,
            }),
        }
    }

    /// Observe a new `(value, delay)` pair and return the settled value
    ///
    /// If the pair differs from the last one observed, the pending timer is
    /// canceled and a new one is armed; it commits `value` after `delay`
    /// unless another change or teardown comes first. Observing an
    /// unchanged pair leaves the running timer alone.
    ///
    /// Fails with [`DebounceError::ResourceExhausted`] when no tokio runtime
    /// is available to host the timer, and with [`DebounceError::Disposed`]
    /// after teardown. Neither failure changes any state.
    pub fn observe(&self, value: T, delay: Duration) -> Result<T> {
        let mut state = self.shared.state.lock();

        if state.phase == Phase::Disposed {
            return Err(DebounceError::Disposed);
        }

        if state.last_input == value && state.delay == delay {
            drop(state);
            return Ok(self.settled());
        }

        let runtime = Handle::try_current().map_err(|_| DebounceError::ResourceExhausted)?;

        state.generation += 1;
        let generation = state.generation;

        if let Some(timer) = state.timer.take() {
            timer.abort();
            trace!(generation, "Canceled pending debounce timer");
        }

        state.last_input = value.clone();
        state.delay = delay;
        state.phase = Phase::Pending;

        // Deadline is fixed here so the timer restarts from this observation,
        // not from whenever the task is first polled
        let deadline = Instant::now() + delay;
        let shared: Weak<Shared<T>> = Arc::downgrade(&self.shared);

        state.timer = Some(runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if let Some(shared) = shared.upgrade() {
                shared.commit(generation, value);
            }
        }));
        debug!(generation, delay_ms = delay.as_millis() as u64, "Armed debounce timer");

        drop(state);
        Ok(self.settled())
    }

    /// Observe a new value with the current delay
    pub fn update(&self, value: T) -> Result<T> {
        let delay = self.delay();
        self.observe(value, delay)
    }

    /// Most recently settled value
    pub fn settled(&self) -> T {
        self.shared.settled.borrow().clone()
    }

    /// Subscribe to settled-value changes
    ///
    /// The receiver is notified only when a commit changes the settled value.
    /// Once the debouncer is dropped, `changed()` returns an error.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.shared.settled.subscribe()
    }

    /// Subscribe to commit events
    ///
    /// Unlike `subscribe`, this fires on every commit, including one that
    /// leaves the settled value unchanged (e.g. re-typing the settled value
    /// after an edit). The payload is the running commit count.
    pub fn commits(&self) -> watch::Receiver<u64> {
        self.shared.commits.subscribe()
    }

    /// Delay of the last observation
    pub fn delay(&self) -> Duration {
        self.shared.state.lock().delay
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> Phase {
        self.shared.state.lock().phase
    }

    /// Tear down: cancel any pending timer and refuse further observations
    ///
    /// The settled value is frozen at whatever it was. Idempotent.
    pub fn dispose(&self) {
        let mut state = self.shared.state.lock();
        if state.phase == Phase::Disposed {
            return;
        }

        state.generation += 1;
        if let Some(timer) = state.timer.take() {
            timer.abort();
            debug!("Debouncer disposed with a pending timer");
        }
        state.phase = Phase::Disposed;
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        let mut state = self.shared.state.lock();
        state.generation += 1;
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        state.phase = Phase::Disposed;
    }
}
