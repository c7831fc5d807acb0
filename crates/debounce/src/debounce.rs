//! Value debouncing
//!
//! A [`Debouncer`] holds back a rapidly changing input and only commits it
//! once no newer value has been observed for a full delay:
//!
//! ```text
//!            observe                    timer expiry / flush
//!   Idle ─────────────────► Pending ───────────────────────► Idle (commit)
//!    ▲                       │  ▲
//!    │   cancel / dispose    │  │ observe (preempt + rearm)
//!    └───────────────────────┘  └──┘
//! ```
//!
//! Commits are published through a [`tokio::sync::watch`] channel, so a
//! consumer can await changes, poll them from a manual loop, or just read
//! [`Debouncer::current`].

use crate::error::Result;
use crate::scheduler::{Scheduler, TokioScheduler};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

/// Observable state of a debouncer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    /// No timer armed
    Idle,
    /// A value is buffered and its timer is armed
    Pending,
}

/// Debounces values of type `T` using timers from `S`
///
/// Dropping the debouncer disposes it: the pending timer is cancelled and
/// subscribers see the channel close.
pub struct Debouncer<T, S = TokioScheduler>
where
    T: Clone + Send + Sync + 'static,
    S: Scheduler,
{
    shared: Arc<Shared<T, S>>,
}

struct Shared<T, S: Scheduler> {
    scheduler: S,
    state: Mutex<State<T, S::Handle>>,
    output: watch::Sender<T>,
}

struct State<T, H> {
    phase: Phase<T, H>,
    /// Delay used by `push` and updated by every `observe`
    delay: Duration,
    /// Bumped on every arm; a timer only commits if it is still current
    generation: u64,
    commits: u64,
    disposed: bool,
}

enum Phase<T, H> {
    Idle,
    Pending { value: T, timer: H, generation: u64 },
}

impl<T> Debouncer<T, TokioScheduler>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a debouncer on the current tokio runtime
    ///
    /// `seed` is reported by [`current`](Self::current) until the first
    /// commit.
    pub fn new(seed: T, delay: Duration) -> Result<Self> {
        Ok(Self::with_scheduler(seed, delay, TokioScheduler::current()?))
    }
}

impl<T, S> Debouncer<T, S>
where
    T: Clone + Send + Sync + 'static,
    S: Scheduler,
{
    /// Create a debouncer driven by an arbitrary scheduler
    pub fn with_scheduler(seed: T, delay: Duration, scheduler: S) -> Self {
        let (output, _) = watch::channel(seed);
        Self {
            shared: Arc::new(Shared {
                scheduler,
                state: Mutex::new(State {
                    phase: Phase::Idle,
                    delay,
                    generation: 0,
                    commits: 0,
                    disposed: false,
                }),
                output,
            }),
        }
    }

    /// Record a new input value
    ///
    /// Any pending value is dropped and a fresh timer of `delay` is armed for
    /// `value`. Equal consecutive values still restart the window. The commit
    /// never happens inside this call, even for a zero delay. No-op after
    /// [`dispose`](Self::dispose).
    pub fn observe(&self, value: T, delay: Duration) {
        let mut state = self.shared.state.lock();
        if state.disposed {
            debug!("Ignoring observation on disposed debouncer");
            return;
        }

        if let Phase::Pending { timer, .. } = std::mem::replace(&mut state.phase, Phase::Idle) {
            self.shared.scheduler.cancel(timer);
            debug!("Preempted pending value (generation {})", state.generation);
        }

        state.delay = delay;
        state.generation += 1;
        let generation = state.generation;

        let weak = Arc::downgrade(&self.shared);
        let timer = self
            .shared
            .scheduler
            .schedule(delay, Box::new(move || expire(weak, generation)));

        state.phase = Phase::Pending {
            value,
            timer,
            generation,
        };
        debug!("Armed debounce timer (generation {}, delay {:?})", generation, delay);
    }

    /// Record a new input value using the current delay
    pub fn push(&self, value: T) {
        let delay = self.delay();
        self.observe(value, delay);
    }

    /// Delay applied by [`push`](Self::push)
    pub fn delay(&self) -> Duration {
        self.shared.state.lock().delay
    }

    /// Change the delay for subsequent observations
    ///
    /// A timer that is already armed keeps the duration it was armed with.
    pub fn set_delay(&self, delay: Duration) {
        self.shared.state.lock().delay = delay;
    }

    /// Last committed value, or the seed before the first commit
    pub fn current(&self) -> T {
        self.shared.output.borrow().clone()
    }

    /// Subscribe to commits
    ///
    /// The receiver starts out with the current value marked as seen and is
    /// closed once the debouncer is dropped.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.shared.output.subscribe()
    }

    /// Whether a value is waiting for its quiescence window to elapse
    pub fn state(&self) -> DebounceState {
        match self.shared.state.lock().phase {
            Phase::Idle => DebounceState::Idle,
            Phase::Pending { .. } => DebounceState::Pending,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state() == DebounceState::Pending
    }

    pub fn is_disposed(&self) -> bool {
        self.shared.state.lock().disposed
    }

    /// Number of values committed so far
    pub fn commit_count(&self) -> u64 {
        self.shared.state.lock().commits
    }

    /// Drop the pending value without committing it
    ///
    /// Returns the discarded value. The debouncer stays usable.
    pub fn cancel(&self) -> Option<T> {
        let mut state = self.shared.state.lock();
        match std::mem::replace(&mut state.phase, Phase::Idle) {
            Phase::Pending { value, timer, .. } => {
                self.shared.scheduler.cancel(timer);
                debug!("Cancelled pending value (generation {})", state.generation);
                Some(value)
            }
            Phase::Idle => None,
        }
    }

    /// Commit the pending value now instead of waiting for its timer
    ///
    /// Returns whether a value was committed.
    pub fn flush(&self) -> bool {
        let mut state = self.shared.state.lock();
        if state.disposed {
            return false;
        }

        match std::mem::replace(&mut state.phase, Phase::Idle) {
            Phase::Pending { value, timer, .. } => {
                self.shared.scheduler.cancel(timer);
                self.shared.commit(&mut state, value);
                true
            }
            Phase::Idle => false,
        }
    }

    /// Tear down: cancel any pending timer and ignore further observations
    ///
    /// Safe to call repeatedly and with nothing pending.
    pub fn dispose(&self) {
        let mut state = self.shared.state.lock();
        if state.disposed {
            return;
        }
        state.disposed = true;

        if let Phase::Pending { timer, .. } = std::mem::replace(&mut state.phase, Phase::Idle) {
            self.shared.scheduler.cancel(timer);
        }
        debug!("Disposed debouncer after {} commits", state.commits);
    }
}

impl<T, S> Drop for Debouncer<T, S>
where
    T: Clone + Send + Sync + 'static,
    S: Scheduler,
{
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<T, S> std::fmt::Debug for Debouncer<T, S>
where
    T: Clone + Send + Sync + std::fmt::Debug + 'static,
    S: Scheduler,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("Debouncer")
            .field("current", &*self.shared.output.borrow())
            .field("pending", &matches!(state.phase, Phase::Pending { .. }))
            .field("delay", &state.delay)
            .field("commits", &state.commits)
            .field("disposed", &state.disposed)
            .finish()
    }
}

impl<T, S> Shared<T, S>
where
    T: Clone + Send + Sync + 'static,
    S: Scheduler,
{
    fn commit(&self, state: &mut State<T, S::Handle>, value: T) {
        state.commits += 1;
        self.output.send_replace(value);
        debug!("Committed debounced value (commit #{})", state.commits);
    }
}

/// Timer callback: commit the buffered value if this timer is still current
fn expire<T, S>(shared: Weak<Shared<T, S>>, generation: u64)
where
    T: Clone + Send + Sync + 'static,
    S: Scheduler,
{
    let Some(shared) = shared.upgrade() else {
        return;
    };

    let mut state = shared.state.lock();
    let current = matches!(
        state.phase,
        Phase::Pending { generation: armed, .. } if armed == generation
    );
    if state.disposed || !current {
        debug!("Discarding stale timer (generation {})", generation);
        return;
    }

    if let Phase::Pending { value, .. } = std::mem::replace(&mut state.phase, Phase::Idle) {
        shared.commit(&mut state, value);
    }
}
