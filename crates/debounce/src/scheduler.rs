//! Timer facilities that drive debounce commits
//!
//! A debouncer needs exactly two things from its environment: arm a one-shot
//! timer and cancel it. [`Scheduler`] is that seam. Two implementations ship
//! with the crate:
//! - [`TokioScheduler`] spawns a sleeping task on a tokio runtime
//! - [`ManualScheduler`] is a virtual clock advanced by the host (poll loops,
//!   deterministic tests)

use crate::error::{DebounceError, Result};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::trace;

/// Callback run when a timer expires
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// One-shot timer facility
///
/// Implementations must never run `task` from inside [`Scheduler::schedule`];
/// expiry always happens on a later turn of the host's loop, even for a zero
/// delay.
pub trait Scheduler: Send + Sync + 'static {
    /// Opaque handle identifying an armed timer
    type Handle: Send + 'static;

    /// Arm a timer that runs `task` once `delay` has elapsed
    fn schedule(&self, delay: Duration, task: Task) -> Self::Handle;

    /// Disarm a timer. Cancelling an expired timer is a no-op.
    fn cancel(&self, handle: Self::Handle);
}

/// Scheduler backed by a tokio runtime
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    runtime: Handle,
}

impl TokioScheduler {
    /// Use the runtime the caller is running on
    pub fn current() -> Result<Self> {
        Handle::try_current()
            .map(Self::from_handle)
            .map_err(|_| DebounceError::NoRuntime)
    }

    /// Use an explicit runtime handle
    pub fn from_handle(runtime: Handle) -> Self {
        Self { runtime }
    }
}

impl Scheduler for TokioScheduler {
    type Handle = AbortHandle;

    fn schedule(&self, delay: Duration, task: Task) -> AbortHandle {
        // Deadline is fixed now, not when the spawned task first gets polled
        let now = Instant::now();
        let deadline = now.checked_add(delay).unwrap_or_else(|| far_future(now));

        trace!("Arming tokio timer ({:?})", delay);
        self.runtime
            .spawn(async move {
                tokio::time::sleep_until(deadline).await;
                task();
            })
            .abort_handle()
    }

    fn cancel(&self, handle: AbortHandle) {
        handle.abort();
    }
}

fn far_future(now: Instant) -> Instant {
    // Roughly 30 years, same horizon tokio uses for its own far-future sleeps
    now + Duration::from_secs(86400 * 365 * 30)
}

/// Handle for a timer armed on a [`ManualScheduler`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ManualTimer {
    deadline: Duration,
    id: u64,
}

impl ManualTimer {
    /// Virtual time at which the timer expires
    pub fn deadline(&self) -> Duration {
        self.deadline
    }
}

/// Virtual-time scheduler driven by explicit [`advance`](Self::advance) calls
///
/// Time starts at zero. Clones share the same clock.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    clock: Arc<Mutex<ManualClock>>,
}

#[derive(Default)]
struct ManualClock {
    now: Duration,
    next_id: u64,
    /// Armed timers ordered by (deadline, arm order)
    timers: BTreeMap<(Duration, u64), Task>,
}

impl ManualScheduler {
    /// Create a scheduler with its clock at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time
    pub fn now(&self) -> Duration {
        self.clock.lock().now
    }

    /// Number of armed timers
    pub fn pending(&self) -> usize {
        self.clock.lock().timers.len()
    }

    /// Deadline of the earliest armed timer
    pub fn next_deadline(&self) -> Option<Duration> {
        self.clock
            .lock()
            .timers
            .first_key_value()
            .map(|(&(deadline, _), _)| deadline)
    }

    /// Move the clock forward by `by`, running every timer that falls due
    ///
    /// Timers run in deadline order (arm order for equal deadlines) and the
    /// clock reads each timer's deadline while it runs. Tasks run without the
    /// clock locked, so they may arm or cancel timers themselves. Returns the
    /// number of tasks run.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.clock.lock().now.saturating_add(by);
        let mut fired = 0;

        loop {
            let task = {
                let mut clock = self.clock.lock();
                let due = clock
                    .timers
                    .first_key_value()
                    .map(|(&(deadline, _), _)| deadline)
                    .filter(|deadline| *deadline <= target);

                let Some(deadline) = due else {
                    clock.now = target;
                    break;
                };

                clock.now = deadline;
                clock.timers.pop_first().map(|(_, task)| task)
            };

            if let Some(task) = task {
                task();
                fired += 1;
            }
        }

        trace!("Manual clock advanced to {:?} ({} timers fired)", target, fired);
        fired
    }

    /// Run timers that are already due without moving the clock
    pub fn tick(&self) -> usize {
        self.advance(Duration::ZERO)
    }
}

impl Scheduler for ManualScheduler {
    type Handle = ManualTimer;

    fn schedule(&self, delay: Duration, task: Task) -> ManualTimer {
        let mut clock = self.clock.lock();
        let deadline = clock.now.saturating_add(delay);
        let id = clock.next_id;
        clock.next_id += 1;
        clock.timers.insert((deadline, id), task);
        ManualTimer { deadline, id }
    }

    fn cancel(&self, handle: ManualTimer) {
        self.clock.lock().timers.remove(&(handle.deadline, handle.id));
    }
}

impl std::fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let clock = self.clock.lock();
        f.debug_struct("ManualScheduler")
            .field("now", &clock.now)
            .field("pending", &clock.timers.len())
            .finish()
    }
}
