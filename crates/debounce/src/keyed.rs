//! Per-key debouncing
//!
//! Each key gets its own [`Debouncer`], so a burst of changes to one path
//! (or field, or channel) never holds back another.

use crate::debounce::Debouncer;
use crate::error::Result;
use crate::scheduler::{Scheduler, TokioScheduler};
use dashmap::DashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

/// A set of independent debouncers addressed by key
///
/// Keys are created on first use and start out with no committed value.
pub struct KeyedDebouncer<K, T, S = TokioScheduler>
where
    K: Eq + Hash + Clone,
    T: Clone + Send + Sync + 'static,
    S: Scheduler + Clone,
{
    slots: DashMap<K, Debouncer<Option<T>, S>>,
    scheduler: S,
    delay: Duration,
    disposed: AtomicBool,
}

impl<K, T> KeyedDebouncer<K, T, TokioScheduler>
where
    K: Eq + Hash + Clone,
    T: Clone + Send + Sync + 'static,
{
    /// Create a keyed debouncer on the current tokio runtime
    pub fn new(delay: Duration) -> Result<Self> {
        Ok(Self::with_scheduler(delay, TokioScheduler::current()?))
    }
}

impl<K, T, S> KeyedDebouncer<K, T, S>
where
    K: Eq + Hash + Clone,
    T: Clone + Send + Sync + 'static,
    S: Scheduler + Clone,
{
    /// Create a keyed debouncer driven by `scheduler`
    ///
    /// `delay` is the default window for [`push`](Self::push) and for keys
    /// created by [`subscribe`](Self::subscribe).
    pub fn with_scheduler(delay: Duration, scheduler: S) -> Self {
        Self {
            slots: DashMap::new(),
            scheduler,
            delay,
            disposed: AtomicBool::new(false),
        }
    }

    fn slot(&self, key: K) -> dashmap::mapref::one::RefMut<'_, K, Debouncer<Option<T>, S>> {
        let slot = self
            .slots
            .entry(key)
            .or_insert_with(|| Debouncer::with_scheduler(None, self.delay, self.scheduler.clone()));

        // A slot inserted while `dispose` is iterating may be missed by it
        if self.is_disposed() {
            slot.dispose();
        }
        slot
    }

    /// Record a new value for `key`
    ///
    /// Only that key's pending value is preempted. No-op after
    /// [`dispose`](Self::dispose).
    pub fn observe(&self, key: K, value: T, delay: Duration) {
        if self.is_disposed() {
            debug!("Ignoring keyed observation on disposed debouncer");
            return;
        }
        self.slot(key).observe(Some(value), delay);
    }

    /// Record a new value for `key` with that key's current delay
    pub fn push(&self, key: K, value: T) {
        if self.is_disposed() {
            debug!("Ignoring keyed observation on disposed debouncer");
            return;
        }
        self.slot(key).push(Some(value));
    }

    /// Last committed value for `key`
    pub fn current(&self, key: &K) -> Option<T> {
        self.slots.get(key).and_then(|slot| slot.current())
    }

    /// Subscribe to commits for `key`, creating its slot if needed
    pub fn subscribe(&self, key: K) -> watch::Receiver<Option<T>> {
        self.slot(key).subscribe()
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.slots.get(key).is_some_and(|slot| slot.is_pending())
    }

    /// Number of keys with a value waiting to commit
    pub fn pending_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_pending()).count()
    }

    /// Number of tracked keys
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn keys(&self) -> Vec<K> {
        self.slots.iter().map(|slot| slot.key().clone()).collect()
    }

    /// Commit every pending value now, returning how many were committed
    pub fn flush_all(&self) -> usize {
        self.slots.iter().filter(|slot| slot.flush()).count()
    }

    /// Stop tracking `key`, cancelling its pending value
    ///
    /// Returns the key's last committed value. Subscribers of the key see
    /// their channel close.
    pub fn remove(&self, key: &K) -> Option<T> {
        let (_, slot) = self.slots.remove(key)?;
        slot.dispose();
        slot.current()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Dispose every key. Idempotent.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        for slot in self.slots.iter() {
            slot.dispose();
        }
        debug!("Disposed keyed debouncer ({} keys)", self.slots.len());
    }
}

impl<K, T, S> Drop for KeyedDebouncer<K, T, S>
where
    K: Eq + Hash + Clone,
    T: Clone + Send + Sync + 'static,
    S: Scheduler + Clone,
{
    fn drop(&mut self) {
        self.dispose();
    }
}
