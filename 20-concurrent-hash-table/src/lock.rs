//! Instrumented reader/writer lock around the record store.
//!
//! [`TableLock`] owns the [`RecordStore`]. Workers reach it only through the
//! guards returned by [`TableLock::read`] and [`TableLock::write`]: a
//! [`ReadGuard`] derefs to `&RecordStore`, a [`WriteGuard`] to
//! `&mut RecordStore`, so the "hold the right lock" rule is checked by the
//! compiler instead of being a convention.
//!
//! Each acquisition and release is counted and written to the event log:
//!
//! - acquire: block until the lock is held, bump `acquisitions`, log
//!   `READ LOCK ACQUIRED` / `WRITE LOCK ACQUIRED`
//! - release: unlock, bump `releases`, log `READ LOCK RELEASED` /
//!   `WRITE LOCK RELEASED`

use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::event_log::{EventLog, ThreadId};
use crate::store::RecordStore;

/// Cumulative lock counters at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LockStats {
    pub acquisitions: u64,
    pub releases: u64,
}

impl LockStats {
    /// True when every acquisition has been matched by a release.
    pub fn is_balanced(&self) -> bool {
        self.acquisitions == self.releases
    }
}

#[derive(Default)]
struct Counters {
    acquisitions: AtomicU64,
    releases: AtomicU64,
}

/// The store's reader/writer lock plus its counters.
pub struct TableLock {
    store: RwLock<RecordStore>,
    counters: Counters,
    events: Arc<EventLog>,
}

impl TableLock {
    pub fn new(store: RecordStore, events: Arc<EventLog>) -> Self {
        Self {
            store: RwLock::new(store),
            counters: Counters::default(),
            events,
        }
    }

    /// Takes a shared lock on behalf of `thread`.
    ///
    /// Any number of readers may hold the lock together.
    pub fn read(&self, thread: ThreadId) -> ReadGuard<'_> {
        let guard = self.store.read();
        self.acquired(thread, "READ LOCK ACQUIRED");
        ReadGuard {
            inner: Some(guard),
            lock: self,
            thread,
        }
    }

    /// Takes the exclusive lock on behalf of `thread`.
    pub fn write(&self, thread: ThreadId) -> WriteGuard<'_> {
        let guard = self.store.write();
        self.acquired(thread, "WRITE LOCK ACQUIRED");
        WriteGuard {
            inner: Some(guard),
            lock: self,
            thread,
        }
    }

    pub fn stats(&self) -> LockStats {
        LockStats {
            acquisitions: self.counters.acquisitions.load(Ordering::SeqCst),
            releases: self.counters.releases.load(Ordering::SeqCst),
        }
    }

    /// Gives back the store once nobody else can reach the lock.
    pub fn into_inner(self) -> RecordStore {
        self.store.into_inner()
    }

    fn acquired(&self, thread: ThreadId, message: &str) {
        self.counters.acquisitions.fetch_add(1, Ordering::SeqCst);
        self.events.log(thread, message);
    }

    fn released(&self, thread: ThreadId, message: &str) {
        self.counters.releases.fetch_add(1, Ordering::SeqCst);
        self.events.log(thread, message);
    }
}

/// Shared access to the store. Releases the lock when dropped.
pub struct ReadGuard<'a> {
    inner: Option<RwLockReadGuard<'a, RecordStore>>,
    lock: &'a TableLock,
    thread: ThreadId,
}

impl ReadGuard<'_> {
    /// Releases the lock now rather than at end of scope.
    pub fn release(self) {}
}

impl Deref for ReadGuard<'_> {
    type Target = RecordStore;

    fn deref(&self) -> &RecordStore {
        match &self.inner {
            Some(guard) => &**guard,
            None => unreachable!("read guard used after release"),
        }
    }
}

impl Drop for ReadGuard<'_> {
    fn drop(&mut self) {
        if let Some(guard) = self.inner.take() {
            drop(guard);
            self.lock.released(self.thread, "READ LOCK RELEASED");
        }
    }
}

/// Exclusive access to the store. Releases the lock when dropped.
pub struct WriteGuard<'a> {
    inner: Option<RwLockWriteGuard<'a, RecordStore>>,
    lock: &'a TableLock,
    thread: ThreadId,
}

impl WriteGuard<'_> {
    /// Releases the lock now rather than at end of scope.
    pub fn release(self) {}
}

impl Deref for WriteGuard<'_> {
    type Target = RecordStore;

    fn deref(&self) -> &RecordStore {
        match &self.inner {
            Some(guard) => &**guard,
            None => unreachable!("write guard used after release"),
        }
    }
}

impl DerefMut for WriteGuard<'_> {
    fn deref_mut(&mut self) -> &mut RecordStore {
        match &mut self.inner {
            Some(guard) => &mut **guard,
            None => unreachable!("write guard used after release"),
        }
    }
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        if let Some(guard) = self.inner.take() {
            drop(guard);
            self.lock.released(self.thread, "WRITE LOCK RELEASED");
        }
    }
}
