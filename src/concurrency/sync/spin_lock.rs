//! `SpinLock` — a one-word busy-wait lock.

use core::fmt;
use core::sync::atomic::Ordering;

use super::RawLock;
use crate::concurrency::shim::{yield_now, AtomicU32};
use crate::marker::NonCopyable;

/// A busy-wait mutual-exclusion lock over a single flag word.
///
/// `lock` spins on a CAS from unlocked to locked and yields the rest of the
/// thread's time slice after every failed attempt, so the holder can make
/// progress on an oversubscribed or single-core scheduler.
///
/// There is no ownership tracking: `unlock` unconditionally clears the flag,
/// and unlocking an unlocked lock is a no-op. Only release a lock you hold.
///
/// # States
/// - 0: Unlocked
/// - 1: Locked
///
/// ```
/// use tinysync::SpinLock;
///
/// let lock = SpinLock::new();
/// lock.lock();
/// assert!(!lock.try_lock());
/// lock.unlock();
/// assert!(!lock.is_locked());
/// ```
pub struct SpinLock {
    state: AtomicU32,
    _marker: NonCopyable,
}

impl SpinLock {
    const UNLOCKED: u32 = 0;
    const LOCKED: u32 = 1;

    /// Creates an unlocked spin lock.
    #[inline]
    pub fn new() -> Self {
        Self {
            state: AtomicU32::new(Self::UNLOCKED),
            _marker: NonCopyable::new(),
        }
    }

    /// Spins until the lock is acquired.
    #[inline]
    pub fn lock(&self) {
        while !self.try_lock() {
            yield_now();
        }
    }

    /// Attempts a single CAS from unlocked to locked.
    #[inline]
    pub fn try_lock(&self) -> bool {
        self.state
            .compare_exchange(Self::UNLOCKED, Self::LOCKED, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    /// Releases the lock. A no-op if the lock is not held.
    #[inline]
    pub fn unlock(&self) {
        self.state.store(Self::UNLOCKED, Ordering::Release);
    }

    /// Returns whether some thread currently holds the lock.
    #[inline]
    pub fn is_locked(&self) -> bool {
        self.state.load(Ordering::Relaxed) == Self::LOCKED
    }
}

impl Default for SpinLock {
    fn default() -> Self {
        Self::new()
    }
}

impl RawLock for SpinLock {
    #[inline]
    fn lock(&self) {
        SpinLock::lock(self);
    }

    #[inline]
    fn unlock(&self) {
        SpinLock::unlock(self);
    }
}

impl fmt::Debug for SpinLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpinLock").field("locked", &self.is_locked()).finish()
    }
}
