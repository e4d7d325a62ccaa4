//! Locks: a CAS spin lock and a call-site-tracking reader-writer lock.
//!
//! Both expose explicit `lock`/`unlock` pairs rather than only guards, because
//! the diagnostic lock must be a drop-in for code written against that shape.
//! [`RawLock`] is the shared "locker" interface and [`LockGuard`] its RAII form.

use std::panic::Location;

pub mod diagnostic_rwlock;
pub mod spin_lock;


pub use diagnostic_rwlock::{CallSite, DiagnosticReadGuard, DiagnosticRwLock, LockOp};
pub use spin_lock::SpinLock;

/// An exclusive lock driven by explicit `lock`/`unlock` calls.
///
/// Implementors decide what misuse means: [`SpinLock`] treats a stray
/// `unlock` as a no-op, [`DiagnosticRwLock`] panics.
pub trait RawLock {
    /// Blocks until the lock is held by the caller.
    #[track_caller]
    fn lock(&self);

    /// Releases the lock.
    #[track_caller]
    fn unlock(&self);

    /// Releases the lock on behalf of the code at `location`.
    ///
    /// [`LockGuard`] calls this on drop with the location that acquired it,
    /// since `Drop` has no caller of its own. Locks that do not record call
    /// sites can keep the default, which is a plain [`unlock`](RawLock::unlock).
    fn unlock_at(&self, location: &'static Location<'static>) {
        let _ = location;
        self.unlock();
    }

    /// Acquires the lock and returns a guard that releases it on drop.
    #[track_caller]
    fn guard(&self) -> LockGuard<'_, Self>
    where
        Self: Sized,
    {
        self.lock();
        LockGuard {
            lock: self,
            acquired_at: Location::caller(),
        }
    }
}

/// RAII guard for any [`RawLock`]; unlocks when dropped.
#[must_use = "if unused the lock is released immediately"]
pub struct LockGuard<'a, L: RawLock> {
    lock: &'a L,
    acquired_at: &'static Location<'static>,
}

impl<L: RawLock> LockGuard<'_, L> {
    /// The lock this guard holds.
    #[inline]
    pub fn lock(&self) -> &L {
        self.lock
    }

    /// Where the guard was taken.
    #[inline]
    pub fn acquired_at(&self) -> &'static Location<'static> {
        self.acquired_at
    }
}

impl<L: RawLock> Drop for LockGuard<'_, L> {
    fn drop(&mut self) {
        self.lock.unlock_at(self.acquired_at);
    }
}
