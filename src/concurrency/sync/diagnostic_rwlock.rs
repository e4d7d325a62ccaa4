//! `DiagnosticRwLock` — a reader-writer lock that reports who is holding it.
//!
//! Every acquisition and release records its call site. When an acquisition
//! does not complete within the configured timeout the lock gives up and
//! produces a [`LockTimeout`] report naming the current writer, the number of
//! readers and a frequency table of every call site seen so far. The
//! panicking entry points (`lock`, `read_lock`) abort with that report; the
//! `*_checked` variants hand it back instead.
//!
//! This is a debugging aid. It costs a mutex round trip and a hash map update
//! per operation, and the history table grows for the lifetime of the lock.
//!
//! The wait is a timed acquisition on `parking_lot`'s raw lock, so a
//! timed-out attempt is withdrawn and can never complete behind the caller's
//! back.

use std::collections::HashMap;
use std::fmt;
use std::panic::Location;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::lock_api::{self, RawRwLock as _, RawRwLockTimed as _};
use parking_lot::{Mutex, RawRwLock};

use super::RawLock;
use crate::config::LockConfig;
use crate::marker::NonCopyable;

/// The operation recorded at a call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LockOp {
    /// Exclusive acquisition.
    Lock,
    /// Exclusive release.
    Unlock,
    /// Shared acquisition.
    RLock,
    /// Shared release.
    RUnlock,
}

impl fmt::Display for LockOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LockOp::Lock => "Lock",
            LockOp::Unlock => "Unlock",
            LockOp::RLock => "RLock",
            LockOp::RUnlock => "RUnlock",
        })
    }
}

/// Where in the calling code a lock operation happened.
///
/// Displayed as `"<op>: <file>:<line>:<column>"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallSite {
    op: LockOp,
    location: &'static Location<'static>,
}

impl CallSite {
    /// Captures the caller's location.
    #[track_caller]
    #[inline]
    pub fn here(op: LockOp) -> Self {
        Self::at(op, Location::caller())
    }

    pub(crate) fn at(op: LockOp, location: &'static Location<'static>) -> Self {
        Self { op, location }
    }

    /// The recorded operation.
    pub fn op(&self) -> LockOp {
        self.op
    }

    /// The source location of the call.
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.op, self.location)
    }
}

/// Report produced when an acquisition exceeds its timeout.
#[derive(Debug, Clone, thiserror::Error)]
#[error(
    "lock timed out after {timeout:?}\nwaiting at: {waiter}{}",
    ReportTail::new(.writer, .readers, .history)
)]
pub struct LockTimeout {
    /// The timeout that elapsed.
    pub timeout: Duration,
    /// The acquisition that gave up.
    pub waiter: CallSite,
    /// The call site holding the exclusive lock, if any.
    pub writer: Option<CallSite>,
    /// Shared holds outstanding at the time of the report.
    pub readers: usize,
    /// Every call site seen so far with its count, most frequent first.
    pub history: Vec<(CallSite, u64)>,
}

// Holder, reader and history lines; each is omitted when empty.
struct ReportTail<'a> {
    writer: Option<&'a CallSite>,
    readers: usize,
    history: &'a [(CallSite, u64)],
}

impl<'a> ReportTail<'a> {
    fn new(writer: &'a Option<CallSite>, readers: &usize, history: &'a [(CallSite, u64)]) -> Self {
        Self {
            writer: writer.as_ref(),
            readers: *readers,
            history,
        }
    }
}

impl fmt::Display for ReportTail<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(writer) = self.writer {
            write!(f, "\nwrite lock held by: {writer}")?;
        }
        if self.readers != 0 {
            write!(f, "\nread lock held {} times", self.readers)?;
        }
        if !self.history.is_empty() {
            f.write_str("\nlock history:")?;
            for (site, count) in self.history {
                write!(f, "\n  {site}: {count}")?;
            }
        }
        Ok(())
    }
}

#[derive(Default)]
struct Diagnostics {
    writer: Option<CallSite>,
    history: HashMap<CallSite, u64>,
}

impl Diagnostics {
    fn record(&mut self, site: CallSite) {
        *self.history.entry(site).or_insert(0) += 1;
    }

    fn sorted_history(&self) -> Vec<(CallSite, u64)> {
        let mut history: Vec<_> = self.history.iter().map(|(site, n)| (*site, *n)).collect();
        history.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        history
    }
}

/// A reader-writer lock that records call sites and reports stuck acquisitions.
///
/// Acquire and release with explicit calls, or through [`RawLock::guard`] and
/// [`DiagnosticRwLock::read_guard`]. Releasing a hold that does not exist
/// panics.
///
/// ```
/// use std::time::Duration;
/// use tinysync::{DiagnosticRwLock, LockConfig};
///
/// let lock = DiagnosticRwLock::with_config(LockConfig::with_timeout(Duration::from_millis(20)));
/// lock.lock();
/// let report = lock.read_lock_checked().unwrap_err();
/// assert!(report.writer.is_some());
/// lock.unlock();
/// ```
pub struct DiagnosticRwLock {
    raw: RawRwLock,
    readers: AtomicUsize,
    diagnostics: Mutex<Diagnostics>,
    config: LockConfig,
    _marker: NonCopyable,
}

impl DiagnosticRwLock {
    /// Creates an unlocked lock with the default five second timeout.
    pub fn new() -> Self {
        Self::with_config(LockConfig::default())
    }

    /// Creates an unlocked lock with the given configuration.
    pub fn with_config(config: LockConfig) -> Self {
        Self {
            raw: <RawRwLock as lock_api::RawRwLock>::INIT,
            readers: AtomicUsize::new(0),
            diagnostics: Mutex::new(Diagnostics::default()),
            config,
            _marker: NonCopyable::new(),
        }
    }

    /// The configuration this lock was built with.
    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    /// Acquires the exclusive lock.
    ///
    /// # Panics
    /// Panics with the [`LockTimeout`] report if the lock is not acquired
    /// within the configured timeout.
    #[track_caller]
    pub fn lock(&self) {
        if let Err(report) = self.lock_checked() {
            fail(&report);
        }
    }

    /// Acquires the exclusive lock, returning the report instead of panicking
    /// on timeout.
    ///
    /// # Errors
    /// Returns [`LockTimeout`] if the timeout elapsed first. The lock is not
    /// held in that case.
    #[track_caller]
    pub fn lock_checked(&self) -> Result<(), LockTimeout> {
        let site = CallSite::here(LockOp::Lock);
        if !self.raw.try_lock_exclusive_for(self.config.timeout) {
            return Err(self.timeout_report(site));
        }
        let mut diagnostics = self.diagnostics.lock();
        diagnostics.writer = Some(site);
        diagnostics.record(site);
        drop(diagnostics);
        tracing::trace!(%site, "write lock acquired");
        Ok(())
    }

    /// Releases the exclusive lock.
    ///
    /// # Panics
    /// Panics if the exclusive lock is not held.
    #[track_caller]
    pub fn unlock(&self) {
        self.release_exclusive(CallSite::here(LockOp::Unlock));
    }

    fn release_exclusive(&self, site: CallSite) {
        let mut diagnostics = self.diagnostics.lock();
        diagnostics.record(site);
        assert!(
            diagnostics.writer.take().is_some(),
            "{site}: unlock of unlocked DiagnosticRwLock"
        );
        // SAFETY: `writer` is only set while the exclusive lock is held, and
        // taking it under the diagnostics mutex makes this the single release.
        unsafe { self.raw.unlock_exclusive() };
        drop(diagnostics);
        tracing::trace!(%site, "write lock released");
    }

    /// Acquires a shared lock.
    ///
    /// # Panics
    /// Panics with the [`LockTimeout`] report if the lock is not acquired
    /// within the configured timeout.
    #[track_caller]
    pub fn read_lock(&self) {
        if let Err(report) = self.read_lock_checked() {
            fail(&report);
        }
    }

    /// Acquires a shared lock, returning the report instead of panicking on
    /// timeout.
    ///
    /// # Errors
    /// Returns [`LockTimeout`] if the timeout elapsed first.
    #[track_caller]
    pub fn read_lock_checked(&self) -> Result<(), LockTimeout> {
        let site = CallSite::here(LockOp::RLock);
        if !self.raw.try_lock_shared_for(self.config.timeout) {
            return Err(self.timeout_report(site));
        }
        self.diagnostics.lock().record(site);
        self.readers.fetch_add(1, Ordering::AcqRel);
        tracing::trace!(%site, "read lock acquired");
        Ok(())
    }

    /// Releases a shared lock.
    ///
    /// # Panics
    /// Panics if no shared lock is held.
    #[track_caller]
    pub fn read_unlock(&self) {
        self.release_shared(CallSite::here(LockOp::RUnlock));
    }

    fn release_shared(&self, site: CallSite) {
        self.diagnostics.lock().record(site);
        let released = self
            .readers
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        assert!(
            released.is_ok(),
            "{site}: read_unlock of DiagnosticRwLock without a read lock held"
        );
        // SAFETY: the reader count was non-zero, so a shared hold exists.
        unsafe { self.raw.unlock_shared() };
        tracing::trace!(%site, "read lock released");
    }

    /// Acquires a shared lock and returns a guard that releases it on drop.
    ///
    /// The release is recorded at the same call site as the acquisition.
    #[track_caller]
    pub fn read_guard(&self) -> DiagnosticReadGuard<'_> {
        self.read_lock();
        DiagnosticReadGuard {
            lock: self,
            acquired_at: Location::caller(),
        }
    }

    /// The call site currently holding the exclusive lock.
    pub fn writer(&self) -> Option<CallSite> {
        self.diagnostics.lock().writer
    }

    /// Number of outstanding shared holds.
    pub fn reader_count(&self) -> usize {
        self.readers.load(Ordering::Acquire)
    }

    /// Snapshot of the call-site history, most frequent first.
    pub fn history(&self) -> Vec<(CallSite, u64)> {
        self.diagnostics.lock().sorted_history()
    }

    fn timeout_report(&self, waiter: CallSite) -> LockTimeout {
        let diagnostics = self.diagnostics.lock();
        LockTimeout {
            timeout: self.config.timeout,
            waiter,
            writer: diagnostics.writer,
            readers: self.readers.load(Ordering::Acquire),
            history: diagnostics.sorted_history(),
        }
    }
}

#[cold]
#[track_caller]
fn fail(report: &LockTimeout) -> ! {
    tracing::error!(waiter = %report.waiter, "{report}");
    panic!("{report}");
}

impl Default for DiagnosticRwLock {
    fn default() -> Self {
        Self::new()
    }
}

impl RawLock for DiagnosticRwLock {
    #[track_caller]
    fn lock(&self) {
        DiagnosticRwLock::lock(self);
    }

    #[track_caller]
    fn unlock(&self) {
        DiagnosticRwLock::unlock(self);
    }

    fn unlock_at(&self, location: &'static Location<'static>) {
        self.release_exclusive(CallSite::at(LockOp::Unlock, location));
    }
}

impl fmt::Debug for DiagnosticRwLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticRwLock")
            .field("writer", &self.writer())
            .field("readers", &self.reader_count())
            .field("timeout", &self.config.timeout)
            .finish_non_exhaustive()
    }
}

/// RAII shared hold on a [`DiagnosticRwLock`].
#[must_use = "if unused the read lock is released immediately"]
pub struct DiagnosticReadGuard<'a> {
    lock: &'a DiagnosticRwLock,
    acquired_at: &'static Location<'static>,
}

impl DiagnosticReadGuard<'_> {
    /// Where the guard was taken.
    #[inline]
    pub fn acquired_at(&self) -> &'static Location<'static> {
        self.acquired_at
    }
}

impl Drop for DiagnosticReadGuard<'_> {
    fn drop(&mut self) {
        self.lock
            .release_shared(CallSite::at(LockOp::RUnlock, self.acquired_at));
    }
}
