//! # `tinysync` - Word-Sized Concurrency Primitives
//!
//! A small toolkit of low-level synchronization primitives, each independently
//! usable and each no larger than a machine word of shared state (plus
//! diagnostics where that is the point).
//!
//! ## Primitives
//!
//! 1. **Atomic bit fields** ([`AtomicBitField32`], [`AtomicBitField64`]):
//!    - One word of independent boolean flags
//!    - OR / AND / XOR / CLEAR (test-and-clear) / SWAP (drain) / GET
//!    - Every mutation is a CAS retry loop, so operations are linearizable
//!
//! 2. **Bit views** ([`BitView`]):
//!    - A handle on one bit of one field
//!    - `set(bool)` maps onto OR / CLEAR of the field
//!
//! 3. **Spin lock** ([`SpinLock`]):
//!    - One flag word, CAS acquisition, cooperative yield between attempts
//!    - No ownership tracking; a stray `unlock` is a no-op
//!
//! 4. **Diagnostic reader-writer lock** ([`DiagnosticRwLock`]):
//!    - Records the call site of every acquisition and release
//!    - An acquisition that exceeds its [`LockConfig`] timeout aborts with a
//!      report naming the holder, the reader count and the call-site history
//!    - A debugging drop-in, not a production lock
//!
//! 5. **Task list** ([`TaskList`]):
//!    - Append-only teardown callbacks, run once, last-added first
//!    - A panicking task becomes an error; the rest still run
//!
//! ## Identity
//!
//! None of the primitives is `Clone` or `Copy`: each embeds a
//! [`marker::NonCopyable`] so the shared state lives at exactly one address.
//! Share them by reference or behind an `Arc`.
//!
//! ## Example
//!
//! ```rust
//! use tinysync::{AtomicBitField32, SpinLock, TaskList};
//!
//! let events = AtomicBitField32::new();
//! events.set(3);
//! events.bit(5).set(true);
//! assert_eq!(events.swap(), 0b10_1000);
//!
//! let lock = SpinLock::new();
//! lock.lock();
//! lock.unlock();
//!
//! let teardown = TaskList::new();
//! teardown.add(|| println!("closed second"));
//! teardown.add(|| println!("closed first"));
//! assert!(teardown.run().is_empty());
//! ```

#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod concurrency;
pub mod config;
pub mod error;
pub mod marker;
pub mod task_list;

pub use concurrency::atomic::{AtomicBitField, AtomicBitField32, AtomicBitField64, BitView, BitWord};
pub use concurrency::sync::diagnostic_rwlock::LockTimeout;
pub use concurrency::sync::{
    CallSite, DiagnosticReadGuard, DiagnosticRwLock, LockGuard, LockOp, RawLock, SpinLock,
};
pub use config::LockConfig;
pub use error::{ConfigError, TaskPanic};
pub use task_list::TaskList;

// Compile-time assertions for the word-sized layout claims.
#[cfg(not(loom))]
const _: () = {
    use core::mem;

    // The marker is free.
    assert!(mem::size_of::<marker::NonCopyable>() == 0);

    // A bit field is exactly its word.
    assert!(mem::size_of::<AtomicBitField32>() == mem::size_of::<u32>());
    assert!(mem::size_of::<AtomicBitField64>() == mem::size_of::<u64>());

    // So is the spin lock.
    assert!(mem::size_of::<SpinLock>() == mem::size_of::<u32>());

    // A view is a reference plus an index.
    assert!(mem::size_of::<BitView<'static, u64>>() <= mem::size_of::<usize>() * 2);
};
