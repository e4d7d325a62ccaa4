//! Word-sized synchronization primitives.
//!
//! Important: every primitive here is a shared-state building block, not a
//! scheduler. Nothing in this module spawns threads, performs I/O or retries
//! beyond the CAS loops its algorithms require.

pub mod atomic;
pub(crate) mod shim;
pub mod sync;
