//! Lock-free atomic bit fields.
//!
//! These types provide **concurrent writer** access to a single machine word
//! using compare-and-swap retry loops.
//!
//! Important:
//! - Atomicity is per field. Two fields updated "together" are two independent
//!   linearization points.
//! - Memory ordering is `AcqRel` on successful updates and `Acquire` on loads,
//!   so a flag set in one thread publishes the writes that preceded it.

/// `AtomicBitField<W>` and its 32/64-bit aliases.
pub mod bitfield;
/// Single-bit views.
pub mod bit;
/// Supported word widths.
pub mod word;

pub use bit::BitView;
pub use bitfield::{AtomicBitField, AtomicBitField32, AtomicBitField64};
pub use word::BitWord;
