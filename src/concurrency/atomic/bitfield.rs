//! Lock-free bit fields.
//!
//! A bit field is one machine word treated as a set of independent boolean
//! flags. Every mutation is a compare-and-swap retry loop: load the word,
//! compute the new word from the old one and the mask, attempt the CAS and
//! retry with the freshly observed value on failure. Each operation is
//! therefore linearizable with respect to every other operation on the same
//! field.
//!
//! The loop has no backoff and no retry bound. Contention windows are a single
//! word wide, so in practice a retry is rare; under pathological contention a
//! caller can in principle starve.

use core::fmt;
use core::sync::atomic::Ordering;

use num_traits::Zero;

use super::bit::BitView;
use super::word::BitWord;
use crate::marker::NonCopyable;

/// A lock-free bit field over the word type `W`.
///
/// Starts zeroed. Share it by reference (or behind an `Arc`); it is
/// deliberately not `Clone`.
///
/// ```
/// use tinysync::AtomicBitField32;
///
/// let flags = AtomicBitField32::new();
/// flags.or(0b1011);
/// assert_eq!(flags.clear(0b0011), 0b0011);
/// assert_eq!(flags.swap(), 0b1000);
/// assert_eq!(flags.get(), 0);
/// ```
pub struct AtomicBitField<W: BitWord> {
    value: W::Atomic,
    _marker: NonCopyable,
}

/// A 32-bit lock-free bit field.
pub type AtomicBitField32 = AtomicBitField<u32>;

/// A 64-bit lock-free bit field.
pub type AtomicBitField64 = AtomicBitField<u64>;

impl<W: BitWord> AtomicBitField<W> {
    /// Width of the field in bits.
    pub const BITS: u32 = W::BITS;

    /// Creates a zeroed bit field.
    #[inline]
    pub fn new() -> Self {
        Self {
            value: W::new_atomic(W::zero()),
            _marker: NonCopyable::new(),
        }
    }

    /// Runs the CAS retry loop, returning the value the successful CAS replaced.
    #[inline(always)]
    fn update(&self, f: impl Fn(W) -> W) -> W {
        let mut current = W::load(&self.value, Ordering::Acquire);
        loop {
            match W::compare_exchange_weak(
                &self.value,
                current,
                f(current),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(previous) => return previous,
                Err(observed) => current = observed,
            }
        }
    }

    /// Sets every bit that is set in `mask`.
    #[inline]
    pub fn or(&self, mask: W) {
        self.update(|v| v | mask);
    }

    /// Clears every bit that is *not* set in `mask`.
    #[inline]
    pub fn and(&self, mask: W) {
        self.update(|v| v & mask);
    }

    /// Flips every bit that is set in `mask`.
    #[inline]
    pub fn xor(&self, mask: W) {
        self.update(|v| v ^ mask);
    }

    /// Clears every bit that is set in `mask` (AND NOT).
    ///
    /// Returns the bits of `mask` that were set before the call, i.e.
    /// `previous & mask`. A non-zero result means this caller was the one that
    /// cleared those bits, which gives test-and-clear semantics.
    #[inline]
    pub fn clear(&self, mask: W) -> W {
        self.update(|v| v & !mask) & mask
    }

    /// Sets bit `bit` to 1.
    ///
    /// # Panics
    /// Panics if `bit >= Self::BITS`.
    #[inline]
    pub fn set(&self, bit: u32) {
        self.or(W::mask_for(bit));
    }

    /// Sets bit `bit` to 0.
    ///
    /// # Panics
    /// Panics if `bit >= Self::BITS`.
    #[inline]
    pub fn unset(&self, bit: u32) {
        self.clear(W::mask_for(bit));
    }

    /// Returns whether bit `bit` is currently set.
    ///
    /// # Panics
    /// Panics if `bit >= Self::BITS`.
    #[inline]
    pub fn is_set(&self, bit: u32) -> bool {
        let mask = W::mask_for(bit);
        (self.get() & mask) == mask
    }

    /// Atomically resets the field to zero and returns its previous value.
    ///
    /// Useful for draining a set of event flags in one step.
    #[inline]
    pub fn swap(&self) -> W {
        W::swap(&self.value, W::zero(), Ordering::AcqRel)
    }

    /// Returns the current value.
    #[inline]
    pub fn get(&self) -> W {
        W::load(&self.value, Ordering::Acquire)
    }

    /// Returns a view of a single bit.
    ///
    /// # Panics
    /// Panics if `index >= Self::BITS`.
    #[inline]
    pub fn bit(&self, index: u32) -> BitView<'_, W> {
        BitView::new(self, index)
    }
}

impl<W: BitWord> Default for AtomicBitField<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: BitWord> fmt::Debug for AtomicBitField<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AtomicBitField")
            .field("bits", &format_args!("{:#0width$b}", self.get(), width = W::BITS as usize + 2))
            .finish()
    }
}
