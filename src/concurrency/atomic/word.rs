//! Word widths a bit field can be built on.

use core::fmt;
use core::sync::atomic::Ordering;

use num_traits::{One, PrimInt};

use crate::concurrency::shim::{AtomicU32, AtomicU64};

mod sealed {
    pub trait Sealed {}
    impl Sealed for u32 {}
    impl Sealed for u64 {}
}

/// An unsigned machine word with a matching atomic type.
///
/// Implemented for `u32` and `u64` only.
pub trait BitWord: PrimInt + fmt::Debug + fmt::Binary + Send + Sync + sealed::Sealed + 'static {
    /// The atomic cell holding a value of this width.
    type Atomic: Send + Sync;

    /// Number of bits in the word.
    const BITS: u32;

    /// Creates an atomic cell initialised to `value`.
    fn new_atomic(value: Self) -> Self::Atomic;

    /// Atomic load.
    fn load(atomic: &Self::Atomic, order: Ordering) -> Self;

    /// Atomic swap, returning the previous value.
    fn swap(atomic: &Self::Atomic, value: Self, order: Ordering) -> Self;

    /// Weak compare-and-swap; may fail spuriously.
    fn compare_exchange_weak(
        atomic: &Self::Atomic,
        current: Self,
        new: Self,
        success: Ordering,
        failure: Ordering,
    ) -> Result<Self, Self>;

    /// Returns the single-bit mask `1 << bit`.
    ///
    /// # Panics
    /// Panics if `bit >= Self::BITS`.
    #[inline(always)]
    fn mask_for(bit: u32) -> Self {
        assert!(
            bit < Self::BITS,
            "bit index {bit} out of range for a {}-bit field",
            Self::BITS
        );
        Self::one() << bit as usize
    }
}

macro_rules! impl_bit_word {
    ($word:ty, $atomic:ty) => {
        impl BitWord for $word {
            type Atomic = $atomic;

            const BITS: u32 = <$word>::BITS;

            #[inline(always)]
            fn new_atomic(value: Self) -> Self::Atomic {
                <$atomic>::new(value)
            }

            #[inline(always)]
            fn load(atomic: &Self::Atomic, order: Ordering) -> Self {
                atomic.load(order)
            }

            #[inline(always)]
            fn swap(atomic: &Self::Atomic, value: Self, order: Ordering) -> Self {
                atomic.swap(value, order)
            }

            #[inline(always)]
            fn compare_exchange_weak(
                atomic: &Self::Atomic,
                current: Self,
                new: Self,
                success: Ordering,
                failure: Ordering,
            ) -> Result<Self, Self> {
                atomic.compare_exchange_weak(current, new, success, failure)
            }
        }
    };
}

impl_bit_word!(u32, AtomicU32);
impl_bit_word!(u64, AtomicU64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_for_covers_full_width() {
        assert_eq!(<u32 as BitWord>::mask_for(0), 1);
        assert_eq!(<u32 as BitWord>::mask_for(31), 1 << 31);
        assert_eq!(<u64 as BitWord>::mask_for(63), 1 << 63);
    }

    #[test]
    #[should_panic(expected = "out of range for a 32-bit field")]
    fn mask_for_rejects_overflowing_shift() {
        let _ = <u32 as BitWord>::mask_for(32);
    }
}
