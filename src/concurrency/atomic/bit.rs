//! Single-bit views into a bit field.

use core::fmt;

use num_traits::Zero;

use super::bitfield::AtomicBitField;
use super::word::BitWord;

/// A handle bound to one bit of an [`AtomicBitField`].
///
/// The view owns nothing and adds no synchronization; every operation
/// delegates to the field.
///
/// ```
/// use tinysync::AtomicBitField64;
///
/// let flags = AtomicBitField64::new();
/// let ready = flags.bit(40);
/// ready.set(true);
/// assert_eq!(flags.get(), 1 << 40);
/// ready.set(false);
/// assert_eq!(flags.get(), 0);
/// ```
pub struct BitView<'a, W: BitWord> {
    field: &'a AtomicBitField<W>,
    index: u32,
}

impl<'a, W: BitWord> BitView<'a, W> {
    /// Binds a view to bit `index` of `field`.
    ///
    /// # Panics
    /// Panics if `index >= W::BITS`.
    #[inline]
    pub fn new(field: &'a AtomicBitField<W>, index: u32) -> Self {
        assert!(
            index < W::BITS,
            "bit index {index} out of range for a {}-bit field",
            W::BITS
        );
        Self { field, index }
    }

    /// Sets (`true`) or clears (`false`) the bit.
    #[inline]
    pub fn set(&self, value: bool) {
        if value {
            self.field.or(self.mask());
        } else {
            self.field.clear(self.mask());
        }
    }

    /// Returns whether the bit is currently set.
    #[inline]
    pub fn get(&self) -> bool {
        !(self.field.get() & self.mask()).is_zero()
    }

    /// The bit index this view is bound to.
    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// The single-bit mask `1 << index`.
    #[inline]
    pub fn mask(&self) -> W {
        W::one() << self.index as usize
    }
}

impl<W: BitWord> Clone for BitView<'_, W> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<W: BitWord> Copy for BitView<'_, W> {}

impl<W: BitWord> fmt::Debug for BitView<'_, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitView")
            .field("index", &self.index)
            .field("set", &self.get())
            .finish()
    }
}

#[cfg(all(test, not(loom)))]
mod tests {
    use crate::{AtomicBitField32, AtomicBitField64};

    #[test]
    fn set_then_unset_leaves_other_bits() {
        let f = AtomicBitField32::new();
        f.or(0b1010_0000);
        let v = f.bit(2);
        v.set(true);
        assert!(v.get());
        assert_eq!(f.get(), 0b1010_0100);
        v.set(false);
        assert!(!v.get());
        assert_eq!(f.get(), 0b1010_0000);
    }

    #[test]
    fn views_share_the_field() {
        let f = AtomicBitField64::new();
        let a = f.bit(0);
        let b = f.bit(63);
        a.set(true);
        b.set(true);
        assert_eq!(f.get(), 1 | (1 << 63));
        assert_eq!(b.index(), 63);
        assert_eq!(b.mask(), 1 << 63);
        f.swap();
        assert!(!a.get());
        assert!(!b.get());
    }

    #[test]
    #[should_panic(expected = "bit index 32 out of range")]
    fn bind_rejects_invalid_index() {
        let f = AtomicBitField32::new();
        let _ = f.bit(32);
    }
}
