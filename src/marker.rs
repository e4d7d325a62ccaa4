//! Structural markers shared by the primitives.

/// A zero-sized tag that makes the containing type non-duplicable.
///
/// `NonCopyable` implements neither `Clone`, `Copy` nor `PartialEq`, so a
/// struct that embeds it cannot derive any of them. Every primitive in this
/// crate carries one: the address of a lock or bit field *is* its identity,
/// and a by-value copy would silently fork the shared state.
///
/// ```compile_fail
/// use tinysync::marker::NonCopyable;
///
/// #[derive(Clone, Copy)]
/// struct Flag {
///     bits: u32,
///     _marker: NonCopyable,
/// }
/// ```
#[derive(Debug, Default)]
pub struct NonCopyable {
    _private: (),
}

impl NonCopyable {
    /// Creates the marker.
    #[inline(always)]
    pub const fn new() -> Self {
        Self { _private: () }
    }
}
