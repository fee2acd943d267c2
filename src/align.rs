/// Granularity every payload size is rounded up to.
pub const ALIGNMENT: usize = 4;

/// Rounds the given size up to the next multiple of [`ALIGNMENT`].
///
/// Overflows (and panics in debug builds) for sizes within `ALIGNMENT - 1`
/// of `usize::MAX`; use [`checked_align`] for untrusted input.
///
/// # Examples
///
/// ```rust
/// use fitalloc::align;
///
/// assert_eq!(align!(1), 4);
/// assert_eq!(align!(13), 16);
/// assert_eq!(align!(16), 16);
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    ($value + $crate::align::ALIGNMENT - 1) & !($crate::align::ALIGNMENT - 1)
  };
}

/// Rounds `size` up to the next multiple of [`ALIGNMENT`], or `None` when
/// the result does not fit in a `usize`.
pub fn checked_align(size: usize) -> Option<usize> {
  size
    .checked_add(ALIGNMENT - 1)
    .map(|padded| padded & !(ALIGNMENT - 1))
}
