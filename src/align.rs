use std::mem;

/// Largest alignment the backing `malloc` is trusted to satisfy on its own.
///
/// Requests above this go through `posix_memalign` instead.
pub const MAX_FUNDAMENTAL_ALIGN: usize = 2 * mem::size_of::<usize>();

/// Rounds `value` up to the next multiple of `align`.
///
/// `align` must be a power of two.
///
/// # Examples
///
/// ```rust
/// use rtrack::align_to;
///
/// assert_eq!(align_to!(13, 8), 16);
/// assert_eq!(align_to!(16, 8), 16);
/// assert_eq!(align_to!(1, 1), 1);
/// ```
#[macro_export]
macro_rules! align_to {
  ($value:expr, $align:expr) => {
    ($value + $align - 1) & !($align - 1)
  };
}

/// Returns `true` when `align` is a usable alignment (non-zero power of two).
pub fn is_valid_alignment(align: usize) -> bool {
  align.is_power_of_two()
}

/// Returns `true` when plain `malloc` already guarantees `align`.
pub fn is_fundamental(align: usize) -> bool {
  align <= MAX_FUNDAMENTAL_ALIGN
}
