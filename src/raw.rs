//! Placement primitives over uninitialized slots.
//!
//! Every element that enters or leaves a container buffer goes through one of
//! these, so element construction and destruction happen exactly once per
//! value.

use std::ptr;

/// Moves `value` into the uninitialized slot at `slot`.
///
/// # Safety
///
/// `slot` must be valid for writes, aligned, and not hold a live value.
#[inline]
pub(crate) unsafe fn construct_at<T>(
  slot: *mut T,
  value: T,
) {
  unsafe { ptr::write(slot, value) }
}

/// Runs the destructor of the value at `slot`, leaving it uninitialized.
///
/// # Safety
///
/// `slot` must hold a live value that is not used again.
#[inline]
pub(crate) unsafe fn destroy_at<T>(slot: *mut T) {
  unsafe { ptr::drop_in_place(slot) }
}

/// Moves the value at `src` into the uninitialized slot at `dst`.
///
/// Afterwards `src` is logically destroyed: its destructor must not run.
///
/// # Safety
///
/// `src` must hold a live value, `dst` must be a valid uninitialized slot,
/// and the two must not overlap.
#[inline]
pub(crate) unsafe fn relocate<T>(
  src: *mut T,
  dst: *mut T,
) {
  unsafe { construct_at(dst, ptr::read(src)) }
}
