//! The memory capability containers allocate through.

use std::ptr::{self, NonNull};

use crate::error::AllocError;

/// A source of raw, aligned memory.
///
/// Containers hold a `&dyn MemoryResource` and never a copy, so any number of
/// them can share one resource. Methods take `&self`; implementations that
/// keep state use interior mutability.
pub trait MemoryResource {
  /// Allocates at least `bytes` bytes aligned to at least `align`.
  ///
  /// `align` must be a non-zero power of two.
  fn allocate(
    &self,
    bytes: usize,
    align: usize,
  ) -> Result<NonNull<u8>, AllocError>;

  /// Returns a block previously obtained from [`allocate`](Self::allocate).
  ///
  /// # Safety
  ///
  /// The memory at `ptr` must not be used after this call. `bytes` and
  /// `align` should match the original request.
  unsafe fn deallocate(
    &self,
    ptr: NonNull<u8>,
    bytes: usize,
    align: usize,
  );

  /// Whether memory from `self` may be released through `other` and vice
  /// versa.
  fn is_equal(
    &self,
    other: &dyn MemoryResource,
  ) -> bool;
}

/// Identity comparison: `true` only when both references point at the same
/// instance.
pub fn same_instance<R: MemoryResource + ?Sized>(
  this: &R,
  other: &dyn MemoryResource,
) -> bool {
  ptr::addr_eq(this as *const R, other as *const dyn MemoryResource)
}
