//! Allocation error types.

use thiserror::Error;

/// Errors surfaced by a [`MemoryResource`](crate::MemoryResource) or by a
/// container asking one for memory.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum AllocError {
  /// The system allocator could not satisfy the request.
  #[error("out of memory: requested {bytes} bytes aligned to {align}")]
  OutOfMemory {
    /// Number of bytes requested.
    bytes: usize,
    /// Alignment requested.
    align: usize,
  },

  /// The element count does not fit in a valid memory layout.
  #[error("capacity overflow: {capacity} elements of {elem_size} bytes")]
  CapacityOverflow {
    /// Element count that was requested.
    capacity: usize,
    /// Size of a single element.
    elem_size: usize,
  },

  /// Alignment is zero or not a power of two.
  #[error("invalid alignment: {align}")]
  InvalidAlignment {
    /// The rejected alignment.
    align: usize,
  },

  /// Address was never handed out by this allocator, or was already released.
  #[error("unknown pointer: {address:#x}")]
  UnknownPointer {
    /// The address passed to deallocate.
    address: usize,
  },
}
