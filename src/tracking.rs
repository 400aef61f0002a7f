use std::{cell::RefCell, collections::BTreeMap, mem, ptr::{self, NonNull}};
use libc::c_void;
use tracing::{trace, warn};

use crate::{
  align::{is_fundamental, is_valid_alignment},
  align_to,
  block::Block,
  config::{TrackingConfig, UnknownPointerPolicy},
  error::AllocError,
  resource::{MemoryResource, same_instance},
};

/// Counters describing the allocator's lifetime activity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AllocStats {
  /// Successful `allocate` calls.
  pub allocations: usize,
  /// Blocks released through `deallocate` / `try_deallocate`.
  pub deallocations: usize,
  /// `deallocate` calls for addresses not in the table.
  pub ignored_deallocations: usize,
  /// Blocks reclaimed by `release_all` (including on drop).
  pub force_released: usize,
  /// Blocks currently outstanding.
  pub live_blocks: usize,
  /// Requested bytes currently outstanding.
  pub live_bytes: usize,
  /// Highest value `live_bytes` has reached.
  pub peak_bytes: usize,
}

#[derive(Debug, Default)]
struct State {
  blocks: BTreeMap<usize, Block>,
  stats: AllocStats,
}

/// A `malloc`-backed allocator that records every block it hands out.
///
/// Each successful allocation inserts `address -> Block` into a table; each
/// successful deallocation removes it. Whatever is still in the table when
/// the allocator is dropped gets freed.
///
/// The table lives in a `RefCell`, so the allocator is `!Sync` and meant for
/// one thread.
#[derive(Debug, Default)]
pub struct TrackingAllocator {
  config: TrackingConfig,
  state: RefCell<State>,
}

/// Asks the system allocator for `size` bytes aligned to `align`.
unsafe fn system_alloc(
  size: usize,
  align: usize,
) -> *mut u8 {
  unsafe {
    if is_fundamental(align) {
      return libc::malloc(size) as *mut u8;
    }

    // posix_memalign wants a multiple of sizeof(void *).
    let align = align.max(mem::size_of::<*mut c_void>());
    let mut out: *mut c_void = ptr::null_mut();

    if libc::posix_memalign(&mut out, align, size) != 0 {
      return ptr::null_mut();
    }

    out as *mut u8
  }
}

impl TrackingAllocator {
  pub fn new() -> Self {
    Self::with_config(TrackingConfig::default())
  }

  pub fn with_config(config: TrackingConfig) -> Self {
    Self {
      config,
      state: RefCell::new(State::default()),
    }
  }

  pub fn config(&self) -> &TrackingConfig {
    &self.config
  }

  /// Number of blocks handed out and not yet released.
  pub fn outstanding(&self) -> usize {
    self.state.borrow().blocks.len()
  }

  /// Sum of the requested sizes of all outstanding blocks.
  pub fn outstanding_bytes(&self) -> usize {
    self.state.borrow().stats.live_bytes
  }

  /// Whether `ptr` is an outstanding block of this allocator.
  pub fn contains(
    &self,
    ptr: *const u8,
  ) -> bool {
    self.state.borrow().blocks.contains_key(&(ptr as usize))
  }

  /// The recorded block at `ptr`, if any.
  pub fn block(
    &self,
    ptr: *const u8,
  ) -> Option<Block> {
    self.state.borrow().blocks.get(&(ptr as usize)).copied()
  }

  pub fn stats(&self) -> AllocStats {
    self.state.borrow().stats
  }

  /// Like [`MemoryResource::deallocate`], but reports unknown addresses
  /// instead of applying the configured policy.
  ///
  /// # Safety
  ///
  /// The memory at `ptr` must not be used after this call.
  pub unsafe fn try_deallocate(
    &self,
    ptr: NonNull<u8>,
  ) -> Result<Block, AllocError> {
    let address = ptr.as_ptr() as usize;
    let mut state = self.state.borrow_mut();

    let Some(block) = state.blocks.remove(&address) else {
      return Err(AllocError::UnknownPointer { address });
    };

    unsafe { libc::free(address as *mut c_void) };

    state.stats.deallocations += 1;
    state.stats.live_blocks -= 1;
    state.stats.live_bytes -= block.size;

    trace!(address = ?ptr, bytes = block.size, align = block.align, "released block");

    Ok(block)
  }

  /// Frees every outstanding block and empties the table.
  ///
  /// Returns how many blocks were reclaimed. Taking `&mut self` guarantees
  /// that no container still borrows this allocator.
  pub fn release_all(&mut self) -> usize {
    let state = self.state.get_mut();
    let leaked = mem::take(&mut state.blocks);

    if leaked.is_empty() {
      return 0;
    }

    warn!(
      blocks = leaked.len(),
      bytes = state.stats.live_bytes,
      "releasing outstanding blocks"
    );

    for (address, block) in &leaked {
      warn!(address = ?(*address as *const u8), bytes = block.size, "leaked block");
      unsafe { libc::free(*address as *mut c_void) };
    }

    state.stats.force_released += leaked.len();
    state.stats.live_blocks = 0;
    state.stats.live_bytes = 0;

    leaked.len()
  }

  fn unknown_pointer(
    &self,
    ptr: NonNull<u8>,
    bytes: usize,
  ) {
    self.state.borrow_mut().stats.ignored_deallocations += 1;

    match self.config.unknown_pointer {
      UnknownPointerPolicy::Ignore => {}
      UnknownPointerPolicy::Warn => {
        warn!(address = ?ptr, bytes, "deallocate of unknown pointer ignored");
      }
      UnknownPointerPolicy::Panic => {
        panic!("deallocate of unknown pointer {ptr:?} ({bytes} bytes)");
      }
    }
  }
}

impl MemoryResource for TrackingAllocator {
  fn allocate(
    &self,
    bytes: usize,
    align: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    if !is_valid_alignment(align) {
      return Err(AllocError::InvalidAlignment { align });
    }

    if bytes > isize::MAX as usize - (align - 1) {
      return Err(AllocError::OutOfMemory { bytes, align });
    }

    // Zero-byte requests still get a distinct, trackable address.
    let size = align_to!(bytes.max(1), align);

    let address = unsafe { system_alloc(size, align) };

    let Some(ptr) = NonNull::new(address) else {
      return Err(AllocError::OutOfMemory { bytes, align });
    };

    let mut state = self.state.borrow_mut();
    state.blocks.insert(address as usize, Block::new(bytes, align));

    state.stats.allocations += 1;
    state.stats.live_blocks += 1;
    state.stats.live_bytes += bytes;
    state.stats.peak_bytes = state.stats.peak_bytes.max(state.stats.live_bytes);

    trace!(address = ?ptr, bytes, align, "allocated block");

    Ok(ptr)
  }

  unsafe fn deallocate(
    &self,
    ptr: NonNull<u8>,
    bytes: usize,
    align: usize,
  ) {
    let recorded = self.block(ptr.as_ptr());

    let Some(block) = recorded else {
      self.unknown_pointer(ptr, bytes);
      return;
    };

    if block.size != bytes || block.align != align {
      warn!(
        address = ?ptr,
        recorded_bytes = block.size,
        recorded_align = block.align,
        bytes,
        align,
        "deallocate layout does not match allocation"
      );
    }

    let _ = unsafe { self.try_deallocate(ptr) };
  }

  fn is_equal(
    &self,
    other: &dyn MemoryResource,
  ) -> bool {
    same_instance(self, other)
  }
}

impl Drop for TrackingAllocator {
  fn drop(&mut self) {
    self.release_all();
  }
}
