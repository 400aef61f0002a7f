use std::{
  alloc::{self, Layout},
  fmt,
  marker::PhantomData,
  mem,
  ops::{Index, IndexMut},
  ptr::NonNull,
  slice,
};
use tracing::debug;

use crate::{
  cursor::{Cursor, CursorMut, Iter, IterMut, offset},
  error::AllocError,
  raw,
  resource::MemoryResource,
};

/// A growable array whose buffer comes from an injected [`MemoryResource`].
///
/// Slots `[0, len)` hold live values in insertion order; slots
/// `[len, capacity)` are reserved but uninitialized. Capacity only ever
/// doubles, and a buffer is never shrunk.
///
/// The container owns its buffer exclusively and borrows the resource for
/// `'a`, so the resource always outlives it. It is move-only: moving it
/// transfers the buffer without touching any element, and
/// [`take`](Self::take) does the same while leaving an empty container
/// behind.
pub struct ResourceVec<'a, T> {
  data: NonNull<T>,
  len: usize,
  cap: usize,
  resource: &'a dyn MemoryResource,
  _marker: PhantomData<T>,
}

/// Unrecoverable allocation failure from an infallible operation.
#[cold]
fn alloc_failure(err: AllocError) -> ! {
  if let AllocError::OutOfMemory { bytes, align } = err {
    if let Ok(layout) = Layout::from_size_align(bytes, align) {
      alloc::handle_alloc_error(layout);
    }
  }

  panic!("{err}");
}

impl<'a, T> ResourceVec<'a, T> {
  /// Creates an empty container bound to `resource`. Nothing is allocated.
  pub fn new_in(resource: &'a dyn MemoryResource) -> Self {
    Self {
      data: NonNull::dangling(),
      len: 0,
      cap: 0,
      resource,
      _marker: PhantomData,
    }
  }

  pub fn resource(&self) -> &'a dyn MemoryResource {
    self.resource
  }

  /// Whether `other` allocates from a resource equal to this one.
  pub fn shares_resource<U>(
    &self,
    other: &ResourceVec<'_, U>,
  ) -> bool {
    self.resource.is_equal(other.resource)
  }

  #[doc(alias = "size")]
  pub fn len(&self) -> usize {
    self.len
  }

  #[doc(alias = "empty")]
  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  pub fn capacity(&self) -> usize {
    self.cap
  }

  /// Start of the buffer. Dangling when no buffer is held.
  pub fn as_ptr(&self) -> *const T {
    self.data.as_ptr()
  }

  pub fn as_slice(&self) -> &[T] {
    unsafe { slice::from_raw_parts(self.data.as_ptr(), self.len) }
  }

  pub fn as_mut_slice(&mut self) -> &mut [T] {
    unsafe { slice::from_raw_parts_mut(self.data.as_ptr(), self.len) }
  }

  pub fn get(
    &self,
    index: usize,
  ) -> Option<&T> {
    self.as_slice().get(index)
  }

  pub fn get_mut(
    &mut self,
    index: usize,
  ) -> Option<&mut T> {
    self.as_mut_slice().get_mut(index)
  }

  /// # Safety
  ///
  /// `index` must be less than `len()`.
  pub unsafe fn get_unchecked(
    &self,
    index: usize,
  ) -> &T {
    unsafe { &*self.data.as_ptr().add(index) }
  }

  /// # Safety
  ///
  /// `index` must be less than `len()`.
  pub unsafe fn get_unchecked_mut(
    &mut self,
    index: usize,
  ) -> &mut T {
    unsafe { &mut *self.data.as_ptr().add(index) }
  }

  /// Appends `value`, doubling the capacity first when full.
  ///
  /// Allocation failure aborts through [`alloc::handle_alloc_error`]; use
  /// [`try_push`](Self::try_push) to observe it instead.
  #[doc(alias = "push_back")]
  pub fn push(
    &mut self,
    value: T,
  ) {
    if let Err(err) = self.try_push(value) {
      alloc_failure(err);
    }
  }

  /// Appends `value`, returning the resource's error if growth fails.
  ///
  /// On error the container is unchanged and `value` is dropped.
  pub fn try_push(
    &mut self,
    value: T,
  ) -> Result<(), AllocError> {
    if self.len == self.cap {
      self.grow()?;
    }

    unsafe { raw::construct_at(self.data.as_ptr().add(self.len), value) };
    self.len += 1;

    Ok(())
  }

  /// Destroys every live element in slot order. The buffer is kept.
  pub fn clear(&mut self) {
    let len = self.len;

    // A panicking destructor leaks the rest instead of dropping them twice.
    self.len = 0;

    for i in 0..len {
      unsafe { raw::destroy_at(self.data.as_ptr().add(i)) };
    }
  }

  /// Moves the buffer and elements out, leaving `self` empty with no buffer.
  ///
  /// `*dst = src.take()` is move assignment: `dst`'s old contents are
  /// dropped and its buffer returned to its resource.
  pub fn take(&mut self) -> Self {
    let resource = self.resource;
    mem::replace(self, Self::new_in(resource))
  }

  pub fn iter(&self) -> Iter<'_, T> {
    Iter::new(self.begin(), self.end())
  }

  pub fn iter_mut(&mut self) -> IterMut<'_, T> {
    let base = self.data.as_ptr();
    IterMut::new(CursorMut::new(base), CursorMut::new(offset(base, self.len)))
  }

  /// Cursor on the first element.
  pub fn begin(&self) -> Cursor<'_, T> {
    Cursor::new(self.data.as_ptr())
  }

  /// Cursor one past the last element.
  pub fn end(&self) -> Cursor<'_, T> {
    Cursor::new(offset(self.data.as_ptr(), self.len))
  }

  /// Writable cursor on the first element.
  pub fn begin_mut(&mut self) -> CursorMut<'_, T> {
    CursorMut::new(self.data.as_ptr())
  }

  /// Writable cursor one past the last element.
  ///
  /// Borrows the container mutably, so it cannot coexist with
  /// [`begin_mut`](Self::begin_mut); compare against `len()` steps or use
  /// [`iter_mut`](Self::iter_mut) to walk the whole range.
  pub fn end_mut(&mut self) -> CursorMut<'_, T> {
    CursorMut::new(offset(self.data.as_ptr(), self.len))
  }

  fn buffer_layout(capacity: usize) -> Result<Layout, AllocError> {
    Layout::array::<T>(capacity).map_err(|_| AllocError::CapacityOverflow {
      capacity,
      elem_size: mem::size_of::<T>(),
    })
  }

  /// Moves every element into a buffer twice the size (or one slot when
  /// there is none yet), then returns the old buffer.
  fn grow(&mut self) -> Result<(), AllocError> {
    let old_cap = self.cap;
    let new_cap = match old_cap {
      0 => 1,
      cap => cap.checked_mul(2).ok_or(AllocError::CapacityOverflow {
        capacity: cap,
        elem_size: mem::size_of::<T>(),
      })?,
    };

    let layout = Self::buffer_layout(new_cap)?;
    let new_data = self.resource.allocate(layout.size(), layout.align())?.cast::<T>();

    for i in 0..self.len {
      unsafe { raw::relocate(self.data.as_ptr().add(i), new_data.as_ptr().add(i)) };
    }

    self.release_buffer();

    self.data = new_data;
    self.cap = new_cap;

    debug!(old_cap, new_cap, len = self.len, address = ?new_data, "grew buffer");

    Ok(())
  }

  /// Returns the buffer to the resource. Elements must already be gone.
  fn release_buffer(&mut self) {
    if self.cap == 0 {
      return;
    }

    // This layout was valid when the buffer was allocated.
    if let Ok(layout) = Self::buffer_layout(self.cap) {
      unsafe { self.resource.deallocate(self.data.cast(), layout.size(), layout.align()) };
    }

    self.data = NonNull::dangling();
    self.cap = 0;
  }
}

impl<T> Drop for ResourceVec<'_, T> {
  fn drop(&mut self) {
    self.clear();
    self.release_buffer();
  }
}

impl<T> Index<usize> for ResourceVec<'_, T> {
  type Output = T;

  fn index(
    &self,
    index: usize,
  ) -> &T {
    &self.as_slice()[index]
  }
}

impl<T> IndexMut<usize> for ResourceVec<'_, T> {
  fn index_mut(
    &mut self,
    index: usize,
  ) -> &mut T {
    &mut self.as_mut_slice()[index]
  }
}

impl<T> Extend<T> for ResourceVec<'_, T> {
  fn extend<I: IntoIterator<Item = T>>(
    &mut self,
    iter: I,
  ) {
    for value in iter {
      self.push(value);
    }
  }
}

impl<'v, T> IntoIterator for &'v ResourceVec<'_, T> {
  type Item = &'v T;
  type IntoIter = Iter<'v, T>;

  fn into_iter(self) -> Self::IntoIter {
    self.iter()
  }
}

impl<'v, T> IntoIterator for &'v mut ResourceVec<'_, T> {
  type Item = &'v mut T;
  type IntoIter = IterMut<'v, T>;

  fn into_iter(self) -> Self::IntoIter {
    self.iter_mut()
  }
}

impl<T: fmt::Debug> fmt::Debug for ResourceVec<'_, T> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_list().entries(self.iter()).finish()
  }
}

#[cfg(test)]
mod tests {
  use std::{cell::Cell, rc::Rc};

  use proptest::prelude::*;

  use super::*;
  use crate::TrackingAllocator;

  #[derive(Debug)]
  struct Tracked {
    id: usize,
    drops: Rc<Cell<usize>>,
  }

  impl Drop for Tracked {
    fn drop(&mut self) {
      self.drops.set(self.drops.get() + 1);
    }
  }

  /// A resource that refuses every request.
  struct Exhausted;

  impl MemoryResource for Exhausted {
    fn allocate(
      &self,
      bytes: usize,
      align: usize,
    ) -> Result<NonNull<u8>, AllocError> {
      Err(AllocError::OutOfMemory { bytes, align })
    }

    unsafe fn deallocate(
      &self,
      _ptr: NonNull<u8>,
      _bytes: usize,
      _align: usize,
    ) {
    }

    fn is_equal(
      &self,
      other: &dyn MemoryResource,
    ) -> bool {
      crate::resource::same_instance(self, other)
    }
  }

  #[test]
  fn starts_empty_without_buffer() {
    let allocator = TrackingAllocator::new();
    let vec = ResourceVec::<u32>::new_in(&allocator);

    assert!(vec.is_empty());
    assert_eq!(vec.len(), 0);
    assert_eq!(vec.capacity(), 0);
    assert_eq!(vec.begin(), vec.end());
    assert_eq!(allocator.outstanding(), 0);
  }

  #[test]
  fn capacity_doubles() {
    let allocator = TrackingAllocator::new();
    let mut vec = ResourceVec::new_in(&allocator);
    let mut capacities = Vec::new();

    for i in 0..9u64 {
      vec.push(i);
      capacities.push(vec.capacity());
    }

    assert_eq!(capacities, [1, 2, 4, 4, 8, 8, 8, 8, 16]);
    assert_eq!(allocator.outstanding(), 1);
    assert_eq!(allocator.stats().allocations, 5);
    assert_eq!(allocator.stats().deallocations, 4);
  }

  #[test]
  fn grow_relocates_without_dropping() {
    let allocator = TrackingAllocator::new();
    let drops = Rc::new(Cell::new(0));
    let mut vec = ResourceVec::new_in(&allocator);

    for id in 0..5 {
      vec.push(Tracked {
        id,
        drops: drops.clone(),
      });
    }

    assert_eq!(drops.get(), 0);
    assert_eq!(vec.iter().map(|t| t.id).collect::<Vec<_>>(), [0, 1, 2, 3, 4]);

    drop(vec);
    assert_eq!(drops.get(), 5);
    assert_eq!(allocator.outstanding(), 0);
  }

  #[test]
  fn clear_keeps_capacity() {
    let allocator = TrackingAllocator::new();
    let drops = Rc::new(Cell::new(0));
    let mut vec = ResourceVec::new_in(&allocator);

    for id in 0..3 {
      vec.push(Tracked {
        id,
        drops: drops.clone(),
      });
    }

    let buffer = vec.as_ptr();
    let allocations = allocator.stats().allocations;

    vec.clear();
    assert_eq!(drops.get(), 3);
    assert_eq!(vec.len(), 0);
    assert_eq!(vec.capacity(), 4);

    for id in 0..4 {
      vec.push(Tracked {
        id,
        drops: drops.clone(),
      });
    }

    assert_eq!(vec.as_ptr(), buffer);
    assert_eq!(allocator.stats().allocations, allocations);
  }

  #[test]
  fn take_transfers_buffer() {
    let allocator = TrackingAllocator::new();
    let mut source = ResourceVec::new_in(&allocator);
    source.extend([1, 2, 3]);

    let buffer = source.as_ptr();
    let dest = source.take();

    assert_eq!(source.len(), 0);
    assert_eq!(source.capacity(), 0);
    assert_eq!(dest.as_ptr(), buffer);
    assert_eq!(dest.as_slice(), [1, 2, 3]);
    assert!(dest.shares_resource(&source));
    assert_eq!(allocator.outstanding(), 1);
  }

  #[test]
  fn move_assignment_releases_old_buffer() {
    let allocator = TrackingAllocator::new();
    let mut source = ResourceVec::new_in(&allocator);
    let mut dest = ResourceVec::new_in(&allocator);

    source.extend([1u16, 2]);
    dest.extend([9u16, 9, 9]);

    let old = dest.as_ptr() as *const u8;
    let buffer = source.as_ptr();

    dest = source.take();

    assert!(!allocator.contains(old));
    assert_eq!(dest.as_ptr(), buffer);
    assert_eq!(dest.as_slice(), [1, 2]);
    assert_eq!(allocator.outstanding(), 1);
  }

  #[test]
  fn checked_and_unchecked_access() {
    let allocator = TrackingAllocator::new();
    let mut vec = ResourceVec::new_in(&allocator);
    vec.extend([10, 20, 30]);

    assert_eq!(vec.get(1), Some(&20));
    assert_eq!(vec.get(3), None);
    assert_eq!(unsafe { *vec.get_unchecked(2) }, 30);

    vec[0] = 11;
    *vec.get_mut(1).unwrap() += 1;
    unsafe { *vec.get_unchecked_mut(2) += 2 };

    assert_eq!(vec.as_slice(), [11, 21, 32]);
  }

  #[test]
  #[should_panic]
  fn index_out_of_range_panics() {
    let allocator = TrackingAllocator::new();
    let mut vec = ResourceVec::new_in(&allocator);
    vec.push(1u8);

    let _ = vec[1];
  }

  #[test]
  fn failed_growth_leaves_container_intact() {
    let resource = Exhausted;
    let mut vec = ResourceVec::<u32>::new_in(&resource);

    let err = vec.try_push(1).unwrap_err();

    assert_eq!(err, AllocError::OutOfMemory { bytes: 4, align: 4 });
    assert!(vec.is_empty());
    assert_eq!(vec.capacity(), 0);
  }

  #[test]
  fn cursors_read_and_write() {
    let allocator = TrackingAllocator::new();
    let mut vec = ResourceVec::new_in(&allocator);
    vec.extend([1, 2, 3]);

    {
      let len = vec.len();
      let mut cursor = vec.begin_mut();
      for _ in 0..len {
        unsafe { *cursor.get_mut() *= 10 };
        cursor.advance();
      }
    }

    for value in &mut vec {
      *value += 1;
    }

    let mut seen = Vec::new();
    let mut cursor = vec.begin();
    while cursor != vec.end() {
      seen.push(unsafe { *cursor.post_advance().get() });
    }

    assert_eq!(seen, [11, 21, 31]);
    assert_eq!(format!("{vec:?}"), "[11, 21, 31]");
  }

  #[test]
  fn zero_sized_elements() {
    let allocator = TrackingAllocator::new();
    let mut vec = ResourceVec::new_in(&allocator);

    for _ in 0..5 {
      vec.push(());
    }

    assert_eq!(vec.len(), 5);
    assert_eq!(vec.capacity(), 8);
    assert_eq!(vec.iter().count(), 5);
    assert_eq!(allocator.outstanding(), 1);

    drop(vec);
    assert_eq!(allocator.outstanding(), 0);
  }

  proptest! {
    #[test]
    fn pushes_preserve_order(values in proptest::collection::vec(any::<i64>(), 0..200)) {
      let allocator = TrackingAllocator::new();
      let mut vec = ResourceVec::new_in(&allocator);

      for &value in &values {
        vec.push(value);
      }

      prop_assert_eq!(vec.len(), values.len());
      for (i, value) in values.iter().enumerate() {
        prop_assert_eq!(&vec[i], value);
      }

      let expected_cap = if values.is_empty() { 0 } else { values.len().next_power_of_two() };
      prop_assert_eq!(vec.capacity(), expected_cap);
      prop_assert_eq!(allocator.outstanding(), usize::from(!values.is_empty()));
    }
  }
}
