//! Forward cursors over contiguous storage.
//!
//! A [`Cursor`] is a bare position: dereferencing it is unchecked, advancing
//! it never fails, and two cursors compare equal when they sit on the same
//! slot. [`Iter`] and [`IterMut`] wrap a begin/end pair into a safe
//! [`Iterator`].
//!
//! Cursors borrow the container they came from, so anything that could move
//! or free the buffer (growth, `clear`, drop) is rejected by the borrow
//! checker while a cursor is alive.

use std::{fmt, iter::FusedIterator, marker::PhantomData, mem, ptr::NonNull};

#[inline]
fn is_zst<T>() -> bool {
  mem::size_of::<T>() == 0
}

/// Moves `ptr` forward by `count` slots.
///
/// Zero-sized types have no slot width, so their position is counted in
/// bytes instead.
#[inline]
pub(crate) fn offset<T>(
  ptr: *mut T,
  count: usize,
) -> *mut T {
  if is_zst::<T>() {
    ptr.wrapping_byte_add(count)
  } else {
    ptr.wrapping_add(count)
  }
}

#[inline]
fn distance<T>(
  from: *const T,
  to: *const T,
) -> usize {
  let bytes = (to as usize).wrapping_sub(from as usize);

  if is_zst::<T>() {
    bytes
  } else {
    bytes / mem::size_of::<T>()
  }
}

/// The address a reference to the element at `ptr` should use.
#[inline]
fn element<T>(ptr: *mut T) -> *mut T {
  if is_zst::<T>() {
    NonNull::dangling().as_ptr()
  } else {
    ptr
  }
}

/// Read-only forward cursor.
pub struct Cursor<'v, T> {
  ptr: *mut T,
  _marker: PhantomData<&'v T>,
}

impl<'v, T> Cursor<'v, T> {
  pub(crate) fn new(ptr: *mut T) -> Self {
    Self {
      ptr,
      _marker: PhantomData,
    }
  }

  /// The raw position of this cursor.
  pub fn as_ptr(&self) -> *const T {
    self.ptr
  }

  /// Dereferences the cursor.
  ///
  /// # Safety
  ///
  /// The cursor must point at a live element, i.e. lie strictly before the
  /// container's `end()`.
  pub unsafe fn get(&self) -> &'v T {
    unsafe { &*element(self.ptr) }
  }

  /// Pre-increment: moves to the next slot and returns the moved cursor.
  pub fn advance(&mut self) -> &mut Self {
    self.ptr = offset(self.ptr, 1);
    self
  }

  /// Post-increment: moves to the next slot and returns the old position.
  pub fn post_advance(&mut self) -> Self {
    let prior = *self;
    self.advance();
    prior
  }
}

impl<T> Clone for Cursor<'_, T> {
  fn clone(&self) -> Self {
    *self
  }
}

impl<T> Copy for Cursor<'_, T> {}

impl<T> PartialEq for Cursor<'_, T> {
  fn eq(
    &self,
    other: &Self,
  ) -> bool {
    self.ptr == other.ptr
  }
}

impl<T> Eq for Cursor<'_, T> {}

impl<T> fmt::Debug for Cursor<'_, T> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_tuple("Cursor").field(&self.ptr).finish()
  }
}

/// Forward cursor with write access.
pub struct CursorMut<'v, T> {
  ptr: *mut T,
  _marker: PhantomData<&'v mut T>,
}

impl<'v, T> CursorMut<'v, T> {
  pub(crate) fn new(ptr: *mut T) -> Self {
    Self {
      ptr,
      _marker: PhantomData,
    }
  }

  /// The raw position of this cursor.
  pub fn as_ptr(&self) -> *mut T {
    self.ptr
  }

  /// Dereferences the cursor for reading.
  ///
  /// # Safety
  ///
  /// The cursor must point at a live element.
  pub unsafe fn get(&self) -> &T {
    unsafe { &*element(self.ptr) }
  }

  /// Dereferences the cursor for writing.
  ///
  /// # Safety
  ///
  /// The cursor must point at a live element, and no other reference to that
  /// element may be alive.
  pub unsafe fn get_mut(&mut self) -> &mut T {
    unsafe { &mut *element(self.ptr) }
  }

  /// Hands out a reference for the full borrow of the container.
  ///
  /// # Safety
  ///
  /// Same as [`get_mut`](Self::get_mut), and each slot may be handed out at
  /// most once.
  unsafe fn into_slot(&self) -> &'v mut T {
    unsafe { &mut *element(self.ptr) }
  }

  /// Pre-increment: moves to the next slot and returns the moved cursor.
  pub fn advance(&mut self) -> &mut Self {
    self.ptr = offset(self.ptr, 1);
    self
  }

  /// Post-increment: moves to the next slot and returns the old position.
  ///
  /// The returned cursor aliases the same buffer as `self`.
  pub fn post_advance(&mut self) -> Self {
    let prior = Self::new(self.ptr);
    self.advance();
    prior
  }
}

impl<T> PartialEq for CursorMut<'_, T> {
  fn eq(
    &self,
    other: &Self,
  ) -> bool {
    self.ptr == other.ptr
  }
}

impl<T> Eq for CursorMut<'_, T> {}

impl<T> fmt::Debug for CursorMut<'_, T> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_tuple("CursorMut").field(&self.ptr).finish()
  }
}

/// Shared iterator over a container's live elements.
#[derive(Clone, Debug)]
pub struct Iter<'v, T> {
  head: Cursor<'v, T>,
  tail: Cursor<'v, T>,
}

impl<'v, T> Iter<'v, T> {
  pub(crate) fn new(
    head: Cursor<'v, T>,
    tail: Cursor<'v, T>,
  ) -> Self {
    Self { head, tail }
  }
}

impl<'v, T> Iterator for Iter<'v, T> {
  type Item = &'v T;

  fn next(&mut self) -> Option<Self::Item> {
    if self.head == self.tail {
      return None;
    }

    // head sits before tail, so it is on a live element.
    let item = unsafe { self.head.get() };
    self.head.advance();
    Some(item)
  }

  fn size_hint(&self) -> (usize, Option<usize>) {
    let remaining = distance(self.head.as_ptr(), self.tail.as_ptr());
    (remaining, Some(remaining))
  }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

/// Mutable iterator over a container's live elements.
#[derive(Debug)]
pub struct IterMut<'v, T> {
  head: CursorMut<'v, T>,
  tail: CursorMut<'v, T>,
}

impl<'v, T> IterMut<'v, T> {
  pub(crate) fn new(
    head: CursorMut<'v, T>,
    tail: CursorMut<'v, T>,
  ) -> Self {
    Self { head, tail }
  }
}

impl<'v, T> Iterator for IterMut<'v, T> {
  type Item = &'v mut T;

  fn next(&mut self) -> Option<Self::Item> {
    if self.head == self.tail {
      return None;
    }

    // Each slot is yielded once before head moves past it.
    let item = unsafe { self.head.into_slot() };
    self.head.advance();
    Some(item)
  }

  fn size_hint(&self) -> (usize, Option<usize>) {
    let remaining = distance(self.head.as_ptr(), self.tail.as_ptr());
    (remaining, Some(remaining))
  }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}

impl<T> FusedIterator for IterMut<'_, T> {}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn cursor_walks_array() {
    let mut values = [1u32, 2, 3];
    let base = values.as_mut_ptr();

    let mut cursor = Cursor::new(base);
    let end = Cursor::new(offset(base, values.len()));

    let mut seen = Vec::new();
    while cursor != end {
      seen.push(unsafe { *cursor.get() });
      cursor.advance();
    }

    assert_eq!(seen, [1, 2, 3]);
  }

  #[test]
  fn post_advance_returns_prior() {
    let mut values = [7i64, 8];
    let base = values.as_mut_ptr();

    let mut cursor = Cursor::new(base);
    let prior = cursor.post_advance();

    assert_eq!(unsafe { *prior.get() }, 7);
    assert_eq!(unsafe { *cursor.get() }, 8);
    assert_ne!(prior, cursor);
  }

  #[test]
  fn cursor_mut_writes_through() {
    let mut values = [0u8; 4];
    let base = values.as_mut_ptr();

    let mut cursor = CursorMut::new(base);
    let end = CursorMut::new(offset(base, 4));
    let mut next = 10;

    while cursor != end {
      unsafe { *cursor.get_mut() = next };
      next += 1;
      cursor.advance();
    }

    assert_eq!(values, [10, 11, 12, 13]);
  }

  #[test]
  fn zero_sized_positions_are_distinct() {
    let base = NonNull::<()>::dangling().as_ptr();
    let mut cursor = Cursor::new(base);
    let end = Cursor::new(offset(base, 3));

    let iter = Iter::new(cursor, end);
    assert_eq!(iter.len(), 3);
    assert_eq!(iter.count(), 3);

    cursor.advance().advance().advance();
    assert_eq!(cursor, end);
  }
}
