//! # rtrack - Tracking Allocator and Resource-Backed Vector
//!
//! This crate provides a **tracking allocator** that records every block it
//! hands out, and a growable **vector** that gets all of its memory from an
//! injected allocator instead of the global one.
//!
//! ## Overview
//!
//! ```text
//!   Ownership:
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                       TrackingAllocator                              │
//!   │                                                                      │
//!   │   table: { 0x5610_a000 -> 16 B, 0x5610_b040 -> 96 B, ... }           │
//!   │                 ▲                        ▲                           │
//!   └─────────────────┼────────────────────────┼───────────────────────────┘
//!                     │ &dyn MemoryResource    │ &dyn MemoryResource
//!          ┌──────────┴─────────┐   ┌──────────┴─────────┐
//!          │ ResourceVec<i32>   │   │ ResourceVec<Point> │
//!          │ owns 0x5610_a000   │   │ owns 0x5610_b040   │
//!          └────────────────────┘   └────────────────────┘
//!
//!   Containers borrow the allocator and exclusively own their buffer.
//!   The allocator never owns a container, only raw blocks.
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   rtrack
//!   ├── align      - Alignment macro (align_to!) and helpers
//!   ├── block      - Per-allocation record (internal)
//!   ├── config     - TrackingConfig, UnknownPointerPolicy
//!   ├── cursor     - Cursor, CursorMut, Iter, IterMut
//!   ├── error      - AllocError
//!   ├── raw        - construct_at / destroy_at / relocate (internal)
//!   ├── resource   - MemoryResource trait
//!   ├── tracking   - TrackingAllocator implementation
//!   └── vector     - ResourceVec implementation
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use rtrack::{ResourceVec, TrackingAllocator};
//!
//! let allocator = TrackingAllocator::new();
//!
//! {
//!     let mut values = ResourceVec::new_in(&allocator);
//!     values.push(10);
//!     values.push(20);
//!     values.push(30);
//!
//!     assert_eq!(values.len(), 3);
//!     assert_eq!(values.iter().copied().collect::<Vec<_>>(), [10, 20, 30]);
//!     assert_eq!(allocator.outstanding(), 1);
//! }
//!
//! // The buffer went back to the allocator when `values` was dropped.
//! assert_eq!(allocator.outstanding(), 0);
//! ```
//!
//! ## How Growth Works
//!
//! ```text
//!   push(c) with len == capacity == 2:
//!
//!   old (cap 2)  ┌─────┬─────┐
//!                │  a  │  b  │
//!                └──┬──┴──┬──┘
//!                   │     │     relocate slot by slot
//!                   ▼     ▼
//!   new (cap 4)  ┌─────┬─────┬─────┬─────┐
//!                │  a  │  b  │  c  │     │
//!                └─────┴─────┴─────┴─────┘
//!                                   ▲
//!                                   └── next push lands here
//!
//!   The old buffer is returned to the allocator once it is empty.
//! ```
//!
//! New capacity is `max(1, 2 * capacity)`. There is no in-place growth and
//! no shrinking; `clear` drops the elements but keeps the buffer.
//!
//! ## Limitations
//!
//! - **Single-threaded only**: the allocator table sits in a `RefCell`
//! - **Unix-only**: backed by `libc` `malloc`, `posix_memalign` and `free`
//! - **Move-only containers**: no `Clone`
//!
//! ## Safety
//!
//! `MemoryResource::deallocate` and the cursor dereferences are `unsafe`;
//! everything else on `ResourceVec` is safe, with bounds-checked indexing
//! and an explicit `get_unchecked` fast path.

pub mod align;
mod block;
pub mod config;
pub mod cursor;
pub mod error;
mod raw;
pub mod resource;
mod tracking;
mod vector;

pub use block::Block;
pub use config::{TrackingConfig, UnknownPointerPolicy};
pub use cursor::{Cursor, CursorMut, Iter, IterMut};
pub use error::AllocError;
pub use resource::MemoryResource;
pub use tracking::{AllocStats, TrackingAllocator};
pub use vector::ResourceVec;
