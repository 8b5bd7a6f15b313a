//! Heap allocation for storage that outlives an arena.
//!
//! Vector and matrix resizing allocate their new payload from a [`Heap`]
//! rather than from a page arena, because the payload is owned by the
//! header it is stored in and freed independently.

#![allow(unsafe_code)]

use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::raw;

/// A general-purpose allocator for individually freed blocks.
pub trait Heap {
    /// Allocate `size` bytes, or `None` if the allocator is exhausted.
    ///
    /// The block is aligned for any scalar or pointer and its contents
    /// are unspecified.
    fn malloc(&self, size: usize) -> Option<NonNull<u8>>;

    /// Release a block.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by `malloc` on this same heap and not
    /// freed since.
    unsafe fn free(&self, ptr: NonNull<u8>);
}

/// [`Heap`] backed by the global allocator.
///
/// Tracks the number of live blocks so tests and diagnostics can detect
/// leaks.
#[derive(Debug, Default)]
pub struct SystemHeap {
    live: AtomicUsize,
}

impl SystemHeap {
    /// Create a heap with no live blocks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of blocks allocated and not yet freed.
    pub fn live_allocations(&self) -> usize {
        self.live.load(Ordering::Relaxed)
    }
}

impl Heap for SystemHeap {
    fn malloc(&self, size: usize) -> Option<NonNull<u8>> {
        let ptr = raw::heap_alloc(size);
        match ptr {
            Some(_) => {
                self.live.fetch_add(1, Ordering::Relaxed);
            }
            None => log::warn!("[SystemHeap::malloc] allocation of {size} bytes failed"),
        }
        ptr
    }

    unsafe fn free(&self, ptr: NonNull<u8>) {
        // SAFETY: forwarded caller contract; SystemHeap::malloc only hands
        // out raw::heap_alloc blocks.
        unsafe { raw::heap_free(ptr) };
        self.live.fetch_sub(1, Ordering::Relaxed);
    }
}
