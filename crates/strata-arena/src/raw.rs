//! Low-level primitives for arena memory operations.
//!
//! The only module in this crate that talks to the global allocator
//! directly. Every `unsafe` block carries a `// SAFETY:` comment.

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::ptr::NonNull;

/// A zero-initialised, fixed-size, aligned block from the global allocator.
///
/// The block never moves, so pointers handed out from it stay valid until
/// the block is dropped.
pub(crate) struct RawBlock {
    ptr: NonNull<u8>,
    layout: Layout,
}

// SAFETY: RawBlock uniquely owns its allocation; no thread-affine state.
unsafe impl Send for RawBlock {}

impl RawBlock {
    /// Allocate `len` zeroed bytes aligned to `align`.
    ///
    /// Returns `None` on an invalid layout or allocator failure.
    pub(crate) fn zeroed(len: usize, align: usize) -> Option<Self> {
        let layout = Layout::from_size_align(len.max(1), align).ok()?;
        // SAFETY: layout has a non-zero size.
        let ptr = unsafe { alloc::alloc_zeroed(layout) };
        NonNull::new(ptr).map(|ptr| Self { ptr, layout })
    }

    /// Usable length in bytes.
    pub(crate) fn len(&self) -> usize {
        self.layout.size()
    }

    /// Pointer to byte `offset` of the block.
    ///
    /// # Panics
    ///
    /// Panics if `offset` exceeds the block length.
    pub(crate) fn at(&self, offset: usize) -> NonNull<u8> {
        assert!(offset <= self.len(), "offset {offset} outside block");
        // SAFETY: offset is within (or one past) the allocation, and the
        // base is non-null, so the result is non-null and in bounds.
        unsafe { NonNull::new_unchecked(self.ptr.as_ptr().add(offset)) }
    }

    /// Zero `len` bytes starting at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if the range exceeds the block length.
    pub(crate) fn zero(&mut self, offset: usize, len: usize) {
        let end = offset.checked_add(len).expect("range overflow");
        assert!(end <= self.len(), "range {offset}..{end} outside block");
        // SAFETY: the range was bounds-checked against the allocation and
        // &mut self guarantees no live Rust references into the block.
        unsafe { self.ptr.as_ptr().add(offset).write_bytes(0, len) };
    }
}

impl Drop for RawBlock {
    fn drop(&mut self) {
        // SAFETY: ptr was returned by alloc_zeroed with this exact layout.
        unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) };
    }
}

/// Bytes reserved in front of every heap block to remember its size.
/// Also the alignment of the returned pointer.
pub(crate) const HEAP_PREFIX: usize = 16;

/// Allocate an uninitialised heap block of `size` bytes.
///
/// The block is aligned to [`HEAP_PREFIX`] and must be released with
/// [`heap_free`].
pub(crate) fn heap_alloc(size: usize) -> Option<NonNull<u8>> {
    let total = size.checked_add(HEAP_PREFIX)?;
    let layout = Layout::from_size_align(total, HEAP_PREFIX).ok()?;
    // SAFETY: total >= HEAP_PREFIX > 0.
    let base = NonNull::new(unsafe { alloc::alloc(layout) })?;
    // SAFETY: base is valid for `total` bytes and aligned to 16, so the
    // usize write at offset 0 and the offset to HEAP_PREFIX are in bounds.
    unsafe {
        base.as_ptr().cast::<usize>().write(size);
        Some(NonNull::new_unchecked(base.as_ptr().add(HEAP_PREFIX)))
    }
}

/// Release a block returned by [`heap_alloc`].
///
/// # Safety
///
/// `ptr` must come from [`heap_alloc`] and must not have been freed.
pub(crate) unsafe fn heap_free(ptr: NonNull<u8>) {
    // SAFETY: the caller guarantees ptr is HEAP_PREFIX bytes past a live
    // base allocation whose first word stores the requested size.
    unsafe {
        let base = ptr.as_ptr().sub(HEAP_PREFIX);
        let size = base.cast::<usize>().read();
        let layout = Layout::from_size_align_unchecked(size + HEAP_PREFIX, HEAP_PREFIX);
        alloc::dealloc(base, layout);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_is_zeroed_and_aligned() {
        let block = RawBlock::zeroed(64, 16).unwrap();
        assert_eq!(block.len(), 64);
        assert_eq!(block.at(0).as_ptr() as usize % 16, 0);
        // SAFETY: the block is 64 bytes long and freshly zeroed.
        let bytes = unsafe { std::slice::from_raw_parts(block.at(0).as_ptr(), 64) };
        assert!(bytes.iter().all(|&b| b == 0));
    }

    #[test]
    fn zero_clears_range() {
        let mut block = RawBlock::zeroed(8, 8).unwrap();
        // SAFETY: offset 3 is inside the 8-byte block.
        unsafe { block.at(3).as_ptr().write(0xAA) };
        block.zero(0, 8);
        // SAFETY: same in-bounds byte.
        assert_eq!(unsafe { block.at(3).as_ptr().read() }, 0);
    }

    #[test]
    fn heap_round_trip() {
        let ptr = heap_alloc(40).unwrap();
        assert_eq!(ptr.as_ptr() as usize % HEAP_PREFIX, 0);
        // SAFETY: ptr is valid for 40 bytes and came from heap_alloc.
        unsafe {
            ptr.as_ptr().write_bytes(0x5A, 40);
            heap_free(ptr);
        }
    }
}
