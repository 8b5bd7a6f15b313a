//! Contiguous memory pages and growable page lists.
//!
//! A [`Page`] is a fixed-size zeroed block with bump allocation.
//! A [`PageList`] is a growable collection of pages that overflow into
//! new pages when the current one is full. A reservation never straddles
//! two pages: it is placed entirely in the next page, and a reservation
//! larger than the regular page size gets a dedicated page of its own.

use std::ptr::NonNull;

use crate::error::ArenaError;
use crate::raw::RawBlock;

fn align_up(value: usize, align: usize) -> Option<usize> {
    Some(value.checked_add(align - 1)? & !(align - 1))
}

/// A single contiguous memory page with bump allocation.
///
/// Pages are never freed while the arena is alive, only reset or dropped
/// with it. Because a page's storage never moves, reservations stay valid
/// across later growth of the page list.
pub struct Page {
    block: RawBlock,
    /// Bump pointer: next free byte offset.
    cursor: usize,
    align: usize,
}

impl Page {
    /// Create a zeroed page of `capacity` bytes whose reservations are
    /// aligned to `align`.
    pub fn new(capacity: usize, align: usize) -> Result<Self, ArenaError> {
        let block = RawBlock::zeroed(capacity, align)
            .ok_or(ArenaError::AllocationFailed { requested: capacity })?;
        Ok(Self {
            block,
            cursor: 0,
            align,
        })
    }

    /// Bump-reserve `len` zeroed bytes from this page.
    ///
    /// Returns `None` if there is insufficient remaining capacity.
    pub fn reserve(&mut self, len: usize) -> Option<NonNull<u8>> {
        let start = align_up(self.cursor, self.align)?;
        let end = start.checked_add(len)?;
        if end > self.capacity() {
            return None;
        }
        // Zero-init: the region may hold data from before a reset.
        self.block.zero(start, len);
        self.cursor = end;
        Some(self.block.at(start))
    }

    /// Pointer to the next free byte, without reserving anything.
    pub fn cursor_ptr(&self) -> NonNull<u8> {
        let start = align_up(self.cursor, self.align)
            .unwrap_or(self.capacity())
            .min(self.capacity());
        self.block.at(start)
    }

    /// Reset the bump pointer to zero without deallocating.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Bytes currently reserved, including alignment padding.
    pub fn used(&self) -> usize {
        self.cursor
    }

    /// Total capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.block.len()
    }

    /// Remaining free capacity in bytes.
    pub fn remaining(&self) -> usize {
        self.capacity() - self.cursor
    }
}

/// A growable list of [`Page`]s with overflow-based bump allocation.
pub struct PageList {
    pages: Vec<Page>,
    page_size: usize,
    max_pages: usize,
    align: usize,
    /// Index of the page currently being filled.
    current: usize,
}

impl PageList {
    /// Create a page list with one pre-allocated page.
    pub fn new(page_size: usize, max_pages: usize, align: usize) -> Result<Self, ArenaError> {
        let mut pages = Vec::with_capacity(max_pages.min(64));
        pages.push(Page::new(page_size, align)?);
        Ok(Self {
            pages,
            page_size,
            max_pages,
            align,
            current: 0,
        })
    }

    /// Reserve `len` zeroed bytes, growing into a new page if needed.
    ///
    /// A zero-length reservation returns the current cursor without
    /// consuming space.
    pub fn reserve(&mut self, len: usize) -> Result<NonNull<u8>, ArenaError> {
        if len == 0 {
            return Ok(self.pages[self.current].cursor_ptr());
        }

        if let Some(ptr) = self.pages[self.current].reserve(len) {
            return Ok(ptr);
        }

        // Current page full: reuse the next existing page if it fits
        // (pages survive a reset).
        let next = self.current + 1;
        if next < self.pages.len() {
            if let Some(ptr) = self.pages[next].reserve(len) {
                self.current = next;
                return Ok(ptr);
            }
        }

        if self.pages.len() >= self.max_pages {
            return Err(ArenaError::CapacityExceeded {
                requested: len,
                capacity: self.memory_bytes(),
            });
        }

        let capacity = align_up(len.max(self.page_size), self.align)
            .ok_or(ArenaError::AllocationFailed { requested: len })?;
        let mut page = Page::new(capacity, self.align)?;
        let ptr = page
            .reserve(len)
            .ok_or(ArenaError::AllocationFailed { requested: len })?;
        self.pages.push(page);
        self.current = self.pages.len() - 1;
        Ok(ptr)
    }

    /// Reset all pages' bump pointers without deallocating.
    pub fn reset(&mut self) {
        for page in &mut self.pages {
            page.reset();
        }
        self.current = 0;
    }

    /// Number of pages currently allocated.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Total bytes of backing storage.
    pub fn memory_bytes(&self) -> usize {
        self.pages.iter().map(Page::capacity).sum()
    }

    /// Total bytes reserved across all pages.
    pub fn total_used(&self) -> usize {
        self.pages.iter().map(Page::used).sum()
    }
}
