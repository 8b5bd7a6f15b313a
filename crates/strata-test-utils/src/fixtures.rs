//! Owned source memory for layout tests.
//!
//! Every block is backed by `u64` words, so block starts are 8-byte
//! aligned and stay put when the fixture grows: the `Box`es move, their
//! heap contents do not. Returned pointers are derived from the stored
//! block and stay writable for the fixture's lifetime.

use strata_layout::{MatrixHeader, VectorHeader};

#[derive(Default)]
pub struct Fixture {
    blocks: Vec<Box<[u64]>>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy `bytes` into a new block and return its address.
    pub fn bytes(&mut self, bytes: &[u8]) -> *mut u8 {
        let mut words = vec![0u64; bytes.len().div_ceil(8).max(1)].into_boxed_slice();
        for (word, chunk) in words.iter_mut().zip(bytes.chunks(8)) {
            let mut buf = [0u8; 8];
            buf[..chunk.len()].copy_from_slice(chunk);
            *word = u64::from_ne_bytes(buf);
        }
        // Derived after the push: moving the box would invalidate an
        // earlier pointer.
        let index = self.blocks.len();
        self.blocks.push(words);
        self.blocks[index].as_mut_ptr().cast()
    }

    /// `len` zero bytes.
    pub fn zeroed(&mut self, len: usize) -> *mut u8 {
        self.bytes(&vec![0u8; len])
    }

    pub fn i32s(&mut self, values: &[i32]) -> *mut u8 {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_ne_bytes()).collect();
        self.bytes(&bytes)
    }

    pub fn i16s(&mut self, values: &[i16]) -> *mut u8 {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_ne_bytes()).collect();
        self.bytes(&bytes)
    }

    pub fn f64s(&mut self, values: &[f64]) -> *mut u8 {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_ne_bytes()).collect();
        self.bytes(&bytes)
    }

    /// A NUL-terminated copy of `s`.
    pub fn c_string(&mut self, s: &str) -> *mut u8 {
        let mut bytes = s.as_bytes().to_vec();
        bytes.push(0);
        self.bytes(&bytes)
    }

    /// A table of pointers, in order.
    pub fn pointers(&mut self, pointers: &[*const u8]) -> *mut u8 {
        let bytes: Vec<u8> = pointers
            .iter()
            .flat_map(|p| (*p as usize).to_ne_bytes())
            .collect();
        self.bytes(&bytes)
    }

    /// One non-owning vector header.
    pub fn vector(&mut self, data: *const u8, count: u32) -> *mut u8 {
        self.bytes(&VectorHeader::new(data, count).encode())
    }

    /// Consecutive non-owning vector headers.
    pub fn vectors(&mut self, headers: &[(*const u8, u32)]) -> *mut u8 {
        let bytes: Vec<u8> = headers
            .iter()
            .flat_map(|&(data, count)| VectorHeader::new(data, count).encode())
            .collect();
        self.bytes(&bytes)
    }

    /// One non-owning matrix header.
    pub fn matrix(&mut self, data: *const u8, rows: u32, cols: u32) -> *mut u8 {
        self.bytes(&MatrixHeader::new(data, rows, cols).encode())
    }

    /// Number of blocks held.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_are_word_aligned() {
        let mut f = Fixture::new();
        let a = f.bytes(&[1, 2, 3]);
        let b = f.c_string("xy");
        assert_eq!(a as usize % 8, 0);
        assert_eq!(b as usize % 8, 0);
        assert_eq!(f.len(), 2);
    }

    #[test]
    fn earlier_blocks_survive_growth() {
        let mut f = Fixture::new();
        let first = f.i32s(&[7, 8]) as usize;
        for _ in 0..100 {
            f.zeroed(16);
        }
        let again = f.blocks[0].as_ptr() as usize;
        assert_eq!(first, again);
    }

    #[test]
    fn returned_pointer_is_the_stored_block() {
        let mut f = Fixture::new();
        f.zeroed(8);
        let p = f.i16s(&[1, -1, 2, -2]);
        assert_eq!(p, f.blocks[1].as_mut_ptr().cast::<u8>());
        let expected = u64::from_ne_bytes(
            [1i16, -1, 2, -2]
                .iter()
                .flat_map(|v| v.to_ne_bytes())
                .collect::<Vec<u8>>()
                .try_into()
                .unwrap(),
        );
        assert_eq!(&*f.blocks[1], &[expected]);
    }
}
