//! Runtime headers of vector and matrix layers.
//!
//! Layout (native endian, `P` = pointer size):
//!
//! ```text
//! vector  [0..P) data  [P..P+4) count  [P+4..P+8) owned
//! matrix  [0..P) data  [P..P+4) rows   [P+4..P+8) cols  [P+8..P+12) owned
//! ```
//!
//! The matrix header is padded to pointer alignment so that arrays of
//! headers keep every data pointer aligned. The `owned` word is nonzero
//! when the payload was heap-allocated by a resize and must be freed with
//! the header; clones never own their payload.

use strata_core::{DimensionSize, LayoutError};

use crate::raw::{self, POINTER_SIZE};

const fn round_up(value: usize, align: usize) -> usize {
    value.div_ceil(align) * align
}

/// Encoded size of a [`VectorHeader`].
pub const VECTOR_HEADER_SIZE: usize = POINTER_SIZE + 8;

/// Encoded size of a [`MatrixHeader`], padded to pointer alignment.
pub const MATRIX_HEADER_SIZE: usize = round_up(POINTER_SIZE + 12, POINTER_SIZE);

fn check_len(bytes: &[u8], need: usize, what: &str) -> Result<(), LayoutError> {
    if bytes.len() < need {
        return Err(LayoutError::parameters(format!(
            "{what} header needs {need} bytes, got {}",
            bytes.len()
        )));
    }
    Ok(())
}

fn word(bytes: &[u8], at: usize) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[at..at + 4]);
    u32::from_ne_bytes(buf)
}

fn pointer(bytes: &[u8]) -> *mut u8 {
    let mut buf = [0u8; POINTER_SIZE];
    buf.copy_from_slice(&bytes[..POINTER_SIZE]);
    usize::from_ne_bytes(buf) as *mut u8
}

/// Pointer and element count of one vector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VectorHeader {
    /// First element, or NULL when `count` is zero.
    pub data: *mut u8,
    /// Number of elements.
    pub count: u32,
    /// Whether `data` is heap-owned by this header.
    pub owned: bool,
}

impl VectorHeader {
    /// The empty vector: NULL data, zero elements.
    pub const EMPTY: Self = Self {
        data: std::ptr::null_mut(),
        count: 0,
        owned: false,
    };

    /// A non-owning header.
    pub fn new(data: *const u8, count: u32) -> Self {
        Self {
            data: data.cast_mut(),
            count,
            owned: false,
        }
    }

    /// Serialize to native-endian bytes.
    pub fn encode(&self) -> [u8; VECTOR_HEADER_SIZE] {
        let mut out = [0u8; VECTOR_HEADER_SIZE];
        out[..POINTER_SIZE].copy_from_slice(&(self.data as usize).to_ne_bytes());
        out[POINTER_SIZE..POINTER_SIZE + 4].copy_from_slice(&self.count.to_ne_bytes());
        out[POINTER_SIZE + 4..].copy_from_slice(&u32::from(self.owned).to_ne_bytes());
        out
    }

    /// Parse from bytes produced by [`encode`](Self::encode).
    pub fn decode(bytes: &[u8]) -> Result<Self, LayoutError> {
        check_len(bytes, VECTOR_HEADER_SIZE, "vector")?;
        Ok(Self {
            data: pointer(bytes),
            count: word(bytes, POINTER_SIZE),
            owned: word(bytes, POINTER_SIZE + 4) != 0,
        })
    }

    /// Read a header from memory.
    ///
    /// # Safety
    ///
    /// `src` must be readable for [`VECTOR_HEADER_SIZE`] bytes.
    pub unsafe fn read_from(src: *const u8) -> Self {
        // SAFETY: every field lies within the VECTOR_HEADER_SIZE bytes the
        // caller guarantees.
        unsafe {
            Self {
                data: raw::read_pointer(src),
                count: raw::read_u32(src.add(POINTER_SIZE)),
                owned: raw::read_u32(src.add(POINTER_SIZE + 4)) != 0,
            }
        }
    }

    /// Write this header to memory.
    ///
    /// # Safety
    ///
    /// `dst` must be writable for [`VECTOR_HEADER_SIZE`] bytes.
    pub unsafe fn write_to(&self, dst: *mut u8) {
        // SAFETY: as for read_from.
        unsafe {
            raw::write_pointer(dst, self.data);
            raw::write_u32(dst.add(POINTER_SIZE), self.count);
            raw::write_u32(dst.add(POINTER_SIZE + 4), u32::from(self.owned));
        }
    }
}

/// Pointer and row/column counts of one matrix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatrixHeader {
    /// First element, or NULL when the matrix is empty.
    pub data: *mut u8,
    /// Number of rows.
    pub rows: u32,
    /// Number of columns.
    pub cols: u32,
    /// Whether `data` is heap-owned by this header.
    pub owned: bool,
}

impl MatrixHeader {
    /// The empty matrix.
    pub const EMPTY: Self = Self {
        data: std::ptr::null_mut(),
        rows: 0,
        cols: 0,
        owned: false,
    };

    /// A non-owning header.
    pub fn new(data: *const u8, rows: u32, cols: u32) -> Self {
        Self {
            data: data.cast_mut(),
            rows,
            cols,
            owned: false,
        }
    }

    /// `rows * cols`, saturating.
    pub fn element_count(&self) -> DimensionSize {
        DimensionSize::new(self.rows) * self.cols
    }

    /// Serialize to native-endian bytes; padding is zero.
    pub fn encode(&self) -> [u8; MATRIX_HEADER_SIZE] {
        let mut out = [0u8; MATRIX_HEADER_SIZE];
        out[..POINTER_SIZE].copy_from_slice(&(self.data as usize).to_ne_bytes());
        out[POINTER_SIZE..POINTER_SIZE + 4].copy_from_slice(&self.rows.to_ne_bytes());
        out[POINTER_SIZE + 4..POINTER_SIZE + 8].copy_from_slice(&self.cols.to_ne_bytes());
        out[POINTER_SIZE + 8..POINTER_SIZE + 12]
            .copy_from_slice(&u32::from(self.owned).to_ne_bytes());
        out
    }

    /// Parse from bytes produced by [`encode`](Self::encode).
    pub fn decode(bytes: &[u8]) -> Result<Self, LayoutError> {
        check_len(bytes, MATRIX_HEADER_SIZE, "matrix")?;
        Ok(Self {
            data: pointer(bytes),
            rows: word(bytes, POINTER_SIZE),
            cols: word(bytes, POINTER_SIZE + 4),
            owned: word(bytes, POINTER_SIZE + 8) != 0,
        })
    }

    /// Read a header from memory.
    ///
    /// # Safety
    ///
    /// `src` must be readable for [`MATRIX_HEADER_SIZE`] bytes.
    pub unsafe fn read_from(src: *const u8) -> Self {
        // SAFETY: fields lie within the guaranteed range.
        unsafe {
            Self {
                data: raw::read_pointer(src),
                rows: raw::read_u32(src.add(POINTER_SIZE)),
                cols: raw::read_u32(src.add(POINTER_SIZE + 4)),
                owned: raw::read_u32(src.add(POINTER_SIZE + 8)) != 0,
            }
        }
    }

    /// Write this header to memory. Padding bytes are left untouched.
    ///
    /// # Safety
    ///
    /// `dst` must be writable for [`MATRIX_HEADER_SIZE`] bytes.
    pub unsafe fn write_to(&self, dst: *mut u8) {
        // SAFETY: fields lie within the guaranteed range.
        unsafe {
            raw::write_pointer(dst, self.data);
            raw::write_u32(dst.add(POINTER_SIZE), self.rows);
            raw::write_u32(dst.add(POINTER_SIZE + 4), self.cols);
            raw::write_u32(dst.add(POINTER_SIZE + 8), u32::from(self.owned));
        }
    }
}
