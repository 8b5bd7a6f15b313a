//! Unchecked memory access used by traversal and cloning.
//!
//! Values in traversed memory are not necessarily aligned for their type,
//! so every scalar access here is an unaligned read or write.

use std::ptr;

use strata_core::LayoutError;

/// Bytes occupied by one pointer.
pub const POINTER_SIZE: usize = std::mem::size_of::<usize>();

/// Read a pointer stored at `addr`.
///
/// # Safety
///
/// `addr` must be valid for reading [`POINTER_SIZE`] bytes.
pub(crate) unsafe fn read_pointer(addr: *const u8) -> *mut u8 {
    // SAFETY: caller guarantees POINTER_SIZE readable bytes.
    unsafe { addr.cast::<*mut u8>().read_unaligned() }
}

/// Store `value` as a pointer at `addr`.
///
/// # Safety
///
/// `addr` must be valid for writing [`POINTER_SIZE`] bytes.
pub(crate) unsafe fn write_pointer(addr: *mut u8, value: *const u8) {
    // SAFETY: caller guarantees POINTER_SIZE writable bytes.
    unsafe { addr.cast::<*const u8>().write_unaligned(value) }
}

/// Read a native-endian `u32` at `addr`.
///
/// # Safety
///
/// `addr` must be valid for reading 4 bytes.
pub(crate) unsafe fn read_u32(addr: *const u8) -> u32 {
    // SAFETY: caller guarantees 4 readable bytes.
    unsafe { addr.cast::<u32>().read_unaligned() }
}

/// Store a native-endian `u32` at `addr`.
///
/// # Safety
///
/// `addr` must be valid for writing 4 bytes.
pub(crate) unsafe fn write_u32(addr: *mut u8, value: u32) {
    // SAFETY: caller guarantees 4 writable bytes.
    unsafe { addr.cast::<u32>().write_unaligned(value) }
}

/// Copy `len` bytes from `src` to `dst`. The ranges may overlap.
///
/// A zero-length copy never dereferences either pointer. Otherwise a NULL
/// pointer is rejected with [`LayoutError::Parameters`].
///
/// # Safety
///
/// When both pointers are non-NULL, `src` must be readable and `dst`
/// writable for `len` bytes.
pub(crate) unsafe fn copy_bytes(dst: *mut u8, src: *const u8, len: usize) -> Result<(), LayoutError> {
    if len == 0 {
        return Ok(());
    }
    if dst.is_null() || src.is_null() {
        return Err(LayoutError::parameters(format!(
            "copy of {len} bytes with NULL pointer (dst={dst:p}, src={src:p})"
        )));
    }
    // SAFETY: non-NULL and sized per the caller contract; ptr::copy
    // tolerates overlap.
    unsafe { ptr::copy(src, dst, len) };
    Ok(())
}

/// Fill `len` bytes at `dst` with `value`.
///
/// # Safety
///
/// When `dst` is non-NULL it must be writable for `len` bytes.
pub(crate) unsafe fn set_bytes(dst: *mut u8, value: u8, len: usize) -> Result<(), LayoutError> {
    if len == 0 {
        return Ok(());
    }
    if dst.is_null() {
        return Err(LayoutError::parameters(format!(
            "fill of {len} bytes at NULL"
        )));
    }
    // SAFETY: non-NULL and sized per the caller contract.
    unsafe { dst.write_bytes(value, len) };
    Ok(())
}

/// Number of `element_size`-byte elements before the first all-zero
/// element.
///
/// # Safety
///
/// `ptr` must point to a sequence of elements that contains an all-zero
/// element, and every element up to and including it must be readable.
pub unsafe fn zero_terminated_len(ptr: *const u8, element_size: usize) -> u32 {
    if element_size == 0 {
        return 0;
    }
    let mut count: u32 = 0;
    loop {
        // SAFETY: element `count` precedes or is the terminator, which the
        // caller guarantees readable.
        let element = unsafe {
            std::slice::from_raw_parts(ptr.add(count as usize * element_size), element_size)
        };
        if element.iter().all(|&b| b == 0) || count == u32::MAX {
            return count;
        }
        count += 1;
    }
}

/// Length of the NUL-terminated string at `ptr`, excluding the NUL.
///
/// # Safety
///
/// `ptr` must point to a readable NUL-terminated byte string.
pub(crate) unsafe fn c_str_len(ptr: *const u8) -> usize {
    // SAFETY: caller contract.
    unsafe { std::ffi::CStr::from_ptr(ptr.cast()) }.to_bytes().len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_round_trip_unaligned() {
        let mut buf = [0u8; POINTER_SIZE + 1];
        let target = 0x1234usize as *const u8;
        // SAFETY: buf has POINTER_SIZE bytes after offset 1.
        unsafe {
            write_pointer(buf.as_mut_ptr().add(1), target);
            assert_eq!(read_pointer(buf.as_ptr().add(1)) as usize, 0x1234);
        }
    }

    #[test]
    fn copy_rejects_null_unless_empty() {
        let mut dst = [0u8; 4];
        let src = [1u8, 2, 3, 4];
        // SAFETY: both buffers are 4 bytes.
        unsafe {
            assert!(copy_bytes(std::ptr::null_mut(), std::ptr::null(), 0).is_ok());
            let err = copy_bytes(dst.as_mut_ptr(), std::ptr::null(), 4).unwrap_err();
            assert_eq!(err.kind(), strata_core::ErrorKind::Parameters);
            copy_bytes(dst.as_mut_ptr(), src.as_ptr(), 4).unwrap();
        }
        assert_eq!(dst, src);
    }

    #[test]
    fn set_fills() {
        let mut buf = [7u8; 6];
        // SAFETY: 6-byte buffer.
        unsafe { set_bytes(buf.as_mut_ptr(), 0, 6).unwrap() };
        assert_eq!(buf, [0; 6]);
        // SAFETY: NULL is checked before use.
        assert!(unsafe { set_bytes(std::ptr::null_mut(), 0, 1) }.is_err());
    }

    #[test]
    fn zero_terminated_counts_whole_elements() {
        let values: [u16; 5] = [3, 0x0100, 9, 0, 5];
        // SAFETY: terminator at index 3.
        let n = unsafe { zero_terminated_len(values.as_ptr().cast(), 2) };
        assert_eq!(n, 3);
    }

    #[test]
    fn c_string_length() {
        let s = b"hello\0";
        // SAFETY: NUL-terminated literal.
        assert_eq!(unsafe { c_str_len(s.as_ptr()) }, 5);
    }
}
